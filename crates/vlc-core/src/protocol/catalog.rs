//! Configuration catalog
//!
//! The firmware exposes its tunables as `(group, parameter)` index pairs.
//! This table names them so configuration echoes can be shown to an
//! operator.

use std::fmt;

/// A named group of configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterGroup {
    /// Short group name
    pub name: &'static str,
    /// Parameter names in firmware index order
    pub parameters: &'static [&'static str],
}

/// Groups in firmware index order
pub const GROUPS: [ParameterGroup; 3] = [
    ParameterGroup {
        name: "PHY",
        parameters: &[
            "PHY preamble length",
            "FEC threshold (default: disabled)",
            "Channel busy threshold (default: 20)",
            "light emission (enable/disable)",
        ],
    },
    ParameterGroup {
        name: "MAC",
        parameters: &[
            "# of re-transmissions",
            "DIFS",
            "CWmin (use power of two)",
            "CWmax (use power of two)",
            "RTS threshold (default: disabled)",
            "MAC address",
        ],
    },
    ParameterGroup {
        name: "LOG",
        parameters: &[
            "logging level (0: none, 7: silly)",
            "logger prefix character (default: disabled)",
        ],
    },
];

/// Why a `(group, parameter)` pair has no catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    /// No group at this index
    UndefinedGroup {
        /// Requested group index
        group: i64,
    },
    /// The group exists but has no parameter at this index
    UndefinedParameter {
        /// The matched group
        group: &'static ParameterGroup,
        /// Requested parameter index
        parameter: i64,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UndefinedGroup { group } => write!(
                f,
                "There are {} groups (0-{}): {} leads to undefined behaviour",
                GROUPS.len(),
                GROUPS.len() - 1,
                group
            ),
            LookupError::UndefinedParameter { group, parameter } => write!(
                f,
                "There are {} parameters (0-{}) in group {}: {} leads to undefined behaviour",
                group.parameters.len(),
                group.parameters.len() - 1,
                group.name,
                parameter
            ),
        }
    }
}

/// Find the group at `index`
pub fn group(index: i64) -> Option<&'static ParameterGroup> {
    usize::try_from(index).ok().and_then(|i| GROUPS.get(i))
}

/// Name of the parameter at `(group, parameter)`
pub fn lookup(group_index: i64, parameter: i64) -> Result<&'static str, LookupError> {
    let group = group(group_index).ok_or(LookupError::UndefinedGroup { group: group_index })?;
    usize::try_from(parameter)
        .ok()
        .and_then(|i| group.parameters.get(i).copied())
        .ok_or(LookupError::UndefinedParameter { group, parameter })
}

/// Operator-facing description of a configuration echo
pub fn describe(group: i64, parameter: i64, value: i64) -> String {
    match lookup(group, parameter) {
        Ok(name) => format!("You set {} to be {}", name, value),
        Err(e) => e.to_string(),
    }
}
