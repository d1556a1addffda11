//! Response classification
//!
//! Maps each decoded line from the device to exactly one [`Event`].
//! Classification is total: lines that match no known shape become
//! [`Event::Unknown`].

use serde::{Deserialize, Serialize};

use super::{catalog, commands::parse_int_literal};

/// A classified line received from the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Device acknowledged a reset (`r`)
    ResetAck,
    /// Firmware version report (`p[...]`)
    VersionInfo {
        /// Version text as reported
        version: String,
    },
    /// Own address report (`a[...]`)
    AddressInfo {
        /// Address text as reported
        address: String,
    },
    /// Configuration write echoed back (`c[g,p,v]`)
    ConfigEcho {
        /// Parameter group index
        group: i64,
        /// Parameter index within the group
        parameter: i64,
        /// Value now in effect
        value: i64,
    },
    /// Application payload from a peer (`m[R,D,...]`)
    DataMessage {
        /// Message body, possibly containing commas
        payload: String,
    },
    /// A previous send completed (`m[R,A]`)
    SendAck,
    /// Anything else
    Unknown,
}

/// Operator-facing rendering of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Device status notice rather than a peer message
    pub is_notice: bool,
    /// Text to show the operator
    pub text: String,
}

impl Event {
    /// Classify one trimmed, non-empty line
    pub fn classify(line: &str) -> Self {
        if line == "r" {
            return Event::ResetAck;
        }
        if let Some(body) = bracket_body(line, 'p') {
            return Event::VersionInfo {
                version: body.to_string(),
            };
        }
        if let Some(body) = bracket_body(line, 'a') {
            return Event::AddressInfo {
                address: body.to_string(),
            };
        }
        if let Some(body) = bracket_body(line, 'c') {
            return classify_config(body);
        }
        if let Some(body) = bracket_body(line, 'm') {
            return classify_data_frame(body);
        }
        Event::Unknown
    }

    /// Whether the line matched no known shape
    pub fn is_unknown(&self) -> bool {
        matches!(self, Event::Unknown)
    }

    /// What an operator should see for this event, if anything
    pub fn describe(&self) -> Option<Description> {
        let notice = |text: String| {
            Some(Description {
                is_notice: true,
                text,
            })
        };
        match self {
            Event::ResetAck => notice("Device has been reset".to_string()),
            Event::VersionInfo { version } => notice(format!("You use version {}", version)),
            Event::AddressInfo { address } => notice(format!("Your address is {}", address)),
            Event::ConfigEcho {
                group,
                parameter,
                value,
            } => notice(catalog::describe(*group, *parameter, *value)),
            Event::SendAck => notice("Sending was successful (ACK received)".to_string()),
            Event::DataMessage { payload } => Some(Description {
                is_notice: false,
                text: payload.clone(),
            }),
            Event::Unknown => None,
        }
    }
}

/// Body of `<tag>[...]`, if the line has that shape
fn bracket_body(line: &str, tag: char) -> Option<&str> {
    line.strip_prefix(tag)?.strip_prefix('[')?.strip_suffix(']')
}

fn classify_config(body: &str) -> Event {
    let tokens: Vec<&str> = body.split(',').collect();
    let [g, p, v] = tokens.as_slice() else {
        return Event::Unknown;
    };
    match (parse_int_literal(g), parse_int_literal(p), parse_int_literal(v)) {
        (Some(group), Some(parameter), Some(value)) => Event::ConfigEcho {
            group,
            parameter,
            value,
        },
        _ => Event::Unknown,
    }
}

fn classify_data_frame(body: &str) -> Event {
    let parts: Vec<&str> = body.splitn(3, ',').collect();
    match parts.as_slice() {
        [kind, status] if kind.trim() == "R" && status.trim() == "A" => Event::SendAck,
        [kind, status, payload] if *kind == "R" && *status == "D" && !payload.is_empty() => {
            Event::DataMessage {
                payload: payload.to_string(),
            }
        }
        _ => Event::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, ConfigureRequest};

    #[test]
    fn test_reset_ack() {
        assert_eq!(Event::classify("r"), Event::ResetAck);
        assert_eq!(Event::classify("rr"), Event::Unknown);
    }

    #[test]
    fn test_version_and_address() {
        assert_eq!(
            Event::classify("p[1.4.2]"),
            Event::VersionInfo {
                version: "1.4.2".to_string()
            }
        );
        assert_eq!(
            Event::classify("a[0A]"),
            Event::AddressInfo {
                address: "0A".to_string()
            }
        );
        assert_eq!(
            Event::classify("a[]"),
            Event::AddressInfo {
                address: String::new()
            }
        );
        assert_eq!(Event::classify("p[1.4.2"), Event::Unknown);
        assert_eq!(Event::classify("p"), Event::Unknown);
    }

    #[test]
    fn test_config_echo() {
        assert_eq!(
            Event::classify("c[1,2,0]"),
            Event::ConfigEcho {
                group: 1,
                parameter: 2,
                value: 0
            }
        );
        assert_eq!(
            Event::classify("c[ 0 , 2 , 0x14 ]"),
            Event::ConfigEcho {
                group: 0,
                parameter: 2,
                value: 20
            }
        );
        assert_eq!(Event::classify("c[1,x,0]"), Event::Unknown);
        assert_eq!(Event::classify("c[1,2]"), Event::Unknown);
        assert_eq!(Event::classify("c[1,2,3,4]"), Event::Unknown);
    }

    #[test]
    fn test_config_echo_out_of_catalog_is_still_classified() {
        let event = Event::classify("c[5,0,1]");
        assert_eq!(
            event,
            Event::ConfigEcho {
                group: 5,
                parameter: 0,
                value: 1
            }
        );
        let description = event.describe().unwrap();
        assert!(description.is_notice);
        assert!(description.text.contains("3 groups (0-2)"));
    }

    #[test]
    fn test_data_message() {
        assert_eq!(
            Event::classify("m[R,D,hello]"),
            Event::DataMessage {
                payload: "hello".to_string()
            }
        );
        // Payload keeps its own commas
        assert_eq!(
            Event::classify("m[R,D,a,b,c]"),
            Event::DataMessage {
                payload: "a,b,c".to_string()
            }
        );
        assert_eq!(Event::classify("m[R,D,]"), Event::Unknown);
        assert_eq!(Event::classify("m[R,X,hello]"), Event::Unknown);
        assert_eq!(Event::classify("m[T,D,hello]"), Event::Unknown);
    }

    #[test]
    fn test_send_ack() {
        assert_eq!(Event::classify("m[R,A]"), Event::SendAck);
        assert_eq!(Event::classify("m[ R , A ]"), Event::SendAck);
        assert_eq!(Event::classify("m[R,B]"), Event::Unknown);
        assert_eq!(Event::classify("m[R]"), Event::Unknown);
        assert_eq!(Event::classify("m[]"), Event::Unknown);
        assert_eq!(Event::classify("m[R,A,]"), Event::Unknown);
    }

    #[test]
    fn test_classifier_is_total() {
        for line in [
            "", "[", "]", "m[", "c[", "c[,,]", "\u{fffd}\u{fffd}", "m[R,D", "x[1]", "P[1]",
            "hello world", "m[hi\0,FF]",
        ] {
            // Must not panic; most of these are unknown
            let _ = Event::classify(line);
        }
        assert_eq!(Event::classify("hello world"), Event::Unknown);
        assert_eq!(Event::classify("P[1]"), Event::Unknown);
    }

    #[test]
    fn test_config_round_trip() {
        for group in -2..5 {
            for parameter in -1..8 {
                for value in [i64::MIN, -20, 0, 1, 20, 255, i64::MAX] {
                    let req = ConfigureRequest::new(group, parameter, value);
                    let line = Command::Configure(req).encode();
                    assert_eq!(
                        Event::classify(&line),
                        Event::ConfigEcho {
                            group,
                            parameter,
                            value
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn test_descriptions() {
        let text = |line: &str| Event::classify(line).describe().map(|d| d.text);
        assert_eq!(text("r").as_deref(), Some("Device has been reset"));
        assert_eq!(text("p[2.1]").as_deref(), Some("You use version 2.1"));
        assert_eq!(text("a[0A]").as_deref(), Some("Your address is 0A"));
        assert_eq!(
            text("m[R,A]").as_deref(),
            Some("Sending was successful (ACK received)")
        );
        assert_eq!(
            text("c[1,4,0]").as_deref(),
            Some("You set RTS threshold (default: disabled) to be 0")
        );
        assert_eq!(text("garbage"), None);

        let message = Event::classify("m[R,D,hello]").describe().unwrap();
        assert!(!message.is_notice);
        assert_eq!(message.text, "hello");
    }
}
