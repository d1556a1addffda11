//! VLC Transceiver Console
//!
//! A terminal session with a transceiver: type text to chat, or slash
//! commands to control the device. Events and raw traffic are printed as
//! they arrive.
//!
//! Usage:
//!   cargo run --example vlc_console -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/tty.usbmodem101)
//!   --baud RATE       Baud rate (default: 115200)
//!   --config FILE     Load client settings from a JSON file
//!   --dest ADDR       Destination address for chat text (default: FF)
//!   --quiet           Do not print raw traffic
//!
//! Commands:
//!   /reset                 Reset the device
//!   /version               Ask for the firmware version
//!   /address [ADDR]        Ask for, or set, the device address
//!   /dest ADDR             Change the chat destination
//!   /config G P V          Set configuration parameter P of group G to V
//!   /quit                  Close the port and exit

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;
use vlc_core::prelude::*;

struct Args {
    config: ClientConfig,
    destination: String,
    show_traffic: bool,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();

    let mut config: Option<ClientConfig> = None;
    let mut port_name: Option<String> = None;
    let mut baud_rate: Option<u32> = None;
    let mut destination = "FF".to_string();
    let mut show_traffic = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                port_name = args.get(i).cloned();
            }
            "--baud" | "-b" => {
                i += 1;
                let raw = args.get(i).context("--baud needs a value")?;
                baud_rate = Some(raw.parse().with_context(|| format!("bad baud rate '{raw}'"))?);
            }
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).context("--config needs a file")?;
                config = Some(ClientConfig::load(path)?);
            }
            "--dest" | "-d" => {
                i += 1;
                destination = args.get(i).context("--dest needs an address")?.clone();
            }
            "--quiet" | "-q" => show_traffic = false,
            arg if !arg.starts_with('-') => port_name = Some(arg.to_string()),
            other => bail!("unknown option '{other}'"),
        }
        i += 1;
    }

    let mut config = config.unwrap_or_else(|| ClientConfig::new("/dev/tty.usbmodem101"));
    if let Some(name) = port_name {
        config.port_name = name;
    }
    if let Some(baud) = baud_rate {
        config.baud_rate = baud;
    }

    Ok(Args {
        config,
        destination,
        show_traffic,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let Args {
        config,
        mut destination,
        show_traffic,
    } = parse_args()?;

    println!(
        "Opening {} at {} baud (waiting {} ms for the device to boot)",
        config.port_name, config.baud_rate, config.startup_delay_ms
    );
    let client = Client::open(&config)
        .with_context(|| format!("could not open {}", config.port_name))?;
    if let Some(reason) = client.history_log_error() {
        eprintln!("[WARN] history log disabled: {reason}");
    }

    client.subscribe(|event| {
        if let Some(description) = event.describe() {
            let label = if description.is_notice { "system" } else { "received" };
            println!("[{label}] {}", description.text);
        }
    });
    if show_traffic {
        client.subscribe_history(|entry| {
            println!(
                "  [{}] [{}]: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.direction,
                entry.payload.escape_debug()
            );
        });
    }
    client.subscribe_log_errors(|e| eprintln!("[WARN] history log write failed: {e}"));

    let stdin = io::stdin();
    print_prompt();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            print_prompt();
            continue;
        }

        let mut words = input.split_whitespace();
        let result = match words.next() {
            Some("/quit") => break,
            Some("/reset") => client.reset(),
            Some("/version") => client.request_version(),
            Some("/address") => match words.next() {
                Some(address) => client.set_address(address),
                None => client.request_address(),
            },
            Some("/dest") => {
                match words.next() {
                    Some(address) => {
                        destination = address.to_string();
                        println!("[system] Sending to {destination}");
                    }
                    None => println!("[system] Usage: /dest ADDR"),
                }
                Ok(())
            }
            Some("/config") => {
                let fields: Vec<&str> = words.collect();
                match fields.as_slice() {
                    [g, p, v] => client.configure_from_text(g, p, v),
                    _ => {
                        println!("[system] Usage: /config GROUP PARAM VALUE");
                        Ok(())
                    }
                }
            }
            Some(cmd) if cmd.starts_with('/') => {
                println!("[system] Unknown command {cmd}");
                Ok(())
            }
            _ => {
                println!("[sent] {input}");
                client.send_text(input, &destination)
            }
        };

        match result {
            Ok(()) => {}
            Err(e @ ProtocolError::InvalidNumericInput { .. }) => println!("[system] {e}"),
            Err(e) => {
                client.close();
                return Err(e).context("device command failed");
            }
        }
        print_prompt();
    }

    client.close();
    Ok(())
}

fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
