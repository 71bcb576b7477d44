// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
ACI Frame Decoder

Decodes ACI frames captured as hex, one frame per line. Lines take the form
logged by the transport with `debug_frames` enabled (`C [15, 01, 68, 69]` for
a command, `E [8A, 01]` for an event) or bare hex bytes, which are decoded as
events unless `--commands` is given. Bytes start at the opcode; the length
byte is implied.

Usage:
  cargo run --bin aci_decode -- [--config <aci_configuration.toml>] [--commands] [--debug-all] [capture.txt]

Reads stdin when no capture file is given.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::env;
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use nrf_aci::config::{load_config, AciConfig, ConfigError};
use nrf_aci::observability::{self, debug_flags_help, parse_debug_flags, LogFormat};
use nrf_aci::protocol::{Command, Event};
use nrf_aci::transport::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Command,
    Event,
}

struct Args {
    config: Option<PathBuf>,
    default_direction: Direction,
    input: Option<PathBuf>,
}

fn usage() -> String {
    format!(
        "Usage: aci_decode [--config <file>] [--commands] [capture.txt]\n\n{}",
        debug_flags_help()
    )
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        default_direction: Direction::Event,
        input: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--commands" => args.default_direction = Direction::Command,
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            // Parsed separately by the observability crate
            flag if flag.starts_with("--debug-") => {}
            flag if flag.starts_with("--") => bail!("unknown option {}\n\n{}", flag, usage()),
            path => args.input = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn load(args: &Args) -> Result<AciConfig> {
    match load_config(args.config.as_deref(), None) {
        Ok(config) => Ok(config),
        // No file anywhere: defaults plus environment overrides
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = AciConfig::default();
            nrf_aci::config::apply_environment_overrides(&mut config);
            Ok(config)
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

/// Split a captured line into its direction and opcode-first bytes
fn parse_line(line: &str, default_direction: Direction) -> Result<Option<(Direction, Vec<u8>)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (direction, rest) = match line.split_once(' ') {
        Some(("C", rest)) => (Direction::Command, rest),
        Some(("E", rest)) => (Direction::Event, rest),
        _ => (default_direction, line),
    };
    let bytes = rest
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']'))
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(digits, 16).with_context(|| format!("bad hex byte '{}'", token))
        })
        .collect::<Result<Vec<u8>>>()?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some((direction, bytes)))
}

fn describe(direction: Direction, bytes: &[u8]) -> Result<String> {
    let frame = Frame::from_payload(bytes).map_err(|e| anyhow::anyhow!("{}", e))?;
    let text = match direction {
        Direction::Command => match Command::decode(&frame) {
            Ok(command) => format!("C {:?}", command),
            Err(e) => format!("C <{}>", e),
        },
        Direction::Event => match Event::decode(&frame) {
            Ok(event) => format!("E {:?}", event),
            Err(e) => format!("E <{}>", e),
        },
    };
    Ok(text)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = load(&args)?;

    let logging = observability::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.parse().unwrap_or(LogFormat::Text),
        file_dir: None,
    };
    let _guard = observability::init_logging(&logging, &parse_debug_flags())?;
    tracing::debug!(
        "link: {:?} mode, lsb_first={}, board {:?}",
        config.link.mode,
        config.link.lsb_first,
        config.link.board
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(io::BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut decoded = 0usize;
    let mut rejected = 0usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line.context("failed to read capture")?;
        let parsed = match parse_line(&line, args.default_direction) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("line {}: {:#}", number + 1, e);
                rejected += 1;
                continue;
            }
        };
        match describe(parsed.0, &parsed.1) {
            Ok(text) => {
                println!("{:>5}: {}", number + 1, text);
                decoded += 1;
            }
            Err(e) => {
                tracing::warn!("line {}: {:#}", number + 1, e);
                rejected += 1;
            }
        }
    }

    tracing::info!("{} frames decoded, {} lines rejected", decoded, rejected);
    Ok(())
}
