//! Trace files: one event per line.
//!
//! ```text
//! # comment
//! create 1
//! switch 1
//! w 0x1a2 0xff
//! r 418
//! exit 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::Pid;
use crate::stats::StatsReport;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Create(Pid),
    Switch(Pid),
    Exit(Pid),
    Read(u64),
    Write(u64, u8),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, TraceError> {
        let mut events = Vec::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let event = Self::parse_line(line).map_err(|message| TraceError::Parse {
                line: index + 1,
                message,
            })?;
            events.push(event);
        }
        Ok(Trace { events })
    }

    fn parse_line(line: &str) -> Result<TraceEvent, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let arity = |n: usize| {
            if tokens.len() == n {
                Ok(())
            } else {
                Err(format!("'{}' takes {} argument(s), got {}", tokens[0], n - 1, tokens.len() - 1))
            }
        };

        match tokens[0] {
            "create" => {
                arity(2)?;
                Ok(TraceEvent::Create(parse_pid(tokens[1])?))
            }
            "switch" => {
                arity(2)?;
                Ok(TraceEvent::Switch(parse_pid(tokens[1])?))
            }
            "exit" => {
                arity(2)?;
                Ok(TraceEvent::Exit(parse_pid(tokens[1])?))
            }
            "r" => {
                arity(2)?;
                Ok(TraceEvent::Read(parse_number(tokens[1], "address")?))
            }
            "w" => {
                arity(3)?;
                let address = parse_number(tokens[1], "address")?;
                let byte = parse_number(tokens[2], "byte")?;
                let byte = u8::try_from(byte).map_err(|_| format!("byte {} does not fit in 8 bits", tokens[2]))?;
                Ok(TraceEvent::Write(address, byte))
            }
            other => Err(format!("unknown event '{}'", other)),
        }
    }
}

fn parse_number(token: &str, what: &str) -> Result<u64, String> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| format!("invalid {}: {}", what, token))
}

fn parse_pid(token: &str) -> Result<Pid, String> {
    let pid = parse_number(token, "pid")?;
    Pid::try_from(pid).map_err(|_| format!("pid {} out of range", token))
}

pub fn write_report<P: AsRef<Path>>(path: P, report: &StatsReport) -> Result<(), TraceError> {
    let path = path.as_ref();
    fs::write(path, format!("{}\n", report)).map_err(|source| TraceError::Write {
        path: path.to_path_buf(),
        source,
    })
}
