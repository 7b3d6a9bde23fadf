//! JSON I/O handling for the CLI
//!
//! - Input: a contact as one JSON object, inline or on stdin
//! - Output: a single JSON object per invocation on stdout

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::contact::Contact;

/// Parse a contact from an inline argument, or from stdin when the
/// argument is "-".
pub fn read_contact(arg: &str) -> CliResult<Contact> {
    if arg.trim() != "-" {
        return parse_contact(arg);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    parse_contact(&line)
}

pub fn parse_contact(text: &str) -> CliResult<Contact> {
    if text.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(serde_json::from_str(text)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
