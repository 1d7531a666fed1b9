//! Decoding of the line protocol test binaries write to their diagnostic stream.
//!
//! A control line starts with the [`PREFIX`] token and comes in two shapes:
//!
//! ```text
//! CTEST <ignored> start <group> [...]
//! CTEST <label> ok|fail [...]
//! ```
//!
//! Trailing tokens, such as a timestamp, are ignored. Everything else is
//! passthrough text.

use crate::outcome::AssertionStatus;

/// First token of every control line.
pub const PREFIX: &str = "CTEST";

/// The single environment variable a test binary is started with.
pub const LOG_ENV: (&str, &str) = ("CTEST_LOG", "1");

const START: &str = "start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    StartGroup(String),
    Outcome {
        label: String,
        status: AssertionStatus,
    },
    Passthrough(String),
    Malformed(String),
}

/// Classify one line of diagnostic output.
///
/// The line is expected without its terminator. This never fails, lines that
/// claim to be control lines but do not fit the grammar become
/// [`ParseEvent::Malformed`].
pub fn parse_line(line: &str) -> ParseEvent {
    let mut tokens = line.split_whitespace();
    if !line.starts_with(PREFIX) || tokens.next() != Some(PREFIX) {
        return ParseEvent::Passthrough(line.to_owned());
    }

    let tokens: Vec<&str> = tokens.collect();
    match tokens.as_slice() {
        [_, START, name, ..] => ParseEvent::StartGroup((*name).to_owned()),
        [label, command, ..] => match AssertionStatus::from_token(command) {
            Some(status) => ParseEvent::Outcome {
                label: (*label).to_owned(),
                status,
            },
            None => ParseEvent::Malformed(line.to_owned()),
        },
        _ => ParseEvent::Malformed(line.to_owned()),
    }
}
