//! Destinations for passthrough output of a test binary.

use std::{io, mem};

/// Receives every line of child output that is not part of the protocol.
pub trait PassthroughSink {
    fn passthrough(&mut self, line: &str);
}

impl<S: PassthroughSink + ?Sized> PassthroughSink for &mut S {
    fn passthrough(&mut self, line: &str) {
        (**self).passthrough(line)
    }
}

/// Prints passthrough lines as they arrive.
#[derive(Debug)]
pub struct ConsoleSink<W: io::Write = io::Stdout> {
    target: W,
}

impl Default for ConsoleSink<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
        }
    }
}

impl<W: io::Write> ConsoleSink<W> {
    pub fn with_target<WithTarget: io::Write>(self, target: WithTarget) -> ConsoleSink<WithTarget> {
        ConsoleSink { target }
    }

    pub fn into_target(self) -> W {
        self.target
    }
}

impl<W: io::Write> PassthroughSink for ConsoleSink<W> {
    fn passthrough(&mut self, line: &str) {
        if let Err(err) = writeln!(self.target, "{line}").and_then(|_| self.target.flush()) {
            tracing::debug!(%err, "dropped passthrough line");
        }
    }
}

/// Collects passthrough lines in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputCapture {
    pub lines: Vec<String>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Self {
        Self {
            lines: mem::take(&mut self.lines),
        }
    }
}

impl PassthroughSink for OutputCapture {
    fn passthrough(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PassthroughSink for NoCapture {
    fn passthrough(&mut self, _: &str) {}
}
