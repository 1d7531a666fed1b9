use std::io;

use crate::formatter::*;

/// A formatter that produces no output.
///
/// Useful for running a suite from code that does its own reporting from the
/// returned [`SuiteResult`](crate::report::SuiteResult).
#[derive(Debug, Default, Clone)]
pub struct NoFormatter;

impl ReportFormatter for NoFormatter {
    type Error = io::Error;

    fn fmt_run_outcome(&mut self, _: FmtRunOutcome<'_>) -> io::Result<()> {
        Ok(())
    }
}
