use std::process::ExitCode;

use chrono::{DateTime, Local};

use crate::{
    aggregate::{TestGroups, Totals},
    error::{ProtocolViolation, RunError},
    outcome::RunExit,
    target::Target,
};

/// Format used for every rendered timestamp.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One execution of one test binary.
#[derive(Debug)]
#[non_exhaustive]
pub struct TestRun {
    pub target: Target,
    pub started_at: DateTime<Local>,
    pub exit: RunExit,
    pub error: Option<RunError>,
    pub groups: TestGroups,
    pub malformed_lines: usize,
    pub violations: Vec<ProtocolViolation>,
    pub success: bool,
}

impl TestRun {
    pub fn totals(&self) -> Totals {
        self.groups.totals()
    }

    pub fn launched(&self) -> bool {
        !matches!(self.error, Some(RunError::Launch { .. }))
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SuiteResult<FmtError = std::io::Error> {
    pub runs: Vec<TestRun>,
    pub success: bool,
    pub fmt_errors: Vec<(&'static str, FmtError)>,
}

impl<FmtError> SuiteResult<FmtError> {
    /// The suite passes only if every run passed, an empty suite passes.
    pub fn new(runs: Vec<TestRun>, fmt_errors: Vec<(&'static str, FmtError)>) -> Self {
        let success = runs.iter().all(|run| run.success);
        Self {
            runs,
            success,
            fmt_errors,
        }
    }

    pub fn passed(&self) -> usize {
        self.runs.iter().filter(|run| run.success).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.passed()
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.success {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }
}
