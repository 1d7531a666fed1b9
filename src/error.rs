use std::{io, path::PathBuf};

use thiserror::Error;

/// Why a single target could not be run to completion.
///
/// These never abort the suite, they are recorded on the
/// [`TestRun`](crate::report::TestRun) and rendered.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    #[error("could not launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading test output: {0}")]
    StreamRead(#[source] io::Error),

    #[error("failed waiting for test process: {0}")]
    Wait(#[source] io::Error),
}

/// A protocol line that is well formed on its own but arrives out of sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolViolation {
    #[error("outcome for {label:?} reported before any test group was started")]
    OutcomeBeforeStart { label: String, line: usize },
}

/// Failures that stop the whole suite, only the report sink can cause these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuiteError {
    #[error("could not open report {}: {source}", .path.display())]
    OpenReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing report: {0}")]
    Report(#[from] io::Error),
}
