//! Rendering of test runs.
//!
//! The suite drives formatters through [`ReportFormatter`]. The report document
//! ([`html::HtmlFormatter`]) and the console summary ([`pretty::PrettyFormatter`])
//! both implement it, every hook except [`ReportFormatter::fmt_run_outcome`] is
//! optional.

use chrono::{DateTime, Local};

use crate::{report::TestRun, target::Target};

pub mod common;
pub mod html;
pub mod no;
pub mod pretty;

#[derive(Debug, Clone, Copy)]
pub struct FmtSuiteStart {
    pub started_at: DateTime<Local>,
    pub targets: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtRunStart<'r> {
    pub target: &'r Target,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtRunOutcome<'r> {
    pub run: &'r TestRun,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtSuiteEnd<'r> {
    pub runs: &'r [TestRun],
    pub success: bool,
}

pub trait ReportFormatter {
    type Error;

    fn fmt_suite_start(&mut self, data: FmtSuiteStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_run_start(&mut self, data: FmtRunStart<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    fn fmt_run_outcome(&mut self, data: FmtRunOutcome<'_>) -> Result<(), Self::Error>;

    fn fmt_suite_end(&mut self, data: FmtSuiteEnd<'_>) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

pub(crate) trait FmtErrors<E> {
    fn push_on_error(&mut self, res: Result<(), (&'static str, E)>);
}

impl<E> FmtErrors<E> for Vec<(&'static str, E)> {
    fn push_on_error(&mut self, res: Result<(), (&'static str, E)>) {
        if let Err(named) = res {
            tracing::debug!(hook = named.0, "formatter failed");
            self.push(named);
        }
    }
}

/// Call a formatter hook and tag a failure with the hook's name.
macro_rules! named_fmt {
    ($formatter:ident.$method:ident($($arg:expr),* $(,)?)) => {
        $formatter
            .$method($($arg),*)
            .map_err(|err| (stringify!($method), err))
    };
}

pub(crate) use named_fmt;
