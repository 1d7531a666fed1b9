use std::{fmt, process::ExitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertionStatus {
    Ok,
    Fail,
}

impl AssertionStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ok" => Some(Self::Ok),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for AssertionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported assertion, in the order the test binary emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub status: AssertionStatus,
    pub label: String,
}

/// A named cluster of assertions between two `start` markers.
///
/// Counts are derived from the detail records as they are pushed, so
/// `ok() + fail() == detail().len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    name: String,
    ok: usize,
    fail: usize,
    detail: Vec<Assertion>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: 0,
            fail: 0,
            detail: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ok(&self) -> usize {
        self.ok
    }

    pub fn fail(&self) -> usize {
        self.fail
    }

    pub fn detail(&self) -> &[Assertion] {
        &self.detail
    }

    pub fn len(&self) -> usize {
        self.detail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_empty()
    }

    pub fn record(&mut self, status: AssertionStatus, label: impl Into<String>) {
        match status {
            AssertionStatus::Ok => self.ok += 1,
            AssertionStatus::Fail => self.fail += 1,
        }
        self.detail.push(Assertion {
            status,
            label: label.into(),
        });
    }

    pub(crate) fn reset(&mut self) {
        self.ok = 0;
        self.fail = 0;
        self.detail.clear();
    }
}

/// How a test process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Code(i32),
    Signal(i32),
    /// The process never ran to completion, usually because it could not be launched.
    DidNotComplete,
}

impl RunExit {
    pub fn is_success(&self) -> bool {
        matches!(self, RunExit::Code(0))
    }

    /// Whether the process finished, but not cleanly.
    pub fn is_abnormal(&self) -> bool {
        match self {
            RunExit::Code(code) => *code != 0,
            RunExit::Signal(_) => true,
            RunExit::DidNotComplete => false,
        }
    }
}

impl From<ExitStatus> for RunExit {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return RunExit::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return RunExit::Signal(signal);
            }
        }

        RunExit::DidNotComplete
    }
}

impl fmt::Display for RunExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunExit::Code(code) => write!(f, "Exit status {code}"),
            RunExit::Signal(signal) => write!(f, "Terminated by signal {signal}"),
            RunExit::DidNotComplete => f.write_str("Did not complete"),
        }
    }
}
