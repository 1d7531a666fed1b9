//! Running a single test binary and consuming its diagnostic stream.

use std::{
    io::{self, BufRead, BufReader, Read},
    path::Path,
    process::{Command, Stdio},
    thread::{self, Scope},
};

use chrono::Local;
use clap::ValueEnum;
use crossbeam_channel::Sender;

use crate::{
    aggregate::{Aggregation, ResultAggregator},
    capture::PassthroughSink,
    error::RunError,
    outcome::RunExit,
    protocol::LOG_ENV,
    report::TestRun,
    target::Target,
};

/// Lines buffered between a reader thread and the aggregator.
const LINE_BUFFER: usize = 64;

pub trait TestRunner {
    /// Run one target to completion.
    ///
    /// Never fails, every problem is recorded on the returned [`TestRun`].
    fn run<S: PassthroughSink + ?Sized>(&self, target: &Target, sink: &mut S) -> TestRun;
}

/// What to do with outcome lines that arrive before any group was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProtocolErrorPolicy {
    /// Mark the run as failed.
    #[default]
    Fail,
    /// Only log the violation.
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Launching,
    Streaming,
    Waiting,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    pub fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (NotStarted, Launching)
                | (Launching, Streaming)
                | (Streaming, Waiting)
                | (Waiting, Completed)
                | (Launching | Streaming | Waiting, Failed)
        )
    }
}

struct RunProgress<'t> {
    executable: &'t Path,
    state: RunState,
}

impl<'t> RunProgress<'t> {
    fn new(executable: &'t Path) -> Self {
        Self {
            executable,
            state: RunState::NotStarted,
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid run transition {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(
            executable = %self.executable.display(),
            from = ?self.state,
            to = ?next,
            "run state changed"
        );
        self.state = next;
    }
}

/// Runs targets as child processes, one at a time.
///
/// The child gets an environment of exactly [`LOG_ENV`]. Its diagnostic stream
/// is parsed line by line while it runs, its standard output is inherited
/// unless capturing is enabled, then it is forwarded to the passthrough sink.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    capture_stdout: bool,
    protocol_errors: ProtocolErrorPolicy,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout_capture(self, capture_stdout: bool) -> Self {
        Self {
            capture_stdout,
            ..self
        }
    }

    pub fn with_protocol_errors(self, protocol_errors: ProtocolErrorPolicy) -> Self {
        Self {
            protocol_errors,
            ..self
        }
    }

    fn execute<S: PassthroughSink + ?Sized>(
        &self,
        target: &Target,
        progress: &mut RunProgress<'_>,
        aggregator: &mut ResultAggregator,
        sink: &mut S,
    ) -> Result<RunExit, RunError> {
        progress.advance(RunState::Launching);
        let (key, value) = LOG_ENV;
        let stdout = match self.capture_stdout {
            true => Stdio::piped(),
            false => Stdio::inherit(),
        };
        let mut child = Command::new(&target.executable)
            .current_dir(&target.working_dir)
            .env_clear()
            .env(key, value)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Launch {
                path: target.executable.clone(),
                source,
            })?;

        progress.advance(RunState::Streaming);
        let drained = drain_streams(child.stderr.take(), child.stdout.take(), aggregator, sink);
        if let Err(err) = drained {
            // nobody reads its pipes anymore
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        progress.advance(RunState::Waiting);
        let status = child.wait().map_err(RunError::Wait)?;
        Ok(status.into())
    }
}

impl TestRunner for ProcessRunner {
    fn run<S: PassthroughSink + ?Sized>(&self, target: &Target, sink: &mut S) -> TestRun {
        let started_at = Local::now();
        let mut progress = RunProgress::new(&target.executable);
        let mut aggregator = ResultAggregator::new();

        let (exit, error) = match self.execute(target, &mut progress, &mut aggregator, sink) {
            Ok(exit) => {
                progress.advance(RunState::Completed);
                (exit, None)
            }
            Err(err) => {
                progress.advance(RunState::Failed);
                tracing::warn!(
                    executable = %target.executable.display(),
                    error = %err,
                    "test run failed"
                );
                (RunExit::DidNotComplete, Some(err))
            }
        };

        if exit.is_abnormal() {
            tracing::warn!(
                executable = %target.executable.display(),
                %exit,
                "test process did not finish properly"
            );
        }

        let Aggregation {
            groups,
            malformed_lines,
            violations,
        } = aggregator.finish();
        let protocol_ok = violations.is_empty() || self.protocol_errors == ProtocolErrorPolicy::Warn;
        let success = error.is_none() && exit.is_success() && protocol_ok;

        TestRun {
            target: target.clone(),
            started_at,
            exit,
            error,
            groups,
            malformed_lines,
            violations,
            success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Diagnostics,
    Output,
}

type Line = (Stream, io::Result<String>);

/// Feed the child's captured streams into the aggregator until they close.
///
/// Each stream is read on its own thread so a child filling one pipe can never
/// block on the other, lines of one stream keep their order. The first read
/// error is returned once both streams are done, lines read before it stay
/// aggregated.
fn drain_streams<S, E, O>(
    stderr: Option<E>,
    stdout: Option<O>,
    aggregator: &mut ResultAggregator,
    sink: &mut S,
) -> Result<(), RunError>
where
    S: PassthroughSink + ?Sized,
    E: Read + Send,
    O: Read + Send,
{
    thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::bounded::<Line>(LINE_BUFFER);
        if let Some(stderr) = stderr {
            spawn_reader(scope, Stream::Diagnostics, stderr, tx.clone());
        }
        if let Some(stdout) = stdout {
            spawn_reader(scope, Stream::Output, stdout, tx.clone());
        }
        drop(tx);

        let mut read_error = None;
        for (stream, line) in rx {
            match (stream, line) {
                (Stream::Diagnostics, Ok(line)) => aggregator.feed_line(&line, sink),
                (Stream::Output, Ok(line)) => sink.passthrough(&line),
                (_, Err(err)) => {
                    read_error.get_or_insert(err);
                }
            }
        }

        match read_error {
            Some(err) => Err(RunError::StreamRead(err)),
            None => Ok(()),
        }
    })
}

fn spawn_reader<'scope, R>(
    scope: &'scope Scope<'scope, '_>,
    stream: Stream,
    reader: R,
    tx: Sender<Line>,
) where
    R: Read + Send + 'scope,
{
    scope.spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let line = match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => Ok(decode_line(&buf)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => Err(err),
            };
            let failed = line.is_err();
            if tx.send((stream, line)).is_err() || failed {
                break;
            }
        }
    });
}

fn decode_line(buf: &[u8]) -> String {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    let buf = buf.strip_suffix(b"\r").unwrap_or(buf);
    String::from_utf8_lossy(buf).into_owned()
}
