use std::io;

use chrono::Local;

use crate::{
    capture::{ConsoleSink, PassthroughSink},
    error::SuiteError,
    formatter::{
        FmtErrors, FmtRunOutcome, FmtRunStart, FmtSuiteEnd, FmtSuiteStart, ReportFormatter,
        html::HtmlFormatter, named_fmt, pretty::PrettyFormatter,
    },
    report::SuiteResult,
    runner::{ProcessRunner, TestRunner},
    target::Target,
};

/// Runs targets one after another and writes every run into the report.
pub struct TestSuite<Runner, Report, Console, Sink> {
    pub(crate) runner: Runner,
    pub(crate) report: Report,
    pub(crate) console: Console,
    pub(crate) sink: Sink,
}

/// A suite with the default process runner and console output, writing its
/// HTML report into `report`.
pub fn suite<W: io::Write>(
    report: W,
) -> TestSuite<ProcessRunner, HtmlFormatter<W>, PrettyFormatter<io::Stdout>, ConsoleSink> {
    TestSuite {
        runner: ProcessRunner::default(),
        report: HtmlFormatter::new(report),
        console: PrettyFormatter::default(),
        sink: ConsoleSink::default(),
    }
}

impl<Runner, Report, Console, Sink> TestSuite<Runner, Report, Console, Sink>
where
    Runner: TestRunner,
    Report: ReportFormatter<Error = io::Error>,
    Console: ReportFormatter,
    Sink: PassthroughSink,
{
    /// Run all targets in order.
    ///
    /// Failures of a single target are part of the result, only a failing
    /// report writer aborts the suite. Console formatting errors are collected
    /// in [`SuiteResult::fmt_errors`].
    pub fn run<I>(self, targets: I) -> Result<SuiteResult<Console::Error>, SuiteError>
    where
        I: IntoIterator<Item = Target>,
    {
        let TestSuite {
            runner,
            mut report,
            mut console,
            mut sink,
        } = self;
        let targets: Vec<Target> = targets.into_iter().collect();
        let mut fmt_errors: Vec<(&'static str, Console::Error)> = Vec::new();

        let start = FmtSuiteStart {
            started_at: Local::now(),
            targets: targets.len(),
        };
        report.fmt_suite_start(start)?;
        fmt_errors.push_on_error(named_fmt!(console.fmt_suite_start(start)));

        let mut runs = Vec::with_capacity(targets.len());
        for target in targets {
            tracing::info!(
                executable = %target.executable.display(),
                working_dir = %target.working_dir.display(),
                "running test target"
            );
            fmt_errors.push_on_error(named_fmt!(
                console.fmt_run_start(FmtRunStart { target: &target })
            ));

            let run = runner.run(&target, &mut sink);
            let totals = run.totals();
            tracing::info!(
                executable = %target.executable.display(),
                success = run.success,
                ok = totals.ok,
                fail = totals.fail,
                "test target finished"
            );

            fmt_errors.push_on_error(named_fmt!(console.fmt_run_outcome(FmtRunOutcome { run: &run })));
            report.fmt_run_outcome(FmtRunOutcome { run: &run })?;
            runs.push(run);
        }

        let mut result = SuiteResult::new(runs, fmt_errors);
        let end = FmtSuiteEnd {
            runs: &result.runs,
            success: result.success,
        };
        report.fmt_suite_end(end)?;
        result
            .fmt_errors
            .push_on_error(named_fmt!(console.fmt_suite_end(end)));
        Ok(result)
    }
}

impl<Runner, Report, Console, Sink> TestSuite<Runner, Report, Console, Sink> {
    pub fn with_runner<WithRunner: TestRunner>(
        self,
        runner: WithRunner,
    ) -> TestSuite<WithRunner, Report, Console, Sink> {
        TestSuite {
            runner,
            report: self.report,
            console: self.console,
            sink: self.sink,
        }
    }

    pub fn with_report<WithReport: ReportFormatter<Error = io::Error>>(
        self,
        report: WithReport,
    ) -> TestSuite<Runner, WithReport, Console, Sink> {
        TestSuite {
            runner: self.runner,
            report,
            console: self.console,
            sink: self.sink,
        }
    }

    pub fn with_console<WithConsole: ReportFormatter>(
        self,
        console: WithConsole,
    ) -> TestSuite<Runner, Report, WithConsole, Sink> {
        TestSuite {
            runner: self.runner,
            report: self.report,
            console,
            sink: self.sink,
        }
    }

    pub fn with_sink<WithSink: PassthroughSink>(
        self,
        sink: WithSink,
    ) -> TestSuite<Runner, Report, Console, WithSink> {
        TestSuite {
            runner: self.runner,
            report: self.report,
            console: self.console,
            sink,
        }
    }
}
