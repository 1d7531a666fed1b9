use std::io;

use crate::{
    aggregate::Tier,
    formatter::{
        common::{
            NO_TESTS,
            color::{ColorSetting, SupportsColor, colors::*},
        },
        *,
    },
};

const RULE: &str =
    "*************************************************************************";

/// Console summary, one stats block per run.
#[derive(Debug)]
pub struct PrettyFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for PrettyFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
        }
    }
}

impl<W: io::Write> PrettyFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> PrettyFormatter<WithTarget> {
        PrettyFormatter {
            target: with_target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        PrettyFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }

    pub fn into_target(self) -> W {
        self.target
    }
}

impl<W: io::Write + SupportsColor> PrettyFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        match self.color_setting {
            ColorSetting::Automatic => self.target.supports_color(),
            ColorSetting::Always => true,
            ColorSetting::Never => false,
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        match self.use_color() {
            true => format!("{color}{text}{RESET}"),
            false => text.to_owned(),
        }
    }
}

impl<W: io::Write + SupportsColor> ReportFormatter for PrettyFormatter<W> {
    type Error = io::Error;

    fn fmt_run_start(&mut self, FmtRunStart { target }: FmtRunStart<'_>) -> io::Result<()> {
        writeln!(
            self.target,
            "Testing {} at {}",
            target.executable.display(),
            target.working_dir.display()
        )
    }

    fn fmt_run_outcome(&mut self, FmtRunOutcome { run }: FmtRunOutcome<'_>) -> io::Result<()> {
        writeln!(self.target, "{RULE}")?;
        writeln!(self.target, "Final stats:")?;

        let totals = run.totals();
        match (totals.success_rate(), totals.tier()) {
            (Some(rate), Some(tier)) => {
                let color = match tier {
                    Tier::AllPass => GREEN,
                    Tier::Mixed => YELLOW,
                    Tier::AllFail => RED,
                };
                let rate = self.paint(color, &format!("{rate:.2} % Success rate."));
                writeln!(self.target, "{}/{}; {rate}", totals.ok, totals.total())?;
            }
            _ => writeln!(self.target, "{NO_TESTS}")?,
        }

        if run.malformed_lines > 0 {
            writeln!(
                self.target,
                "Ignored {} malformed protocol line(s)",
                run.malformed_lines
            )?;
        }
        for violation in &run.violations {
            let text = self.paint(RED, &format!("Protocol error: {violation}"));
            writeln!(self.target, "{text}")?;
        }
        if run.exit.is_abnormal() {
            let text = self.paint(
                RED,
                &format!("Process did not finish properly. {}", run.exit),
            );
            writeln!(self.target, "{text}")?;
        }
        if let Some(err) = &run.error {
            let text = self.paint(RED, &format!("Error: {err}"));
            writeln!(self.target, "{text}")?;
        }
        Ok(())
    }

    fn fmt_suite_end(&mut self, FmtSuiteEnd { runs, success }: FmtSuiteEnd<'_>) -> io::Result<()> {
        let passed = runs.iter().filter(|run| run.success).count();
        let failed = runs.len() - passed;

        writeln!(self.target)?;
        write!(self.target, "suite result: ")?;
        match (success, self.use_color()) {
            (true, false) => write!(self.target, "ok. ")?,
            (true, true) => write!(self.target, "{GREEN}ok{RESET}. ")?,
            (false, false) => write!(self.target, "FAILED. ")?,
            (false, true) => write!(self.target, "{RED}FAILED{RESET}. ")?,
        }
        writeln!(self.target, "{passed} passed; {failed} failed")?;
        self.target.flush()
    }
}
