use std::path::PathBuf;

use clap::Parser;

use crate::{
    formatter::common::color::ColorSetting,
    runner::{ProcessRunner, ProtocolErrorPolicy},
    target::Target,
};

/// Run test binaries speaking the CTEST protocol and write an HTML report.
#[derive(Debug, Clone, Parser)]
#[command(name = "ctestrun", version, long_about = None)]
pub struct Config {
    /// Test executables, run in the given order
    #[arg(value_name = "TARGET")]
    pub targets: Vec<PathBuf>,

    /// Where to write the report document
    #[arg(short, long, value_name = "FILE", default_value = "index.html")]
    pub output: PathBuf,

    /// Run every target in this directory instead of the one containing it
    #[arg(short = 'C', long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// When to color console output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorSetting,

    /// Capture the targets' standard output instead of letting it through
    #[arg(long)]
    pub capture_stdout: bool,

    /// How to treat outcomes reported before any test group started
    #[arg(long, value_enum, default_value_t)]
    pub protocol_errors: ProtocolErrorPolicy,
}

impl Config {
    pub fn targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|executable| {
                let target = Target::new(executable);
                match &self.working_dir {
                    Some(dir) => target.with_working_dir(dir),
                    None => target,
                }
            })
            .collect()
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new()
            .with_stdout_capture(self.capture_stdout)
            .with_protocol_errors(self.protocol_errors)
    }
}
