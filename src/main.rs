use std::{fs::File, io::BufWriter, process::ExitCode};

use clap::Parser;
use ctestrun::{
    config::Config, error::SuiteError, formatter::pretty::PrettyFormatter, report::SuiteResult,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();

    let config = Config::parse();
    match run(&config) {
        Ok(result) => {
            for (hook, err) in &result.fmt_errors {
                tracing::warn!(hook, %err, "console output failed");
            }
            result.exit_code()
        }
        Err(err) => {
            tracing::error!(%err, "test suite aborted");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<SuiteResult, SuiteError> {
    let report = File::create(&config.output).map_err(|source| SuiteError::OpenReport {
        path: config.output.clone(),
        source,
    })?;

    ctestrun::suite(BufWriter::new(report))
        .with_runner(config.runner())
        .with_console(PrettyFormatter::default().with_color_setting(config.color))
        .run(config.targets())
}
