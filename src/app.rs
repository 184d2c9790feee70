//! Whole-run orchestration: parse arguments, open the log, validate, close.

use std::ffi::OsString;
use std::path::PathBuf;

use chrono::Local;
use clap::error::ErrorKind;

use crate::cli::{Cli, RunConfig};
use crate::libxml2::LibXml2Wrapper;
use crate::log_writer::LogWriter;
use crate::outcome::{self, EXIT_IO_FAILURE, EXIT_USAGE, EXIT_VALID};
use crate::validator;

/// Run the program for `args` (including the program name) and return the
/// process exit code.
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_args(args) {
        Ok(cli) => cli,
        Err(err) => return report_usage(&err),
    };

    // Relative paths still work if the working directory has vanished
    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = RunConfig::from_cli(&cli, &Local::now(), &working_dir);
    tracing::debug!(?config, "arguments accepted");

    let mut log = match LogWriter::open(config.verbosity, &config.log_path) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("Cannot open log file {}: {}", config.log_path.display(), err);
            return EXIT_IO_FAILURE;
        }
    };

    let outcome = validator::run(&config, &mut log, || Ok(LibXml2Wrapper::new()));
    outcome::finish(&outcome, log)
}

/// Usage problems go straight to stdout; the log is not open yet.
fn report_usage(err: &clap::Error) -> u8 {
    print!("{}", err.render());
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_VALID,
        _ => EXIT_USAGE,
    }
}
