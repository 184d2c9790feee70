//! Validation driver
//!
//! Runs one validation from banner to terminal lines:
//!
//! `Start → ParamsChecked → FilesChecked → SchemaLoaded → ValidatorBuilt → Validated`
//!
//! Each step writes its narration line *before* doing its work, so a truncated
//! log still names the last step that was attempted. The first failure ends
//! the run. Schema compilation and XML validation are delegated to a
//! [`SchemaFactory`]; the driver only sequences and narrates.

use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::cli::RunConfig;
use crate::error::{Result, ValidatorError};
use crate::log_writer::LogWriter;
use crate::outcome::ValidationOutcome;

/// Compiles XSD files into schemas
pub trait SchemaFactory {
    type Schema: Schema;

    fn new_schema(&self, xsd: &Path) -> Result<Self::Schema>;
}

/// A compiled schema that hands out validators
pub trait Schema {
    type Validator: Validator;

    fn new_validator(&self) -> Result<Self::Validator>;
}

/// Checks XML documents against the schema it was built from
pub trait Validator {
    /// `Err(Violation)` for a constraint violation, `Err(XmlParse)` for a
    /// document that is not well-formed.
    fn validate(&mut self, xml: &Path) -> Result<()>;
}

const PROGRAM_NAME: &str = "XmlValidator";

/// Validate `config.xml_path` against `config.xsd_path`, narrating to `log`.
///
/// `make_factory` is called only once both input files are known to exist.
/// The log is left open; closing it is [`crate::outcome::finish`]'s job.
pub fn run<S, F, M>(config: &RunConfig, log: &mut LogWriter<S>, make_factory: M) -> ValidationOutcome
where
    S: Write,
    F: SchemaFactory,
    M: FnOnce() -> Result<F>,
{
    let outcome = match validate_files(config, log, make_factory) {
        Ok(()) => ValidationOutcome::Valid,
        Err(err) => {
            tracing::debug!(error = %err, "validation ended early");
            ValidationOutcome::from(err)
        }
    };

    if let Err(err) = write_result(log, &outcome) {
        tracing::warn!(error = %err, "writing result lines failed");
    }

    outcome
}

fn validate_files<S, F, M>(config: &RunConfig, log: &mut LogWriter<S>, make_factory: M) -> Result<()>
where
    S: Write,
    F: SchemaFactory,
    M: FnOnce() -> Result<F>,
{
    write_banner(log, config)?;

    log.write_line("Checking files ...")?;
    // XML first; only the first missing file is reported
    for path in [&config.xml_path, &config.xsd_path] {
        if !path.exists() {
            return Err(ValidatorError::FileMissing(path.clone()));
        }
    }

    log.write_line("Preparing schema ...")?;
    let factory = make_factory()?;

    log.write_line("Loading schema ...")?;
    tracing::debug!(xsd = %config.xsd_path.display(), "compiling schema");
    let schema = factory.new_schema(&config.xsd_path)?;

    log.write_line("Instantiating validator ...")?;
    let mut validator = schema.new_validator()?;

    log.write_line("Validating XML ...")?;
    tracing::debug!(xml = %config.xml_path.display(), "validating document");
    validator.validate(&config.xml_path)
}

fn write_banner<S: Write>(log: &mut LogWriter<S>, config: &RunConfig) -> Result<()> {
    let working_dir = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());

    log.write_separator()?;
    log.write_line(&format!("{} {}", PROGRAM_NAME, env!("CARGO_PKG_VERSION")))?;
    log.write_line(&format!("Author: {}", env!("CARGO_PKG_AUTHORS")))?;
    log.write_line("")?;
    log.write_line(&format!(
        "Executed at: {}",
        Local::now().format("%d.%m.%Y - %H:%M:%S")
    ))?;
    log.write_line(&format!("Executed in: {working_dir}"))?;
    log.write_line("")?;
    log.write_line(&format!("Log file: {}", config.log_path.display()))?;
    log.write_line("Checking parameters ...")?;
    log.write_line(&format!("XML file: {}", config.xml_path.display()))?;
    log.write_line(&format!("XSD file: {}", config.xsd_path.display()))?;
    log.write_line("")?;
    Ok(())
}

fn write_result<S: Write>(log: &mut LogWriter<S>, outcome: &ValidationOutcome) -> std::io::Result<()> {
    match outcome {
        ValidationOutcome::Valid => {
            log.write_line("Result: XML file is valid!")?;
            log.write_line("Program finished.")?;
        }
        ValidationOutcome::Invalid {
            line,
            column,
            reason,
        } => {
            log.write_line("(e) Result: XML file is not valid!")?;
            log.write_line(&format!("(e) Line: {line}"))?;
            log.write_line(&format!("(e) Column: {column}"))?;
            log.write_line(&format!("(e) Reason: {reason}"))?;
        }
        ValidationOutcome::SchemaError { reason } => {
            log.write_line("(e) XML error!")?;
            log.write_line(&format!("(e) Reason: {reason}"))?;
        }
        ValidationOutcome::FileMissing { path } => {
            log.write_line(&format!("(e) File not found: {}", path.display()))?;
        }
        ValidationOutcome::IoFailure { reason } => {
            log.write_line(&format!("(e) I/O error: {reason}"))?;
        }
    }
    log.write_separator()
}
