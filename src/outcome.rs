//! Run outcome and exit-code mapping
//!
//! The exit code is the contract automated callers branch on:
//!
//! | Outcome | Code |
//! |---|---|
//! | `Valid` | 0 |
//! | `Invalid`, `SchemaError` | 1 |
//! | `FileMissing` | 2 |
//! | `IoFailure` | 3 |
//! | log close failure | 4 |
//! | usage error | 64 |

use std::io::Write;
use std::path::PathBuf;

use crate::error::ValidatorError;
use crate::log_writer::LogWriter;

pub const EXIT_VALID: u8 = 0;
pub const EXIT_VALIDATION_FAILED: u8 = 1;
pub const EXIT_FILE_MISSING: u8 = 2;
pub const EXIT_IO_FAILURE: u8 = 3;
pub const EXIT_CLOSE_FAILURE: u8 = 4;
/// `EX_USAGE` from sysexits.h
pub const EXIT_USAGE: u8 = 64;

/// How a validation run ended; produced once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid { line: u32, column: u32, reason: String },
    SchemaError { reason: String },
    FileMissing { path: PathBuf },
    IoFailure { reason: String },
}

impl ValidationOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            ValidationOutcome::Valid => EXIT_VALID,
            ValidationOutcome::Invalid { .. } | ValidationOutcome::SchemaError { .. } => {
                EXIT_VALIDATION_FAILED
            }
            ValidationOutcome::FileMissing { .. } => EXIT_FILE_MISSING,
            ValidationOutcome::IoFailure { .. } => EXIT_IO_FAILURE,
        }
    }
}

impl From<ValidatorError> for ValidationOutcome {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::FileMissing(path) => ValidationOutcome::FileMissing { path },
            ValidatorError::Violation {
                line,
                column,
                message,
            } => ValidationOutcome::Invalid {
                line,
                column,
                reason: strip_category(&message).to_string(),
            },
            ValidatorError::SchemaCompile(reason) | ValidatorError::XmlParse(reason) => {
                ValidationOutcome::SchemaError { reason }
            }
            ValidatorError::LibXml2(err) => ValidationOutcome::SchemaError {
                reason: err.to_string(),
            },
            ValidatorError::Io(err) => ValidationOutcome::IoFailure {
                reason: err.to_string(),
            },
        }
    }
}

/// Drop a leading `"<category>: "` from a validator message.
///
/// Splits on the first `": "`, so colons inside the category itself (such
/// as a `{namespace-uri}` prefix) stay put. A message without one is
/// returned unchanged.
pub fn strip_category(message: &str) -> &str {
    match message.split_once(": ") {
        Some((_, rest)) => rest,
        None => message,
    }
}

/// Close the log and pick the process exit code.
///
/// A close failure wins over every other outcome.
pub fn finish<S: Write>(outcome: &ValidationOutcome, mut log: LogWriter<S>) -> u8 {
    match log.close() {
        Ok(()) => {
            tracing::debug!(?outcome, code = outcome.exit_code(), "run finished");
            outcome.exit_code()
        }
        Err(err) => {
            eprintln!("Closing log file {} failed: {}", log.path().display(), err);
            EXIT_CLOSE_FAILURE
        }
    }
}
