//! # xml-validator Library
//!
//! Validates one XML file against one XSD schema and narrates the run to the
//! screen, a monthly log file, both, or nowhere. The process exit code tells
//! automated callers how the run ended.

pub mod app;
pub mod cli;
pub mod error;
pub mod libxml2;
pub mod log_writer;
pub mod outcome;
pub mod validator;

pub use cli::{Cli, RunConfig, VerbosityMode};
pub use error::{LibXml2Error, ValidatorError};
pub use libxml2::{LibXml2Wrapper, SchemaValidator, XmlSchemaPtr};
pub use log_writer::LogWriter;
pub use outcome::ValidationOutcome;
pub use validator::{Schema, SchemaFactory, Validator};
