use std::path::PathBuf;

use thiserror::Error;

/// Every way a validation run can end early
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("File not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("Schema could not be compiled: {0}")]
    SchemaCompile(String),

    #[error("XML validation failed at line {line}, column {column}: {message}")]
    Violation {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("LibXML2 internal error: {0}")]
    LibXml2(#[from] LibXml2Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("File validation failed with code {code}: {}", file.display())]
    ValidationFailed { code: i32, file: PathBuf },

    #[error("Path cannot be passed to libxml2: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
