use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, TimeZone};
use clap::{Parser, ValueEnum};

/// Fixed prefix of the monthly log file
pub const LOG_FILE_PREFIX: &str = "XmlValidator";

/// Where narration lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerbosityMode {
    /// Standard output only
    #[value(name = "s", alias = "screen")]
    Screen,
    /// Log file only
    #[value(name = "f", alias = "file")]
    File,
    /// Standard output and log file
    #[value(name = "b", alias = "both")]
    Both,
    /// Nothing at all
    #[value(name = "o", alias = "omit")]
    Omit,
}

impl VerbosityMode {
    pub fn writes_screen(self) -> bool {
        matches!(self, VerbosityMode::Screen | VerbosityMode::Both)
    }

    pub fn writes_file(self) -> bool {
        matches!(self, VerbosityMode::File | VerbosityMode::Both)
    }
}

/// Validate one XML file against one XSD schema
#[derive(Parser, Debug, Clone)]
#[command(name = "xml-validator")]
#[command(about = "Validate an XML file against an XSD schema")]
#[command(version)]
pub struct Cli {
    /// Output channel: s|screen, f|file, b|both, o|omit
    #[arg(value_enum, value_name = "VERBOSITY")]
    pub verbosity: VerbosityMode,

    /// XML document to validate
    #[arg(value_name = "XML_FILE")]
    pub xml_file: PathBuf,

    /// XSD schema to validate against
    #[arg(value_name = "XSD_FILE")]
    pub xsd_file: PathBuf,
}

impl Cli {
    /// Parse without exiting, so the caller owns the exit code
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub verbosity: VerbosityMode,
    pub xml_path: PathBuf,
    pub xsd_path: PathBuf,
    pub log_path: PathBuf,
}

impl RunConfig {
    /// Build the run configuration; the log file lives in `working_dir`.
    pub fn from_cli<Tz: TimeZone>(cli: &Cli, now: &DateTime<Tz>, working_dir: &Path) -> Self {
        Self {
            verbosity: cli.verbosity,
            xml_path: cli.xml_file.clone(),
            xsd_path: cli.xsd_file.clone(),
            log_path: working_dir.join(log_file_name(now)),
        }
    }
}

/// One log file per calendar month, e.g. `XmlValidator.2016_12.log`
pub fn log_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{}.{:04}_{:02}.log", LOG_FILE_PREFIX, now.year(), now.month())
}
