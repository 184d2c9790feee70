//! Narration sink
//!
//! `LogWriter` routes each narration line to standard output, the monthly log
//! file, both, or nowhere. File lines are `\r\n`-terminated and flushed one by
//! one, so a run that dies midway still leaves every line it managed to write.
//! The file is opened in append mode and never truncated; concurrent runs may
//! interleave lines but never destroy each other's history.

use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use crate::cli::VerbosityMode;

/// Width of the separator that brackets each run in the log
pub const SEPARATOR_WIDTH: usize = 120;

/// Line-oriented writer for the verbosity modes
///
/// The log file is only touched in `File` and `Both` modes. `close()` releases
/// it; `Drop` calls `close()` as well, so the handle is released on every exit
/// path.
#[derive(Debug)]
pub struct LogWriter<S: Write = Stdout> {
    mode: VerbosityMode,
    path: PathBuf,
    screen: S,
    file: Option<File>,
    closed: bool,
}

impl LogWriter<Stdout> {
    /// Open a writer narrating to the process's standard output
    pub fn open(mode: VerbosityMode, path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::with_screen(mode, path, io::stdout())
    }
}

impl<S: Write> LogWriter<S> {
    /// Open a writer with an explicit screen sink.
    ///
    /// # Errors
    ///
    /// Fails if the mode needs the log file and it cannot be created or opened
    /// for appending.
    pub fn with_screen(mode: VerbosityMode, path: impl Into<PathBuf>, screen: S) -> io::Result<Self> {
        let path = path.into();
        let file = if mode.writes_file() {
            Some(OpenOptions::new().create(true).append(true).open(&path)?)
        } else {
            None
        };

        tracing::debug!(?mode, path = %path.display(), "log writer opened");

        Ok(Self {
            mode,
            path,
            screen,
            file,
            closed: false,
        })
    }

    pub fn mode(&self) -> VerbosityMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Write one narration line to the sinks selected by the mode
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        if self.mode.writes_screen() {
            writeln!(self.screen, "{text}")?;
        }

        if self.mode.writes_file() {
            let file = self
                .file
                .as_mut()
                .ok_or_else(|| io::Error::other("log writer is closed"))?;
            write!(file, "{text}\r\n")?;
            file.flush()?;
        }

        Ok(())
    }

    /// Write the fixed-width run separator
    pub fn write_separator(&mut self) -> io::Result<()> {
        self.write_line(&"-".repeat(SEPARATOR_WIDTH))
    }

    /// Flush and release the sinks.
    ///
    /// The file handle is given up on the first call whatever the result;
    /// later calls do nothing and return `Ok(())`.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let screen_result = if self.mode.writes_screen() {
            self.screen.flush()
        } else {
            Ok(())
        };

        if let Some(mut file) = self.file.take() {
            file.flush()?;
            // Surfaces write errors the OS deferred until close.
            file.sync_all()?;
        }

        tracing::debug!(path = %self.path.display(), "log writer closed");
        screen_result
    }
}

impl<S: Write> Drop for LogWriter<S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %err, "closing log writer failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_path(dir: &TempDir) -> PathBuf {
        dir.path().join("XmlValidator.2016_12.log")
    }

    #[test]
    fn test_file_mode_writes_crlf_lines() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        let mut log = LogWriter::with_screen(VerbosityMode::File, &path, Vec::new()).unwrap();
        log.write_line("first").unwrap();
        log.write_line("second").unwrap();

        // Flushed per line, readable before close
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\r\nsecond\r\n");
        assert!(log.screen().is_empty());

        log.close().unwrap();
    }

    #[test]
    fn test_screen_mode_never_touches_file() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        let mut log = LogWriter::with_screen(VerbosityMode::Screen, &path, Vec::new()).unwrap();
        log.write_line("hello").unwrap();

        assert_eq!(log.screen().as_slice(), b"hello\n");
        assert!(!path.exists());
    }

    #[test]
    fn test_both_mode_writes_same_lines_in_same_order() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        let mut log = LogWriter::with_screen(VerbosityMode::Both, &path, Vec::new()).unwrap();
        for line in ["one", "two", "three"] {
            log.write_line(line).unwrap();
        }
        log.close().unwrap();

        let screen = String::from_utf8(log.screen().clone()).unwrap();
        let file = std::fs::read_to_string(&path).unwrap();
        assert_eq!(screen, "one\ntwo\nthree\n");
        assert_eq!(file, "one\r\ntwo\r\nthree\r\n");
    }

    #[test]
    fn test_omit_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        let mut log = LogWriter::with_screen(VerbosityMode::Omit, &path, Vec::new()).unwrap();
        log.write_line("dropped").unwrap();
        log.write_separator().unwrap();
        log.close().unwrap();

        assert!(log.screen().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        for run in ["run one", "run two"] {
            let mut log = LogWriter::with_screen(VerbosityMode::File, &path, Vec::new()).unwrap();
            log.write_line(run).unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "run one\r\nrun two\r\n");
    }

    #[test]
    fn test_separator_width() {
        let mut log = LogWriter::with_screen(VerbosityMode::Screen, "unused.log", Vec::new()).unwrap();
        log.write_separator().unwrap();

        let screen = String::from_utf8(log.screen().clone()).unwrap();
        assert_eq!(screen.trim_end().len(), SEPARATOR_WIDTH);
        assert!(screen.trim_end().chars().all(|c| c == '-'));
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut log = LogWriter::with_screen(VerbosityMode::Both, log_path(&dir), Vec::new()).unwrap();

        log.close().unwrap();
        log.close().unwrap();
        assert!(log.write_line("too late").is_err());
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("x.log");

        assert!(LogWriter::with_screen(VerbosityMode::File, &path, Vec::new()).is_err());
        // Screen mode does not need the file
        assert!(LogWriter::with_screen(VerbosityMode::Screen, &path, Vec::new()).is_ok());
    }

    #[test]
    fn test_accessors() {
        let log = LogWriter::with_screen(VerbosityMode::Omit, "a.log", Vec::new()).unwrap();
        assert_eq!(log.mode(), VerbosityMode::Omit);
        assert_eq!(log.path(), Path::new("a.log"));
    }
}
