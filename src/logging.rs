//! Diagnostics setup and the report sink.
//!
//! Diagnostics go through `tracing` to stderr. The run report, the text a
//! user reads or redirects with `--log`, is written to a [`ReportSink`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("hbconv=debug")
        } else {
            EnvFilter::new("hbconv=info")
        }
    });

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Destination of the run report for the duration of one run.
///
/// Either the process's stdout or a log file; flushed when dropped.
pub struct ReportSink {
    inner: Box<dyn Write>,
}

impl ReportSink {
    pub fn stdout() -> Self {
        Self {
            inner: Box::new(io::stdout()),
        }
    }

    /// Open the sink, redirecting to `log_file` when given.
    ///
    /// A log file that cannot be created is reported and stdout is used instead.
    pub fn open(log_file: Option<&Path>) -> Self {
        match log_file {
            None => Self::stdout(),
            Some(path) => match File::create(path) {
                Ok(file) => {
                    tracing::debug!(log = %path.display(), "writing report to log file");
                    Self {
                        inner: Box::new(BufWriter::new(file)),
                    }
                }
                Err(e) => {
                    tracing::error!(log = %path.display(), error = %e, "could not open log file");
                    Self::stdout()
                }
            },
        }
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Drop for ReportSink {
    fn drop(&mut self) {
        let _ = self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_log_file_receives_report() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");
        {
            let mut sink = ReportSink::open(Some(&log));
            writeln!(sink, "Processing complete:").unwrap();
        }
        assert_eq!(fs::read_to_string(&log).unwrap(), "Processing complete:\n");
    }

    #[test]
    fn test_unopenable_log_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("missing/dir/run.log");
        let mut sink = ReportSink::open(Some(&log));
        assert!(writeln!(sink, "still works").is_ok());
        assert!(!log.exists());
    }
}
