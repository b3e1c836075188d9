//! Logger setup: `[%Y-%m-%d %H:%M:%S] [LEVEL] message` lines written both to
//! stdout and to `<logging_dir>/<username>.log`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use env_logger::Target;
use log::LevelFilter;

use crate::error_handling::types::ConfigError;

/// Writes everything to two sinks.
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

fn format_line(now: DateTime<Local>, level: log::Level, message: &std::fmt::Arguments<'_>) -> String {
    format!("[{}] [{}] {}", now.format("%Y-%m-%d %H:%M:%S"), level, message)
}

/// Creates `logging_dir` if needed and opens the user's log for appending.
pub fn open_log_file(logging_dir: &Path, username: &str) -> Result<(PathBuf, File), ConfigError> {
    fs::create_dir_all(logging_dir).map_err(|e| {
        ConfigError::DirectoryError(format!("{}: {}", logging_dir.display(), e))
    })?;
    let path = logging_dir.join(format!("{}.log", username));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Installs the global logger. `RUST_LOG` is read first and `level` then
/// applies to everything it does not name; HTTP internals stay at WARN.
pub fn init(logging_dir: &Path, username: &str, level: LevelFilter) -> Result<PathBuf, ConfigError> {
    let (path, file) = open_log_file(logging_dir, username)?;

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("hyper_util", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(buf, "{}", format_line(Local::now(), record.level(), record.args()))
        })
        .target(Target::Pipe(Box::new(Tee {
            first: io::stdout(),
            second: file,
        })))
        .try_init()
        .map_err(|e| ConfigError::InvalidValue(format!("logger: {}", e)))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_format() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            format_line(now, log::Level::Warn, &format_args!("{} is live", "someone")),
            "[2024-01-02 03:04:05] [WARN] someone is live"
        );
    }

    #[test]
    fn test_tee_writes_both_sinks() {
        let mut tee = Tee {
            first: Vec::new(),
            second: Vec::new(),
        };
        tee.write_all(b"line\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.first, b"line\n");
        assert_eq!(tee.second, b"line\n");
    }

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempfile::TempDir::new().unwrap();
        let logs = dir.path().join("logs");

        let (path, mut file) = open_log_file(&logs, "someone").unwrap();
        assert_eq!(path, logs.join("someone.log"));
        file.write_all(b"first\n").unwrap();

        let (_, mut file) = open_log_file(&logs, "someone").unwrap();
        file.write_all(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }
}
