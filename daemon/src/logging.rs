//! Console and monthly log file output.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const FILE_PREFIX: &str = "twitch_stats-";
const DEFAULT_DIRECTIVE: &str = "twitch_stats=info";

/// Append-only log file that moves to a new file when the UTC month changes.
pub struct MonthlyLog {
    dir: PathBuf,
    month: String,
    file: File,
}

impl MonthlyLog {
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let now = Utc::now();
        let month = month_key(now);
        let file = open_append(&log_path(dir, now))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            month,
            file,
        })
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}.log", FILE_PREFIX, self.month))
    }

    fn roll_to(&mut self, now: DateTime<Utc>) -> io::Result<()> {
        let month = month_key(now);
        if month != self.month {
            self.file.flush()?;
            self.file = open_append(&log_path(&self.dir, now))?;
            self.month = month;
        }
        Ok(())
    }
}

impl Write for MonthlyLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.roll_to(Utc::now())?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Log file path for the month containing `now`.
pub fn log_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("{}{}.log", FILE_PREFIX, month_key(now)))
}

fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y%m").to_string()
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Keep the guard alive for the process lifetime.
///
/// When the log directory is unusable, output goes to the console only.
pub fn init_logging(log_dir: &str) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    match MonthlyLog::open(Path::new(log_dir)) {
        Ok(log) => {
            let path = log.current_path();
            let (writer, guard) = tracing_appender::non_blocking(log);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            tracing::debug!(path = %path.display(), "Log file opened");
            Some(guard)
        }
        Err(e) => {
            eprintln!("Failed to open log directory '{}': {}", log_dir, e);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}
