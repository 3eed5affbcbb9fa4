//! Tracing setup: stdout plus one log file per launch under `.aclearn/logs`.
//!
//! Launch files are named `aclearn_<timestamp>.log`, so name order is launch
//! order. Only the newest [`KEEP_LAUNCH_LOGS`] are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Launch logs kept on disk, the current one included.
pub const KEEP_LAUNCH_LOGS: usize = 10;
const LAUNCH_LOG_PREFIX: &str = "aclearn_";
const LAUNCH_LOG_EXTENSION: &str = "log";
/// Used when `RUST_LOG` is unset; keeps the graphics stack quiet.
const DEFAULT_DIRECTIVES: &str = "info,wgpu_core=warn,wgpu_hal=warn,eframe=warn";

const FILE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No config directory available for log files")]
    NoLogDir,
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format launch timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Failed to install tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

impl From<app_dirs::AppDirError> for LoggingError {
    fn from(error: app_dirs::AppDirError) -> Self {
        match error {
            app_dirs::AppDirError::NoBaseDir => LoggingError::NoLogDir,
            app_dirs::AppDirError::CreateDir { path, source } => LoggingError::Io {
                action: "create",
                path,
                source,
            },
        }
    }
}

/// Install the global subscriber. Later calls do nothing.
///
/// On error the app keeps running without logs; `main` reports the reason on stderr.
pub fn init() -> Result<(), LoggingError> {
    if FILE_WRITER_GUARD.get().is_some() {
        return Ok(());
    }
    let dir = app_dirs::logs_dir()?;
    let launch_log = create_launch_log(&dir, launch_time())?;
    prune_launch_logs(&dir, KEEP_LAUNCH_LOGS)?;

    let file = fs::OpenOptions::new()
        .append(true)
        .open(&launch_log)
        .map_err(|source| LoggingError::Io {
            action: "open",
            path: launch_log.clone(),
            source,
        })?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);
    let timer = fmt::time::OffsetTime::new(local_offset(), LINE_STAMP);

    Registry::default()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
        )
        .with(fmt::layer().with_timer(timer.clone()))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(timer)
                .with_writer(file_writer),
        )
        .try_init()?;
    let _ = FILE_WRITER_GUARD.set(guard);

    tracing::info!(path = %launch_log.display(), "logging to file");
    Ok(())
}

fn create_launch_log(dir: &Path, at: OffsetDateTime) -> Result<PathBuf, LoggingError> {
    let stamp = at.format(FILE_STAMP)?;
    let path = dir.join(format!("{LAUNCH_LOG_PREFIX}{stamp}.{LAUNCH_LOG_EXTENSION}"));
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::Io {
            action: "create",
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Delete all but the `keep` newest launch logs in `dir`. Other files are left alone.
fn prune_launch_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| LoggingError::Io {
        action: "read",
        path: dir.to_path_buf(),
        source,
    })?;
    let mut launch_logs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_launch_log(path))
        .collect();
    if launch_logs.len() <= keep {
        return Ok(0);
    }
    launch_logs.sort();
    let stale = launch_logs.len() - keep;
    for path in launch_logs.drain(..stale) {
        fs::remove_file(&path).map_err(|source| LoggingError::Io {
            action: "remove",
            path,
            source,
        })?;
    }
    Ok(stale)
}

fn is_launch_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|ext| ext.to_str()) == Some(LAUNCH_LOG_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LAUNCH_LOG_PREFIX))
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn launch_time() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn launch_log_is_named_after_its_timestamp() {
        let dir = tempdir().unwrap();
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let path = create_launch_log(dir.path(), at).unwrap();
        assert_eq!(path, dir.path().join("aclearn_2023-11-14_22-13-20.log"));
        assert!(path.is_file());
    }

    #[test]
    fn pruning_keeps_newest_launch_logs_only() {
        let dir = tempdir().unwrap();
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        for minute in 0..12 {
            create_launch_log(dir.path(), start + time::Duration::minutes(minute)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        fs::write(dir.path().join("other.log"), "keep").unwrap();

        assert_eq!(prune_launch_logs(dir.path(), 10).unwrap(), 2);

        let names = names(dir.path());
        assert_eq!(names.iter().filter(|n| n.starts_with("aclearn_")).count(), 10);
        assert!(!names.contains(&"aclearn_2023-11-14_22-13-20.log".to_string()));
        assert!(!names.contains(&"aclearn_2023-11-14_22-14-20.log".to_string()));
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(names.contains(&"other.log".to_string()));
    }

    #[test]
    fn pruning_below_limit_is_a_no_op() {
        let dir = tempdir().unwrap();
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        create_launch_log(dir.path(), at).unwrap();
        assert_eq!(prune_launch_logs(dir.path(), 10).unwrap(), 0);
        assert_eq!(names(dir.path()).len(), 1);
    }
}
