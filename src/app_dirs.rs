//! Where aclearn keeps its own files: `<config base>/.aclearn/`.
//!
//! The base is the OS config directory unless `ACLEARN_CONFIG_HOME` points
//! elsewhere. Unit tests redirect it in-process with `ConfigBaseGuard`.

use std::path::PathBuf;
use std::sync::Mutex;

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".aclearn";
/// Replaces the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "ACLEARN_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

static BASE_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory could be determined for this user")]
    NoBaseDir,
    #[error("Could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.aclearn` directory, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = base_dir().ok_or(AppDirError::NoBaseDir)?;
    created(base.join(APP_DIR_NAME))
}

/// Launch logs live here.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    created(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn created(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

fn base_dir() -> Option<PathBuf> {
    let overridden = BASE_OVERRIDE
        .lock()
        .map(|base| base.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
    overridden
        .or_else(|| std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

/// Points the config base at `path` until dropped; holders are serialized.
#[cfg(test)]
pub(crate) struct ConfigBaseGuard {
    _serial: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
static GUARD_SERIAL: Mutex<()> = Mutex::new(());

#[cfg(test)]
impl ConfigBaseGuard {
    pub(crate) fn set(path: PathBuf) -> Self {
        let serial = GUARD_SERIAL.lock().unwrap_or_else(|err| err.into_inner());
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = Some(path);
        Self { _serial: serial }
    }
}

#[cfg(test)]
impl Drop for ConfigBaseGuard {
    fn drop(&mut self) {
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = None;
    }
}
