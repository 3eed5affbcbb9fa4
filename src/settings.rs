//! Persistent app settings stored as TOML in the `.aclearn` directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;
use crate::session::ConfigLimits;

/// Default filename used to store the app settings.
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// User-tunable settings loaded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Directory imported `.npy` files are copied into.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Labeled samples drawn per class when a dataset is loaded.
    #[serde(default = "default_size_init_per_class")]
    pub size_init_per_class: usize,
    /// Upper bound for the number of configured models.
    #[serde(default = "default_max_models")]
    pub max_models: usize,
    /// Upper bound for replicas per model.
    #[serde(default = "default_max_replicas")]
    pub max_replicas: u32,
    #[serde(default)]
    pub theme: Theme,
    /// Fixed seed for dataset sampling and weight init; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub learner: LearnerSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            size_init_per_class: default_size_init_per_class(),
            max_models: default_max_models(),
            max_replicas: default_max_replicas(),
            theme: Theme::default(),
            seed: None,
            learner: LearnerSettings::default(),
        }
    }
}

impl AppSettings {
    /// Bounds for the model form.
    pub fn limits(&self) -> ConfigLimits {
        ConfigLimits {
            max_models: self.max_models,
            max_replicas: self.max_replicas.max(1),
        }
    }
}

/// Color scheme applied to the egui visuals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Hyperparameters for the built-in MC-dropout learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSettings {
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_dropout")]
    pub dropout: f32,
    /// Stochastic forward passes averaged at evaluation time.
    #[serde(default = "default_mc_passes")]
    pub mc_passes: usize,
    /// Share of rows held out for accuracy measurements.
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f32,
}

impl Default for LearnerSettings {
    fn default() -> Self {
        Self {
            hidden_size: default_hidden_size(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            dropout: default_dropout(),
            mc_passes: default_mc_passes(),
            holdout_fraction: default_holdout_fraction(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Resolve the path to the settings file.
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

/// Load settings from disk, returning defaults if the file is missing.
pub fn load_or_default() -> Result<AppSettings, SettingsError> {
    load_from_path(&settings_path()?)
}

/// Persist settings, overwriting any previous contents.
pub fn save(settings: &AppSettings) -> Result<(), SettingsError> {
    save_to_path(settings, &settings_path()?)
}

/// Save settings to a specific path, creating parent directories as needed.
pub fn save_to_path(settings: &AppSettings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| SettingsError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_from_path(path: &Path) -> Result<AppSettings, SettingsError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let bytes = std::fs::read(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| SettingsError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_size_init_per_class() -> usize {
    2
}

fn default_max_models() -> usize {
    10
}

fn default_max_replicas() -> u32 {
    100
}

fn default_hidden_size() -> usize {
    64
}

fn default_epochs() -> usize {
    30
}

fn default_batch_size() -> usize {
    32
}

fn default_learning_rate() -> f32 {
    0.05
}

fn default_dropout() -> f32 {
    0.25
}

fn default_mc_passes() -> usize {
    10
}

fn default_holdout_fraction() -> f32 {
    0.2
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> SettingsError {
    match error {
        app_dirs::AppDirError::NoBaseDir => SettingsError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            SettingsError::CreateDir { path, source }
        }
    }
}
