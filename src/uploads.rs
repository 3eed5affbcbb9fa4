//! Copies picked `.npy` files into the experiment data directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extension accepted by the dataset import.
pub const NPY_EXTENSION: &str = "npy";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{name} is not a .npy file")]
    NotNpy { name: String },
    #[error("invalid file name {0:?}")]
    InvalidName(String),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A picked file held in memory until the import is confirmed.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name only; directories are stripped when the file is created.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Read a file picked from disk, rejecting anything that is not `.npy`.
    pub fn read(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::InvalidName(path.display().to_string()))?
            .to_string();
        ensure_npy(&name)?;
        let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { name, bytes })
    }
}

/// Write `file` verbatim to `<data_dir>/<name>` and return the written path.
pub fn persist(data_dir: &Path, file: &UploadedFile) -> Result<PathBuf, UploadError> {
    let name = Path::new(&file.name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UploadError::InvalidName(file.name.clone()))?;
    ensure_npy(name)?;
    std::fs::create_dir_all(data_dir).map_err(|source| UploadError::CreateDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    let path = data_dir.join(name);
    std::fs::write(&path, &file.bytes).map_err(|source| UploadError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn ensure_npy(name: &str) -> Result<(), UploadError> {
    let is_npy = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NPY_EXTENSION));
    if is_npy {
        Ok(())
    } else {
        Err(UploadError::NotNpy {
            name: name.to_string(),
        })
    }
}
