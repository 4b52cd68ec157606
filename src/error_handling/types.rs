use std::fmt;
use std::path::PathBuf;

use crate::data_capture::types::CaptureErrorKind;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    JsonError(String),
    MissingField(String),
    InvalidField(String),
    ChunkEmpty(String),
    ChunkTooLarge(usize),
    DuplicateCamera(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::JsonError(e) => write!(f, "Chunk file parsing error: {}", e),
            ConfigError::MissingField(e) => write!(f, "Missing field: {}", e),
            ConfigError::InvalidField(e) => write!(f, "Invalid field: {}", e),
            ConfigError::ChunkEmpty(e) => write!(f, "Camera chunk is empty: {}", e),
            ConfigError::ChunkTooLarge(n) => {
                write!(f, "Camera chunk holds {} cameras, at most 6 are allowed", n)
            }
            ConfigError::DuplicateCamera(e) => write!(f, "Duplicate cam_id in chunk: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failure surfaced by a [`Fetcher`](crate::data_capture::fetcher::Fetcher).
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Timeout,
    Failed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "Fetch timed out"),
            FetchError::Failed(e) => write!(f, "Fetch failed: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    CreateDirFailed(String),
    WriteFailed(String),
    ReadFailed(String),
    FingerprintCollision(PathBuf),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::CreateDirFailed(e) => write!(f, "Storage directory creation failed: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
            StorageError::FingerprintCollision(p) => write!(
                f,
                "Fingerprint collision: {} already holds different content",
                p.display()
            ),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    Timeout,
    FetchFailed(String),
    DecodeFailed(String),
    StorageFailed(StorageError),
}

impl CaptureError {
    /// Collapses the error into the camera-local failure taxonomy.
    pub fn kind(&self) -> CaptureErrorKind {
        match self {
            CaptureError::Timeout => CaptureErrorKind::Timeout,
            CaptureError::FetchFailed(_) => CaptureErrorKind::FetchError,
            CaptureError::DecodeFailed(_) => CaptureErrorKind::DecodeError,
            CaptureError::StorageFailed(_) => CaptureErrorKind::StorageError,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Timeout => write!(f, "Capture timed out"),
            CaptureError::FetchFailed(e) => write!(f, "Capture fetch error: {}", e),
            CaptureError::DecodeFailed(e) => write!(f, "Capture decode error: {}", e),
            CaptureError::StorageFailed(e) => write!(f, "Capture storage error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<FetchError> for CaptureError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => CaptureError::Timeout,
            FetchError::Failed(e) => CaptureError::FetchFailed(e),
        }
    }
}

impl From<StorageError> for CaptureError {
    fn from(err: StorageError) -> Self {
        CaptureError::StorageFailed(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}
