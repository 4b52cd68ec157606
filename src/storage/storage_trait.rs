//! Storage Trait
//!
//! This module defines the `Storage` trait, the persistence seam used by capture
//! tasks. Implementors decide where normalized images live and are responsible
//! for:
//! - Deriving a deterministic location from camera, content and capture time
//! - Creating whatever hierarchy that location needs
//! - Refusing to replace existing content with different bytes
//!
//! Calls are blocking; capture tasks run them on the blocking thread pool.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};

use crate::configuration::types::CameraDescriptor;
use crate::error_handling::types::StorageError;

pub trait Storage: Send + Sync {
    /// Persists `encoded` for `camera` captured at `timestamp` and returns the
    /// path it was written to.
    fn store(
        &self,
        camera: &CameraDescriptor,
        encoded: &[u8],
        timestamp: &DateTime<FixedOffset>,
    ) -> Result<PathBuf, StorageError>;
}
