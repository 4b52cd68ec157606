//! Capture of one camera for one round.
//!
//! A [`CaptureTask`] runs fetch -> normalize -> store for a camera and folds
//! every failure into a [`CaptureOutcome`]; nothing escapes to the round.
//!
//! - The fetch is bounded by the caller's timeout. On expiry the fetch future
//!   is dropped, which releases whatever context the fetcher held.
//! - Normalization and storage run on the blocking pool so the scheduling
//!   timeline is never stalled by CPU or disk work.
//! - No retries: a failed camera is simply captured again next round.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use log::{debug, info, warn};

use super::fetcher::Fetcher;
use super::normalizer::ImageNormalizer;
use super::types::CaptureOutcome;
use crate::configuration::types::CameraDescriptor;
use crate::error_handling::types::{CaptureError, StorageError};
use crate::storage::storage_trait::Storage;

/// Shared capture pipeline. Cloning is cheap; every per-camera task of a round
/// gets its own clone.
#[derive(Clone)]
pub struct CaptureTask {
    fetcher: Arc<dyn Fetcher>,
    normalizer: ImageNormalizer,
    storage: Arc<dyn Storage>,
    utc_offset: FixedOffset,
}

impl CaptureTask {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        normalizer: ImageNormalizer,
        storage: Arc<dyn Storage>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            storage,
            utc_offset,
        }
    }

    /// Captures `camera` once. Never fails: errors become a failed outcome.
    pub async fn capture(&self, camera: &CameraDescriptor, timeout: Duration) -> CaptureOutcome {
        match self.try_capture(camera, timeout).await {
            Ok((timestamp, path)) => {
                info!("[{}] {} -> {}", camera.cam_id, camera.code, path.display());
                CaptureOutcome::success(&camera.cam_id, &camera.code, timestamp, path)
            }
            Err(e) => {
                warn!("[{}] {} failed: {}", camera.cam_id, camera.code, e);
                CaptureOutcome::failure(&camera.cam_id, &camera.code, self.now(), e.kind())
            }
        }
    }

    async fn try_capture(
        &self,
        camera: &CameraDescriptor,
        timeout: Duration,
    ) -> Result<(DateTime<FixedOffset>, PathBuf), CaptureError> {
        debug!("[{}] Fetching {}", camera.cam_id, camera.fetch_endpoint);
        let raw = tokio::time::timeout(timeout, self.fetcher.fetch(&camera.fetch_endpoint, timeout))
            .await
            .map_err(|_| CaptureError::Timeout)??;
        let timestamp = self.now();
        debug!("[{}] Received {} bytes", camera.cam_id, raw.len());

        let normalizer = self.normalizer;
        let encoded = tokio::task::spawn_blocking(move || normalizer.normalize(&raw))
            .await
            .map_err(|e| CaptureError::DecodeFailed(format!("normalizer aborted: {}", e)))??;

        let storage = Arc::clone(&self.storage);
        let owned_camera = camera.clone();
        let path = tokio::task::spawn_blocking(move || {
            storage.store(&owned_camera, &encoded, &timestamp)
        })
        .await
        .map_err(|e| StorageError::WriteFailed(format!("storage aborted: {}", e)))??;

        Ok((timestamp, path))
    }

    /// Current wall-clock time at the configured offset, whole seconds.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset).trunc_subsecs(0)
    }
}
