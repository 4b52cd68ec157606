//! Common data types used across the data_capture subsystem.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

/// Camera-local failure taxonomy. None of these abort a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureErrorKind {
    /// The fetch did not complete inside the per-camera budget.
    Timeout,
    /// Navigation, network or render failure reported by the fetcher.
    FetchError,
    /// Retrieved bytes could not be interpreted as a supported image.
    DecodeError,
    /// Directory creation, write failure or fingerprint collision.
    StorageError,
}

impl CaptureErrorKind {
    /// Short tag used in the status line.
    pub fn tag(&self) -> &'static str {
        match self {
            CaptureErrorKind::Timeout => "timeout",
            CaptureErrorKind::FetchError => "fetch",
            CaptureErrorKind::DecodeError => "decode",
            CaptureErrorKind::StorageError => "storage",
        }
    }
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of one capture task for one round.
///
/// `stored_path` is present iff `succeeded`, `error_kind` iff not. Use
/// [`CaptureOutcome::success`] and [`CaptureOutcome::failure`] to keep that
/// pairing intact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub cam_id: String,
    /// Human label of the camera, rendered by the status reporter.
    pub code: String,
    pub succeeded: bool,
    /// Capture instant, whole seconds.
    pub timestamp: DateTime<FixedOffset>,
    pub stored_path: Option<PathBuf>,
    pub error_kind: Option<CaptureErrorKind>,
}

impl CaptureOutcome {
    pub fn success(
        cam_id: &str,
        code: &str,
        timestamp: DateTime<FixedOffset>,
        stored_path: PathBuf,
    ) -> Self {
        Self {
            cam_id: cam_id.to_string(),
            code: code.to_string(),
            succeeded: true,
            timestamp,
            stored_path: Some(stored_path),
            error_kind: None,
        }
    }

    pub fn failure(
        cam_id: &str,
        code: &str,
        timestamp: DateTime<FixedOffset>,
        error_kind: CaptureErrorKind,
    ) -> Self {
        Self {
            cam_id: cam_id.to_string(),
            code: code.to_string(),
            succeeded: false,
            timestamp,
            stored_path: None,
            error_kind: Some(error_kind),
        }
    }
}

/// Outcomes of one round, one per camera, in chunk order.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    /// Correlates log lines of the same round.
    pub round_id: Uuid,
    pub started_at: DateTime<FixedOffset>,
    pub outcomes: Vec<CaptureOutcome>,
}

impl RoundResult {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
