use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, SubsecRound, Utc};
use log::{debug, error, info};
use uuid::Uuid;

use crate::configuration::types::CameraDescriptor;
use crate::data_capture::capture_task::CaptureTask;
use crate::data_capture::types::{CaptureErrorKind, CaptureOutcome, RoundResult};
use crate::reporting::status_reporter::StatusReporter;

/// Staggered launch of the cameras of one round.
///
/// Camera `i` starts `(i / batch_size) * spacing` after the round begins;
/// a `batch_size` of 0 starts every camera immediately.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaunchPlan {
    pub batch_size: usize,
    pub spacing: Duration,
}

impl LaunchPlan {
    pub fn delay_for(&self, index: usize) -> Duration {
        if self.batch_size == 0 {
            return Duration::ZERO;
        }
        let batch = (index / self.batch_size) as u32;
        self.spacing * batch
    }
}

/// Fans a round out to one capture task per camera and joins them all.
///
/// Tasks of a round are independent: a failing or slow camera never cancels
/// or delays its siblings beyond its own timeout. The returned outcomes follow
/// the input camera order whatever the completion order.
pub struct CaptureOrchestrator {
    task: CaptureTask,
    reporter: Arc<StatusReporter>,
    timeout: Duration,
    launch: LaunchPlan,
    utc_offset: FixedOffset,
}

impl CaptureOrchestrator {
    pub fn new(
        task: CaptureTask,
        reporter: Arc<StatusReporter>,
        timeout: Duration,
        launch: LaunchPlan,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            task,
            reporter,
            timeout,
            launch,
            utc_offset,
        }
    }

    /// Runs one round over `cameras` and reports it once all tasks are done.
    pub async fn run_round(&self, cameras: &[CameraDescriptor]) -> RoundResult {
        let round_id = Uuid::new_v4();
        let started_at = Utc::now().with_timezone(&self.utc_offset).trunc_subsecs(0);
        info!("[{}] Round started for {} cameras", round_id, cameras.len());

        // At most one task per camera, so concurrency is bounded by the chunk size.
        let mut handles = Vec::with_capacity(cameras.len());
        for (index, camera) in cameras.iter().enumerate() {
            let task = self.task.clone();
            let camera = camera.clone();
            let timeout = self.timeout;
            let delay = self.launch.delay_for(index);
            handles.push(tokio::spawn(async move {
                if !delay.is_zero() {
                    debug!("[{}] Launch delayed by {:?}", camera.cam_id, delay);
                    tokio::time::sleep(delay).await;
                }
                task.capture(&camera, timeout).await
            }));
        }

        let mut outcomes = Vec::with_capacity(cameras.len());
        for (camera, handle) in cameras.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("[{}][{}] Capture task aborted: {}", round_id, camera.cam_id, e);
                    CaptureOutcome::failure(
                        &camera.cam_id,
                        &camera.code,
                        self.task.now(),
                        CaptureErrorKind::FetchError,
                    )
                }
            };
            outcomes.push(outcome);
        }

        let result = RoundResult {
            round_id,
            started_at,
            outcomes,
        };
        info!(
            "[{}] Round finished: {}/{} captured",
            round_id,
            result.successes(),
            result.total()
        );
        self.reporter.report(&result);
        result
    }
}
