use std::sync::Arc;

use chrono::FixedOffset;
use log::{error, info};
use tokio::sync::watch;

use super::orchestrator::{CaptureOrchestrator, LaunchPlan};
use super::scheduler::Scheduler;
use crate::configuration::camera_chunk::load_chunk;
use crate::configuration::config::Config;
use crate::configuration::types::CameraDescriptor;
use crate::data_capture::capture_task::CaptureTask;
use crate::data_capture::fetcher::Fetcher;
use crate::data_capture::http_fetcher::HttpFetcher;
use crate::data_capture::normalizer::ImageNormalizer;
use crate::error_handling::types::ControllerError;
use crate::reporting::status_reporter::StatusReporter;
use crate::storage::file_storage::FileStorage;
use crate::storage::storage_trait::Storage;

/// Wires configuration, camera chunk and capture components together and
/// drives the scheduler.
///
/// Everything that can make the process fail happens in the constructors;
/// once [`Controller::run`] starts, camera failures only show up in the
/// status lines.
pub struct Controller {
    pub config: Config,
    cameras: Arc<Vec<CameraDescriptor>>,
    orchestrator: Arc<CaptureOrchestrator>,
    scheduler: Scheduler,
}

impl Controller {
    /// Builds the production controller: chunk file, filesystem store, HTTP
    /// fetcher and stdout status line.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Loading camera chunk {}", config.chunk_file.display());
        let cameras = load_chunk(&config.chunk_file)?;

        let storage = FileStorage::new(&config.storage_root).map_err(|e| {
            error!("Storage root {} unusable: {}", config.storage_root.display(), e);
            ControllerError::StorageError(e)
        })?;

        let fetcher = HttpFetcher::new(config.fetch.clone())
            .map_err(|e| ControllerError::InitializationFailed(e.to_string()))?;

        Self::with_components(
            config,
            cameras,
            Arc::new(fetcher),
            Arc::new(storage),
            StatusReporter::stdout(),
        )
    }

    /// Builds a controller around caller-provided collaborators.
    pub fn with_components(
        config: Config,
        cameras: Vec<CameraDescriptor>,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
        reporter: StatusReporter,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        let utc_offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            ControllerError::InitializationFailed(format!(
                "invalid utc_offset_hours {}",
                config.utc_offset_hours
            ))
        })?;

        let task = CaptureTask::new(
            fetcher,
            ImageNormalizer::new(config.jpeg_quality),
            storage,
            utc_offset,
        );
        let launch = LaunchPlan {
            batch_size: config.launch_batch_size,
            spacing: config.launch_batch_spacing(),
        };
        let orchestrator = CaptureOrchestrator::new(
            task,
            Arc::new(reporter),
            config.timeout(),
            launch,
            utc_offset,
        );
        let scheduler = Scheduler::new(config.interval(), config.initial_offset());

        info!(
            "Controller ready: {} cameras, interval={}s, timeout={}s, storage={}",
            cameras.len(),
            config.interval_seconds,
            config.timeout_seconds,
            config.storage_root.display()
        );

        Ok(Self {
            config,
            cameras: Arc::new(cameras),
            orchestrator: Arc::new(orchestrator),
            scheduler,
        })
    }

    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    /// Runs rounds until `shutdown` turns `true`; returns the number of rounds.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> u64 {
        let orchestrator = Arc::clone(&self.orchestrator);
        let cameras = Arc::clone(&self.cameras);
        self.scheduler
            .run(
                move || {
                    let orchestrator = Arc::clone(&orchestrator);
                    let cameras = Arc::clone(&cameras);
                    async move {
                        orchestrator.run_round(&cameras).await;
                    }
                },
                shutdown,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_chunk(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("cams_chunk_000.json");
        fs::write(
            &path,
            r#"[{"cam_id": "a", "code": "A", "expand_url": "http://127.0.0.1:9/a.jpg"},
                {"cam_id": "b", "code": "B", "expand_url": "http://127.0.0.1:9/b.jpg"}]"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn new_loads_chunk_and_prepares_storage() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            chunk_file: write_chunk(&dir),
            storage_root: dir.path().join("images"),
            ..Config::default()
        };

        let controller = Controller::new(config).unwrap();
        assert_eq!(controller.cameras().len(), 2);
        assert!(dir.path().join("images").is_dir());
    }

    #[test]
    fn malformed_chunk_is_fatal() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("bad.json");
        fs::write(&chunk, r#"[{"code": "A"}]"#).unwrap();
        let config = Config {
            chunk_file: chunk,
            storage_root: dir.path().join("images"),
            ..Config::default()
        };

        assert!(matches!(
            Controller::new(config),
            Err(ControllerError::ConfigurationError(_))
        ));
    }

    #[test]
    fn out_of_range_interval_is_rejected_before_building() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            chunk_file: write_chunk(&dir),
            storage_root: dir.path().join("images"),
            interval_seconds: 1e20,
            ..Config::default()
        };
        let cameras = load_chunk(&config.chunk_file).unwrap();
        let storage = Arc::new(FileStorage::new(&config.storage_root).unwrap());
        let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()).unwrap());

        assert!(matches!(
            Controller::with_components(config, cameras, fetcher, storage, StatusReporter::stdout()),
            Err(ControllerError::ConfigurationError(_))
        ));
    }

    #[test]
    fn unusable_storage_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let config = Config {
            chunk_file: write_chunk(&dir),
            storage_root: blocker.join("images"),
            ..Config::default()
        };

        assert!(matches!(
            Controller::new(config),
            Err(ControllerError::StorageError(_))
        ));
    }
}
