//! Loading of the camera chunk file.
//!
//! A chunk is the JSON array produced by the catalog splitter: at most six
//! camera records processed together every round. Every problem with the file
//! is reported here, before the scheduler starts.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use super::types::{CameraDescriptor, CameraRecord};
use crate::error_handling::types::ConfigError;

/// Upper bound on cameras per chunk, and so on concurrent tasks per round.
pub const MAX_CHUNK_SIZE: usize = 6;

const FALLBACK_CODE: &str = "nocode";

/// Reads and validates a chunk file.
pub fn load_chunk(path: &Path) -> Result<Vec<CameraDescriptor>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cameras = parse_chunk(&content)
        .map_err(|e| match e {
            ConfigError::ChunkEmpty(_) => ConfigError::ChunkEmpty(path.display().to_string()),
            other => other,
        })?;

    if cameras.len() != MAX_CHUNK_SIZE {
        warn!(
            "Chunk {} holds {} cameras (expected {}), running with what is present",
            path.display(),
            cameras.len(),
            MAX_CHUNK_SIZE
        );
    }
    info!("Loaded {} cameras from {}", cameras.len(), path.display());
    Ok(cameras)
}

/// Parses chunk JSON into descriptors, preserving file order.
pub fn parse_chunk(content: &str) -> Result<Vec<CameraDescriptor>, ConfigError> {
    let records: Vec<CameraRecord> =
        serde_json::from_str(content).map_err(|e| ConfigError::JsonError(e.to_string()))?;

    if records.is_empty() {
        return Err(ConfigError::ChunkEmpty(String::from("no camera records")));
    }
    if records.len() > MAX_CHUNK_SIZE {
        return Err(ConfigError::ChunkTooLarge(records.len()));
    }

    let mut seen = HashSet::new();
    let mut cameras = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let camera = into_descriptor(index, record)?;
        if !seen.insert(camera.cam_id.clone()) {
            return Err(ConfigError::DuplicateCamera(camera.cam_id));
        }
        debug!("Camera {} ({}) -> {}", camera.cam_id, camera.code, camera.fetch_endpoint);
        cameras.push(camera);
    }
    Ok(cameras)
}

fn into_descriptor(index: usize, record: CameraRecord) -> Result<CameraDescriptor, ConfigError> {
    let cam_id = non_blank(record.cam_id)
        .ok_or_else(|| ConfigError::MissingField(format!("cam_id of record #{}", index)))?;
    // cam_id becomes a path component of every stored image
    if cam_id == "." || cam_id == ".." || cam_id.contains(['/', '\\']) {
        return Err(ConfigError::InvalidField(format!("cam_id {:?}", cam_id)));
    }
    let fetch_endpoint = non_blank(record.expand_url)
        .ok_or_else(|| ConfigError::MissingField(format!("expand_url of camera {}", cam_id)))?;
    let title = non_blank(record.title);
    let code = non_blank(record.code)
        .or_else(|| title.clone())
        .unwrap_or_else(|| String::from(FALLBACK_CODE));

    Ok(CameraDescriptor {
        cam_id,
        code,
        title,
        fetch_endpoint,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
