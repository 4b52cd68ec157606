//! Test doubles and sample images shared by the capture tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageFormat, Rgba, RgbaImage};

use super::fetcher::Fetcher;
use crate::configuration::types::CameraDescriptor;
use crate::error_handling::types::{FetchError, StorageError};
use crate::storage::file_storage::image_relative_path;
use crate::storage::storage_trait::Storage;

/// Encodes one solid-colour frame per entry of `colors` into an animated GIF.
pub fn animated_gif(width: u32, height: u32, colors: &[[u8; 3]]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = colors.iter().map(|[r, g, b]| {
            Frame::new(RgbaImage::from_pixel(width, height, Rgba([*r, *g, *b, 255])))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

pub fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn camera(cam_id: &str, code: &str) -> CameraDescriptor {
    CameraDescriptor {
        cam_id: cam_id.to_string(),
        code: code.to_string(),
        title: None,
        fetch_endpoint: format!("https://cams.test/{}", cam_id),
    }
}

/// Canned behaviour of one endpoint.
#[derive(Clone)]
pub enum Script {
    Bytes(Vec<u8>),
    Delayed(Duration, Vec<u8>),
    Fail(String),
    /// Never answers; holds an open context until the fetch is dropped.
    Hang,
}

/// Fetcher returning scripted results per endpoint.
///
/// `open_contexts` counts fetches currently in flight so tests can check that
/// a cancelled fetch released its context.
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    open_contexts: Arc<AtomicUsize>,
    calls: AtomicUsize,
}

struct ContextGuard(Arc<AtomicUsize>);

impl ContextGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        ContextGuard(Arc::clone(counter))
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            open_contexts: Arc::new(AtomicUsize::new(0)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, camera: &CameraDescriptor, script: Script) -> Self {
        self.scripts.insert(camera.fetch_endpoint.clone(), script);
        self
    }

    pub fn open_contexts(&self) -> usize {
        self.open_contexts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, endpoint: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _context = ContextGuard::acquire(&self.open_contexts);
        match self.scripts.get(endpoint).cloned() {
            Some(Script::Bytes(bytes)) => Ok(bytes),
            Some(Script::Delayed(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(bytes)
            }
            Some(Script::Fail(reason)) => Err(FetchError::Failed(reason)),
            Some(Script::Hang) => {
                std::future::pending::<()>().await;
                Err(FetchError::Timeout)
            }
            None => Err(FetchError::Failed(format!("no script for {}", endpoint))),
        }
    }
}

/// In-memory storage recording every write.
pub struct MemStorage {
    pub writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    fail_with: Option<StorageError>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(err: StorageError) -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }
}

impl Storage for MemStorage {
    fn store(
        &self,
        camera: &CameraDescriptor,
        encoded: &[u8],
        timestamp: &DateTime<FixedOffset>,
    ) -> Result<PathBuf, StorageError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let path = image_relative_path(camera, encoded, timestamp);
        self.writes
            .lock()
            .unwrap()
            .push((path.clone(), encoded.to_vec()));
        Ok(path)
    }
}

/// Cloneable in-memory sink for status lines.
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(|l| l.to_string())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
