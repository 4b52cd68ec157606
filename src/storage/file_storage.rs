use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use log::{debug, error, info, warn};
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::configuration::types::CameraDescriptor;
use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::Storage;

const FALLBACK_SLUG: &str = "nocode";
const IMAGE_EXTENSION: &str = "jpg";
// Combining Diacritical Marks block; labels in decomposed form carry their accents here.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Date-partitioned image store on the local filesystem.
///
/// Layout under `root`:
/// `{cam_id}__{slug}/{YYYYMMDD}/{cam_id}__{slug}__{YYYYMMDD}__{HHMMSS}__{hash8}.jpg`
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens the store, creating `root` if needed and checking it accepts writes.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            error!("Failed to create storage root {}: {}", root.display(), e);
            StorageError::CreateDirFailed(format!("{}: {}", root.display(), e))
        })?;

        let probe = root.join(format!(".write-probe-{}", Uuid::new_v4().simple()));
        fs::write(&probe, b"probe").map_err(|e| {
            error!("Storage root {} is not writable: {}", root.display(), e);
            StorageError::WriteFailed(format!("{}: {}", root.display(), e))
        })?;
        if let Err(e) = fs::remove_file(&probe) {
            warn!("Failed to remove write probe {}: {}", probe.display(), e);
        }

        info!("FileStorage initialized at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for FileStorage {
    fn store(
        &self,
        camera: &CameraDescriptor,
        encoded: &[u8],
        timestamp: &DateTime<FixedOffset>,
    ) -> Result<PathBuf, StorageError> {
        let path = self.root.join(image_relative_path(camera, encoded, timestamp));
        let dir = path.parent().unwrap_or(&self.root);
        // create_dir_all tolerates siblings creating the same levels concurrently
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create {}: {}", dir.display(), e);
            StorageError::CreateDirFailed(format!("{}: {}", dir.display(), e))
        })?;

        // Staged next to the target so publishing is a same-directory rename.
        let mut staged = tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(dir)
            .map_err(|e| {
                error!("Failed to stage a file in {}: {}", dir.display(), e);
                StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
            })?;
        if let Err(e) = staged.write_all(encoded).and_then(|_| staged.flush()) {
            error!("Failed to write {}: {}", staged.path().display(), e);
            return Err(StorageError::WriteFailed(format!("{}: {}", path.display(), e)));
        }

        // The target only ever appears complete, so an existing one can be compared.
        match staged.persist_noclobber(&path) {
            Ok(_) => {
                debug!("Stored {} bytes at {}", encoded.len(), path.display());
                Ok(path)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                let existing = fs::read(&path).map_err(|e| {
                    error!("Failed to read existing {}: {}", path.display(), e);
                    StorageError::ReadFailed(format!("{}: {}", path.display(), e))
                })?;
                if existing == encoded {
                    debug!("{} already holds identical content", path.display());
                    Ok(path)
                } else {
                    error!("Fingerprint collision at {}", path.display());
                    Err(StorageError::FingerprintCollision(path))
                }
            }
            Err(e) => {
                error!("Failed to publish {}: {}", path.display(), e.error);
                Err(StorageError::WriteFailed(format!("{}: {}", path.display(), e.error)))
            }
        }
    }
}

/// Path of an image relative to the store root.
pub fn image_relative_path(
    camera: &CameraDescriptor,
    encoded: &[u8],
    timestamp: &DateTime<FixedOffset>,
) -> PathBuf {
    let slug = slugify(&camera.code);
    let day = timestamp.format("%Y%m%d").to_string();
    let time = timestamp.format("%H%M%S").to_string();
    let folder = format!("{}__{}", camera.cam_id, slug);
    let file_name = format!(
        "{}__{}__{}__{}__{}.{}",
        camera.cam_id,
        slug,
        day,
        time,
        fingerprint(encoded),
        IMAGE_EXTENSION
    );
    PathBuf::from(folder).join(day).join(file_name)
}

/// First 8 hex characters of the SHA-256 digest of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..4])
}

/// Filesystem-safe form of a camera label.
///
/// Lowercases, drops combining marks, folds precomposed Latin diacritics to
/// their base letter, turns every run of
/// other characters into a single `_` and trims separators at both ends.
pub fn slugify(code: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

    let folded: String = code
        .to_lowercase()
        .chars()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .map(fold_diacritic)
        .collect();
    let slug = re.replace_all(&folded, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        String::from(FALLBACK_SLUG)
    } else {
        slug.to_string()
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ'
        | 'ẩ' | 'ẫ' | 'ậ' | 'ä' | 'å' => 'a',
        'đ' => 'd',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ'
        | 'ở' | 'ỡ' | 'ợ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'û' | 'ü' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
