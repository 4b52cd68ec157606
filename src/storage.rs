//! Storage subsystem
//!
//! Persistence of normalized images.
//!
//! Components:
//! - `storage_trait`: the Storage trait used by capture tasks.
//! - `file_storage`: date-partitioned filesystem store with content fingerprints.

pub mod file_storage;
pub mod storage_trait;

pub use file_storage::FileStorage;
pub use storage_trait::Storage;
