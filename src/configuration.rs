pub mod camera_chunk;
pub mod config;
pub mod types;

pub use camera_chunk::{load_chunk, MAX_CHUNK_SIZE};
pub use config::{CliArgs, Config};
pub use types::{CameraDescriptor, FetchSettings};
