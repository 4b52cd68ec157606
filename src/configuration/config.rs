use super::types::FetchSettings;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line surface of the capture process.
///
/// Every flag is optional so that a TOML file given through `--config` can
/// provide the values instead; flags win over the file. The storage root can
/// also come from `CAMSNAP_STORAGE_ROOT`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "camsnap")]
#[command(version)]
#[command(about = "Periodic still-image capture for a chunk of traffic cameras")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON chunk file holding at most six cameras
    #[arg(long)]
    pub chunk_file: Option<PathBuf>,

    /// Seconds between round starts
    #[arg(long)]
    pub interval: Option<f64>,

    /// Seconds to wait before the first round, used to stagger chunks
    #[arg(long)]
    pub offset: Option<f64>,

    /// Per-camera fetch budget in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Base directory of the image store
    #[arg(long, env = "CAMSNAP_STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,
}

/// Immutable process configuration, threaded into the controller at
/// construction.
///
/// # Fields Overview
///
/// - `chunk_file`: camera chunk to capture
/// - `interval_seconds`: time between round starts
/// - `initial_offset_seconds`: delay before the first round
/// - `timeout_seconds`: per-camera fetch budget
/// - `storage_root`: base directory of the image store
/// - `jpeg_quality`: quality of the canonical JPEG encoding
/// - `utc_offset_hours`: wall clock used for the date/time parts of file names
/// - `launch_batch_size` / `launch_batch_spacing_seconds`: optional staggered
///   launch of cameras inside a round, `0` launches everything at once
/// - `fetch`: headers used by the HTTP fetcher
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub chunk_file: PathBuf,
    pub interval_seconds: f64,
    pub initial_offset_seconds: f64,
    pub timeout_seconds: f64,
    pub storage_root: PathBuf,
    pub jpeg_quality: u8,
    pub utc_offset_hours: i32,
    pub launch_batch_size: usize,
    pub launch_batch_spacing_seconds: f64,
    pub fetch: FetchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_file: PathBuf::new(),
            interval_seconds: 15.0,
            initial_offset_seconds: 0.0,
            timeout_seconds: 20.0,
            storage_root: PathBuf::from("images"),
            jpeg_quality: 90,
            utc_offset_hours: 7,
            launch_batch_size: 0,
            launch_batch_spacing_seconds: 5.0,
            fetch: FetchSettings::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from parsed arguments: file (if any), then
    /// flag overrides, then validation.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        debug!("Configuration read from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(chunk_file) = &args.chunk_file {
            self.chunk_file = chunk_file.clone();
        }
        if let Some(interval) = args.interval {
            self.interval_seconds = interval;
        }
        if let Some(offset) = args.offset {
            self.initial_offset_seconds = offset;
        }
        if let Some(timeout) = args.timeout {
            self.timeout_seconds = timeout;
        }
        if let Some(root) = &args.storage_root {
            self.storage_root = root.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField(String::from("chunk_file")));
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingField(String::from("storage_root")));
        }
        if seconds("interval_seconds", self.interval_seconds)?.is_zero() {
            return Err(ConfigError::NotInRange(String::from(
                "interval_seconds must be > 0, got 0",
            )));
        }
        seconds("initial_offset_seconds", self.initial_offset_seconds)?;
        if seconds("timeout_seconds", self.timeout_seconds)?.is_zero() {
            return Err(ConfigError::NotInRange(String::from(
                "timeout_seconds must be > 0, got 0",
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::NotInRange(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ConfigError::NotInRange(format!(
                "utc_offset_hours must be within -12..=14, got {}",
                self.utc_offset_hours
            )));
        }
        seconds("launch_batch_spacing_seconds", self.launch_batch_spacing_seconds)?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_seconds)
    }

    pub fn initial_offset(&self) -> Duration {
        Duration::from_secs_f64(self.initial_offset_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    pub fn launch_batch_spacing(&self) -> Duration {
        Duration::from_secs_f64(self.launch_batch_spacing_seconds)
    }
}

/// Checks that `value` is a non-negative number of seconds a `Duration` can hold.
fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        ConfigError::NotInRange(format!("{} must be a duration >= 0, got {}: {}", name, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap_or_else(|e| panic!("{}", e))
    }

    #[test]
    #[serial]
    fn flags_build_a_valid_config() {
        std::env::remove_var("CAMSNAP_STORAGE_ROOT");
        let args = parse(&[
            "camsnap",
            "--chunk-file",
            "cams_chunk_000.json",
            "--interval",
            "30",
            "--offset",
            "2.5",
            "--timeout",
            "10",
            "--storage-root",
            "/tmp/snaps",
        ]);
        let config = Config::load(&args).unwrap();
        assert_eq!(config.chunk_file, PathBuf::from("cams_chunk_000.json"));
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.initial_offset(), Duration::from_millis(2500));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.storage_root, PathBuf::from("/tmp/snaps"));
        assert_eq!(config.jpeg_quality, 90);
    }

    #[test]
    #[serial]
    fn file_values_are_overridden_by_flags() {
        std::env::remove_var("CAMSNAP_STORAGE_ROOT");
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chunk_file = "from_file.json"
interval_seconds = 60.0
timeout_seconds = 5.0
jpeg_quality = 75
utc_offset_hours = 0

[fetch]
referer = "https://giaothong.hochiminhcity.gov.vn/Map.aspx"
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let args = parse(&["camsnap", "--config", &path, "--interval", "15"]);
        let config = Config::load(&args).unwrap();
        assert_eq!(config.chunk_file, PathBuf::from("from_file.json"));
        assert_eq!(config.interval_seconds, 15.0);
        assert_eq!(config.timeout_seconds, 5.0);
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.utc_offset_hours, 0);
        assert_eq!(
            config.fetch.referer.as_deref(),
            Some("https://giaothong.hochiminhcity.gov.vn/Map.aspx")
        );
        assert!(config.fetch.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    #[serial]
    fn storage_root_can_come_from_environment() {
        std::env::set_var("CAMSNAP_STORAGE_ROOT", "/var/lib/camsnap");
        let args = parse(&["camsnap", "--chunk-file", "c.json"]);
        std::env::remove_var("CAMSNAP_STORAGE_ROOT");
        let config = Config::load(&args).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/var/lib/camsnap"));
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        std::env::remove_var("CAMSNAP_STORAGE_ROOT");
        let missing_chunk = parse(&["camsnap"]);
        assert!(matches!(
            Config::load(&missing_chunk),
            Err(ConfigError::MissingField(_))
        ));

        let zero_interval = parse(&["camsnap", "--chunk-file", "c.json", "--interval", "0"]);
        assert!(matches!(
            Config::load(&zero_interval),
            Err(ConfigError::NotInRange(_))
        ));

        let config = Config {
            chunk_file: PathBuf::from("c.json"),
            jpeg_quality: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotInRange(_))));

        for huge in [
            Config {
                chunk_file: PathBuf::from("c.json"),
                interval_seconds: 1e20,
                ..Config::default()
            },
            Config {
                chunk_file: PathBuf::from("c.json"),
                initial_offset_seconds: 1e20,
                ..Config::default()
            },
            Config {
                chunk_file: PathBuf::from("c.json"),
                timeout_seconds: f64::MAX,
                ..Config::default()
            },
            Config {
                chunk_file: PathBuf::from("c.json"),
                launch_batch_spacing_seconds: 1e20,
                ..Config::default()
            },
        ] {
            assert!(matches!(huge.validate(), Err(ConfigError::NotInRange(_))));
        }

        let huge_flag = parse(&["camsnap", "--chunk-file", "c.json", "--interval", "1e20"]);
        assert!(matches!(
            Config::load(&huge_flag),
            Err(ConfigError::NotInRange(_))
        ));

        let nan_offset = Config {
            chunk_file: PathBuf::from("c.json"),
            initial_offset_seconds: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(nan_offset.validate(), Err(ConfigError::NotInRange(_))));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "intervall_seconds = 3").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }
}
