// InfoExtractor trait and common types

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::downloader::errors::BridgeError;

/// Environment variable pinning the yt-dlp binary
pub const YTDLP_PATH_ENV: &str = "CROXZ_YTDLP";
/// Environment variable overriding the extraction timeout
pub const TIMEOUT_ENV: &str = "CROXZ_TIMEOUT_SECS";

/// How the extractor treats collection URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistMode {
    /// `--no-playlist`: resolve the single item only
    #[default]
    Single,
    /// `--flat-playlist --yes-playlist`: list entries without resolving them
    Flat,
}

impl fmt::Display for PlaylistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

/// Configuration for info extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Use exactly this binary instead of searching for one
    pub binary_override: Option<PathBuf>,
    /// Hard limit for one extraction run
    pub timeout_seconds: u64,
    /// Hard limit for `--version`
    pub version_timeout_seconds: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_override: None,
            timeout_seconds: 120,
            version_timeout_seconds: 10,
        }
    }
}

impl ExtractorConfig {
    /// Defaults, adjusted by `CROXZ_YTDLP` and `CROXZ_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var_os(YTDLP_PATH_ENV).map(PathBuf::from),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn from_vars(binary: Option<PathBuf>, timeout: Option<String>) -> Self {
        let mut config = Self::default()
            .with_binary_override(binary.filter(|p| !p.as_os_str().is_empty()));

        if let Some(raw) = timeout {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config = config.with_timeout(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }

        config
    }

    pub fn with_binary_override(mut self, path: Option<PathBuf>) -> Self {
        self.binary_override = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Captured result of one tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl From<std::process::Output> for ToolOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Trait for info extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    fn is_available(&self) -> bool;

    /// Run the tool for `url` and return its raw line-delimited JSON output
    async fn dump_json(&self, url: &str, mode: PlaylistMode) -> Result<ToolOutput, BridgeError>;

    /// Installed tool version, if it can be determined
    async fn version(&self) -> Option<String>;
}
