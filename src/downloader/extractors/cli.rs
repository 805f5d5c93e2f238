// CLI InfoExtractor - uses native `yt-dlp` binary

use std::path::PathBuf;

use async_trait::async_trait;

use super::traits::{ExtractorConfig, InfoExtractor, PlaylistMode, ToolOutput};
use crate::downloader::errors::BridgeError;
use crate::downloader::tools::ToolLocator;
use crate::downloader::utils::run_output_with_timeout;

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: Option<PathBuf>,
    config: ExtractorConfig,
}

impl CliInfoExtractor {
    /// Locate yt-dlp once; the result holds for the lifetime of the extractor
    pub fn new(config: ExtractorConfig) -> Self {
        let ytdlp_path = ToolLocator::new(config.binary_override.clone()).locate_ytdlp();
        match &ytdlp_path {
            Some(path) => tracing::debug!(path = %path.display(), "found yt-dlp"),
            None => tracing::debug!("yt-dlp not found"),
        }

        Self { ytdlp_path, config }
    }

    /// Build command arguments
    fn build_args(url: &str, mode: PlaylistMode) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--ignore-errors".to_string(),
            "--no-check-certificates".to_string(),
        ];

        match mode {
            PlaylistMode::Flat => {
                args.push("--flat-playlist".to_string());
                args.push("--yes-playlist".to_string());
            }
            PlaylistMode::Single => args.push("--no-playlist".to_string()),
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.ytdlp_path.is_some()
    }

    async fn dump_json(&self, url: &str, mode: PlaylistMode) -> Result<ToolOutput, BridgeError> {
        let path = self.ytdlp_path.as_ref().ok_or(BridgeError::ToolNotFound)?;
        let args = Self::build_args(url, mode);

        tracing::debug!(
            "[CliExtractor] {} {}",
            path.display(),
            args.join(" ")
        );

        let output =
            run_output_with_timeout(path.as_os_str(), &args, self.config.timeout_seconds).await?;
        Ok(output.into())
    }

    async fn version(&self) -> Option<String> {
        let path = self.ytdlp_path.as_ref()?;

        match run_output_with_timeout(
            path.as_os_str(),
            &["--version"],
            self.config.version_timeout_seconds,
        )
        .await
        {
            Ok(out) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("[CliExtractor] version check failed: {}", e);
                None
            }
        }
    }
}
