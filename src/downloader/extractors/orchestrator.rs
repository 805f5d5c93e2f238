// InfoExtractor Orchestrator - runs the extractor and normalizes its output
//
// Flow:
// 1. Tool missing → error record, never a panic
// 2. Run yt-dlp, split stdout into JSON lines, drop the noise
// 3. One record → single transform, several → flat playlist
// 4. Nothing usable → attach the installed yt-dlp version to the note

use serde_json::Value;

use super::cli::CliInfoExtractor;
use super::traits::{ExtractorConfig, InfoExtractor, PlaylistMode};
use crate::downloader::errors::BridgeError;
use crate::downloader::models::{ExtractionOutcome, RawRecord};
use crate::downloader::transform::{transform_playlist, transform_single};

/// Orchestrator around one extractor implementation
pub struct InfoExtractorOrchestrator {
    extractor: Box<dyn InfoExtractor>,
}

impl InfoExtractorOrchestrator {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_extractor(Box::new(CliInfoExtractor::new(config)))
    }

    /// Use a specific extractor (tests, alternative backends)
    pub fn with_extractor(extractor: Box<dyn InfoExtractor>) -> Self {
        Self { extractor }
    }

    pub fn is_available(&self) -> bool {
        self.extractor.is_available()
    }

    /// Extract and normalize; every failure becomes an error record
    pub async fn extract(&self, url: &str, mode: PlaylistMode) -> ExtractionOutcome {
        match self.try_extract(url, mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("[Orchestrator] {} failed: {}", self.extractor.name(), e);
                ExtractionOutcome::error(e.to_string())
            }
        }
    }

    async fn try_extract(&self, url: &str, mode: PlaylistMode) -> Result<ExtractionOutcome, BridgeError> {
        if !self.extractor.is_available() {
            return Err(BridgeError::ToolNotFound);
        }

        tracing::debug!("[Orchestrator] {} ({} mode): {}", self.extractor.name(), mode, url);
        let output = self.extractor.dump_json(url, mode).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();

        // stderr only matters when there is nothing else to go on
        if !output.success && stdout.is_empty() {
            return Err(BridgeError::from_stderr(&output.stderr));
        }
        if stdout.is_empty() {
            return Err(BridgeError::EmptyOutput);
        }

        let records = parse_records(stdout);
        let mut outcome = match records.as_slice() {
            [] => return Err(BridgeError::Unparseable),
            [single] => transform_single(single),
            many => ExtractionOutcome::Playlist(transform_playlist(many, url)),
        };

        if let ExtractionOutcome::Video(record) = &mut outcome {
            if let Some(note) = record.note.as_mut() {
                note.ytdlp_version = self.extractor.version().await;
            }
        }

        Ok(outcome)
    }
}

/// One JSON object per line; anything else is diagnostic noise
fn parse_records(stdout: &str) -> Vec<RawRecord> {
    let mut skipped = 0usize;
    let records: Vec<RawRecord> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) if value.is_object() => Some(RawRecord::from_json(&value)),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    tracing::debug!(parsed = records.len(), skipped, "parsed yt-dlp output");
    records
}
