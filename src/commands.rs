// Command bodies: each produces exactly one JSON-serializable value

use serde::Serialize;

use crate::cli::Command;
use crate::downloader::classify::{classify, direct_download_record, is_direct_download_url};
use crate::downloader::extractors::{InfoExtractorOrchestrator, PlaylistMode};
use crate::downloader::models::ExtractionOutcome;

/// URL introspection without running the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzeReport {
    pub url: String,
    pub is_direct: bool,
    pub has_ytdlp: bool,
    pub extension: Option<String>,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub supported: bool,
    pub is_direct: bool,
}

pub fn analyze(url: &str, has_ytdlp: bool) -> AnalyzeReport {
    let classification = classify(url);

    AnalyzeReport {
        url: url.to_string(),
        is_direct: classification.is_direct,
        has_ytdlp,
        category: classification
            .category
            .filter(|_| classification.is_direct)
            .map(|c| c.to_string()),
        extension: classification.extension,
        filename: classification.filename,
    }
}

/// Direct links are answered from the URL alone; everything else goes to yt-dlp
pub async fn extract_info(
    url: &str,
    mode: PlaylistMode,
    orchestrator: &InfoExtractorOrchestrator,
) -> ExtractionOutcome {
    if is_direct_download_url(url) {
        tracing::debug!(url, "direct download");
        return ExtractionOutcome::Direct(direct_download_record(url));
    }

    orchestrator.extract(url, mode).await
}

pub fn check(url: &str, has_ytdlp: bool) -> CheckReport {
    let is_direct = is_direct_download_url(url);
    CheckReport {
        supported: is_direct || has_ytdlp,
        is_direct,
    }
}

/// Result of one command; serialized as-is, without a wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Analyze(AnalyzeReport),
    Extraction(ExtractionOutcome),
    Check(CheckReport),
}

pub async fn run(command: &Command, orchestrator: &InfoExtractorOrchestrator) -> CommandOutput {
    match command {
        Command::Analyze(args) => CommandOutput::Analyze(analyze(&args.url, orchestrator.is_available())),
        Command::Extract(args) => {
            CommandOutput::Extraction(extract_info(&args.url, PlaylistMode::Single, orchestrator).await)
        }
        Command::Playlist(args) => {
            CommandOutput::Extraction(extract_info(&args.url, PlaylistMode::Flat, orchestrator).await)
        }
        Command::Check(args) => CommandOutput::Check(check(&args.url, orchestrator.is_available())),
    }
}
