// InfoExtractor module - yt-dlp info extraction
//
// - traits: the replaceable `InfoExtractor` seam and its configuration
// - cli: the native `yt-dlp` binary implementation
// - orchestrator: runs an extractor and turns its output into one outcome

mod cli;
mod orchestrator;
mod traits;

pub use cli::CliInfoExtractor;
pub use orchestrator::InfoExtractorOrchestrator;
pub use traits::{ExtractorConfig, InfoExtractor, PlaylistMode, ToolOutput, TIMEOUT_ENV, YTDLP_PATH_ENV};
