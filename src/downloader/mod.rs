// Downloader module - normalizes direct links and media pages into format lists

pub mod classify;
pub mod errors;
pub mod extractors;
pub mod filename;
pub mod format_selector;
pub mod models;
pub mod tools;
pub mod transform;
pub mod utils;

pub use classify::{classify, direct_download_record, is_direct_download_url, FileCategory, UrlClassification};
pub use errors::BridgeError;
pub use extractors::{ExtractorConfig, InfoExtractor, InfoExtractorOrchestrator, PlaylistMode};
pub use filename::sanitize_filename;
pub use format_selector::{FormatSelector, ReconciledFormat};
pub use models::ExtractionOutcome;
