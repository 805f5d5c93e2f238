// Error types for the extraction bridge

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// yt-dlp is neither on PATH nor in any well-known install location
    #[error("yt-dlp not found. Install it for media extraction support.")]
    ToolNotFound,

    /// The tool ran longer than its allotted time and was killed
    #[error("Extraction timeout ({seconds}s)")]
    Timeout { seconds: u64 },

    /// The tool could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading pipes or waiting for the child failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Non-zero exit with nothing on stdout; carries the trimmed stderr text
    #[error("{}", stderr_or_unknown(.0))]
    ToolFailed(String),

    /// The tool exited but printed nothing
    #[error("No data returned from yt-dlp")]
    EmptyOutput,

    /// Output was present but no line parsed as a JSON object
    #[error("Failed to parse yt-dlp output")]
    Unparseable,
}

fn stderr_or_unknown(stderr: &str) -> &str {
    if stderr.is_empty() {
        "Unknown error"
    } else {
        stderr
    }
}

impl BridgeError {
    /// Build a tool failure from raw stderr bytes
    pub fn from_stderr(stderr: &[u8]) -> Self {
        Self::ToolFailed(String::from_utf8_lossy(stderr).trim().to_string())
    }
}
