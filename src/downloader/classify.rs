// URL classification: direct file links vs pages that need extraction

use std::fmt;

use serde::Serialize;
use url::Url;

use super::filename::{sanitize_filename, DEFAULT_MAX_LENGTH, FALLBACK_NAME};
use super::models::{DirectDownloadRecord, FormatEntry};

const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "iso", "cab", "arj", "lzh", "ace",
];

const EXECUTABLE_EXTENSIONS: &[&str] = &[
    "exe", "msi", "dmg", "pkg", "deb", "rpm", "appimage", "apk", "ipa", "run", "bin", "sh", "bat",
    "cmd", "ps1",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "txt", "csv",
    "epub", "mobi",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "ico", "tiff", "tif", "psd", "ai", "raw",
    "cr2", "nef",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "wav", "flac", "ogg", "aac", "wma", "opus", "aiff", "ape", "alac",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "avi", "mov", "wmv", "flv", "m4v", "mpeg", "mpg", "3gp", "ts", "m2ts",
    "vob",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "woff", "woff2", "eot", "fon"];

const CODE_EXTENSIONS: &[&str] = &[
    "js", "py", "java", "cpp", "c", "h", "cs", "php", "rb", "go", "rs", "swift", "kt", "scala",
    "sql",
];

/// Coarse file category derived from an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Archive,
    Executable,
    Document,
    Image,
    Audio,
    Video,
    Font,
    Code,
    /// Anything else; never eligible for direct download
    File,
}

impl FileCategory {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        let table: [(&[&str], Self); 8] = [
            (ARCHIVE_EXTENSIONS, Self::Archive),
            (EXECUTABLE_EXTENSIONS, Self::Executable),
            (DOCUMENT_EXTENSIONS, Self::Document),
            (IMAGE_EXTENSIONS, Self::Image),
            (AUDIO_EXTENSIONS, Self::Audio),
            (VIDEO_EXTENSIONS, Self::Video),
            (FONT_EXTENSIONS, Self::Font),
            (CODE_EXTENSIONS, Self::Code),
        ];

        table
            .iter()
            .find(|(set, _)| set.contains(&ext.as_str()))
            .map_or(Self::File, |(_, category)| *category)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Executable => "executable",
            Self::Document => "document",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Font => "font",
            Self::Code => "code",
            Self::File => "file",
        }
    }

    pub fn is_direct_downloadable(&self) -> bool {
        !matches!(self, Self::File)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of inspecting a URL without touching the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlClassification {
    pub is_direct: bool,
    pub extension: Option<String>,
    /// Category of the extension, `File` when unrecognized
    pub category: Option<FileCategory>,
    pub filename: String,
}

/// Path component of a URL; tolerates strings `Url` refuses to parse
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_string()
        }
    }
}

/// Last path segment, percent-decoded; `"download"` when empty
pub fn filename_from_url(url: &str) -> String {
    let path = url_path(url);
    let decoded = urlencoding::decode_binary(path.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let name = decoded.rsplit('/').next().unwrap_or("");
    // Encoded '?' may surface after decoding
    let name = name.split('?').next().unwrap_or("");

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Lowercased extension, if it is alphanumeric and at most 10 characters
pub fn extension_from_url(url: &str) -> Option<String> {
    let filename = filename_from_url(url);
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();

    let valid = !ext.is_empty()
        && ext.chars().count() <= 10
        && ext.chars().all(char::is_alphanumeric);

    valid.then_some(ext)
}

pub fn classify(url: &str) -> UrlClassification {
    let extension = extension_from_url(url);
    let category = extension.as_deref().map(FileCategory::from_extension);
    let is_direct = category.is_some_and(|c| c.is_direct_downloadable());

    UrlClassification {
        is_direct,
        extension,
        category,
        filename: filename_from_url(url),
    }
}

pub fn is_direct_download_url(url: &str) -> bool {
    classify(url).is_direct
}

/// Build the single-format record for a plain file link
pub fn direct_download_record(url: &str) -> DirectDownloadRecord {
    let original_filename = filename_from_url(url);
    let ext = extension_from_url(url).unwrap_or_else(|| "bin".to_string());
    let category = FileCategory::from_extension(&ext);

    let stem = original_filename
        .rsplit_once('.')
        .map_or(original_filename.as_str(), |(stem, _)| stem);
    let clean_name = sanitize_filename(stem, DEFAULT_MAX_LENGTH);

    let protocol = if url.starts_with("https") { "https" } else { "http" };

    let format = FormatEntry {
        url: url.to_string(),
        protocol: protocol.to_string(),
        ext: ext.clone(),
        format: Some(format!("{}/{}", category, ext)),
        filename: Some(clean_name.clone()),
        video_ext: (category == FileCategory::Video).then(|| ext.clone()),
        audio_ext: (category == FileCategory::Audio).then(|| ext.clone()),
        ..FormatEntry::default()
    };

    DirectDownloadRecord {
        id: clean_name.clone(),
        title: clean_name,
        original_title: original_filename,
        webpage_url: url.to_string(),
        formats: vec![format],
        category: category.to_string(),
        direct_download: true,
    }
}
