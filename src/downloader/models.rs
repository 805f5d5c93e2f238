// Data models: raw yt-dlp records in, normalized download-manager records out

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

/// Read a codec-like marker. yt-dlp writes the string "none" when a stream is
/// absent; that, null, a missing key and the empty string all map to `None`.
fn real_codec(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|v| !v.is_empty() && *v != "none")
        .map(|v| v.to_string())
}

fn opt_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opt_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

fn opt_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

/// One segment of a fragmented (DASH/HLS) stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub path: String,
}

/// One candidate stream as reported by the extractor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormat {
    pub url: Option<String>,
    pub protocol: Option<String>,
    /// Container extension (mp4, webm, m4a, mhtml, ...)
    pub ext: Option<String>,
    /// Video codec, `None` when the stream carries no video
    pub vcodec: Option<String>,
    /// Audio codec, `None` when the stream carries no audio
    pub acodec: Option<String>,
    /// Audio container, `None` when yt-dlp reports no audio
    pub audio_ext: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Total bitrate in kbps
    pub tbr: Option<f64>,
    /// Audio bitrate in kbps
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub quality: Option<f64>,
    pub preference: Option<f64>,
    pub language: Option<String>,
    pub language_preference: Option<i64>,
    pub http_headers: BTreeMap<String, String>,
    pub fragment_base_url: Option<String>,
    pub fragments: Vec<Fragment>,
    pub manifest_url: Option<String>,
}

impl RawFormat {
    pub fn from_json(f: &Value) -> Self {
        let http_headers = f["http_headers"]
            .as_object()
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let fragments = f["fragments"]
            .as_array()
            .map(|frags| {
                frags
                    .iter()
                    .map(|frag| Fragment {
                        path: frag["path"]
                            .as_str()
                            .or_else(|| frag["url"].as_str())
                            .unwrap_or("")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            url: f["url"].as_str().filter(|u| !u.is_empty()).map(|s| s.to_string()),
            protocol: f["protocol"].as_str().map(|s| s.to_string()),
            ext: f["ext"].as_str().map(|s| s.to_string()),
            vcodec: real_codec(&f["vcodec"]),
            acodec: real_codec(&f["acodec"]),
            audio_ext: real_codec(&f["audio_ext"]),
            width: opt_u64(&f["width"]).map(|w| w as u32),
            height: opt_u64(&f["height"]).map(|h| h as u32),
            fps: f["fps"].as_f64(),
            tbr: f["tbr"].as_f64(),
            abr: f["abr"].as_f64(),
            filesize: opt_u64(&f["filesize"]),
            filesize_approx: opt_u64(&f["filesize_approx"]),
            quality: f["quality"].as_f64(),
            preference: f["preference"].as_f64(),
            language: f["language"].as_str().map(|s| s.to_string()),
            language_preference: f["language_preference"].as_i64(),
            http_headers,
            fragment_base_url: f["fragment_base_url"].as_str().map(|s| s.to_string()),
            fragments,
            manifest_url: f["manifest_url"].as_str().map(|s| s.to_string()),
        }
    }

    pub fn has_video(&self) -> bool {
        self.vcodec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.is_some()
    }

    /// Video and audio muxed in one stream
    pub fn is_combined(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// Storyboard / contact-sheet pseudo formats
    pub fn is_storyboard(&self) -> bool {
        self.ext.as_deref() == Some("mhtml") || self.vcodec.as_deref() == Some("images")
    }

    /// Exact size, or the extractor's estimate
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    pub fn ext_or_default(&self) -> &str {
        self.ext.as_deref().unwrap_or("mp4")
    }
}

/// A subtitle track as listed by the extractor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleTrack {
    pub name: String,
    pub url: String,
    pub ext: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    pub preference: i64,
}

/// One JSON record printed by yt-dlp: a single item or a playlist container
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// `_type` discriminant ("playlist", "url", "video", ...)
    pub kind: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
    pub duration: Option<Number>,
    pub upload_date: Option<String>,
    /// `None` when the record carries no `formats` list at all
    pub formats: Option<Vec<RawFormat>>,
    /// The record itself read as a format, for single-file pages
    pub as_format: RawFormat,
    pub subtitles: BTreeMap<String, Vec<SubtitleTrack>>,
    pub thumbnails: Vec<Thumbnail>,
    pub entries: Vec<RawRecord>,
    pub playlist_title: Option<String>,
    pub playlist: Option<String>,
}

impl RawRecord {
    pub fn from_json(json: &Value) -> Self {
        let formats = json["formats"]
            .as_array()
            .map(|list| list.iter().map(RawFormat::from_json).collect());

        let mut subtitles = BTreeMap::new();
        if let Some(langs) = json["subtitles"].as_object() {
            for (lang, subs) in langs {
                let Some(subs) = subs.as_array().filter(|s| !s.is_empty()) else {
                    continue;
                };
                let tracks = subs
                    .iter()
                    .map(|sub| SubtitleTrack {
                        name: sub["name"].as_str().unwrap_or(lang).to_string(),
                        url: sub["url"].as_str().unwrap_or("").to_string(),
                        ext: sub["ext"].as_str().unwrap_or("vtt").to_string(),
                    })
                    .collect();
                subtitles.insert(lang.clone(), tracks);
            }
        }

        let thumbnails = json["thumbnails"]
            .as_array()
            .map(|thumbs| {
                thumbs
                    .iter()
                    .filter_map(|t| {
                        let url = t["url"].as_str().filter(|u| !u.is_empty())?;
                        Some(Thumbnail {
                            url: url.to_string(),
                            width: t["width"].as_u64(),
                            height: t["height"].as_u64(),
                            preference: t["preference"].as_f64().map_or(0, |p| p as i64),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entries = json["entries"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter(|e| e.is_object())
                    .map(RawRecord::from_json)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            kind: json["_type"].as_str().map(|s| s.to_string()),
            id: opt_string(&json["id"]),
            title: json["title"].as_str().map(|s| s.to_string()),
            webpage_url: json["webpage_url"].as_str().map(|s| s.to_string()),
            url: json["url"].as_str().map(|s| s.to_string()),
            duration: opt_number(&json["duration"]),
            upload_date: opt_string(&json["upload_date"]),
            formats,
            as_format: RawFormat::from_json(json),
            subtitles,
            thumbnails,
            entries,
            playlist_title: json["playlist_title"].as_str().map(|s| s.to_string()),
            playlist: json["playlist"].as_str().map(|s| s.to_string()),
        }
    }

    pub fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist")
    }
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

/// One downloadable format as handed to the download manager
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatEntry {
    pub url: String,
    pub protocol: String,
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    pub quality: i64,
    pub preference: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbr: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abr: Option<f64>,

    /// Human-readable label, e.g. "1080p 60fps 128kbps [45.3MB] (mp4)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "_filename", skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Video and audio come from different streams; the consumer must fetch
    /// `_audio_url` as well and mux both
    #[serde(rename = "_needs_merge", skip_serializing_if = "std::ops::Not::not")]
    pub needs_merge: bool,
    #[serde(rename = "_audio_url", skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Last-resort silent video, only offered when nothing with audio exists
    #[serde(rename = "_video_only", skip_serializing_if = "std::ops::Not::not")]
    pub video_only: bool,
    #[serde(rename = "_quality_score", skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "languagePreference", skip_serializing_if = "Option::is_none")]
    pub language_preference: Option<i64>,
    #[serde(rename = "httpHeaders", skip_serializing_if = "BTreeMap::is_empty")]
    pub http_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_base_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
    #[serde(rename = "manifestUrl", skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
}

impl FormatEntry {
    pub fn has_video(&self) -> bool {
        self.vcodec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.is_some()
    }
}

/// Informational note attached when extraction worked but nothing is usable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoFormatsNote {
    #[serde(rename = "_error")]
    pub error: String,
    #[serde(rename = "_ytdlp_version")]
    pub ytdlp_version: Option<String>,
    #[serde(rename = "_hint")]
    pub hint: String,
}

impl NoFormatsNote {
    pub fn new(ytdlp_version: Option<String>) -> Self {
        Self {
            error: "No downloadable formats found".to_string(),
            ytdlp_version,
            hint: "Try updating yt-dlp: yt-dlp -U".to_string(),
        }
    }
}

/// Normalized description of a single playable item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub id: String,
    /// Sanitized, filesystem-safe title
    pub title: String,
    /// Unmodified title for display
    pub original_title: String,
    pub webpage_url: String,
    pub duration: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    pub formats: Vec<FormatEntry>,
    pub subtitles: BTreeMap<String, Vec<SubtitleTrack>>,
    pub thumbnails: Vec<Thumbnail>,
    #[serde(flatten)]
    pub note: Option<NoFormatsNote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Url,
}

/// Lightweight reference to one playlist item; formats are not resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistEntry {
    #[serde(rename = "_type")]
    pub kind: EntryKind,
    pub url: String,
    pub title: String,
    pub duration: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub webpage_url: String,
    pub entries: Vec<PlaylistEntry>,
}

/// A plain file URL recognized by its extension; no extractor involved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectDownloadRecord {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub webpage_url: String,
    pub formats: Vec<FormatEntry>,
    pub category: String,
    pub direct_download: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub error: String,
}

/// Exactly one of these is produced per extraction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_type", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Video(NormalizedRecord),
    Playlist(PlaylistRecord),
    Direct(DirectDownloadRecord),
    Error(ErrorRecord),
}

impl ExtractionOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorRecord {
            error: message.into(),
        })
    }
}
