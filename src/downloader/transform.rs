// Record transformer: raw yt-dlp records into the download-manager shape

use time::{Date, Month};

use super::filename::{format_filename, sanitize_filename, DEFAULT_MAX_LENGTH};
use super::format_selector::{FormatSelector, ReconciledFormat};
use super::models::{
    EntryKind, ExtractionOutcome, FormatEntry, NoFormatsNote, NormalizedRecord, PlaylistEntry,
    PlaylistRecord, RawRecord,
};
use super::utils::format_filesize;

const DEFAULT_TITLE: &str = "Unknown Title";
const DEFAULT_ENTRY_TITLE: &str = "Unknown";
const DEFAULT_PLAYLIST_TITLE: &str = "Playlist";

const PASSTHROUGH_PROTOCOLS: &[&str] = &["http", "https", "m3u8_native", "http_dash_segments"];

/// Transform one record: a playlist container or a single playable item
pub fn transform_single(record: &RawRecord) -> ExtractionOutcome {
    if record.is_playlist() {
        return ExtractionOutcome::Playlist(transform_playlist_info(record));
    }

    let original_title = record
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let clean_title = sanitize_filename(&original_title, DEFAULT_MAX_LENGTH);
    let id = record.id.clone().unwrap_or_default();

    // A page that is itself the media file
    let raw_formats = match &record.formats {
        Some(formats) if !formats.is_empty() => formats.clone(),
        _ if record.url.is_some() => vec![record.as_format.clone()],
        _ => Vec::new(),
    };

    let reconciled = FormatSelector::reconcile(&raw_formats);
    tracing::debug!(
        raw = raw_formats.len(),
        kept = reconciled.len(),
        "reconciled formats"
    );

    let entries: Vec<FormatEntry> = reconciled
        .iter()
        .map(|fmt| format_entry(fmt, &clean_title, &id))
        .collect();

    let playable: Vec<FormatEntry> = entries
        .iter()
        .filter(|f| f.has_audio() || f.audio_ext.is_some() || f.video_only)
        .cloned()
        .collect();
    let formats = if playable.is_empty() { entries } else { playable };

    let note = if formats.is_empty() {
        tracing::warn!(id = %id, "no downloadable formats");
        Some(NoFormatsNote::new(None))
    } else {
        None
    };

    ExtractionOutcome::Video(NormalizedRecord {
        id,
        title: clean_title,
        original_title,
        webpage_url: record
            .webpage_url
            .clone()
            .or_else(|| record.url.clone())
            .unwrap_or_default(),
        duration: record.duration.clone(),
        upload_date: record.upload_date.as_deref().and_then(normalize_upload_date),
        formats,
        subtitles: record.subtitles.clone(),
        thumbnails: record.thumbnails.clone(),
        note,
    })
}

/// Flatten a playlist container's own `entries`
pub fn transform_playlist_info(record: &RawRecord) -> PlaylistRecord {
    let entries = record
        .entries
        .iter()
        .map(|entry| PlaylistEntry {
            kind: EntryKind::Url,
            url: entry
                .url
                .clone()
                .or_else(|| entry.webpage_url.clone())
                .unwrap_or_default(),
            title: entry
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_ENTRY_TITLE.to_string()),
            duration: entry.duration.clone(),
        })
        .collect();

    PlaylistRecord {
        id: Some(record.id.clone().unwrap_or_default()),
        title: record
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_PLAYLIST_TITLE.to_string()),
        webpage_url: record.webpage_url.clone().unwrap_or_default(),
        entries,
    }
}

/// Several independent records (flat-playlist output) as one playlist.
/// The first record that is itself a playlist replaces the whole result.
pub fn transform_playlist(records: &[RawRecord], source_url: &str) -> PlaylistRecord {
    let mut entries = Vec::with_capacity(records.len());
    let mut title = DEFAULT_PLAYLIST_TITLE.to_string();

    for record in records {
        if record.is_playlist() {
            return transform_playlist_info(record);
        }

        entries.push(PlaylistEntry {
            kind: EntryKind::Url,
            url: record
                .webpage_url
                .clone()
                .or_else(|| record.url.clone())
                .unwrap_or_default(),
            title: record
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_ENTRY_TITLE.to_string()),
            duration: record.duration.clone(),
        });

        if title == DEFAULT_PLAYLIST_TITLE {
            let found = [&record.playlist_title, &record.playlist]
                .into_iter()
                .flatten()
                .find(|t| !t.is_empty());
            if let Some(found) = found {
                title = found.clone();
            }
        }
    }

    PlaylistRecord {
        id: None,
        title,
        webpage_url: source_url.to_string(),
        entries,
    }
}

/// `YYYYMMDD` into `YYYY-MM-DD`; anything that is not a real date is dropped
pub fn normalize_upload_date(raw: &str) -> Option<String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = raw[..4].parse().ok()?;
    let month: u8 = raw[4..6].parse().ok()?;
    let day: u8 = raw[6..].parse().ok()?;
    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;

    Some(format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    ))
}

fn normalize_protocol(protocol: Option<&str>, url: &str, ext: Option<&str>) -> String {
    let protocol = protocol.unwrap_or("https");
    if PASSTHROUGH_PROTOCOLS.contains(&protocol) {
        protocol.to_string()
    } else if url.contains("m3u8") || ext == Some("m3u8") {
        "m3u8_native".to_string()
    } else if url.starts_with("https") {
        "https".to_string()
    } else {
        "http".to_string()
    }
}

/// Build the output entry for one reconciled format
pub fn format_entry(reconciled: &ReconciledFormat, clean_title: &str, video_id: &str) -> FormatEntry {
    let fmt = &reconciled.format;
    let url = fmt.url.clone().unwrap_or_default();
    let ext = fmt.ext_or_default().to_string();
    let protocol = normalize_protocol(fmt.protocol.as_deref(), &url, fmt.ext.as_deref());
    let filesize = fmt.effective_size().filter(|size| *size > 0);

    let has_video = fmt.has_video();
    let has_audio = reconciled.has_audio();

    let mut entry = FormatEntry {
        url: url.clone(),
        protocol: protocol.clone(),
        ext: ext.clone(),
        filesize,
        quality: fmt.quality.map_or(0, |q| q as i64),
        preference: fmt.preference.map_or(0, |p| p as i64),
        tbr: fmt.tbr,
        needs_merge: reconciled.needs_merge(),
        audio_url: reconciled.merge_audio_url.clone(),
        video_only: reconciled.video_only,
        quality_score: Some(reconciled.quality_score),
        http_headers: fmt.http_headers.clone(),
        ..FormatEntry::default()
    };

    if has_video {
        entry.video_ext = Some(ext.clone());
        entry.vcodec = fmt.vcodec.clone();
        entry.height = fmt.height;
        entry.width = fmt.width;
        entry.fps = fmt.fps;
    }

    if has_audio {
        entry.audio_ext = if has_video && !reconciled.needs_merge() {
            // Muxed stream: the audio lives in the video container
            Some(ext.clone())
        } else {
            fmt.audio_ext.clone().or_else(|| Some(ext.clone()))
        };
        entry.acodec = fmt.acodec.clone().or_else(|| Some("aac".to_string()));
        entry.abr = fmt.abr;
    }

    entry.format = format_label(reconciled, &ext, filesize);
    entry.filename = Some(format_filename(
        clean_title,
        fmt.height,
        Some(video_id).filter(|id| !id.is_empty()),
    ));

    if let Some(language) = &fmt.language {
        entry.language = Some(language.clone());
        entry.language_preference = Some(fmt.language_preference.unwrap_or(0));
    }

    if protocol == "http_dash_segments" {
        entry.container = Some(format!("{}_dash", ext));
    }

    if !fmt.fragments.is_empty() {
        entry.fragment_base_url = Some(fmt.fragment_base_url.clone().unwrap_or_default());
        entry.fragments = fmt.fragments.clone();
    }

    if protocol == "m3u8_native" {
        entry.manifest_url = Some(fmt.manifest_url.clone().unwrap_or(url));
    }

    entry
}

/// "1080p 60fps 128kbps [45.3MB] (mp4)"; parts without a value are left out
fn format_label(reconciled: &ReconciledFormat, ext: &str, filesize: Option<u64>) -> Option<String> {
    let fmt = &reconciled.format;
    let mut parts = Vec::new();

    if fmt.has_video() {
        if let Some(height) = fmt.height.filter(|h| *h > 0) {
            parts.push(format!("{}p", height));
        }
        let fps = fmt.fps.map_or(0, |f| f as i64);
        if fps >= 60 {
            parts.push(format!("{}fps", fps));
        }
    }

    if reconciled.has_audio() {
        let abr = fmt.abr.map_or(0, |a| a as i64);
        if abr > 0 {
            parts.push(format!("{}kbps", abr));
        }
    }

    if let Some(size) = filesize {
        parts.push(format!("[{}]", format_filesize(size)));
    }

    (!parts.is_empty()).then(|| format!("{} ({})", parts.join(" "), ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        RawRecord::from_json(&value)
    }

    fn video(outcome: ExtractionOutcome) -> NormalizedRecord {
        match outcome {
            ExtractionOutcome::Video(rec) => rec,
            other => panic!("expected a video record, got {:?}", other),
        }
    }

    #[test]
    fn test_merged_video_and_audio_entries() {
        let rec = video(transform_single(&record(json!({
            "id": "abc123",
            "title": "My Clip",
            "webpage_url": "https://site/watch?v=abc123",
            "formats": [
                {"url": "A", "height": 1080, "vcodec": "avc1", "acodec": "none", "ext": "mp4", "fps": 60, "filesize": 47_500_000},
                {"url": "B", "vcodec": "none", "acodec": "aac", "abr": 128.0, "ext": "m4a"}
            ]
        }))));

        assert_eq!(rec.title, "My_Clip");
        assert_eq!(rec.original_title, "My Clip");
        assert_eq!(rec.formats.len(), 2);

        let merged = &rec.formats[0];
        assert_eq!(merged.url, "A");
        assert!(merged.needs_merge);
        assert_eq!(merged.audio_url.as_deref(), Some("B"));
        assert_eq!(merged.audio_ext.as_deref(), Some("m4a"));
        assert_eq!(merged.video_ext.as_deref(), Some("mp4"));
        assert_eq!(merged.format.as_deref(), Some("1080p 60fps 128kbps [45.3MB] (mp4)"));
        assert_eq!(merged.filename.as_deref(), Some("My_Clip_1080p_[abc123]"));

        let audio = &rec.formats[1];
        assert_eq!(audio.url, "B");
        assert_eq!(audio.preference, -50);
        assert_eq!(audio.vcodec, None);
        assert_eq!(audio.audio_ext.as_deref(), Some("m4a"));
        assert_eq!(audio.format.as_deref(), Some("128kbps (m4a)"));
        assert!(rec.note.is_none());
    }

    #[test]
    fn test_combined_stream_reports_container_as_audio_ext() {
        let rec = video(transform_single(&record(json!({
            "id": "x",
            "title": "t",
            "formats": [{"url": "C", "height": 360, "vcodec": "avc1", "acodec": "mp4a", "ext": "mp4", "audio_ext": "m4a"}]
        }))));
        let entry = &rec.formats[0];
        assert_eq!(entry.audio_ext.as_deref(), Some("mp4"));
        assert!(!entry.needs_merge);
        assert_eq!(entry.quality_score, Some(100_000 + 3600 + 500));
    }

    #[test]
    fn test_implicit_format_from_top_level_url() {
        let rec = video(transform_single(&record(json!({
            "id": "clip",
            "title": "Clip",
            "url": "https://cdn/clip.m3u8",
            "ext": "mp4",
            "vcodec": "avc1",
            "acodec": "aac",
            "height": 720,
            "protocol": "m3u8"
        }))));
        assert_eq!(rec.webpage_url, "https://cdn/clip.m3u8");
        assert_eq!(rec.formats.len(), 1);
        let entry = &rec.formats[0];
        assert_eq!(entry.protocol, "m3u8_native");
        assert_eq!(entry.manifest_url.as_deref(), Some("https://cdn/clip.m3u8"));
    }

    #[test]
    fn test_no_formats_is_a_soft_failure() {
        let rec = video(transform_single(&record(json!({
            "id": "gone",
            "title": "Gone",
            "formats": [{"url": "https://sb", "ext": "mhtml", "vcodec": "none", "acodec": "none"}]
        }))));
        assert!(rec.formats.is_empty());
        let note = rec.note.as_ref().expect("note");
        assert_eq!(note.error, "No downloadable formats found");

        let value = serde_json::to_value(ExtractionOutcome::Video(rec)).unwrap();
        assert_eq!(value["_type"], "video");
        assert_eq!(value["_error"], "No downloadable formats found");
        assert_eq!(value["_ytdlp_version"], Value::Null);
        assert_eq!(value["_hint"], "Try updating yt-dlp: yt-dlp -U");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let rec = video(transform_single(&record(json!({"formats": []}))));
        assert_eq!(rec.id, "");
        assert_eq!(rec.original_title, "Unknown Title");
        assert_eq!(rec.title, "Unknown_Title");
        assert_eq!(rec.webpage_url, "");
        assert_eq!(rec.upload_date, None);
    }

    #[test]
    fn test_upload_date_normalization() {
        assert_eq!(normalize_upload_date("20240131").as_deref(), Some("2024-01-31"));
        assert_eq!(normalize_upload_date("2024013"), None);
        assert_eq!(normalize_upload_date("2024-1-31"), None);
        assert_eq!(normalize_upload_date("20241301"), None);
        assert_eq!(normalize_upload_date("20230229"), None);
        assert_eq!(normalize_upload_date("20240229").as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_protocol_normalization() {
        assert_eq!(normalize_protocol(None, "https://a", None), "https");
        assert_eq!(normalize_protocol(Some("http_dash_segments"), "https://a", None), "http_dash_segments");
        assert_eq!(normalize_protocol(Some("m3u8"), "https://a/x.m3u8", None), "m3u8_native");
        assert_eq!(normalize_protocol(Some("ftp"), "https://a/x", Some("m3u8")), "m3u8_native");
        assert_eq!(normalize_protocol(Some("rtmp"), "rtmp://a/x", None), "http");
        assert_eq!(normalize_protocol(Some("f4m"), "https://a/x", None), "https");
    }

    #[test]
    fn test_dash_fragments_language_and_headers() {
        let rec = video(transform_single(&record(json!({
            "id": "d",
            "title": "Dash",
            "formats": [{
                "url": "https://cdn/init.mp4",
                "protocol": "http_dash_segments",
                "ext": "mp4",
                "vcodec": "avc1",
                "acodec": "mp4a",
                "height": 480,
                "language": "en",
                "http_headers": {"Referer": "https://site"},
                "fragment_base_url": "https://cdn/",
                "fragments": [{"path": "seg-1.m4s"}, {"path": "seg-2.m4s"}]
            }]
        }))));
        let entry = &rec.formats[0];
        assert_eq!(entry.container.as_deref(), Some("mp4_dash"));
        assert_eq!(entry.fragment_base_url.as_deref(), Some("https://cdn/"));
        assert_eq!(entry.fragments.len(), 2);
        assert_eq!(entry.language.as_deref(), Some("en"));
        assert_eq!(entry.language_preference, Some(0));

        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["httpHeaders"]["Referer"], "https://site");
        assert_eq!(value["languagePreference"], 0);
        assert!(value.get("manifestUrl").is_none());
        assert!(value.get("_needs_merge").is_none());
    }

    #[test]
    fn test_label_omits_absent_parts() {
        let rec = video(transform_single(&record(json!({
            "id": "a-very-long-identifier",
            "title": "Song",
            "formats": [{"url": "S", "vcodec": "none", "acodec": "opus", "ext": "webm"}]
        }))));
        let entry = &rec.formats[0];
        assert_eq!(entry.format, None);
        // ids longer than 12 characters are not appended
        assert_eq!(entry.filename.as_deref(), Some("Song"));
    }

    #[test]
    fn test_playlist_container_record() {
        let outcome = transform_single(&record(json!({
            "_type": "playlist",
            "id": "PL1",
            "webpage_url": "https://site/list",
            "entries": [
                {"url": "https://site/v/1", "title": "One", "duration": 61},
                {"webpage_url": "https://site/v/2"}
            ]
        })));
        let ExtractionOutcome::Playlist(list) = outcome else {
            panic!("expected playlist");
        };
        assert_eq!(list.id.as_deref(), Some("PL1"));
        assert_eq!(list.title, "Playlist");
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[0].title, "One");
        assert_eq!(list.entries[1].url, "https://site/v/2");
        assert_eq!(list.entries[1].title, "Unknown");
    }

    #[test]
    fn test_multiple_records_become_playlist() {
        let records = vec![
            record(json!({"url": "https://site/v/1", "title": "One", "playlist_title": "Mix"})),
            record(json!({"webpage_url": "https://site/v/2", "title": "Two", "duration": 12.5})),
        ];
        let list = transform_playlist(&records, "https://site/list");
        assert_eq!(list.id, None);
        assert_eq!(list.title, "Mix");
        assert_eq!(list.webpage_url, "https://site/list");
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[0].url, "https://site/v/1");
        assert_eq!(list.entries[1].url, "https://site/v/2");

        let value = serde_json::to_value(&list.entries[1]).unwrap();
        assert_eq!(value, json!({"_type": "url", "url": "https://site/v/2", "title": "Two", "duration": 12.5}));
    }

    #[test]
    fn test_empty_playlist_title_is_skipped() {
        let records = vec![
            record(json!({"url": "u1", "playlist_title": ""})),
            record(json!({"url": "u2", "playlist_title": "", "playlist": "Road Trip"})),
        ];
        assert_eq!(transform_playlist(&records, "src").title, "Road Trip");
    }

    #[test]
    fn test_fractional_heights_keep_separate_entries() {
        let rec = video(transform_single(&record(json!({
            "id": "f",
            "title": "Float",
            "formats": [
                {"url": "A", "height": 720.0, "vcodec": "avc1", "acodec": "mp4a", "ext": "mp4"},
                {"url": "B", "height": 1080.0, "vcodec": "avc1", "acodec": "mp4a", "ext": "mp4"}
            ]
        }))));
        let heights: Vec<_> = rec.formats.iter().map(|f| f.height).collect();
        assert_eq!(heights, vec![Some(1080), Some(720)]);
        assert_eq!(rec.formats[0].filename.as_deref(), Some("Float_1080p_[f]"));
    }

    #[test]
    fn test_multiple_records_default_title() {
        let records = vec![record(json!({"url": "u1"})), record(json!({"url": "u2"}))];
        assert_eq!(transform_playlist(&records, "src").title, "Playlist");
    }

    #[test]
    fn test_nested_playlist_discards_earlier_entries() {
        // Known quirk: the first nested playlist replaces the result, so
        // entries seen before it (and records after it) are lost
        let records = vec![
            record(json!({"url": "https://site/v/0", "title": "Loose"})),
            record(json!({"_type": "playlist", "id": "inner", "title": "Inner", "entries": [{"url": "https://site/v/9"}]})),
            record(json!({"url": "https://site/v/10", "title": "After"})),
        ];
        let list = transform_playlist(&records, "https://site/list");
        assert_eq!(list.id.as_deref(), Some("inner"));
        assert_eq!(list.title, "Inner");
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].url, "https://site/v/9");
    }
}
