// Filename sanitizing: arbitrary titles -> safe ASCII file names

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const FALLBACK_NAME: &str = "download";

/// Manual substitutions used when plain decomposition loses most of a title.
/// Applied in order; add rows here rather than new branches.
const MANUAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    // Turkish
    ("\u{011f}", "g"),
    ("\u{011e}", "G"),
    ("\u{0131}", "i"),
    ("\u{0130}", "I"),
    ("\u{015f}", "s"),
    ("\u{015e}", "S"),
    ("\u{00fc}", "u"),
    ("\u{00dc}", "U"),
    ("\u{00f6}", "o"),
    ("\u{00d6}", "O"),
    ("\u{00e7}", "c"),
    ("\u{00c7}", "C"),
    // German
    ("\u{00e4}", "ae"),
    ("\u{00c4}", "Ae"),
    ("\u{00df}", "ss"),
    // French / Spanish
    ("\u{00e9}", "e"),
    ("\u{00e8}", "e"),
    ("\u{00ea}", "e"),
    ("\u{00eb}", "e"),
    ("\u{00e0}", "a"),
    ("\u{00e1}", "a"),
    ("\u{00e2}", "a"),
    ("\u{00f1}", "n"),
    ("\u{00d1}", "N"),
    // Typography
    ("\u{2019}", "'"),
    ("\u{2018}", "'"),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("\u{2026}", "..."),
    ("\u{00a9}", "(c)"),
    ("\u{00ae}", "(r)"),
    ("\u{2122}", "(tm)"),
];

lazy_static::lazy_static! {
    // Windows-invalid characters plus C0 controls
    static ref INVALID_CHARS_RE: Regex = Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap();
    static ref SEPARATOR_RUN_RE: Regex = Regex::new(r"[\s_]+").unwrap();
}

/// NFKD-decompose and drop everything outside ASCII
fn to_ascii(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

fn apply_manual_substitutions(text: &str) -> String {
    MANUAL_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn trim_edges(text: &str) -> &str {
    text.trim_matches(|c: char| c == '_' || c == '.' || c == ' ')
}

/// Convert a title into a non-empty, filesystem-safe ASCII name of at most
/// `max_length` characters. Returns [`FALLBACK_NAME`] when nothing survives.
pub fn sanitize_filename(title: &str, max_length: usize) -> String {
    if title.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let mut ascii = to_ascii(title);

    // Under 30% survived decomposition: retry after the manual table
    let original_len = title.chars().count();
    if (ascii.chars().count() as f64) < original_len as f64 * 0.3 {
        ascii = to_ascii(&apply_manual_substitutions(title));
    }

    let stripped = INVALID_CHARS_RE.replace_all(&ascii, "");
    let collapsed = SEPARATOR_RUN_RE.replace_all(&stripped, "_");
    let mut clean = trim_edges(&collapsed).to_string();

    if clean.len() > max_length {
        // Pure ASCII at this point, byte and char boundaries coincide
        clean.truncate(max_length);
        clean = trim_edges(&clean).to_string();
    }

    if clean.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    clean
}

/// Per-format file name: `<title>[_<height>p][_[<id>]]`
pub fn format_filename(clean_title: &str, height: Option<u32>, video_id: Option<&str>) -> String {
    let mut parts = vec![clean_title.to_string()];

    if let Some(h) = height.filter(|h| *h > 0) {
        parts.push(format!("{}p", h));
    }

    if let Some(id) = video_id.filter(|id| !id.is_empty() && id.chars().count() <= 12) {
        parts.push(format!("[{}]", id));
    }

    parts.join("_")
}
