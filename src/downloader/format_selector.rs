// FormatSelector - format reconciliation
//
// Reduces the raw candidate list from yt-dlp to a minimal, ranked set that a
// download manager can use directly:
// - Drops storyboards and URL-less entries
// - Pairs every video-only stream with the best audio-only stream
// - Keeps one format per resolution, and only if it carries audio
// - Keeps one audio-only format at the end for music downloads

use std::collections::HashSet;

use super::models::RawFormat;

const COMBINED_BONUS: i64 = 100_000;
const AUDIO_ONLY_PREFERENCE_PENALTY: i64 = 50;

/// One surviving format, possibly synthesized from a video and an audio stream
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledFormat {
    /// The stream itself; for merged entries the video stream with the
    /// companion's codec, bitrate and container overlaid
    pub format: RawFormat,
    /// Companion audio stream the consumer must fetch and mux
    pub merge_audio_url: Option<String>,
    /// Silent video offered only because nothing with audio exists
    pub video_only: bool,
    pub quality_score: i64,
}

impl ReconciledFormat {
    fn new(format: RawFormat) -> Self {
        Self {
            format,
            merge_audio_url: None,
            video_only: false,
            quality_score: 0,
        }
    }

    pub fn needs_merge(&self) -> bool {
        self.merge_audio_url.is_some()
    }

    pub fn has_video(&self) -> bool {
        self.format.has_video()
    }

    /// Embedded audio, or audio information merged in from a companion stream
    pub fn has_audio(&self) -> bool {
        self.format.has_audio() || self.format.audio_ext.is_some()
    }
}

/// Format selector with quality ranking
pub struct FormatSelector;

impl FormatSelector {
    /// Reconcile raw formats into a deduplicated, ranked list.
    /// Deterministic for a given input order.
    pub fn reconcile(formats: &[RawFormat]) -> Vec<ReconciledFormat> {
        let mut combined = Vec::new();
        let mut video_only = Vec::new();
        let mut audio_only = Vec::new();

        for fmt in formats {
            if fmt.url.is_none() || fmt.is_storyboard() {
                continue;
            }

            if fmt.is_combined() {
                combined.push(fmt);
            } else if fmt.has_video() {
                video_only.push(fmt);
            } else if fmt.has_audio() {
                audio_only.push(fmt);
            }
        }

        let mut candidates: Vec<ReconciledFormat> = combined
            .iter()
            .map(|fmt| ReconciledFormat::new((*fmt).clone()))
            .collect();

        if !video_only.is_empty() && !audio_only.is_empty() {
            // Best bitrate first; stable, so the earliest wins a tie
            audio_only.sort_by(|a, b| Self::audio_bitrate(b).total_cmp(&Self::audio_bitrate(a)));
            let best_audio = audio_only[0];
            for vfmt in &video_only {
                candidates.push(Self::pair_with_audio(vfmt, best_audio));
            }
        }

        if candidates.is_empty() {
            for vfmt in &video_only {
                let mut fallback = ReconciledFormat::new((*vfmt).clone());
                fallback.video_only = true;
                candidates.push(fallback);
            }
        }

        for afmt in &audio_only {
            let mut audio = (*afmt).clone();
            let preference = audio.preference.map_or(0, |p| p as i64);
            audio.preference = Some((preference - AUDIO_ONLY_PREFERENCE_PENALTY) as f64);
            candidates.push(ReconciledFormat::new(audio));
        }

        for candidate in &mut candidates {
            candidate.quality_score = Self::quality_score(&candidate.format);
        }
        // Stable: equal scores keep input order
        candidates.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));

        Self::deduplicate(candidates)
    }

    /// Copy a video-only stream and overlay the audio stream's details
    fn pair_with_audio(video: &RawFormat, audio: &RawFormat) -> ReconciledFormat {
        let mut merged = video.clone();
        merged.acodec = audio.acodec.clone();
        merged.abr = audio.abr;
        merged.audio_ext = Some(audio.ext.clone().unwrap_or_else(|| "m4a".to_string()));

        ReconciledFormat {
            format: merged,
            merge_audio_url: audio.url.clone(),
            video_only: false,
            quality_score: 0,
        }
    }

    /// One video format per height, only with audio unless no video with
    /// audio exists at all; then the single best audio-only format
    fn deduplicate(sorted: Vec<ReconciledFormat>) -> Vec<ReconciledFormat> {
        let any_video_with_audio = sorted.iter().any(|c| c.has_video() && c.has_audio());

        let mut seen_heights = HashSet::new();
        let mut video_formats = Vec::new();
        let mut best_audio = None;

        for candidate in sorted {
            if candidate.has_video() {
                if !candidate.has_audio() && any_video_with_audio {
                    continue;
                }
                if seen_heights.insert(candidate.format.height.unwrap_or(0)) {
                    video_formats.push(candidate);
                }
            } else if candidate.format.has_audio() && best_audio.is_none() {
                best_audio = Some(candidate);
            }
        }

        video_formats.extend(best_audio);
        video_formats
    }

    /// Audio bitrate, falling back to total bitrate
    fn audio_bitrate(fmt: &RawFormat) -> f64 {
        fmt.abr
            .filter(|b| *b != 0.0)
            .or(fmt.tbr.filter(|b| *b != 0.0))
            .unwrap_or(0.0)
    }

    /// Ranking score; fractional values are truncated before use
    pub fn quality_score(fmt: &RawFormat) -> i64 {
        let mut score = 0;

        if fmt.is_combined() {
            score += COMBINED_BONUS;
        }

        score += i64::from(fmt.height.unwrap_or(0)) * 10;
        score += fmt.tbr.map_or(0, |t| t as i64);

        score += match fmt.ext.as_deref() {
            Some("mp4") => 500,
            Some("webm") => 100,
            _ => 0,
        };

        let fps = fmt.fps.map_or(0, |f| f as i64);
        if fps >= 60 {
            score += 200;
        } else if fps >= 30 {
            score += 100;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_video_format(url: &str, height: u32, vcodec: &str, ext: &str) -> RawFormat {
        RawFormat {
            url: Some(url.to_string()),
            protocol: Some("https".to_string()),
            ext: Some(ext.to_string()),
            vcodec: Some(vcodec.to_string()),
            height: Some(height),
            width: Some(height * 16 / 9),
            fps: Some(30.0),
            ..RawFormat::default()
        }
    }

    fn make_audio_format(url: &str, abr: f64, ext: &str) -> RawFormat {
        RawFormat {
            url: Some(url.to_string()),
            protocol: Some("https".to_string()),
            ext: Some(ext.to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            audio_ext: Some(ext.to_string()),
            abr: Some(abr),
            ..RawFormat::default()
        }
    }

    fn make_combined_format(url: &str, height: u32, ext: &str) -> RawFormat {
        RawFormat {
            acodec: Some("mp4a.40.2".to_string()),
            ..make_video_format(url, height, "avc1.64001F", ext)
        }
    }

    #[test]
    fn test_video_and_audio_are_paired() {
        let formats = vec![
            RawFormat {
                url: Some("A".to_string()),
                ext: Some("mp4".to_string()),
                vcodec: Some("avc1".to_string()),
                height: Some(1080),
                ..RawFormat::default()
            },
            RawFormat {
                url: Some("B".to_string()),
                ext: Some("m4a".to_string()),
                acodec: Some("aac".to_string()),
                abr: Some(128.0),
                height: Some(0),
                ..RawFormat::default()
            },
        ];

        let result = FormatSelector::reconcile(&formats);
        assert_eq!(result.len(), 2);

        let video = &result[0];
        assert_eq!(video.format.url.as_deref(), Some("A"));
        assert_eq!(video.format.height, Some(1080));
        assert!(video.needs_merge());
        assert_eq!(video.merge_audio_url.as_deref(), Some("B"));
        assert_eq!(video.format.acodec.as_deref(), Some("aac"));
        assert_eq!(video.format.audio_ext.as_deref(), Some("m4a"));
        assert_eq!(video.format.abr, Some(128.0));

        let audio = &result[1];
        assert_eq!(audio.format.url.as_deref(), Some("B"));
        assert!(!audio.has_video());
        assert!(!audio.needs_merge());
        assert_eq!(audio.format.preference, Some(-50.0));
    }

    #[test]
    fn test_same_height_keeps_mp4() {
        let formats = vec![
            make_combined_format("webm-url", 1080, "webm"),
            make_combined_format("mp4-url", 1080, "mp4"),
        ];

        let result = FormatSelector::reconcile(&formats);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format.url.as_deref(), Some("mp4-url"));
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let formats = vec![
            make_video_format("v1", 720, "vp9", "webm"),
            make_video_format("v2", 720, "avc1", "mp4"),
            make_video_format("v3", 1080, "avc1", "mp4"),
            make_audio_format("a1", 128.0, "m4a"),
            make_audio_format("a2", 160.0, "webm"),
            make_combined_format("c1", 360, "mp4"),
        ];

        let first = FormatSelector::reconcile(&formats);
        let second = FormatSelector::reconcile(&formats);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_video_has_audio() {
        let formats = vec![
            make_video_format("v1", 2160, "av01", "mp4"),
            make_video_format("v2", 1080, "avc1", "mp4"),
            make_video_format("v3", 720, "vp9", "webm"),
            make_combined_format("c1", 360, "mp4"),
            make_audio_format("a1", 48.0, "m4a"),
            make_audio_format("a2", 160.0, "webm"),
        ];

        let result = FormatSelector::reconcile(&formats);
        for fmt in result.iter().filter(|f| f.has_video()) {
            assert!(fmt.has_audio(), "silent video survived: {:?}", fmt.format.url);
        }

        // Best audio by bitrate is the companion for every merged entry
        for fmt in result.iter().filter(|f| f.needs_merge()) {
            assert_eq!(fmt.merge_audio_url.as_deref(), Some("a2"));
        }
    }

    #[test]
    fn test_single_audio_only_kept() {
        let formats = vec![
            make_combined_format("c1", 720, "mp4"),
            make_audio_format("a1", 48.0, "m4a"),
            RawFormat {
                tbr: Some(160.0),
                ..make_audio_format("a2", 160.0, "m4a")
            },
        ];

        let result = FormatSelector::reconcile(&formats);
        let audio: Vec<_> = result.iter().filter(|f| !f.has_video()).collect();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].format.url.as_deref(), Some("a2"));
        assert!(!result.last().unwrap().has_video());
    }

    #[test]
    fn test_storyboards_and_missing_urls_dropped() {
        let formats = vec![
            make_video_format("sb", 90, "avc1", "mhtml"),
            make_video_format("img", 45, "images", "jpg"),
            RawFormat {
                url: None,
                ..make_combined_format("x", 480, "mp4")
            },
        ];

        assert!(FormatSelector::reconcile(&formats).is_empty());
    }

    #[test]
    fn test_silent_video_only_when_nothing_else() {
        let formats = vec![
            make_video_format("v1", 720, "avc1", "mp4"),
            make_video_format("v2", 720, "vp9", "webm"),
            make_video_format("v3", 480, "avc1", "mp4"),
        ];

        let result = FormatSelector::reconcile(&formats);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|f| f.video_only && !f.has_audio()));
        assert_eq!(result[0].format.url.as_deref(), Some("v1"));
        assert_eq!(result[1].format.url.as_deref(), Some("v3"));
    }

    #[test]
    fn test_silent_video_dropped_next_to_combined() {
        let formats = vec![
            make_video_format("v1", 2160, "av01", "mp4"),
            make_combined_format("c1", 360, "mp4"),
        ];

        let result = FormatSelector::reconcile(&formats);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format.url.as_deref(), Some("c1"));
    }

    #[test]
    fn test_audio_only_input_ranks_by_score() {
        // abr is not part of the score; the webm container bonus decides
        let formats = vec![
            make_audio_format("a1", 128.0, "m4a"),
            make_audio_format("a2", 64.0, "webm"),
        ];

        let result = FormatSelector::reconcile(&formats);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format.url.as_deref(), Some("a2"));
    }

    #[test]
    fn test_quality_score_components() {
        let mut fmt = make_combined_format("c", 1080, "mp4");
        fmt.tbr = Some(2500.7);
        fmt.fps = Some(60.0);
        assert_eq!(
            FormatSelector::quality_score(&fmt),
            100_000 + 10_800 + 2_500 + 500 + 200
        );

        fmt.fps = Some(29.97);
        fmt.ext = Some("webm".to_string());
        assert_eq!(FormatSelector::quality_score(&fmt), 100_000 + 10_800 + 2_500 + 100);
    }

    #[test]
    fn test_empty_input() {
        assert!(FormatSelector::reconcile(&[]).is_empty());
    }
}
