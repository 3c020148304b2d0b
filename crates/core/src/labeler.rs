//! Turns extracted metadata and text into labels with a confidence score.

use providers::{ExtractError, TermRanker};
use std::collections::{BTreeMap, HashMap};

pub const ESSENTIAL_METADATA_KEYS: [&str; 3] = ["title", "author", "created"];
pub const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];
pub const MEDIA_PLACEHOLDERS: [&str; 3] = ["photo", "video", "audio"];

const MAX_LABELS: usize = 5;
const CONTENT_PREFIX_CHARS: usize = 500;
const SAMPLE_CHARS: usize = 2000;
const MIN_WORD_CHARS: usize = 4;
const METADATA_CONFIDENCE: f64 = 90.0;
const MEDIA_CONFIDENCE: f64 = 85.0;
const EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ':', ';', '(', ')', '[', ']', '{', '}'];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labeling {
    pub labels: Vec<String>,
    pub confidence: f64,
}

/// Metadata labels win; otherwise labels come from the content sample.
pub fn generate_labels(
    content: &str,
    metadata: &BTreeMap<String, String>,
    ranker: Option<&dyn TermRanker>,
) -> Result<Labeling, ExtractError> {
    let from_metadata = metadata_labels(metadata);
    if !from_metadata.is_empty() {
        return Ok(Labeling {
            labels: from_metadata,
            confidence: METADATA_CONFIDENCE,
        });
    }

    let sample = scoring_sample(content);
    if sample.is_empty() {
        return Ok(Labeling::default());
    }
    match ranker {
        Some(ranker) => ranked_labels(&sample, ranker),
        None => Ok(frequency_labels(&sample)),
    }
}

pub fn metadata_labels(metadata: &BTreeMap<String, String>) -> Vec<String> {
    ESSENTIAL_METADATA_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
        .take(MAX_LABELS)
        .collect()
}

/// First 500 characters, whitespace collapsed, capped at 2000 characters.
pub fn scoring_sample(content: &str) -> String {
    let prefix: String = content.chars().take(CONTENT_PREFIX_CHARS).collect();
    let collapsed = prefix.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(SAMPLE_CHARS).collect()
}

/// Most frequent words longer than three characters. Ties keep first-seen order.
pub fn frequency_labels(sample: &str) -> Labeling {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for raw in sample.split_whitespace() {
        let word = raw.trim_matches(EDGE_PUNCTUATION).to_lowercase();
        if word.chars().count() < MIN_WORD_CHARS {
            continue;
        }
        let count = counts.entry(word.clone()).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // sort_by is stable, so equal counts stay in encounter order.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(MAX_LABELS);
    let confidence = if order.is_empty() {
        0.0
    } else {
        (50.0 + 10.0 * order.len() as f64).min(100.0)
    };
    Labeling {
        labels: order,
        confidence,
    }
}

fn ranked_labels(sample: &str, ranker: &dyn TermRanker) -> Result<Labeling, ExtractError> {
    let terms = ranker.rank(sample, MAX_LABELS)?;
    if terms.is_empty() {
        return Ok(Labeling::default());
    }
    let mean = terms.iter().map(|t| t.weight).sum::<f64>() / terms.len() as f64;
    Ok(Labeling {
        labels: terms.into_iter().map(|t| t.term.to_lowercase()).collect(),
        confidence: (mean * 1000.0).clamp(0.0, 100.0),
    })
}

/// Images always reach the media confidence floor and get `photo` when unlabeled;
/// video and audio only fill in when nothing else was found.
pub fn apply_media_override(labeling: &mut Labeling, mime: &str, extension: &str) {
    if mime.starts_with("image/") || IMAGE_EXTENSIONS.contains(&extension) {
        if labeling.labels.is_empty() {
            labeling.labels = vec!["photo".to_string()];
        }
        labeling.confidence = labeling.confidence.max(MEDIA_CONFIDENCE);
        return;
    }
    let placeholder = if mime.starts_with("video/") {
        "video"
    } else if mime.starts_with("audio/") {
        "audio"
    } else {
        return;
    };
    if labeling.labels.is_empty() {
        labeling.labels = vec![placeholder.to_string()];
        labeling.confidence = labeling.confidence.max(MEDIA_CONFIDENCE);
    }
}

/// True for a lone `photo`/`video`/`audio` label, which learned labels may replace.
pub fn is_media_placeholder(labels: &[String]) -> bool {
    matches!(labels, [only] if MEDIA_PLACEHOLDERS.contains(&only.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::{RankedTerm, TfIdfRanker};

    fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn essential_metadata_becomes_labels() {
        let metadata = meta(&[
            ("author", "Ada Lovelace"),
            ("title", "Quarterly Report"),
            ("producer", "Writer"),
        ]);
        let labeling = generate_labels("ignored body text here", &metadata, None).unwrap();
        assert_eq!(labeling.labels, vec!["quarterly report", "ada lovelace"]);
        assert_eq!(labeling.confidence, 90.0);
    }

    #[test]
    fn blank_essential_values_fall_through_to_content() {
        let metadata = meta(&[("title", "  ")]);
        let labeling = generate_labels("finance finance budget", &metadata, None).unwrap();
        assert_eq!(labeling.labels, vec!["finance", "budget"]);
        assert_eq!(labeling.confidence, 70.0);
    }

    #[test]
    fn frequency_fallback_counts_and_keeps_encounter_order_on_ties() {
        let labeling = frequency_labels(
            "Project notes about quarterly planning and finance. Finance!",
        );
        assert_eq!(
            labeling.labels,
            vec!["finance", "project", "notes", "about", "quarterly"]
        );
        assert_eq!(labeling.confidence, 100.0);
    }

    #[test]
    fn short_words_only_yield_no_labels() {
        let labeling = generate_labels("a an the of to", &BTreeMap::new(), None).unwrap();
        assert!(labeling.labels.is_empty());
        assert_eq!(labeling.confidence, 0.0);
    }

    #[test]
    fn empty_content_yields_no_labels() {
        let labeling = generate_labels(" \n\t ", &BTreeMap::new(), None).unwrap();
        assert_eq!(labeling, Labeling::default());
    }

    #[test]
    fn sample_uses_only_first_500_characters() {
        let content = format!("{} zebra", "x".repeat(500));
        assert!(!scoring_sample(&content).contains("zebra"));
        assert_eq!(scoring_sample("a \n\n b\tc"), "a b c");
    }

    #[test]
    fn ranker_confidence_is_mean_weight_scaled() {
        struct Fixed;
        impl TermRanker for Fixed {
            fn rank(&self, _text: &str, _limit: usize) -> Result<Vec<RankedTerm>, ExtractError> {
                Ok(vec![
                    RankedTerm { term: "Budget".into(), weight: 0.04 },
                    RankedTerm { term: "forecast".into(), weight: 0.02 },
                ])
            }
        }
        let labeling = generate_labels("anything", &BTreeMap::new(), Some(&Fixed)).unwrap();
        assert_eq!(labeling.labels, vec!["budget", "forecast"]);
        assert!((labeling.confidence - 30.0).abs() < 1e-9);
    }

    #[test]
    fn tfidf_ranker_caps_confidence() {
        let labeling = generate_labels(
            "This document talks about finance budgets and forecasts.",
            &BTreeMap::new(),
            Some(&TfIdfRanker),
        )
        .unwrap();
        assert!(labeling.labels.contains(&"finance".to_string()));
        assert_eq!(labeling.confidence, 100.0);
    }

    #[test]
    fn ranker_errors_propagate() {
        struct Broken;
        impl TermRanker for Broken {
            fn rank(&self, _text: &str, _limit: usize) -> Result<Vec<RankedTerm>, ExtractError> {
                Err(ExtractError::Ranking("model unavailable".into()))
            }
        }
        assert!(generate_labels("some words", &BTreeMap::new(), Some(&Broken)).is_err());
    }

    #[test]
    fn images_get_photo_and_confidence_floor() {
        let mut labeling = Labeling::default();
        apply_media_override(&mut labeling, "application/octet-stream", ".png");
        assert_eq!(labeling.labels, vec!["photo"]);
        assert_eq!(labeling.confidence, 85.0);

        let mut labeled = Labeling {
            labels: vec!["sunset".into()],
            confidence: 60.0,
        };
        apply_media_override(&mut labeled, "image/jpeg", ".jpg");
        assert_eq!(labeled.labels, vec!["sunset"]);
        assert_eq!(labeled.confidence, 85.0);
    }

    #[test]
    fn video_and_audio_only_fill_empty_labels() {
        let mut video = Labeling::default();
        apply_media_override(&mut video, "video/mp4", ".mp4");
        assert_eq!(video.labels, vec!["video"]);
        assert_eq!(video.confidence, 85.0);

        let mut audio = Labeling {
            labels: vec!["podcast".into()],
            confidence: 40.0,
        };
        apply_media_override(&mut audio, "audio/mpeg", ".mp3");
        assert_eq!(audio.labels, vec!["podcast"]);
        assert_eq!(audio.confidence, 40.0);
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_media_placeholder(&["photo".to_string()]));
        assert!(!is_media_placeholder(&["photo".to_string(), "beach".to_string()]));
        assert!(!is_media_placeholder(&[]));
    }
}
