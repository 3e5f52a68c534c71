use tracing::info;

use crate::models::Utterance;

/// Configuration for the fine-grained pre-merge
#[derive(Debug, Clone)]
pub struct PreMergeConfig {
    /// Maximum silence between same-speaker utterances to merge across, in ms
    pub gap_ms: u64,
}

impl Default for PreMergeConfig {
    fn default() -> Self {
        Self { gap_ms: 500 }
    }
}

/// Coalesce adjacent same-speaker utterances separated by small gaps.
///
/// Shrinks the unit count ahead of correction (fewer, larger oracle batches
/// with more context each). The merged utterance concatenates text with no
/// separator, extends `end_ms`, and keeps the first constituent's `index` as
/// its stable identity. Confidence is the character-count-weighted average of
/// the constituents, so longer text dominates.
///
/// The pre-merged utterance is the pipeline's atomic unit from here on.
pub fn pre_merge(units: Vec<Utterance>, config: &PreMergeConfig) -> Vec<Utterance> {
    let raw_count = units.len();
    let mut merged: Vec<Utterance> = Vec::with_capacity(units.len());
    let mut iter = units.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for unit in iter {
        let same_speaker = unit.speaker == current.speaker;
        let within_gap = unit.start_ms.saturating_sub(current.end_ms) < config.gap_ms;

        if same_speaker && within_gap {
            let len_cur = current.char_count();
            let len_next = unit.char_count();
            let total = len_cur + len_next;
            if total > 0 {
                current.confidence = (current.confidence * len_cur as f64
                    + unit.confidence * len_next as f64)
                    / total as f64;
            }
            current.text.push_str(&unit.text);
            current.corrected_text = current.text.clone();
            current.end_ms = unit.end_ms;
        } else {
            merged.push(current);
            current = unit;
        }
    }
    merged.push(current);

    info!("Pre-merge: {} -> {} units", raw_count, merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(index: usize, text: &str, speaker: &str, start_ms: u64, end_ms: u64, conf: f64) -> Utterance {
        Utterance::new(index, text.to_string(), start_ms, end_ms, speaker.to_string(), conf)
    }

    #[test]
    fn test_merges_same_speaker_within_gap() {
        let units = vec![
            unit(0, "hello ", "Speaker 1", 0, 1_000, 0.9),
            unit(1, "there", "Speaker 1", 1_200, 2_000, 0.9),
        ];

        let merged = pre_merge(units, &PreMergeConfig::default());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 0);
        assert_eq!(merged[0].text, "hello there");
        assert_eq!(merged[0].corrected_text, "hello there");
        assert_eq!(merged[0].start_ms, 0);
        assert_eq!(merged[0].end_ms, 2_000);
    }

    #[test]
    fn test_speaker_change_breaks_merge() {
        let units = vec![
            unit(0, "hello", "Speaker 1", 0, 1_000, 0.9),
            unit(1, "hi", "Speaker 2", 1_100, 2_000, 0.9),
        ];

        let merged = pre_merge(units, &PreMergeConfig::default());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].index, 1);
    }

    #[test]
    fn test_large_gap_breaks_merge() {
        let units = vec![
            unit(0, "hello", "Speaker 1", 0, 1_000, 0.9),
            unit(1, "again", "Speaker 1", 1_500, 2_500, 0.9),
        ];

        let merged = pre_merge(units, &PreMergeConfig::default());

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_weighted_confidence() {
        // 10 chars at 1.0 plus 30 chars at 0.5 -> 0.625, not the plain
        // mean 0.75
        let units = vec![
            unit(0, "aaaaaaaaaa", "Speaker 1", 0, 1_000, 1.0),
            unit(1, &"b".repeat(30), "Speaker 1", 1_100, 2_000, 0.5),
        ];

        let merged = pre_merge(units, &PreMergeConfig::default());

        assert_eq!(merged.len(), 1);
        assert!((merged[0].confidence - 0.625).abs() < 1e-9);
    }

    #[test]
    fn test_chain_of_three_keeps_first_index() {
        let units = vec![
            unit(3, "a", "Speaker 1", 0, 100, 0.9),
            unit(4, "b", "Speaker 1", 150, 300, 0.8),
            unit(5, "c", "Speaker 1", 350, 500, 0.7),
        ];

        let merged = pre_merge(units, &PreMergeConfig::default());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 3);
        assert_eq!(merged[0].text, "abc");
    }

    #[test]
    fn test_empty_input() {
        let merged = pre_merge(vec![], &PreMergeConfig::default());
        assert!(merged.is_empty());
    }
}
