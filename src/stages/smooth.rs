use tracing::debug;

use crate::models::Utterance;

/// Configuration for speaker smoothing
#[derive(Debug, Clone)]
pub struct SmoothConfig {
    /// Maximum duration in ms for an isolated flip to be overwritten
    pub max_flip_duration_ms: u64,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            max_flip_duration_ms: 1_500,
        }
    }
}

/// Remove isolated single-utterance speaker misattributions.
///
/// A short utterance whose speaker differs from both neighbors while the
/// neighbors agree is almost always a diarization flicker; its label is
/// overwritten with the surrounding speaker.
///
/// One left-to-right pass. Every decision reads the *input* labels, so a
/// correction at i never influences the test at i+1. No iteration to
/// convergence.
pub fn smooth_speakers(units: &[Utterance], config: &SmoothConfig) -> Vec<Utterance> {
    if units.len() < 3 {
        return units.to_vec();
    }

    let mut smoothed: Vec<Utterance> = units.to_vec();
    let mut flipped = 0usize;

    for i in 1..units.len() - 1 {
        let prev = &units[i - 1].speaker;
        let curr = &units[i].speaker;
        let next = &units[i + 1].speaker;

        if curr != prev && prev == next && units[i].duration_ms() < config.max_flip_duration_ms {
            smoothed[i].speaker = prev.clone();
            flipped += 1;
        }
    }

    if flipped > 0 {
        debug!("Speaker smoothing: {} isolated flips corrected", flipped);
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(index: usize, speaker: &str, start_ms: u64, end_ms: u64) -> Utterance {
        Utterance::new(
            index,
            format!("text {}", index),
            start_ms,
            end_ms,
            speaker.to_string(),
            0.9,
        )
    }

    #[test]
    fn test_short_isolated_flip_is_corrected() {
        let units = vec![
            unit(0, "Speaker 1", 0, 2_000),
            unit(1, "Speaker 2", 2_100, 2_900),
            unit(2, "Speaker 1", 3_000, 5_000),
        ];

        let smoothed = smooth_speakers(&units, &SmoothConfig::default());

        assert_eq!(smoothed[1].speaker, "Speaker 1");
        assert_eq!(smoothed.len(), units.len());
        assert_eq!(smoothed[1].start_ms, 2_100);
    }

    #[test]
    fn test_long_flip_is_kept() {
        let units = vec![
            unit(0, "Speaker 1", 0, 2_000),
            unit(1, "Speaker 2", 2_100, 3_700),
            unit(2, "Speaker 1", 3_800, 5_000),
        ];

        let smoothed = smooth_speakers(&units, &SmoothConfig::default());

        assert_eq!(smoothed[1].speaker, "Speaker 2");
    }

    #[test]
    fn test_decisions_use_original_labels() {
        // Alternating short utterances: each interior position is judged
        // against the input labels, so corrections do not cascade within
        // the pass.
        let units = vec![
            unit(0, "Speaker 1", 0, 500),
            unit(1, "Speaker 2", 600, 1_100),
            unit(2, "Speaker 1", 1_200, 1_700),
            unit(3, "Speaker 2", 1_800, 2_300),
            unit(4, "Speaker 1", 2_400, 2_900),
        ];

        let smoothed = smooth_speakers(&units, &SmoothConfig::default());

        let labels: Vec<&str> = smoothed.iter().map(|u| u.speaker.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Speaker 1", "Speaker 1", "Speaker 2", "Speaker 1", "Speaker 1"]
        );
    }

    #[test]
    fn test_short_sequences_unchanged() {
        let units = vec![unit(0, "Speaker 1", 0, 500), unit(1, "Speaker 2", 600, 1_000)];

        let smoothed = smooth_speakers(&units, &SmoothConfig::default());

        assert_eq!(smoothed[0].speaker, "Speaker 1");
        assert_eq!(smoothed[1].speaker, "Speaker 2");
    }

    #[test]
    fn test_differing_neighbors_not_touched() {
        let units = vec![
            unit(0, "Speaker 1", 0, 1_000),
            unit(1, "Speaker 3", 1_100, 1_500),
            unit(2, "Speaker 2", 1_600, 2_500),
        ];

        let smoothed = smooth_speakers(&units, &SmoothConfig::default());

        assert_eq!(smoothed[1].speaker, "Speaker 3");
    }
}
