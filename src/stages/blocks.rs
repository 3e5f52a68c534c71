use tracing::info;

use crate::models::{Block, Utterance};

/// Configuration for the display/export merge
#[derive(Debug, Clone)]
pub struct BlockMergeConfig {
    /// Maximum silence between same-speaker units to group into one block,
    /// in ms. Looser than the pre-merge gap: this stage optimizes paragraph
    /// readability, not correction-batch efficiency.
    pub gap_ms: u64,
}

impl Default for BlockMergeConfig {
    fn default() -> Self {
        Self { gap_ms: 5_000 }
    }
}

/// Merge consecutive corrected units into display blocks.
///
/// Consecutive units with the same speaker whose gap is under the threshold
/// join one block; each block keeps its ordered constituent entries so
/// renderers can still show individual timestamps.
pub fn merge_blocks(units: &[Utterance], config: &BlockMergeConfig) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for unit in units {
        match blocks.last_mut() {
            Some(block)
                if block.speaker == unit.speaker
                    && unit.start_ms.saturating_sub(block.end_ms) < config.gap_ms =>
            {
                block.end_ms = unit.end_ms;
                block.entries.push(unit.clone());
            }
            _ => blocks.push(Block {
                speaker: unit.speaker.clone(),
                start_ms: unit.start_ms,
                end_ms: unit.end_ms,
                entries: vec![unit.clone()],
            }),
        }
    }

    if !units.is_empty() {
        info!("Block merge: {} -> {} blocks", units.len(), blocks.len());
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(index: usize, speaker: &str, start_ms: u64, end_ms: u64) -> Utterance {
        let mut u = Utterance::new(
            index,
            format!("part {} ", index),
            start_ms,
            end_ms,
            speaker.to_string(),
            0.9,
        );
        u.corrected_text = format!("Part {} ", index);
        u
    }

    #[test]
    fn test_same_speaker_within_gap_merges() {
        let units = vec![
            unit(0, "Speaker 1", 0, 1_000),
            unit(1, "Speaker 1", 4_000, 5_000),
        ];

        let blocks = merge_blocks(&units, &BlockMergeConfig::default());

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_ms, 0);
        assert_eq!(blocks[0].end_ms, 5_000);
        assert_eq!(blocks[0].entries.len(), 2);
        assert_eq!(blocks[0].corrected_text(), "Part 0 Part 1 ");
    }

    #[test]
    fn test_gap_at_threshold_splits() {
        let units = vec![
            unit(0, "Speaker 1", 0, 1_000),
            unit(1, "Speaker 1", 6_000, 7_000),
        ];

        let blocks = merge_blocks(&units, &BlockMergeConfig::default());

        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_speaker_change_splits() {
        let units = vec![
            unit(0, "Speaker 1", 0, 1_000),
            unit(1, "Speaker 2", 1_100, 2_000),
            unit(2, "Speaker 1", 2_100, 3_000),
        ];

        let blocks = merge_blocks(&units, &BlockMergeConfig::default());

        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_entries_preserve_individual_timestamps() {
        let units = vec![
            unit(0, "Speaker 1", 100, 900),
            unit(1, "Speaker 1", 1_000, 1_800),
        ];

        let blocks = merge_blocks(&units, &BlockMergeConfig::default());

        assert_eq!(blocks[0].entries[0].start_ms, 100);
        assert_eq!(blocks[0].entries[1].start_ms, 1_000);
    }
}
