use crate::models::{Chunk, Run, Utterance};

/// Configuration for oracle batch sizing
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum cumulative text characters per chunk
    pub char_budget: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { char_budget: 600 }
    }
}

/// Split every run's units into chunks along unit boundaries.
///
/// Greedy accumulation: units join the current chunk until adding the next
/// would exceed the budget, then a new chunk starts. A unit is never split,
/// so a single unit whose text alone exceeds the budget becomes its own
/// one-unit chunk. Chunk boundaries therefore always coincide with utterance
/// boundaries and no overlap/deduplication is ever needed.
pub fn build_chunks(units: &[Utterance], runs: &[Run], config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for run in runs {
        let mut ids: Vec<usize> = Vec::new();
        let mut chars = 0usize;

        for unit in &units[run.start..run.end] {
            let unit_chars = unit.char_count();

            if !ids.is_empty() && chars + unit_chars > config.char_budget {
                chunks.push(Chunk {
                    ids: std::mem::take(&mut ids),
                    char_count: chars,
                });
                chars = 0;
            }

            ids.push(unit.index);
            chars += unit_chars;
        }

        if !ids.is_empty() {
            chunks.push(Chunk {
                ids,
                char_count: chars,
            });
        }
    }

    chunks
}
