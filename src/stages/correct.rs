use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::llm::OracleClient;
use crate::models::{Chunk, CorrectionRecord, CorrectionStats, Utterance};

/// Configuration for the correction orchestrator
#[derive(Debug, Clone)]
pub struct CorrectionConfig {
    /// Maximum oracle requests in flight at once, shared across all runs
    pub max_concurrency: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Outcome of one correction pass: the id-keyed corrected texts plus
/// aggregate counters
#[derive(Debug, Default)]
pub struct CorrectionOutcome {
    /// Corrected text by stable utterance index; absent ids keep their
    /// original text
    pub corrected: HashMap<usize, String>,
    /// Aggregate counters for observability
    pub stats: CorrectionStats,
}

/// Dispatch every chunk to the oracle under the shared concurrency cap and
/// gather the id-keyed corrections.
///
/// Chunks are spawned eagerly; the semaphore, not submission order, decides
/// when each request goes out, and results are gathered in completion order.
/// Ordering of the transcript is restored purely by id-keyed reconciliation.
/// A failed chunk (transport, timeout, unparseable response) is logged and
/// its units fall back to their original text; sibling requests keep flying.
pub async fn execute_correction(
    client: &OracleClient,
    units: &[Utterance],
    chunks: &[Chunk],
    config: &CorrectionConfig,
) -> CorrectionOutcome {
    let mut outcome = CorrectionOutcome {
        corrected: HashMap::new(),
        stats: CorrectionStats {
            chunks_total: chunks.len(),
            units_submitted: chunks.iter().map(|c| c.unit_count()).sum(),
            units_total: units.len(),
            ..Default::default()
        },
    };

    if chunks.is_empty() {
        return outcome;
    }

    info!(
        "Correcting {}/{} units in {} chunks (concurrency {})",
        outcome.stats.units_submitted,
        units.len(),
        chunks.len(),
        config.max_concurrency
    );

    let text_by_id: HashMap<usize, &str> =
        units.iter().map(|u| (u.index, u.text.as_str())).collect();

    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let mut tasks: JoinSet<(usize, anyhow::Result<Vec<CorrectionRecord>>)> = JoinSet::new();

    for (chunk_no, chunk) in chunks.iter().enumerate() {
        let records: Vec<CorrectionRecord> = chunk
            .ids
            .iter()
            .filter_map(|id| {
                text_by_id.get(id).map(|text| CorrectionRecord {
                    id: *id,
                    text: (*text).to_string(),
                })
            })
            .collect();

        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (chunk_no, Err(anyhow::anyhow!(e))),
            };
            let result = client.correct_chunk(&records).await;
            (chunk_no, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((chunk_no, Ok(records))) => {
                for record in records {
                    // An empty correction would blank the unit; degrade instead
                    if record.text.is_empty() {
                        continue;
                    }
                    outcome.corrected.insert(record.id, record.text);
                }
                info!("Chunk {} reconciled", chunk_no);
            }
            Ok((chunk_no, Err(e))) => {
                warn!("Chunk {} failed, units keep original text: {:#}", chunk_no, e);
                outcome.stats.chunks_failed += 1;
            }
            Err(e) => {
                warn!("Chunk task aborted, units keep original text: {}", e);
                outcome.stats.chunks_failed += 1;
            }
        }
    }

    if outcome.stats.chunks_failed > 0 {
        warn!(
            "{}/{} chunks failed correction",
            outcome.stats.chunks_failed, outcome.stats.chunks_total
        );
    }

    outcome
}

/// Write gathered corrections back onto the unit sequence by stable id.
///
/// Units without a matching record keep their pre-correction text. Chunks
/// partition ids disjointly, so every write targets a distinct unit. Returns
/// the count of units whose text actually changed.
pub fn apply_corrections(units: &mut [Utterance], corrected: &HashMap<usize, String>) -> usize {
    let mut changed = 0usize;

    for unit in units.iter_mut() {
        if let Some(text) = corrected.get(&unit.index) {
            unit.corrected_text = text.clone();
            if unit.was_corrected() {
                changed += 1;
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(index: usize, text: &str) -> Utterance {
        Utterance::new(
            index,
            text.to_string(),
            index as u64 * 1_000,
            index as u64 * 1_000 + 500,
            "Speaker 1".to_string(),
            0.5,
        )
    }

    fn as_map(records: Vec<CorrectionRecord>) -> HashMap<usize, String> {
        records
            .into_iter()
            .filter(|r| !r.text.is_empty())
            .map(|r| (r.id, r.text))
            .collect()
    }

    #[test]
    fn test_apply_by_id_not_position() {
        let mut units = vec![unit(0, "aa"), unit(1, "bb"), unit(2, "cc")];

        // Records arrive permuted; reconciliation is keyed by id
        let corrected = as_map(vec![
            CorrectionRecord {
                id: 2,
                text: "CC".to_string(),
            },
            CorrectionRecord {
                id: 0,
                text: "AA".to_string(),
            },
        ]);

        let changed = apply_corrections(&mut units, &corrected);

        assert_eq!(changed, 2);
        assert_eq!(units[0].corrected_text, "AA");
        assert_eq!(units[1].corrected_text, "bb");
        assert_eq!(units[2].corrected_text, "CC");
    }

    #[test]
    fn test_permuted_response_matches_in_order_response() {
        let in_order = as_map(vec![
            CorrectionRecord {
                id: 0,
                text: "AA".to_string(),
            },
            CorrectionRecord {
                id: 1,
                text: "BB".to_string(),
            },
        ]);
        let permuted = as_map(vec![
            CorrectionRecord {
                id: 1,
                text: "BB".to_string(),
            },
            CorrectionRecord {
                id: 0,
                text: "AA".to_string(),
            },
        ]);

        let mut a = vec![unit(0, "aa"), unit(1, "bb")];
        let mut b = vec![unit(0, "aa"), unit(1, "bb")];

        apply_corrections(&mut a, &in_order);
        apply_corrections(&mut b, &permuted);

        let texts_a: Vec<&str> = a.iter().map(|u| u.corrected_text.as_str()).collect();
        let texts_b: Vec<&str> = b.iter().map(|u| u.corrected_text.as_str()).collect();
        assert_eq!(texts_a, texts_b);
    }

    #[test]
    fn test_missing_id_keeps_original() {
        let mut units = vec![unit(0, "aa"), unit(1, "bb")];

        let corrected = as_map(vec![CorrectionRecord {
            id: 0,
            text: "AA".to_string(),
        }]);

        apply_corrections(&mut units, &corrected);

        assert_eq!(units[1].corrected_text, "bb");
        assert!(!units[1].was_corrected());
    }

    #[test]
    fn test_empty_correction_never_blanks_a_unit() {
        let mut units = vec![unit(0, "aa")];

        let corrected = as_map(vec![CorrectionRecord {
            id: 0,
            text: String::new(),
        }]);

        apply_corrections(&mut units, &corrected);

        assert_eq!(units[0].corrected_text, "aa");
    }

    #[test]
    fn test_unchanged_correction_counts_as_no_change() {
        let mut units = vec![unit(0, "aa")];

        let corrected = as_map(vec![CorrectionRecord {
            id: 0,
            text: "aa".to_string(),
        }]);

        let changed = apply_corrections(&mut units, &corrected);

        assert_eq!(changed, 0);
    }
}
