use tracing::info;

use crate::error::PipelineError;
use crate::llm::OracleClient;
use crate::models::{Block, CorrectionStats, Utterance};
use crate::stages::{
    apply_corrections, build_chunks, classify, execute_correction, find_runs, merge_blocks,
    merge_runs, pre_merge, smooth_speakers, BlockMergeConfig, ChunkConfig, CorrectionConfig,
    FilterConfig, PreMergeConfig, RunMergeConfig, SmoothConfig,
};

/// Configuration for the full correction pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub smooth: SmoothConfig,
    pub pre_merge: PreMergeConfig,
    pub filter: FilterConfig,
    pub run_merge: RunMergeConfig,
    pub chunk: ChunkConfig,
    pub correction: CorrectionConfig,
    pub block_merge: BlockMergeConfig,
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineOutput {
    /// Pre-merged, corrected units in original order
    pub units: Vec<Utterance>,
    /// Display blocks built from the corrected units
    pub blocks: Vec<Block>,
    /// Correction counters for observability
    pub stats: CorrectionStats,
}

/// Run stages 2-8 over ingested utterances.
///
/// Pass `None` as the client to skip correction entirely (every unit passes
/// through with `corrected_text == text`). Correction failures degrade per
/// chunk and never surface here; the only error is a structural one the
/// pipeline cannot default around - input not ordered by `start_ms`. The
/// worst oracle outcome is a complete, uncorrected transcript.
pub async fn run_pipeline(
    client: Option<&OracleClient>,
    utterances: Vec<Utterance>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    validate_ordering(&utterances)?;

    if utterances.is_empty() {
        return Ok(PipelineOutput {
            units: vec![],
            blocks: vec![],
            stats: CorrectionStats::default(),
        });
    }

    let smoothed = smooth_speakers(&utterances, &config.smooth);
    let mut units = pre_merge(smoothed, &config.pre_merge);

    let needs_correction = classify(&units, &config.filter);
    let mut stats = CorrectionStats {
        units_total: units.len(),
        ..Default::default()
    };

    let needs_any = needs_correction.iter().any(|n| *n);

    match client {
        Some(client) if needs_any => {
            let runs = merge_runs(find_runs(&needs_correction), &config.run_merge);
            let chunks = build_chunks(&units, &runs, &config.chunk);

            let outcome = execute_correction(client, &units, &chunks, &config.correction).await;
            stats = outcome.stats;
            stats.units_corrected = apply_corrections(&mut units, &outcome.corrected);

            info!(
                "Correction: {}/{} units changed, {}/{} chunks failed",
                stats.units_corrected, stats.units_total, stats.chunks_failed, stats.chunks_total
            );
        }
        Some(_) => {
            info!("All {} units above threshold, skipping correction", units.len());
        }
        None => {
            info!("No oracle client, passing {} units through uncorrected", units.len());
        }
    }

    let blocks = merge_blocks(&units, &config.block_merge);

    Ok(PipelineOutput {
        units,
        blocks,
        stats,
    })
}

/// The one invariant ingestion cannot default: start_ms must be
/// non-decreasing across the sequence
fn validate_ordering(units: &[Utterance]) -> Result<(), PipelineError> {
    for i in 1..units.len() {
        if units[i].start_ms < units[i - 1].start_ms {
            return Err(PipelineError::UnorderedInput { index: i });
        }
    }
    Ok(())
}
