use tracing::info;

use crate::models::Run;

/// Configuration for run merging
#[derive(Debug, Clone)]
pub struct RunMergeConfig {
    /// Maximum count of trusted units between two runs that gets absorbed
    /// when merging them into one
    pub max_trusted_gap: usize,
}

impl Default for RunMergeConfig {
    fn default() -> Self {
        Self { max_trusted_gap: 3 }
    }
}

/// Identify maximal contiguous runs of units flagged as needing correction
pub fn find_runs(needs_correction: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &needs) in needs_correction.iter().enumerate() {
        match (needs, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(Run::new(s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Run::new(s, needs_correction.len()));
    }

    runs
}

/// Merge runs separated by a short trusted gap.
///
/// A trusted island of at most `max_trusted_gap` units between two runs is
/// absorbed into one combined run; every absorbed unit is corrected as if it
/// had been flagged, trading a few redundant corrections for fewer oracle
/// batches. Larger trusted stretches are never re-corrected.
pub fn merge_runs(runs: Vec<Run>, config: &RunMergeConfig) -> Vec<Run> {
    let raw_count = runs.len();
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());

    for run in runs {
        match merged.last_mut() {
            Some(last) if run.start - last.end <= config.max_trusted_gap => {
                last.end = run.end;
            }
            _ => merged.push(run),
        }
    }

    if merged.len() < raw_count {
        info!(
            "Run merge: {} -> {} runs (gap <= {})",
            raw_count,
            merged.len(),
            config.max_trusted_gap
        );
    }

    merged
}
