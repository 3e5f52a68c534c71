use tracing::info;

use crate::models::Utterance;

/// Configuration for the confidence filter
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Units at or above this confidence pass through uncorrected
    pub confidence_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.9,
        }
    }
}

/// Classify each unit as needing correction (`true`) or trusted (`false`).
///
/// Pure per-unit classification against the threshold; no reordering, no
/// merging. Units the recognizer gave no confidence carry 0.0 and therefore
/// always classify as needing correction.
pub fn classify(units: &[Utterance], config: &FilterConfig) -> Vec<bool> {
    let needs: Vec<bool> = units
        .iter()
        .map(|u| u.confidence < config.confidence_threshold)
        .collect();

    let trusted = needs.iter().filter(|n| !**n).count();
    info!(
        "Confidence filter: {}/{} units at or above threshold ({:.2})",
        trusted,
        units.len(),
        config.confidence_threshold
    );

    needs
}
