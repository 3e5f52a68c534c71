use serde::{Deserialize, Serialize};

/// One `{id, text}` record of the oracle wire format, used for both the
/// request payload and the parsed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    /// Stable utterance index; the oracle must echo it unchanged
    pub id: usize,
    /// Utterance text (original on request, corrected on response)
    pub text: String,
}

/// Aggregate counters from one correction pass, for observability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionStats {
    /// Chunks dispatched to the oracle
    pub chunks_total: usize,
    /// Chunks whose request or parse failed entirely (units degraded)
    pub chunks_failed: usize,
    /// Units submitted for correction (run members after absorption)
    pub units_submitted: usize,
    /// Units whose corrected text actually differs from the original
    pub units_corrected: usize,
    /// Total units in the pre-merged sequence
    pub units_total: usize,
}
