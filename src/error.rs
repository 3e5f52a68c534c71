use thiserror::Error;

/// Structural failures the pipeline cannot default its way past.
///
/// Correction-level failures (transport, response shape, missing ids) never
/// appear here; those degrade per chunk or per unit and the pipeline carries
/// on.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input sequence is not ordered by start_ms, which every stage
    /// depends on
    #[error("utterance at position {index} starts before its predecessor; input must be ordered by start_ms")]
    UnorderedInput { index: usize },

    /// No parse tier recovered a single record from an oracle response
    #[error("oracle response contained no parseable correction records")]
    UnparseableResponse,
}
