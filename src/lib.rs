pub mod error;
pub mod eval;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::PipelineError;
pub use eval::{evaluate_transcript, Evaluation, EvaluationConfig};
pub use io::{
    parse_recognizer_file, parse_recognizer_json, HumanTranscript, IngestConfig,
    MachineTranscript, TranscriptMetadata,
};
pub use llm::{OracleClient, OracleConfig};
pub use models::{
    Block, Chunk, ConfidenceAggregation, CorrectionRecord, CorrectionStats, RecognizerResponse,
    Run, Utterance,
};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
pub use stages::{
    BlockMergeConfig, ChunkConfig, CorrectionConfig, FilterConfig, PreMergeConfig, RunMergeConfig,
    SmoothConfig,
};
