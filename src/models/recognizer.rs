use serde::{Deserialize, Serialize};

/// Root document produced by the speech recognizer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognizerResponse {
    /// Ordered utterances with timestamps and diarization labels
    pub utterances: Vec<RecognizerUtterance>,
    /// Flat per-token confidence stream across the whole document, indexed
    /// only by non-punctuation characters; empty when the recognizer already
    /// supplied per-utterance aggregates
    #[serde(default)]
    pub token_confidence: Vec<f64>,
}

/// A single recognized utterance as emitted by the recognizer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognizerUtterance {
    /// Recognized text including punctuation
    pub text: String,
    /// Start timestamp in milliseconds
    pub start_ms: u64,
    /// End timestamp in milliseconds
    pub end_ms: u64,
    /// Numeric diarization label; absent or negative means unattributed
    #[serde(default)]
    pub speaker: Option<i32>,
    /// Precomputed aggregate confidence (0-1), if the recognizer provides one
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RecognizerUtterance {
    /// Display label for the diarization id ("Speaker 1" when unattributed)
    pub fn speaker_label(&self) -> String {
        match self.speaker {
            Some(n) if n >= 0 => format!("Speaker {}", n + 1),
            _ => "Speaker 1".to_string(),
        }
    }
}

/// Policy for reducing per-token confidence scores to one utterance-level
/// scalar. The recognizer contract does not fix the reduction, so it is a
/// pipeline parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceAggregation {
    /// Arithmetic mean of token scores
    #[default]
    Mean,
    /// Minimum token score (most conservative)
    Min,
    /// Geometric mean of token scores
    GeometricMean,
}

impl ConfidenceAggregation {
    /// Reduce token scores to one scalar; empty input yields 0.0 so that the
    /// confidence filter routes the utterance to correction
    pub fn aggregate(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        match self {
            Self::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
            Self::Min => scores.iter().cloned().fold(f64::INFINITY, f64::min),
            Self::GeometricMean => {
                let log_sum: f64 = scores.iter().map(|s| s.max(f64::MIN_POSITIVE).ln()).sum();
                (log_sum / scores.len() as f64).exp()
            }
        }
    }
}

/// Punctuation-bearing characters that carry no token confidence entry.
/// Covers both CJK and ASCII punctuation seen in recognizer output.
const PUNCTUATION: &str = "。！？；，、：“”‘’（）《》【】…—·\n.!?;,:\"'()[] ";

fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(c)
}

/// Number of characters in `text` that consume a token confidence entry
pub fn scored_char_count(text: &str) -> usize {
    text.chars().filter(|c| !is_punctuation(*c)).count()
}

/// Cursor over the recognizer's flat token confidence stream.
///
/// Each utterance consumes one score per non-punctuation character of its
/// text; punctuation positions are skipped so the stream and the text stay
/// aligned across the whole document.
pub struct ConfidenceCursor<'a> {
    scores: &'a [f64],
    offset: usize,
}

impl<'a> ConfidenceCursor<'a> {
    pub fn new(scores: &'a [f64]) -> Self {
        Self { scores, offset: 0 }
    }

    /// Consume the scores for one utterance's text and reduce them with the
    /// given policy. Returns 0.0 once the stream is exhausted.
    pub fn take_for(&mut self, text: &str, aggregation: ConfidenceAggregation) -> f64 {
        let wanted = scored_char_count(text);
        let available = self.scores.len().saturating_sub(self.offset);
        let taken = wanted.min(available);
        let slice = &self.scores[self.offset..self.offset + taken];
        self.offset += taken;
        aggregation.aggregate(slice)
    }
}
