use serde::{Deserialize, Serialize};

/// One recognized speech unit flowing through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Stable identity assigned once at ingestion; a merged utterance keeps
    /// its first constituent's index, so indices stay unique and ordered
    pub index: usize,
    /// Recognized text - immutable once produced by the recognizer
    pub text: String,
    /// Text after correction; equals `text` until a correction is applied
    pub corrected_text: String,
    /// Start offset into the source media in milliseconds
    pub start_ms: u64,
    /// End offset into the source media in milliseconds
    pub end_ms: u64,
    /// Opaque speaker label (e.g. "Speaker 1"); compared, never parsed
    pub speaker: String,
    /// Aggregate recognition confidence in [0, 1]; 0.0 when the recognizer
    /// produced none
    pub confidence: f64,
}

impl Utterance {
    pub fn new(
        index: usize,
        text: String,
        start_ms: u64,
        end_ms: u64,
        speaker: String,
        confidence: f64,
    ) -> Self {
        Self {
            index,
            corrected_text: text.clone(),
            text,
            start_ms,
            end_ms,
            speaker,
            confidence,
        }
    }

    /// Duration of this utterance in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Character count of the original text (merge weighting unit)
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether correction changed this utterance's text
    pub fn was_corrected(&self) -> bool {
        self.corrected_text != self.text
    }
}

/// Display/export paragraph: consecutive same-speaker corrected utterances
/// merged under the post-merge gap rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Speaker label shared by every entry in this block
    pub speaker: String,
    /// Start of the first entry in milliseconds
    pub start_ms: u64,
    /// End of the last entry in milliseconds
    pub end_ms: u64,
    /// Constituent utterances in order (individual timestamps preserved)
    pub entries: Vec<Utterance>,
}

impl Block {
    /// Duration of this block in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Concatenated original text of all entries
    pub fn text(&self) -> String {
        self.entries.iter().map(|u| u.text.as_str()).collect()
    }

    /// Concatenated corrected text of all entries
    pub fn corrected_text(&self) -> String {
        self.entries
            .iter()
            .map(|u| u.corrected_text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_utterance_starts_uncorrected() {
        let u = Utterance::new(0, "hello there".to_string(), 500, 1200, "Speaker 1".to_string(), 0.95);

        assert_eq!(u.corrected_text, u.text);
        assert!(!u.was_corrected());
        assert_eq!(u.duration_ms(), 700);
        assert_eq!(u.char_count(), 11);
    }

    #[test]
    fn test_block_concatenates_entries() {
        let mut a = Utterance::new(0, "good ".to_string(), 0, 400, "Speaker 1".to_string(), 0.9);
        a.corrected_text = "Good ".to_string();
        let b = Utterance::new(1, "morning".to_string(), 450, 900, "Speaker 1".to_string(), 0.9);

        let block = Block {
            speaker: "Speaker 1".to_string(),
            start_ms: 0,
            end_ms: 900,
            entries: vec![a, b],
        };

        assert_eq!(block.text(), "good morning");
        assert_eq!(block.corrected_text(), "Good morning");
        assert_eq!(block.duration_ms(), 900);
    }
}
