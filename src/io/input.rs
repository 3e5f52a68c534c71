use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{
    ConfidenceAggregation, ConfidenceCursor, RecognizerResponse, Utterance,
};

/// Configuration for recognizer ingestion
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    /// Reduction applied to per-token confidence when the recognizer did not
    /// supply a per-utterance aggregate
    pub aggregation: ConfidenceAggregation,
}

/// Parse a recognizer JSON file into the ordered utterance sequence
pub fn parse_recognizer_file(path: &Path, config: &IngestConfig) -> Result<Vec<Utterance>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_recognizer_json(&content, config)
}

/// Parse a recognizer JSON string into the ordered utterance sequence
pub fn parse_recognizer_json(json: &str, config: &IngestConfig) -> Result<Vec<Utterance>> {
    let response: RecognizerResponse =
        serde_json::from_str(json).context("Failed to parse recognizer JSON")?;
    Ok(ingest(&response, config))
}

/// Convert a recognizer response into utterances with stable indices.
///
/// Indices are assigned in ingestion order and never reassigned downstream.
/// Confidence falls back from the per-utterance aggregate to the flat token
/// stream (punctuation positions skipped), and to 0.0 when neither exists so
/// the unit routes to correction.
fn ingest(response: &RecognizerResponse, config: &IngestConfig) -> Vec<Utterance> {
    let mut cursor = ConfidenceCursor::new(&response.token_confidence);

    response
        .utterances
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let confidence = match raw.confidence {
                Some(c) => c,
                None => cursor.take_for(&raw.text, config.aggregation),
            };
            Utterance::new(
                index,
                raw.text.clone(),
                raw.start_ms,
                raw.end_ms,
                raw.speaker_label(),
                confidence,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognizer_json() {
        let json = r#"{
            "utterances": [
                {"text": "hello there.", "start_ms": 500, "end_ms": 1200, "speaker": 0, "confidence": 0.95},
                {"text": "hi.", "start_ms": 1500, "end_ms": 1900, "speaker": 1, "confidence": 0.6},
                {"text": "how are you?", "start_ms": 2100, "end_ms": 2900, "speaker": 0, "confidence": 0.9}
            ]
        }"#;

        let units = parse_recognizer_json(json, &IngestConfig::default()).unwrap();

        assert_eq!(units.len(), 3);
        assert_eq!(units[0].index, 0);
        assert_eq!(units[0].speaker, "Speaker 1");
        assert_eq!(units[1].speaker, "Speaker 2");
        assert_eq!(units[2].index, 2);
        assert!((units[1].confidence - 0.6).abs() < 1e-9);
        assert_eq!(units[0].corrected_text, "hello there.");
    }

    #[test]
    fn test_flat_token_confidence_consumed_in_order() {
        // "ab." consumes 2 scores, "cd" the next 2; punctuation skipped
        let json = r#"{
            "utterances": [
                {"text": "ab.", "start_ms": 0, "end_ms": 400, "speaker": 0},
                {"text": "cd", "start_ms": 500, "end_ms": 900, "speaker": 0}
            ],
            "token_confidence": [1.0, 0.8, 0.4, 0.2]
        }"#;

        let units = parse_recognizer_json(json, &IngestConfig::default()).unwrap();

        assert!((units[0].confidence - 0.9).abs() < 1e-9);
        assert!((units[1].confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_missing_confidence_defaults_to_zero() {
        let json = r#"{
            "utterances": [
                {"text": "no confidence here", "start_ms": 0, "end_ms": 1000}
            ]
        }"#;

        let units = parse_recognizer_json(json, &IngestConfig::default()).unwrap();

        assert_eq!(units[0].confidence, 0.0);
        assert_eq!(units[0].speaker, "Speaker 1");
    }

    #[test]
    fn test_empty_document() {
        let units = parse_recognizer_json(r#"{"utterances": []}"#, &IngestConfig::default()).unwrap();
        assert!(units.is_empty());
    }
}
