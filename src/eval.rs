//! Map-reduce content evaluation over the corrected transcript.
//!
//! Short transcripts are scored in one oracle call. Long ones are split at
//! sentence boundaries, key points are extracted per chunk under the same
//! bounded-concurrency discipline as the correction stage, and one reduce
//! call turns the collected notes into the final structured evaluation.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::llm::{extract_json_object, OracleClient};

/// Configuration for transcript evaluation
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Hard cap on evaluated characters; longer input is truncated
    pub max_text_chars: usize,
    /// Map-phase chunk size in characters; input at or under this is
    /// evaluated in a single call
    pub chunk_chars: usize,
    /// Maximum concurrent map requests
    pub max_concurrency: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 50_000,
            chunk_chars: 6_000,
            max_concurrency: 4,
        }
    }
}

/// Structured evaluation of one transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub meta: EvaluationMeta,
    #[serde(default)]
    pub scores: EvaluationScores,
    #[serde(default)]
    pub analysis: EvaluationAnalysis,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationScores {
    #[serde(default)]
    pub logic: u32,
    #[serde(default)]
    pub info_density: u32,
    #[serde(default)]
    pub expression: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationAnalysis {
    #[serde(default)]
    pub main_points: Vec<String>,
    #[serde(default)]
    pub key_data: Vec<String>,
    #[serde(default)]
    pub sentiment: String,
}

/// System prompt for direct evaluation and the reduce call: strict JSON out
const EVALUATION_SYSTEM_PROMPT: &str = r#"You are a strict data extraction engine, not a chat assistant.
Task: score and summarize the given transcript text.

### Scoring dimensions (100 points total)
1. logic (35): is the structure clear and are the arguments coherent?
2. info_density (35): does the content carry substance - data, cases, evidence?
3. expression (30): is the language clear, unambiguous, free of redundancy?

### Absolute format constraints
1. Output exactly one valid JSON string and nothing else.
2. No Markdown markers, no preamble, no closing remarks, no explanations.
3. Ignore minor homophone errors left over from speech recognition; judge the meaning.
4. Use an empty string or 0 for anything you cannot extract.

### JSON output structure
{
    "meta": {
        "title": "a precise title for the content",
        "category": "inferred category (e.g. economics/technology/training/product)",
        "keywords": ["keyword1", "keyword2", "keyword3"]
    },
    "scores": {
        "logic": 0,
        "info_density": 0,
        "expression": 0,
        "total": 0
    },
    "analysis": {
        "main_points": ["core point 1", "core point 2", "core point 3"],
        "key_data": ["mentioned figure 1", "mentioned figure 2"],
        "sentiment": "overall sentiment (positive/neutral/negative)"
    },
    "summary": "a dense summary of at most 300 words"
}"#;

/// System prompt for the map phase: plain-text key points, fast
const MAP_SYSTEM_PROMPT: &str = r#"You are a professional content analyst.
Task: read the given transcript section and distill its core content.

Requirements:
1. Extract the section's core points (2-5 items).
2. Extract any key figures or facts it mentions.
3. Summarize the section's topic in 1-2 sentences.
4. No preamble or closing remarks; output the points directly.
5. Ignore minor speech-recognition homophone errors; judge the meaning."#;

/// Evaluate transcript text, switching to map-reduce for long input.
///
/// Individual map-chunk failures are logged and skipped; an error here means
/// the final (or direct) scoring call itself failed, which callers degrade
/// to `Evaluation::default()` rather than aborting anything.
pub async fn evaluate_transcript(
    client: &OracleClient,
    text: &str,
    config: &EvaluationConfig,
) -> Result<Evaluation> {
    let text = truncate_chars(text, config.max_text_chars);

    if text.chars().count() <= config.chunk_chars {
        info!("Direct evaluation: {} chars", text.chars().count());
        return score_text(client, &text).await;
    }

    let chunks = chunk_text(&text, config.chunk_chars);
    info!(
        "Map-reduce evaluation: {} chars -> {} chunks",
        text.chars().count(),
        chunks.len()
    );

    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let mut tasks: JoinSet<(usize, Result<String>)> = JoinSet::new();

    for (i, chunk) in chunks.into_iter().enumerate() {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (i, Err(anyhow::anyhow!(e))),
            };
            let result = client.send_message(MAP_SYSTEM_PROMPT, &chunk).await;
            (i, result)
        });
    }

    let mut notes: Vec<(usize, String)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((i, Ok(text))) => notes.push((i, text)),
            Ok((i, Err(e))) => warn!("Evaluation map chunk {} failed, skipping: {:#}", i, e),
            Err(e) => warn!("Evaluation map task aborted: {}", e),
        }
    }

    if notes.is_empty() {
        anyhow::bail!("Every evaluation map chunk failed");
    }

    // Source order matters for the reduce narrative, completion order does not
    notes.sort_by_key(|(i, _)| *i);
    let combined = notes
        .into_iter()
        .map(|(_, n)| n)
        .collect::<Vec<_>>()
        .join("\n\n");

    let reduce_input = format!(
        "Key points extracted from consecutive sections of one long transcript:\n\n{}",
        combined
    );
    score_text(client, &reduce_input).await
}

async fn score_text(client: &OracleClient, text: &str) -> Result<Evaluation> {
    let body = client.send_message(EVALUATION_SYSTEM_PROMPT, text).await?;
    let object = extract_json_object(&body)
        .context("Evaluation response contained no JSON object")?;
    serde_json::from_str(&object).context("Failed to parse evaluation JSON")
}

/// Truncate on a character boundary, warning when input is dropped
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    warn!(
        "Text too long for evaluation ({} chars), truncating to {}",
        text.chars().count(),
        max_chars
    );
    text.chars().take(max_chars).collect()
}

/// Split text into chunks at sentence boundaries.
///
/// Looks backwards from each chunk's end for sentence-ending punctuation so
/// sections break between sentences; falls back to a hard split when no
/// boundary exists in the back half of the chunk.
fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    const ENDINGS: [char; 9] = ['。', '！', '？', '；', '.', '!', '?', ';', '\n'];

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = start + chunk_size;
        if end >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let mut split = end;
        let floor = start + chunk_size / 2;
        let mut i = end;
        while i > floor {
            if ENDINGS.contains(&chars[i]) {
                split = i + 1;
                break;
            }
            i -= 1;
        }

        chunks.push(chars[start..split].iter().collect());
        start = split;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evaluation_json() {
        let json = r#"{
            "meta": {"title": "Quarterly review", "category": "business", "keywords": ["revenue"]},
            "scores": {"logic": 30, "info_density": 28, "expression": 25, "total": 83},
            "analysis": {"main_points": ["revenue grew"], "key_data": ["12%"], "sentiment": "positive"},
            "summary": "A quarterly review."
        }"#;

        let eval: Evaluation = serde_json::from_str(json).unwrap();

        assert_eq!(eval.meta.title, "Quarterly review");
        assert_eq!(eval.scores.total, 83);
        assert_eq!(eval.analysis.main_points, vec!["revenue grew"]);
    }

    #[test]
    fn test_partial_evaluation_json_defaults() {
        let eval: Evaluation = serde_json::from_str(r#"{"summary": "short"}"#).unwrap();

        assert_eq!(eval.summary, "short");
        assert_eq!(eval.scores.total, 0);
        assert!(eval.meta.keywords.is_empty());
    }

    #[test]
    fn test_chunk_text_prefers_sentence_boundaries() {
        let text = "First sentence is here. Second one follows! Third keeps going? Fourth wraps up.";
        let chunks = chunk_text(text, 30);

        assert!(chunks.len() > 1);
        // Interior chunks end right after sentence punctuation
        for chunk in &chunks[..chunks.len() - 1] {
            let last = chunk.trim_end().chars().last().unwrap();
            assert!(['.', '!', '?', ';'].contains(&last), "chunk ended with {:?}", last);
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_text_short_input_single_chunk() {
        let chunks = chunk_text("short text", 100);
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("abc", 4), "abc");
    }
}
