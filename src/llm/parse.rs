//! Defensive parsing of oracle responses.
//!
//! Oracles are instructed to return bare JSON, but compliance is unreliable:
//! responses arrive wrapped in prose, fenced in Markdown, or truncated
//! mid-record. Parsing runs as an ordered chain of tiers, first success wins:
//!
//! 1. strict JSON parse of the whole body (bare array, or a wrapper object
//!    carrying an `entries` array),
//! 2. extraction of a `[...]` substring embedded in surrounding text,
//! 3. per-record regex salvage, which tolerates malformed records without
//!    discarding the well-formed ones.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::models::CorrectionRecord;

static RECORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""id"\s*:\s*(\d+)\s*,\s*"text"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("record pattern is valid")
});

#[derive(Deserialize)]
struct EntriesWrapper {
    entries: Vec<CorrectionRecord>,
}

/// Parse an oracle response body into correction records.
///
/// Returns an error only when every tier comes up empty; the caller treats
/// that as a whole-chunk degrade.
pub fn parse_correction_response(body: &str) -> Result<Vec<CorrectionRecord>, PipelineError> {
    if let Some(records) = parse_strict(body) {
        return Ok(records);
    }
    if let Some(records) = parse_extracted_array(body) {
        debug!("Oracle response needed array extraction");
        return Ok(records);
    }
    let salvaged = salvage_records(body);
    if !salvaged.is_empty() {
        debug!("Regex salvage recovered {} records", salvaged.len());
        return Ok(salvaged);
    }
    Err(PipelineError::UnparseableResponse)
}

/// Tier 1: the body is exactly the promised JSON (or the common wrapper
/// object some models emit instead)
fn parse_strict(body: &str) -> Option<Vec<CorrectionRecord>> {
    let trimmed = body.trim();
    if let Ok(records) = serde_json::from_str::<Vec<CorrectionRecord>>(trimmed) {
        return Some(records);
    }
    serde_json::from_str::<EntriesWrapper>(trimmed)
        .ok()
        .map(|w| w.entries)
}

/// Tier 2: locate a bracket-delimited array inside surrounding prose or
/// Markdown fences and parse that substring
fn parse_extracted_array(body: &str) -> Option<Vec<CorrectionRecord>> {
    let cleaned = body.replace("```json", "").replace("```", "");
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<CorrectionRecord>>(&cleaned[start..=end]).ok()
}

/// Tier 3: reconstruct records one at a time from `"id": N, "text": "..."`
/// fragments, skipping whatever is malformed around them
fn salvage_records(body: &str) -> Vec<CorrectionRecord> {
    RECORD_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str().parse::<usize>().ok()?;
            let text = unescape(caps.get(2)?.as_str());
            Some(CorrectionRecord { id, text })
        })
        .collect()
}

/// Extract a `{...}` object from a response body, stripping Markdown fences.
/// Used by consumers that expect a single JSON object (e.g. evaluation).
pub fn extract_json_object(body: &str) -> Option<String> {
    let cleaned = body.replace("```json", "").replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}

/// Resolve the JSON escapes a salvaged text fragment may contain
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
