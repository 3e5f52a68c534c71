use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Block, CorrectionStats, Utterance};

/// Machine-readable output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineTranscript {
    /// Corrected units in original order
    pub entries: Vec<MachineEntry>,
    /// Display blocks (post-merge paragraphs)
    pub blocks: Vec<MachineBlock>,
    /// Speaker labels in order of first appearance
    pub speakers: Vec<String>,
    /// Metadata about the processing
    pub metadata: TranscriptMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineEntry {
    pub index: usize,
    pub speaker: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub corrected_text: String,
    pub confidence: f64,
    pub was_corrected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineBlock {
    pub speaker: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub entry_indices: Vec<usize>,
    pub corrected_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub total_units: usize,
    pub units_corrected: usize,
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub duration_ms: u64,
    pub generated_at: String,
}

impl MachineTranscript {
    /// Create from corrected units, display blocks, and correction stats
    pub fn from_pipeline(units: &[Utterance], blocks: &[Block], stats: &CorrectionStats) -> Self {
        let entries: Vec<MachineEntry> = units
            .iter()
            .map(|u| MachineEntry {
                index: u.index,
                speaker: u.speaker.clone(),
                start_ms: u.start_ms,
                end_ms: u.end_ms,
                text: u.text.clone(),
                corrected_text: u.corrected_text.clone(),
                confidence: u.confidence,
                was_corrected: u.was_corrected(),
            })
            .collect();

        let machine_blocks: Vec<MachineBlock> = blocks
            .iter()
            .map(|b| MachineBlock {
                speaker: b.speaker.clone(),
                start_ms: b.start_ms,
                end_ms: b.end_ms,
                entry_indices: b.entries.iter().map(|u| u.index).collect(),
                corrected_text: b.corrected_text(),
            })
            .collect();

        let mut speakers: Vec<String> = Vec::new();
        for unit in units {
            if !speakers.contains(&unit.speaker) {
                speakers.push(unit.speaker.clone());
            }
        }

        let duration_ms = units
            .last()
            .map(|u| u.end_ms)
            .unwrap_or(0)
            .saturating_sub(units.first().map(|u| u.start_ms).unwrap_or(0));

        Self {
            entries,
            blocks: machine_blocks,
            speakers,
            metadata: TranscriptMetadata {
                total_units: units.len(),
                units_corrected: stats.units_corrected,
                chunks_total: stats.chunks_total,
                chunks_failed: stats.chunks_failed,
                duration_ms,
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable transcript format
pub struct HumanTranscript<'a> {
    blocks: &'a [Block],
}

impl<'a> HumanTranscript<'a> {
    pub fn new(blocks: &'a [Block]) -> Self {
        Self { blocks }
    }

    /// Format the transcript as human-readable text
    pub fn format(&self) -> String {
        let mut output = String::new();

        for block in self.blocks {
            let start_time = format_timestamp(block.start_ms);
            output.push_str(&format!("[{}] {}:\n", start_time, block.speaker));

            let wrapped = wrap_text(&block.corrected_text(), 80);
            output.push_str(&wrapped);
            output.push_str("\n\n");
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Format milliseconds as MM:SS.mmm
pub fn format_timestamp(ms: u64) -> String {
    let seconds = ms / 1000;
    let millis = ms % 1000;
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}
