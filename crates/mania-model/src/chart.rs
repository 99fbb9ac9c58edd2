use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteId};
use crate::parse::{ParseWarning, parse_metadata, parse_timing_points, parse_with_warnings};
use crate::timing_point::TimingPoint;
use crate::velocity::ScrollVelocity;

/// Descriptive chart fields from the `[General]`/`[Metadata]`/`[Difficulty]` sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub title: String,
    pub artist: String,
    pub version: String,
    pub audio_filename: String,
    /// Silence before the audio starts, in milliseconds
    pub audio_lead_in: f64,
    /// Key count declared by the chart, if any
    pub key_count: Option<usize>,
}

/// A fully parsed chart: notes, scroll-velocity points and metadata.
#[derive(Debug, Clone)]
pub struct Chart {
    pub metadata: ChartMetadata,
    pub notes: Vec<Note>,
    pub timing_points: Vec<TimingPoint>,
    pub warnings: Vec<ParseWarning>,
    pub column_count: usize,
}

impl Chart {
    pub fn parse(text: &str, column_count: usize) -> Self {
        let (notes, warnings) = parse_with_warnings(text, column_count);
        Self {
            metadata: parse_metadata(text),
            notes,
            timing_points: parse_timing_points(text),
            warnings,
            column_count,
        }
    }

    pub fn load(path: &Path, column_count: usize) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chart {}", path.display()))?;
        Ok(Self::parse(&text, column_count))
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id.index())
    }

    pub fn scroll_velocity(&self) -> ScrollVelocity {
        ScrollVelocity::new(self.timing_points.clone())
    }

    /// Latest time any note needs (tail for holds), 0 for an empty chart.
    pub fn last_time(&self) -> f64 {
        self.notes
            .iter()
            .map(Note::exit_time)
            .fold(0.0, f64::max)
    }

    pub fn total_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn hold_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_hold()).count()
    }

    /// Maximum number of judgements a play produces: one per tap, two per hold.
    /// A hold whose head is missed yields only one.
    pub fn judgement_count(&self) -> usize {
        self.total_notes() + self.hold_count()
    }
}
