use log::warn;
use thiserror::Error;

use crate::chart::ChartMetadata;
use crate::note::Note;
use crate::timing_point::{TimingPoint, sort_and_accumulate};

/// Horizontal playfield width that hit-object x positions are expressed in.
pub const LANE_SPACE_WIDTH: f64 = 512.0;

/// Bit in the hit-object type field that marks a hold note.
const HOLD_TYPE_BIT: u32 = 128;

/// A hit-object or timing-point record that was skipped or degraded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseWarning {
    /// 1-based line number in the chart text
    pub line: usize,
    pub reason: String,
}

impl ParseWarning {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Iterate the non-empty, non-comment lines of a bracketed section.
///
/// Yields `(line_number, trimmed_line)`. The section ends at the next line
/// starting with `[` or at end of input.
fn section_lines<'a>(text: &'a str, header: &'a str) -> impl Iterator<Item = (usize, &'a str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .skip_while(move |(_, line)| *line != header)
        .skip(1)
        .take_while(|(_, line)| !line.starts_with('['))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
}

/// Parse the `[HitObjects]` section into notes sorted by head time.
pub fn parse(text: &str, column_count: usize) -> Vec<Note> {
    parse_with_warnings(text, column_count).0
}

/// Parse `[HitObjects]`, returning the notes plus one warning per skipped or degraded record.
pub fn parse_with_warnings(text: &str, column_count: usize) -> (Vec<Note>, Vec<ParseWarning>) {
    let mut notes = Vec::new();
    let mut warnings = Vec::new();

    if column_count == 0 {
        return (notes, warnings);
    }

    for (line_no, line) in section_lines(text, "[HitObjects]") {
        match parse_hit_object(line, column_count) {
            Ok((note, degraded)) => {
                if let Some(reason) = degraded {
                    warnings.push(ParseWarning::new(line_no, reason));
                }
                notes.push(note);
            }
            Err(reason) => warnings.push(ParseWarning::new(line_no, reason)),
        }
    }

    for w in &warnings {
        warn!("chart parse: {w}");
    }

    // Stable: ties keep file order
    notes.sort_by(|a, b| a.time.total_cmp(&b.time));
    (notes, warnings)
}

/// Parse one `x,y,time,type,hitSound[,endTime:hitSample]` record.
///
/// Returns the note and an optional degradation reason, or the reason the
/// record was skipped.
fn parse_hit_object(line: &str, column_count: usize) -> Result<(Note, Option<String>), String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(format!("expected at least 4 fields, found {}", fields.len()));
    }

    let x: f64 = fields[0]
        .parse()
        .map_err(|_| format!("invalid x position {:?}", fields[0]))?;
    if !x.is_finite() || x < 0.0 {
        return Err(format!("x position out of range: {x}"));
    }
    let time: f64 = fields[2]
        .parse()
        .map_err(|_| format!("invalid time {:?}", fields[2]))?;
    if !time.is_finite() {
        return Err(format!("non-finite time {:?}", fields[2]));
    }
    let kind: u32 = fields[3]
        .parse()
        .map_err(|_| format!("invalid type {:?}", fields[3]))?;

    let column = column_for_x(x, column_count);

    if kind & HOLD_TYPE_BIT == 0 {
        return Ok((Note::tap(column, time), None));
    }

    let end = fields
        .get(5)
        .and_then(|params| params.split(':').next())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|t| t.is_finite());

    match end {
        Some(end_time) if end_time < time => Ok((
            Note::hold(column, time, time),
            Some(format!("hold end {end_time} before head {time}, clamped")),
        )),
        Some(end_time) => Ok((Note::hold(column, time, end_time), None)),
        None => Ok((
            Note::tap(column, time),
            Some("hold without a valid end time, read as tap".to_string()),
        )),
    }
}

/// Map a lane-space x coordinate onto a column index.
fn column_for_x(x: f64, column_count: usize) -> usize {
    let col = (x * column_count as f64 / LANE_SPACE_WIDTH).floor() as usize;
    col.min(column_count - 1)
}

/// Parse `[TimingPoints]` into scroll-velocity points, sorted and prefix-summed.
///
/// Inherited points (`uninherited == "0"`) carry a slider-velocity factor of
/// `-100 / beatLength`, floored at 0.1x. All other points are 1.0x.
pub fn parse_timing_points(text: &str) -> Vec<TimingPoint> {
    let mut points = Vec::new();

    for (line_no, line) in section_lines(text, "[TimingPoints]") {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 {
            warn!("timing point line {line_no}: expected at least 2 fields");
            continue;
        }
        let (Ok(time), Ok(beat_length)) = (fields[0].parse::<f64>(), fields[1].parse::<f64>())
        else {
            warn!("timing point line {line_no}: invalid number in {line:?}");
            continue;
        };
        if !time.is_finite() {
            warn!("timing point line {line_no}: non-finite time");
            continue;
        }

        let multiplier = if fields.get(6) == Some(&"0") {
            (-100.0 / beat_length).max(0.1)
        } else {
            1.0
        };
        points.push(TimingPoint::new(time, multiplier));
    }

    sort_and_accumulate(&mut points);
    points
}

/// Read `[General]`, `[Metadata]` and `[Difficulty]` key:value pairs.
pub fn parse_metadata(text: &str) -> ChartMetadata {
    let mut meta = ChartMetadata::default();

    for header in ["[General]", "[Metadata]", "[Difficulty]"] {
        for (_, line) in section_lines(text, header) {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Title" => meta.title = value.to_string(),
                "Artist" => meta.artist = value.to_string(),
                "Version" => meta.version = value.to_string(),
                "AudioFilename" => meta.audio_filename = value.to_string(),
                "AudioLeadIn" => meta.audio_lead_in = value.parse().unwrap_or(0.0),
                // mania stores the key count in CircleSize
                "CircleSize" => {
                    meta.key_count = value
                        .parse::<f64>()
                        .ok()
                        .filter(|v| *v >= 1.0)
                        .map(|v| v as usize)
                }
                _ => {}
            }
        }
    }
    meta
}
