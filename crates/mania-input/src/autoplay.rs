//! Autoplay log generation.
//!
//! Produces the key press/release sequence that plays a chart perfectly:
//! every head is pressed on time, holds are released on their tail and taps
//! are released shortly after.

use serde::{Deserialize, Serialize};

use mania_model::Note;

/// How long autoplay keeps a tap key down, ms.
const TAP_RELEASE_MS: f64 = 30.0;

/// A single key edge at a chart time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyInputLog {
    pub time: f64,
    pub column: usize,
    pub pressed: bool,
}

/// Create the autoplay input log for a time-sorted note list.
///
/// The result is sorted by time, with releases ordered before presses at
/// the same instant so back-to-back notes in one column re-trigger.
pub fn create_autoplay_log(notes: &[Note]) -> Vec<KeyInputLog> {
    let mut log = Vec::with_capacity(notes.len() * 2);

    for (i, note) in notes.iter().enumerate() {
        let next_in_column = notes[i + 1..]
            .iter()
            .find(|n| n.column == note.column)
            .map(|n| n.time);

        let release = if note.is_hold() {
            note.end_time
        } else {
            let mut t = note.time + TAP_RELEASE_MS;
            if let Some(next) = next_in_column {
                // Leave a gap so the next press is a fresh edge
                t = t.min(note.time + (next - note.time) / 2.0);
            }
            t
        };

        log.push(KeyInputLog {
            time: note.time,
            column: note.column,
            pressed: true,
        });
        log.push(KeyInputLog {
            time: release,
            column: note.column,
            pressed: false,
        });
    }

    log.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.pressed.cmp(&b.pressed)));
    log
}
