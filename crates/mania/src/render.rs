//! Render frame derivation and the renderer seam.
//!
//! Positions are in scroll units above the judgement line: the scroll
//! velocity distance between now and the note, scaled by scroll speed. The
//! renderer maps units to pixels.

use mania_model::{Note, NoteId, NoteKind, NoteState, ScrollVelocity};
use mania_rule::HitManager;

/// Notes further ahead than this are not emitted.
pub const VISIBLE_AHEAD: f64 = 2000.0;
/// Hold bodies are kept until their tail drops this far below the line.
pub const VISIBLE_BEHIND: f64 = 300.0;

#[derive(Debug, thiserror::Error)]
#[error("render fault: {0}")]
pub struct RenderFault(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSprite {
    pub note: NoteId,
    pub column: usize,
    pub kind: NoteKind,
    pub state: NoteState,
    pub head_y: f64,
    /// Equal to `head_y` for taps
    pub tail_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub time: f64,
    pub scroll_speed: f64,
    pub render_tail: bool,
    /// Per-column key state
    pub held: Vec<bool>,
    pub notes: Vec<NoteSprite>,
    pub combo: u32,
    pub accuracy: f64,
}

impl RenderFrame {
    /// Collect the visible notes of every column, starting at its cursor.
    pub fn build(
        notes: &[Note],
        hits: &HitManager,
        velocity: &ScrollVelocity,
        time: f64,
        scroll_speed: f64,
    ) -> Self {
        let now_pos = velocity.position_at(time);
        let mut sprites = Vec::new();

        for column in 0..hits.column_count() {
            let lane = hits.lane_notes(column);
            for &id in &lane[hits.next_index(column).min(lane.len())..] {
                let Some(note) = notes.get(id.index()) else {
                    continue;
                };
                let head_y = (velocity.position_at(note.time) - now_pos) * scroll_speed;
                if head_y > VISIBLE_AHEAD {
                    break;
                }
                let state = note.state();
                if matches!(state, NoteState::ResolvedTap | NoteState::ResolvedHoldOk) {
                    continue;
                }

                let tail_y = if note.is_hold() {
                    (velocity.position_at(note.end_time) - now_pos) * scroll_speed
                } else {
                    head_y
                };
                if tail_y < -VISIBLE_BEHIND {
                    continue;
                }

                sprites.push(NoteSprite {
                    note: id,
                    column,
                    kind: note.kind,
                    state,
                    // A held head sticks to the judgement line
                    head_y: if note.holding { head_y.max(0.0) } else { head_y },
                    tail_y,
                });
            }
        }

        Self {
            time,
            scroll_speed,
            notes: sprites,
            ..Self::default()
        }
    }
}

pub trait Renderer {
    fn draw(&mut self, frame: &RenderFrame) -> Result<(), RenderFault>;
}

/// Discards frames; counts them for headless runs.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &RenderFrame) -> Result<(), RenderFault> {
        self.frames += 1;
        Ok(())
    }
}
