use log::{debug, warn};
use serde::{Deserialize, Serialize};

use mania_model::{Note, NoteId, NoteKind};

use crate::judge::{find_note_for_hit, judgement_for};
use crate::judge_property::{JudgeProperty, Judgement};

/// Max notes examined per column in one `update` sweep.
const SWEEP_LIMIT: usize = 64;

/// What produced a judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interaction {
    /// Key press matched a note head
    Hit,
    /// Hold released near its tail, or held through the end
    Release,
    /// Note timed out without a press
    Miss,
    /// Hold released well before its tail
    HoldBreak,
}

/// A single judgement emitted by the hit manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgementResult {
    pub note: NoteId,
    pub column: usize,
    pub tier: Judgement,
    /// Signed error in ms: positive is late
    pub error_ms: f64,
    pub kind: Interaction,
}

/// Hit/miss engine.
///
/// Keeps per-column note-id lists and a monotonic cursor per column. Notes
/// before the cursor are resolved and never looked at again.
#[derive(Debug, Clone)]
pub struct HitManager {
    property: JudgeProperty,
    // column -> note ids in time order
    lane_notes: Vec<Vec<NoteId>>,
    next_index: Vec<usize>,
}

impl HitManager {
    pub fn new(notes: &[Note], column_count: usize, property: JudgeProperty) -> Self {
        let mut lane_notes: Vec<Vec<NoteId>> = vec![Vec::new(); column_count];
        for (i, note) in notes.iter().enumerate() {
            if let Some(lane) = lane_notes.get_mut(note.column) {
                lane.push(NoteId(i));
            }
        }

        Self {
            property,
            lane_notes,
            next_index: vec![0; column_count],
        }
    }

    pub fn column_count(&self) -> usize {
        self.lane_notes.len()
    }

    pub fn property(&self) -> &JudgeProperty {
        &self.property
    }

    /// Cursor of a column: index into `lane_notes(column)`.
    pub fn next_index(&self, column: usize) -> usize {
        self.next_index.get(column).copied().unwrap_or(0)
    }

    pub fn lane_notes(&self, column: usize) -> &[NoteId] {
        self.lane_notes.get(column).map_or(&[], Vec::as_slice)
    }

    /// True once every column's cursor has passed its last note.
    pub fn is_finished(&self) -> bool {
        self.lane_notes
            .iter()
            .zip(&self.next_index)
            .all(|(lane, &idx)| idx >= lane.len())
    }

    fn advance(&mut self, column: usize, to: usize) {
        let cursor = &mut self.next_index[column];
        if to > *cursor {
            *cursor = to;
        }
    }

    /// Judge every queued press.
    ///
    /// `time` is chart time at this tick and `now` the host time the press
    /// timestamps are measured in. `consume(column)` pops the oldest press
    /// timestamp for a column and is called until it returns `None`. Presses
    /// that match no note are dropped.
    pub fn process_input_hits<F>(
        &mut self,
        notes: &mut [Note],
        time: f64,
        now: f64,
        mut consume: F,
    ) -> Vec<JudgementResult>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut results = Vec::new();

        for column in 0..self.lane_notes.len() {
            while let Some(timestamp) = consume(column) {
                let press_time = if self.property.latency_compensation {
                    time - (now - timestamp).max(0.0)
                } else {
                    time
                };

                let lane = &self.lane_notes[column];
                let Some((_, id)) = find_note_for_hit(
                    notes,
                    lane,
                    self.next_index[column],
                    press_time,
                    &self.property,
                ) else {
                    debug!("column {column}: press at {press_time:.1} matched no note");
                    continue;
                };

                let note = &mut notes[id.index()];
                let error_ms = press_time - note.time;
                let tier = judgement_for(&self.property, error_ms.abs(), note.kind, false);

                note.was_interacted = true;
                match (note.kind, tier) {
                    (NoteKind::Tap, _) => note.hit = true,
                    (NoteKind::Hold, Judgement::Miss) => {
                        note.is_broken = true;
                        note.hit = false;
                        note.holding = false;
                    }
                    (NoteKind::Hold, _) => {
                        note.holding = true;
                        note.hit = true;
                        note.is_broken = false;
                    }
                }

                results.push(JudgementResult {
                    note: id,
                    column,
                    tier,
                    error_ms,
                    kind: Interaction::Hit,
                });
            }
        }
        results
    }

    /// Judge a key release in `column` at chart time `time`.
    ///
    /// Returns `None` when no hold is being held in that column.
    pub fn process_release(
        &mut self,
        notes: &mut [Note],
        column: usize,
        time: f64,
    ) -> Option<JudgementResult> {
        let lane = self.lane_notes.get(column)?;
        let cursor = self.next_index[column];
        let id = lane[cursor.min(lane.len())..]
            .iter()
            .take(self.property.lookahead)
            .copied()
            .find(|id| notes.get(id.index()).is_some_and(|n| n.holding))?;

        let note = &mut notes[id.index()];
        note.holding = false;
        let error_ms = time - note.end_time;

        if error_ms.abs() > self.property.windows.miss && time < note.end_time {
            note.is_broken = true;
            return Some(JudgementResult {
                note: id,
                column,
                tier: Judgement::Miss,
                error_ms,
                kind: Interaction::HoldBreak,
            });
        }

        Some(JudgementResult {
            note: id,
            column,
            tier: judgement_for(&self.property, error_ms.abs(), note.kind, true),
            error_ms,
            kind: Interaction::Release,
        })
    }

    /// Per-tick sweep: auto-release finished holds, time out missed notes,
    /// and advance cursors past resolved ones.
    pub fn update<F>(&mut self, notes: &mut [Note], time: f64, mut emit: F)
    where
        F: FnMut(JudgementResult),
    {
        let windows = self.property.windows;
        let grace = self.property.grace_period;

        for column in 0..self.lane_notes.len() {
            let mut idx = self.next_index[column];
            let mut checks = 0;

            while idx < self.lane_notes[column].len() && checks < SWEEP_LIMIT {
                checks += 1;
                let id = self.lane_notes[column][idx];
                let Some(note) = notes.get_mut(id.index()) else {
                    self.advance(column, idx + 1);
                    idx += 1;
                    continue;
                };

                if note.is_resolved() {
                    self.advance(column, idx + 1);
                    idx += 1;
                    continue;
                }

                // Held through the end
                if note.holding && time > note.end_time + windows.good {
                    note.holding = false;
                    emit(JudgementResult {
                        note: id,
                        column,
                        tier: Judgement::Perfect.coarser(),
                        error_ms: 0.0,
                        kind: Interaction::Release,
                    });
                    self.advance(column, idx + 1);
                    idx += 1;
                    continue;
                }

                if !note.was_interacted && time > note.time + windows.miss {
                    note.was_interacted = true;
                    note.hit = false;
                    if note.kind == NoteKind::Hold {
                        note.is_broken = true;
                    }
                    emit(JudgementResult {
                        note: id,
                        column,
                        tier: Judgement::Miss,
                        error_ms: 0.0,
                        kind: Interaction::Miss,
                    });
                    self.advance(column, idx + 1);
                    idx += 1;
                    continue;
                }

                if time > note.exit_time() + grace {
                    warn!(
                        "column {column}: note {} stuck past grace period at {time:.1}, skipping",
                        id.index()
                    );
                    self.advance(column, idx + 1);
                    idx += 1;
                    continue;
                }

                break;
            }
        }
    }

    /// Rewind all cursors (restart).
    pub fn reset(&mut self) {
        self.next_index.fill(0);
    }
}
