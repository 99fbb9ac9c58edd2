//! Pure judgement policy: timing error to tier, and press-to-note matching.

use mania_model::{Note, NoteId, NoteKind};

use crate::judge_property::{JudgeProperty, Judgement};

/// Map an absolute timing error to a tier.
///
/// Windows are half-open and checked finest first: an error equal to a
/// window's bound already falls into the next tier, and `good` or more is a Miss.
/// A hold tail release has a ceiling of Great. Only a Perfect is lowered;
/// Good and Miss releases keep their tier.
pub fn judgement_for(
    property: &JudgeProperty,
    abs_error: f64,
    kind: NoteKind,
    is_tail_release: bool,
) -> Judgement {
    let w = &property.windows;
    let tier = if abs_error < w.perfect {
        Judgement::Perfect
    } else if abs_error < w.great {
        Judgement::Great
    } else if abs_error < w.good {
        Judgement::Good
    } else {
        Judgement::Miss
    };

    if is_tail_release && kind == NoteKind::Hold && tier == Judgement::Perfect {
        tier.coarser()
    } else {
        tier
    }
}

/// Find the first pressable note in a column near `time`.
///
/// Scans `lane[cursor..]` over at most `property.lookahead` entries for a note
/// that is neither hit, held nor already judged and lies within the miss
/// window. Stops at the first note starting after `time + miss`, since later
/// notes can only be farther away. Returns the position in `lane` and the id.
pub fn find_note_for_hit(
    notes: &[Note],
    lane: &[NoteId],
    cursor: usize,
    time: f64,
    property: &JudgeProperty,
) -> Option<(usize, NoteId)> {
    let miss = property.windows.miss;
    let start = cursor.min(lane.len());

    for (offset, &id) in lane[start..].iter().take(property.lookahead).enumerate() {
        let Some(note) = notes.get(id.index()) else {
            continue;
        };
        if note.hit || note.holding || note.was_interacted {
            continue;
        }
        if note.time > time + miss {
            break;
        }
        if (time - note.time).abs() <= miss {
            return Some((start + offset, id));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge_property::JudgeWindows;

    fn property() -> JudgeProperty {
        JudgeProperty::with_windows(JudgeWindows::new(50.0, 100.0, 150.0, 200.0))
    }

    #[test]
    fn tiers_by_error() {
        let p = property();
        let tap = |e| judgement_for(&p, e, NoteKind::Tap, false);
        assert_eq!(tap(0.0), Judgement::Perfect);
        assert_eq!(tap(49.0), Judgement::Perfect);
        assert_eq!(tap(49.9), Judgement::Perfect);
        assert_eq!(tap(50.0), Judgement::Great);
        assert_eq!(tap(99.0), Judgement::Great);
        assert_eq!(tap(100.0), Judgement::Good);
        assert_eq!(tap(149.0), Judgement::Good);
        assert_eq!(tap(150.0), Judgement::Miss);
        assert_eq!(tap(190.0), Judgement::Miss);
    }

    #[test]
    fn hold_tail_capped() {
        let p = property();
        assert_eq!(
            judgement_for(&p, 10.0, NoteKind::Hold, true),
            Judgement::Great
        );
        assert_eq!(
            judgement_for(&p, 10.0, NoteKind::Hold, false),
            Judgement::Perfect
        );
        // Coarser tiers are unchanged
        assert_eq!(
            judgement_for(&p, 120.0, NoteKind::Hold, true),
            Judgement::Good
        );
        // Tail flag has no effect on taps
        assert_eq!(
            judgement_for(&p, 10.0, NoteKind::Tap, true),
            Judgement::Perfect
        );
    }

    fn lane_of(notes: &[Note]) -> Vec<NoteId> {
        (0..notes.len()).map(NoteId).collect()
    }

    #[test]
    fn finds_first_unconsumed_in_window() {
        let mut notes = vec![
            Note::tap(0, 1000.0),
            Note::tap(0, 1100.0),
            Note::tap(0, 2000.0),
        ];
        let lane = lane_of(&notes);
        let p = property();

        assert_eq!(
            find_note_for_hit(&notes, &lane, 0, 1050.0, &p),
            Some((0, NoteId(0)))
        );

        notes[0].hit = true;
        notes[0].was_interacted = true;
        assert_eq!(
            find_note_for_hit(&notes, &lane, 0, 1050.0, &p),
            Some((1, NoteId(1)))
        );
    }

    #[test]
    fn stops_at_far_future_note() {
        let notes = vec![Note::tap(0, 1000.0), Note::tap(0, 5000.0)];
        let lane = lane_of(&notes);
        assert_eq!(find_note_for_hit(&notes, &lane, 0, 500.0, &property()), None);
    }

    #[test]
    fn skips_stale_notes_behind_press() {
        let notes = vec![Note::tap(0, 100.0), Note::tap(0, 1000.0)];
        let lane = lane_of(&notes);
        assert_eq!(
            find_note_for_hit(&notes, &lane, 0, 990.0, &property()),
            Some((1, NoteId(1)))
        );
    }

    #[test]
    fn lookahead_bounds_scan() {
        let mut notes: Vec<Note> = (0..10).map(|i| Note::tap(0, i as f64)).collect();
        notes.push(Note::tap(0, 5000.0));
        let lane = lane_of(&notes);
        let mut p = property();
        p.lookahead = 4;
        // Note 10 is in range but beyond the lookahead
        assert_eq!(find_note_for_hit(&notes, &lane, 0, 5000.0, &p), None);
        assert_eq!(
            find_note_for_hit(&notes, &lane, 8, 5000.0, &p),
            Some((10, NoteId(10)))
        );
    }

    #[test]
    fn cursor_past_end_is_none() {
        let notes = vec![Note::tap(0, 0.0)];
        let lane = lane_of(&notes);
        assert_eq!(find_note_for_hit(&notes, &lane, 5, 0.0, &property()), None);
    }
}
