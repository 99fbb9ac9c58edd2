use serde::{Deserialize, Serialize};

/// Index of a note inside the chart's note arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub usize);

impl NoteId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The type of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteKind {
    #[default]
    Tap,
    Hold,
}

/// Lifecycle view derived from a note's judgement flags.
///
/// `Unseen -> {ResolvedTap | Holding} -> {ResolvedHoldOk | ResolvedHoldBroken}`,
/// or `Unseen -> ResolvedMiss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteState {
    Unseen,
    Holding,
    ResolvedTap,
    ResolvedHoldOk,
    ResolvedHoldBroken,
    ResolvedMiss,
}

/// A single hittable note in the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Head time in milliseconds
    pub time: f64,
    /// Tail time in milliseconds (equal to `time` for taps)
    pub end_time: f64,
    /// Column index (0-indexed)
    pub column: usize,
    pub kind: NoteKind,
    /// Head was judged as a successful hit
    pub hit: bool,
    /// Hold head was hit and the key has not been released yet
    pub holding: bool,
    /// A judgement (hit or timeout) has been applied to the head
    pub was_interacted: bool,
    /// Hold body failed: head missed, released early, or timed out
    pub is_broken: bool,
}

impl Note {
    pub fn tap(column: usize, time: f64) -> Self {
        Self {
            time,
            end_time: time,
            column,
            kind: NoteKind::Tap,
            hit: false,
            holding: false,
            was_interacted: false,
            is_broken: false,
        }
    }

    pub fn hold(column: usize, time: f64, end_time: f64) -> Self {
        Self {
            end_time,
            kind: NoteKind::Hold,
            ..Self::tap(column, time)
        }
    }

    pub fn is_hold(&self) -> bool {
        self.kind == NoteKind::Hold
    }

    /// Duration in milliseconds (0 for taps)
    pub fn duration(&self) -> f64 {
        self.end_time - self.time
    }

    /// Time after which the note can no longer change: tail for holds, head for taps.
    pub fn exit_time(&self) -> f64 {
        match self.kind {
            NoteKind::Tap => self.time,
            NoteKind::Hold => self.end_time,
        }
    }

    /// Judged and not being held any more.
    pub fn is_resolved(&self) -> bool {
        (self.hit || self.was_interacted) && !self.holding
    }

    pub fn state(&self) -> NoteState {
        if self.holding {
            return NoteState::Holding;
        }
        if !self.was_interacted && !self.hit {
            return NoteState::Unseen;
        }
        match (self.kind, self.hit, self.is_broken) {
            (_, false, _) => NoteState::ResolvedMiss,
            (NoteKind::Tap, true, _) => NoteState::ResolvedTap,
            (NoteKind::Hold, true, false) => NoteState::ResolvedHoldOk,
            (NoteKind::Hold, true, true) => NoteState::ResolvedHoldBroken,
        }
    }

    /// Clear all judgement flags (restart).
    pub fn reset(&mut self) {
        self.hit = false;
        self.holding = false;
        self.was_interacted = false;
        self.is_broken = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_has_equal_end_time() {
        let n = Note::tap(2, 1500.0);
        assert_eq!(n.end_time, 1500.0);
        assert_eq!(n.duration(), 0.0);
        assert_eq!(n.exit_time(), 1500.0);
        assert!(!n.is_hold());
    }

    #[test]
    fn hold_exit_time_is_tail() {
        let n = Note::hold(0, 1000.0, 2000.0);
        assert!(n.is_hold());
        assert_eq!(n.exit_time(), 2000.0);
        assert_eq!(n.duration(), 1000.0);
    }

    #[test]
    fn state_transitions() {
        let mut n = Note::hold(0, 1000.0, 2000.0);
        assert_eq!(n.state(), NoteState::Unseen);

        n.was_interacted = true;
        n.hit = true;
        n.holding = true;
        assert_eq!(n.state(), NoteState::Holding);
        assert!(!n.is_resolved());

        n.holding = false;
        assert_eq!(n.state(), NoteState::ResolvedHoldOk);
        assert!(n.is_resolved());

        n.is_broken = true;
        assert_eq!(n.state(), NoteState::ResolvedHoldBroken);
    }

    #[test]
    fn timed_out_note_is_miss() {
        let mut n = Note::tap(1, 500.0);
        n.was_interacted = true;
        assert_eq!(n.state(), NoteState::ResolvedMiss);

        let mut h = Note::hold(1, 500.0, 900.0);
        h.was_interacted = true;
        h.is_broken = true;
        assert_eq!(h.state(), NoteState::ResolvedMiss);
    }

    #[test]
    fn reset_clears_flags() {
        let mut n = Note::hold(3, 10.0, 20.0);
        n.hit = true;
        n.holding = true;
        n.was_interacted = true;
        n.is_broken = true;
        n.reset();
        assert_eq!(n, Note::hold(3, 10.0, 20.0));
    }

    #[test]
    fn note_id_serde() {
        let json = serde_json::to_string(&NoteId(7)).unwrap();
        let back: NoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index(), 7);
    }
}
