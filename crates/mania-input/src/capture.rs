//! Key edge capture.
//!
//! Each column keeps a FIFO of press timestamps and a held flag. Capture is
//! decoupled from judgement: presses that land between logic ticks stay
//! queued until the hit manager drains them.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::control_keys::{ControlAction, control_action_for};

/// Signal produced by a key edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputSignal {
    KeyDown(usize),
    KeyUp(usize),
    Control(ControlAction),
}

pub struct InputCapture {
    queues: Vec<VecDeque<f64>>,
    held: Vec<bool>,
    bindings: HashMap<String, usize>,
    /// Column presses are dropped while false; control keys still pass.
    accepting: bool,
}

impl InputCapture {
    pub fn new<S: AsRef<str>>(column_count: usize, bindings: &[S]) -> Self {
        let mut capture = Self {
            queues: vec![VecDeque::new(); column_count],
            held: vec![false; column_count],
            bindings: HashMap::new(),
            accepting: true,
        };
        capture.set_bindings(bindings);
        capture
    }

    pub fn column_count(&self) -> usize {
        self.queues.len()
    }

    /// Rebind keys: `bindings[i]` drives column `i`. Keys are case-insensitive.
    pub fn set_bindings<S: AsRef<str>>(&mut self, bindings: &[S]) {
        self.bindings = bindings
            .iter()
            .take(self.queues.len())
            .enumerate()
            .map(|(col, key)| (key.as_ref().to_lowercase(), col))
            .collect();
    }

    pub fn column_for(&self, key: &str) -> Option<usize> {
        self.bindings.get(&key.to_lowercase()).copied()
    }

    /// Press edge. OS key-repeat events are ignored.
    ///
    /// Control keys take precedence over column bindings.
    pub fn key_down(&mut self, key: &str, timestamp: f64, repeat: bool) -> Option<InputSignal> {
        if repeat {
            return None;
        }
        let key = key.to_lowercase();

        if let Some(action) = control_action_for(&key) {
            return Some(InputSignal::Control(action));
        }

        let col = *self.bindings.get(&key)?;
        self.press_column(col, timestamp)
    }

    /// Release edge. The press queue is left alone.
    pub fn key_up(&mut self, key: &str) -> Option<InputSignal> {
        let col = self.column_for(key)?;
        self.release_column(col)
    }

    /// Press a column directly (autoplay, tests).
    pub fn press_column(&mut self, col: usize, timestamp: f64) -> Option<InputSignal> {
        if !self.accepting || col >= self.queues.len() {
            return None;
        }
        self.held[col] = true;
        self.queues[col].push_back(timestamp);
        Some(InputSignal::KeyDown(col))
    }

    pub fn release_column(&mut self, col: usize) -> Option<InputSignal> {
        let held = self.held.get_mut(col)?;
        *held = false;
        Some(InputSignal::KeyUp(col))
    }

    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Pop the oldest pending press timestamp for a column.
    pub fn consume_input(&mut self, col: usize) -> Option<f64> {
        self.queues.get_mut(col)?.pop_front()
    }

    pub fn pending(&self, col: usize) -> usize {
        self.queues.get(col).map_or(0, VecDeque::len)
    }

    pub fn is_pressing(&self, col: usize) -> bool {
        self.held.get(col).copied().unwrap_or(false)
    }

    /// Drop all pending presses and held flags (pause, restart).
    pub fn clear_queue(&mut self) {
        let dropped: usize = self.queues.iter().map(VecDeque::len).sum();
        if dropped > 0 {
            debug!("input: dropping {dropped} pending presses");
        }
        self.queues.iter_mut().for_each(VecDeque::clear);
        self.held.fill(false);
    }
}
