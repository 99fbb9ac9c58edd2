//! Abstraction over host time sources.
//! Implementations: SystemTime (production), ManualTime (testing).

use std::cell::Cell;
use std::time::Instant;

pub trait TimeSource {
    /// Current host time in milliseconds from an arbitrary epoch.
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock backed by `Instant`.
pub struct SystemTime {
    start: Instant,
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic tests.
#[derive(Default)]
pub struct ManualTime {
    current_ms: Cell<f64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, ms: f64) {
        self.current_ms.set(ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.current_ms.set(self.current_ms.get() + delta_ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        self.current_ms.get()
    }
}
