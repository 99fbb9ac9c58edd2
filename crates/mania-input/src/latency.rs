use std::collections::VecDeque;

/// Rolling record of input processing latency (handling time minus event time).
#[derive(Debug, Clone)]
pub struct LatencyMonitor {
    history: VecDeque<f64>,
    capacity: usize,
    last: f64,
}

impl Default for LatencyMonitor {
    fn default() -> Self {
        Self::new(60)
    }
}

impl LatencyMonitor {
    /// `capacity` is the number of samples kept, usually the display refresh rate.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            last: 0.0,
        }
    }

    pub fn record(&mut self, now: f64, event_timestamp: f64) {
        self.last = now - event_timestamp;
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(self.last);
    }

    pub fn average(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn samples(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.last = 0.0;
    }
}
