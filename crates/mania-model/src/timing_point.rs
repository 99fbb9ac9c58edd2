use serde::{Deserialize, Serialize};

/// Scroll-velocity change point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    /// Time in milliseconds
    pub time: f64,
    /// Scroll-speed factor from this point on
    pub multiplier: f64,
    /// Scroll distance accumulated up to `time` (prefix sum)
    pub cumulative_position: f64,
}

impl TimingPoint {
    pub fn new(time: f64, multiplier: f64) -> Self {
        Self {
            time,
            multiplier,
            cumulative_position: 0.0,
        }
    }

    /// Scroll distance at `time`, assuming `time` lies in this point's segment.
    pub fn position_at(&self, time: f64) -> f64 {
        self.cumulative_position + (time - self.time) * self.multiplier
    }
}

/// Sort points by time and fill in `cumulative_position` prefix sums.
pub(crate) fn sort_and_accumulate(points: &mut [TimingPoint]) {
    points.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut position = 0.0;
    for i in 0..points.len() {
        if i > 0 {
            let prev = points[i - 1];
            position += (points[i].time - prev.time) * prev.multiplier;
        }
        points[i].cumulative_position = position;
    }
}
