//! Scroll-velocity index.
//!
//! Converts chart time into scroll distance across variable-speed segments,
//! using the prefix sums precomputed on each timing point.

use crate::timing_point::{TimingPoint, sort_and_accumulate};

/// Upper bound on binary-search iterations. Sorted input needs ~log2(n).
const MAX_SEARCH_ITERATIONS: usize = 100;

#[derive(Debug, Clone)]
pub struct ScrollVelocity {
    points: Vec<TimingPoint>,
}

impl ScrollVelocity {
    /// Build the index. An empty list falls back to a single 1.0x point at 0 ms.
    pub fn new(mut points: Vec<TimingPoint>) -> Self {
        if points.is_empty() {
            points.push(TimingPoint::new(0.0, 1.0));
        }
        sort_and_accumulate(&mut points);
        Self { points }
    }

    pub fn points(&self) -> &[TimingPoint] {
        &self.points
    }

    /// Index of the last point with `time <= t`, or 0 when `t` precedes every point.
    fn segment_index(&self, t: f64) -> usize {
        let mut left = 0usize;
        let mut right = self.points.len();
        let mut found = 0usize;
        let mut iterations = 0;

        while left < right && iterations < MAX_SEARCH_ITERATIONS {
            iterations += 1;
            let mid = (left + right) / 2;
            if self.points[mid].time <= t {
                found = mid;
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        found
    }

    /// Scroll position at chart time `t` (ms * multiplier units).
    pub fn position_at(&self, t: f64) -> f64 {
        self.points[self.segment_index(t)].position_at(t)
    }

    /// Active multiplier at chart time `t`.
    pub fn multiplier_at(&self, t: f64) -> f64 {
        self.points[self.segment_index(t)].multiplier
    }

    /// Scroll distance between two chart times.
    pub fn distance(&self, from: f64, to: f64) -> f64 {
        self.position_at(to) - self.position_at(from)
    }
}

impl Default for ScrollVelocity {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScrollVelocity {
        ScrollVelocity::new(vec![
            TimingPoint::new(0.0, 1.0),
            TimingPoint::new(1000.0, 2.0),
            TimingPoint::new(2000.0, 0.5),
        ])
    }

    #[test]
    fn empty_defaults_to_identity() {
        let sv = ScrollVelocity::default();
        assert_eq!(sv.points().len(), 1);
        assert_eq!(sv.position_at(1234.0), 1234.0);
        assert_eq!(sv.multiplier_at(-50.0), 1.0);
    }

    #[test]
    fn position_across_segments() {
        let sv = sample();
        assert_eq!(sv.position_at(500.0), 500.0);
        assert_eq!(sv.position_at(1000.0), 1000.0);
        assert_eq!(sv.position_at(1500.0), 2000.0);
        assert_eq!(sv.position_at(2000.0), 3000.0);
        assert_eq!(sv.position_at(2400.0), 3200.0);
    }

    #[test]
    fn before_first_point_uses_first_segment() {
        let sv = ScrollVelocity::new(vec![TimingPoint::new(500.0, 2.0)]);
        // Extrapolated backwards along the first point's multiplier
        assert_eq!(sv.position_at(0.0), -1000.0);
    }

    #[test]
    fn constant_segment_distance_is_linear() {
        let sv = sample();
        let d = sv.distance(1100.0, 1900.0);
        assert!((d - 800.0 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let sv = ScrollVelocity::new(vec![
            TimingPoint::new(2000.0, 0.5),
            TimingPoint::new(0.0, 1.0),
            TimingPoint::new(1000.0, 2.0),
        ]);
        assert_eq!(sv.position_at(1500.0), 2000.0);
        assert_eq!(sv.multiplier_at(1999.0), 2.0);
    }

    #[test]
    fn nan_time_terminates() {
        let sv = sample();
        // Must not hang; value is unspecified.
        let _ = sv.position_at(f64::NAN);
    }
}
