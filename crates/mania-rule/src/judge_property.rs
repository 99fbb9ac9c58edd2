use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Number of judgement tiers: Perfect, Great, Good, Miss.
pub const JUDGEMENT_COUNT: usize = 4;

/// Judgement tier, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Judgement {
    Perfect,
    Great,
    Good,
    Miss,
}

impl Judgement {
    pub const ALL: [Judgement; JUDGEMENT_COUNT] = [
        Judgement::Perfect,
        Judgement::Great,
        Judgement::Good,
        Judgement::Miss,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn is_miss(self) -> bool {
        self == Judgement::Miss
    }

    /// One step coarser. Miss stays Miss.
    pub fn coarser(self) -> Self {
        match self {
            Judgement::Perfect => Judgement::Great,
            Judgement::Great => Judgement::Good,
            Judgement::Good | Judgement::Miss => Judgement::Miss,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Judgement::Perfect => "PERFECT",
            Judgement::Great => "GREAT",
            Judgement::Good => "GOOD",
            Judgement::Miss => "MISS",
        }
    }
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maximum admitted |error| per tier, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeWindows {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
    /// Widest window: a press farther than this never matches a note
    pub miss: f64,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect: 49.0,
            great: 82.0,
            good: 112.0,
            miss: 150.0,
        }
    }
}

impl JudgeWindows {
    pub fn new(perfect: f64, great: f64, good: f64, miss: f64) -> Self {
        Self {
            perfect,
            great,
            good,
            miss,
        }
    }
}

/// Judge configuration: windows, per-tier weights/points, scan limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JudgeProperty {
    pub windows: JudgeWindows,
    /// Accuracy weight per tier, indexed by `Judgement::index`
    pub weights: [f64; JUDGEMENT_COUNT],
    /// Score points per tier
    pub points: [u32; JUDGEMENT_COUNT],
    /// Max notes scanned per column when matching a press
    pub lookahead: usize,
    /// Notes this far (ms) past their exit time are skipped unconditionally
    pub grace_period: f64,
    /// Subtract input processing latency (tick time minus event time) from press times
    pub latency_compensation: bool,
}

impl Default for JudgeProperty {
    fn default() -> Self {
        Self {
            windows: JudgeWindows::default(),
            weights: [1.0, 0.65, 0.35, 0.0],
            points: [300, 200, 100, 0],
            lookahead: 32,
            grace_period: 2000.0,
            latency_compensation: true,
        }
    }
}

impl JudgeProperty {
    pub fn with_windows(windows: JudgeWindows) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn weight(&self, tier: Judgement) -> f64 {
        self.weights[tier.index()]
    }

    pub fn points(&self, tier: Judgement) -> u32 {
        self.points[tier.index()]
    }

    /// Clamp values to usable ranges.
    ///
    /// Windows are made non-negative and non-decreasing from perfect to miss.
    pub fn validate(&mut self) {
        let w = &mut self.windows;
        w.perfect = w.perfect.max(0.0);
        w.great = w.great.max(w.perfect);
        w.good = w.good.max(w.great);
        w.miss = w.miss.max(w.good);

        for weight in &mut self.weights {
            *weight = weight.clamp(0.0, 1.0);
        }
        self.lookahead = self.lookahead.clamp(1, 1024);
        self.grace_period = self.grace_period.max(self.windows.miss);
    }

    /// Read a judge property from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut property: JudgeProperty = serde_json::from_str(&data)?;
        property.validate();
        Ok(property)
    }

    /// Write the judge property to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = JudgeProperty::default();
        assert_eq!(p.windows.perfect, 49.0);
        assert_eq!(p.windows.miss, 150.0);
        assert_eq!(p.weight(Judgement::Great), 0.65);
        assert_eq!(p.points(Judgement::Perfect), 300);
        assert_eq!(p.points(Judgement::Miss), 0);
        assert_eq!(p.lookahead, 32);
        assert_eq!(p.grace_period, 2000.0);
    }

    #[test]
    fn test_coarser() {
        assert_eq!(Judgement::Perfect.coarser(), Judgement::Great);
        assert_eq!(Judgement::Good.coarser(), Judgement::Miss);
        assert_eq!(Judgement::Miss.coarser(), Judgement::Miss);
    }

    #[test]
    fn test_validate_orders_windows() {
        let mut p = JudgeProperty::with_windows(JudgeWindows::new(-5.0, 80.0, 40.0, 10.0));
        p.lookahead = 0;
        p.validate();
        assert_eq!(p.windows.perfect, 0.0);
        assert_eq!(p.windows.good, 80.0);
        assert_eq!(p.windows.miss, 80.0);
        assert_eq!(p.lookahead, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: JudgeProperty =
            serde_json::from_str(r#"{"windows":{"perfect":20.0},"latencyCompensation":false}"#)
                .unwrap();
        assert_eq!(p.windows.perfect, 20.0);
        assert_eq!(p.windows.great, 82.0);
        assert!(!p.latency_compensation);
        assert_eq!(p.points, [300, 200, 100, 0]);
    }

    #[test]
    fn test_read_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("judge.json");
        let p = JudgeProperty::with_windows(JudgeWindows::new(50.0, 100.0, 150.0, 200.0));
        p.write(&path).unwrap();
        let back = JudgeProperty::read(&path).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_display() {
        assert_eq!(Judgement::Great.to_string(), "GREAT");
    }
}
