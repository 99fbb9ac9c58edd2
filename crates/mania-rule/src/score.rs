use std::fmt;

use serde::{Deserialize, Serialize};

use crate::judge_property::{JUDGEMENT_COUNT, JudgeProperty, Judgement};

/// Letter rank derived from accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    SS,
    S,
    A,
    B,
    C,
    D,
}

impl Rank {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 100.0 {
            Rank::SS
        } else if accuracy > 95.0 {
            Rank::S
        } else if accuracy > 90.0 {
            Rank::A
        } else if accuracy > 80.0 {
            Rank::B
        } else if accuracy > 70.0 {
            Rank::C
        } else {
            Rank::D
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::SS => "SS",
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        };
        f.write_str(s)
    }
}

/// Running score for one session.
#[derive(Debug, Clone)]
pub struct ScoreState {
    weights: [f64; JUDGEMENT_COUNT],
    points: [u32; JUDGEMENT_COUNT],

    score: u64,
    combo: u32,
    max_combo: u32,
    counts: [u32; JUDGEMENT_COUNT],
    weight_sum: f64,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new(&JudgeProperty::default())
    }
}

impl ScoreState {
    pub fn new(property: &JudgeProperty) -> Self {
        Self {
            weights: property.weights,
            points: property.points,
            score: 0,
            combo: 0,
            max_combo: 0,
            counts: [0; JUDGEMENT_COUNT],
            weight_sum: 0.0,
        }
    }

    pub fn add_hit(&mut self, tier: Judgement) {
        let i = tier.index();
        self.counts[i] += 1;
        self.weight_sum += self.weights[i];
        self.score += u64::from(self.points[i]);

        if tier.is_miss() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn count(&self, tier: Judgement) -> u32 {
        self.counts[tier.index()]
    }

    pub fn judged(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Weighted accuracy in percent; 100 before anything is judged.
    pub fn accuracy(&self) -> f64 {
        let judged = self.judged();
        if judged == 0 {
            return 100.0;
        }
        (self.weight_sum / f64::from(judged) * 100.0).clamp(0.0, 100.0)
    }

    pub fn rank(&self) -> Rank {
        Rank::from_accuracy(self.accuracy())
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.counts = [0; JUDGEMENT_COUNT];
        self.weight_sum = 0.0;
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            perfect: self.count(Judgement::Perfect),
            great: self.count(Judgement::Great),
            good: self.count(Judgement::Good),
            miss: self.count(Judgement::Miss),
            accuracy: self.accuracy(),
            rank: self.rank(),
        }
    }
}

/// Serializable copy of the score for UI and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
    pub accuracy: f64,
    pub rank: Rank,
}
