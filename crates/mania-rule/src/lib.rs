// Judgement windows, hit/miss engine, score aggregation

mod hit_manager;
pub mod judge;
mod judge_property;
mod score;

pub use hit_manager::{HitManager, Interaction, JudgementResult};
pub use judge::{find_note_for_hit, judgement_for};
pub use judge_property::{JUDGEMENT_COUNT, JudgeProperty, JudgeWindows, Judgement};
pub use score::{Rank, ScoreSnapshot, ScoreState};
