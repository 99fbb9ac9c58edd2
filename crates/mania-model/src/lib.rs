// Chart data model: hit-object parser, note arena types, scroll-velocity index

mod chart;
mod note;
mod parse;
mod timing_point;
mod velocity;

pub use chart::{Chart, ChartMetadata};
pub use note::{Note, NoteId, NoteKind, NoteState};
pub use parse::{
    LANE_SPACE_WIDTH, ParseWarning, parse, parse_metadata, parse_timing_points,
    parse_with_warnings,
};
pub use timing_point::TimingPoint;
pub use velocity::ScrollVelocity;
