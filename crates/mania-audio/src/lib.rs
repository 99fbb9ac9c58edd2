// Audio clock, time sources, decoding into PCM, output sink seam

mod clock;
pub mod decode;
mod error;
mod pcm;
mod sink;
mod time;

pub use clock::{AudioClock, ClockState};
pub use error::LoadError;
pub use pcm::Pcm;
pub use sink::{AudioSink, NullSink};
pub use time::{ManualTime, SystemTime, TimeSource};
