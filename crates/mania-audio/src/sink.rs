use crate::pcm::Pcm;

/// Audio output device seam.
///
/// The clock never asks the sink for time; it only tells it what to do.
pub trait AudioSink {
    /// Start (or restart) output of `pcm` from `position_ms`.
    fn start(&mut self, pcm: &Pcm, position_ms: f64);

    /// Halt output, keeping nothing queued.
    fn stop(&mut self);

    /// Linear gain, 0.0 = silent.
    fn set_volume(&mut self, volume: f32);
}

/// Sink that discards all audio. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn start(&mut self, _pcm: &Pcm, _position_ms: f64) {}

    fn stop(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}
}
