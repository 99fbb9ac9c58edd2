//! Audio clock: the single source of chart time.
//!
//! Chart time is elapsed playback in ms plus a calibration offset. While
//! playing it is the host-time delta since the last `play()` plus the
//! accumulated position; while stopped it is the accumulated position alone.

use std::path::Path;
use std::rc::Rc;

use log::{debug, info};

use crate::decode;
use crate::error::LoadError;
use crate::pcm::Pcm;
use crate::sink::{AudioSink, NullSink};
use crate::time::TimeSource;

/// Sample rate used for generated silence.
const SILENCE_SAMPLE_RATE: u32 = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Playing,
}

pub struct AudioClock {
    time: Rc<dyn TimeSource>,
    sink: Box<dyn AudioSink>,
    pcm: Option<Pcm>,
    state: ClockState,
    /// Host time of the last `play()`
    started_at: f64,
    /// Playback position frozen at the last `stop()`/`seek()`
    accumulated: f64,
    offset: f64,
    volume: f32,
}

impl AudioClock {
    pub fn new(time: Rc<dyn TimeSource>) -> Self {
        Self::with_sink(time, Box::new(NullSink))
    }

    pub fn with_sink(time: Rc<dyn TimeSource>, sink: Box<dyn AudioSink>) -> Self {
        Self {
            time,
            sink,
            pcm: None,
            state: ClockState::Stopped,
            started_at: 0.0,
            accumulated: 0.0,
            offset: 0.0,
            volume: 0.2,
        }
    }

    /// Decode an in-memory audio file on the blocking pool.
    pub async fn load_bytes(
        &mut self,
        bytes: Vec<u8>,
        ext_hint: Option<String>,
    ) -> Result<(), LoadError> {
        let pcm =
            tokio::task::spawn_blocking(move || decode::decode_bytes(bytes, ext_hint.as_deref()))
                .await
                .map_err(|e| LoadError::Decode(format!("decode task failed: {e}")))??;
        self.set_pcm(pcm);
        Ok(())
    }

    pub async fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let bytes = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        self.load_bytes(bytes, ext).await
    }

    /// Use a silent buffer instead of song audio (headless runs).
    pub fn load_silence(&mut self, duration_ms: f64) {
        self.set_pcm(Pcm::silence(duration_ms, SILENCE_SAMPLE_RATE));
    }

    fn set_pcm(&mut self, pcm: Pcm) {
        info!("audio loaded: {:.0} ms", pcm.duration_ms());
        self.full_stop();
        self.pcm = Some(pcm);
    }

    pub fn is_loaded(&self) -> bool {
        self.pcm.is_some()
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    /// Resume from the last paused position. No-op without audio or while playing.
    pub fn play(&mut self) {
        let Some(pcm) = &self.pcm else {
            debug!("clock: play() without audio ignored");
            return;
        };
        if self.state == ClockState::Playing {
            return;
        }
        self.started_at = self.time.now_ms();
        self.state = ClockState::Playing;
        self.sink.start(pcm, self.accumulated);
    }

    /// Freeze playback, keeping the position.
    pub fn stop(&mut self) {
        if self.state != ClockState::Playing {
            return;
        }
        self.accumulated += self.time.now_ms() - self.started_at;
        self.state = ClockState::Stopped;
        self.sink.stop();
    }

    /// Stop and rewind to the start.
    pub fn full_stop(&mut self) {
        if self.state == ClockState::Playing {
            self.sink.stop();
        }
        self.state = ClockState::Stopped;
        self.accumulated = 0.0;
        self.started_at = 0.0;
    }

    /// Jump to `position_ms` (clamped at 0), keeping the play/pause state.
    pub fn seek(&mut self, position_ms: f64) {
        let was_playing = self.is_playing();
        if was_playing {
            self.stop();
        }
        self.accumulated = position_ms.max(0.0);
        if was_playing {
            self.play();
        }
    }

    /// Chart time in ms.
    pub fn time(&self) -> f64 {
        let elapsed = match self.state {
            ClockState::Playing => self.time.now_ms() - self.started_at + self.accumulated,
            ClockState::Stopped => self.accumulated,
        };
        elapsed + self.offset
    }

    /// Host time from the same source the clock runs on.
    pub fn host_now(&self) -> f64 {
        self.time.now_ms()
    }

    pub fn time_source(&self) -> Rc<dyn TimeSource> {
        Rc::clone(&self.time)
    }

    pub fn set_offset(&mut self, offset_ms: f64) {
        self.offset = offset_ms;
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
        self.sink.set_volume(self.volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn duration_ms(&self) -> f64 {
        self.pcm.as_ref().map_or(0.0, Pcm::duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTime;
    use std::cell::RefCell;

    fn clock() -> (Rc<ManualTime>, AudioClock) {
        let time = Rc::new(ManualTime::new());
        let mut clock = AudioClock::new(time.clone());
        clock.load_silence(10_000.0);
        (time, clock)
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let (time, clock) = clock();
        time.advance(500.0);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn play_stop_resume() {
        let (time, mut clock) = clock();
        time.set_time(1000.0);
        clock.play();
        time.advance(250.0);
        assert_eq!(clock.time(), 250.0);

        clock.stop();
        time.advance(5000.0);
        assert_eq!(clock.time(), 250.0);

        clock.play();
        time.advance(100.0);
        assert_eq!(clock.time(), 350.0);
    }

    #[test]
    fn play_without_audio_is_noop() {
        let time = Rc::new(ManualTime::new());
        let mut clock = AudioClock::new(time.clone());
        clock.play();
        assert_eq!(clock.state(), ClockState::Stopped);
    }

    #[test]
    fn double_play_keeps_start() {
        let (time, mut clock) = clock();
        clock.play();
        time.advance(100.0);
        clock.play();
        time.advance(100.0);
        assert_eq!(clock.time(), 200.0);
    }

    #[test]
    fn offset_applies_in_both_states() {
        let (time, mut clock) = clock();
        clock.set_offset(-30.0);
        assert_eq!(clock.time(), -30.0);
        clock.play();
        time.advance(100.0);
        assert_eq!(clock.time(), 70.0);
    }

    #[test]
    fn seek_preserves_state() {
        let (time, mut clock) = clock();
        clock.seek(2000.0);
        assert!(!clock.is_playing());
        assert_eq!(clock.time(), 2000.0);

        clock.play();
        time.advance(10.0);
        clock.seek(-50.0);
        assert!(clock.is_playing());
        assert_eq!(clock.time(), 0.0);
        time.advance(10.0);
        assert_eq!(clock.time(), 10.0);
    }

    #[test]
    fn full_stop_rewinds() {
        let (time, mut clock) = clock();
        clock.play();
        time.advance(400.0);
        clock.full_stop();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.state(), ClockState::Stopped);
        // Idempotent
        clock.full_stop();
        assert_eq!(clock.time(), 0.0);
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl AudioSink for Recorder {
        fn start(&mut self, _pcm: &Pcm, position_ms: f64) {
            self.events.borrow_mut().push(format!("start {position_ms}"));
        }
        fn stop(&mut self) {
            self.events.borrow_mut().push("stop".to_string());
        }
        fn set_volume(&mut self, volume: f32) {
            self.events.borrow_mut().push(format!("volume {volume}"));
        }
    }

    #[test]
    fn sink_follows_clock() {
        let time = Rc::new(ManualTime::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Recorder {
            events: events.clone(),
        };
        let mut clock = AudioClock::with_sink(time.clone(), Box::new(sink));
        clock.load_silence(1000.0);
        clock.set_volume(0.5);
        clock.play();
        time.advance(120.0);
        clock.stop();
        clock.play();

        assert_eq!(
            *events.borrow(),
            vec!["volume 0.5", "start 0", "stop", "start 120"]
        );
    }

    #[tokio::test]
    async fn load_bytes_decodes_wav() {
        let time = Rc::new(ManualTime::new());
        let mut clock = AudioClock::new(time);
        clock
            .load_bytes(crate::decode::tests::wav_bytes(8000, 1, 8000), Some("wav".into()))
            .await
            .unwrap();
        assert!(clock.is_loaded());
        assert!((clock.duration_ms() - 1000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn load_garbage_is_error() {
        let time = Rc::new(ManualTime::new());
        let mut clock = AudioClock::new(time);
        let result = clock.load_bytes(vec![1, 2, 3, 4], None).await;
        assert!(result.is_err());
        assert!(!clock.is_loaded());
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let time = Rc::new(ManualTime::new());
        let mut clock = AudioClock::new(time);
        let result = clock.load_file(Path::new("/nonexistent/a.mp3")).await;
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
