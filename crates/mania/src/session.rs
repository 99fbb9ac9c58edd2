//! Game session: owns the chart state and ties the clock, input, hit
//! engine and score together behind the control surface.
//!
//! State machine: `Idle -> Playing <-> Paused`, with `restart()` and
//! `destroy()` returning to `Idle`. Judgement only runs while Playing.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, error, info, warn};

use mania_audio::{AudioClock, LoadError, TimeSource};
use mania_config::settings::{
    KEY_GLOBAL_OFFSET, KEY_LOGIC_RATE, KEY_SCROLL_SPEED, MAX_LOGIC_RATE, MAX_SCROLL_SPEED,
    MIN_LOGIC_RATE, MIN_SCROLL_SPEED,
};
use mania_config::{KeyValueStore, Settings};
use mania_input::{
    ControlAction, InputCapture, InputSignal, KeyInputLog, LatencyMonitor, create_autoplay_log,
};
use mania_model::{Chart, Note, ScrollVelocity};
use mania_rule::{HitManager, JudgeProperty, JudgementResult, ScoreSnapshot, ScoreState};

use crate::events::{EventBus, SessionCommand, SessionEvent};
use crate::render::{RenderFrame, Renderer};

/// Silence appended after the last note when no song audio is given.
const SONG_END_PADDING_MS: f64 = 2000.0;
/// Logic ticks closer together than this share of the period are dropped.
const MIN_TICK_FRACTION: f64 = 0.9;
const LATENCY_SAMPLES: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Paused,
}

pub enum AudioSource {
    File(PathBuf),
    Bytes {
        data: Vec<u8>,
        ext_hint: Option<String>,
    },
    /// Silent buffer covering the chart, for headless play.
    Silence,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub column_count: usize,
    pub judge: JudgeProperty,
    /// Feed a perfect key sequence instead of waiting for the player.
    pub autoplay: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            column_count: 4,
            judge: JudgeProperty::default(),
            autoplay: false,
        }
    }
}

pub struct GameSession {
    store: Box<dyn KeyValueStore>,
    settings: Settings,
    property: JudgeProperty,
    column_count: usize,
    autoplay_enabled: bool,

    clock: AudioClock,
    input: InputCapture,
    latency: LatencyMonitor,
    events: EventBus,

    chart: Option<Chart>,
    notes: Vec<Note>,
    velocity: ScrollVelocity,
    hit_manager: HitManager,
    score: ScoreState,
    autoplay: Vec<KeyInputLog>,
    autoplay_cursor: usize,

    state: SessionState,
    last_tick: Option<f64>,
    destroyed: bool,
}

impl GameSession {
    pub fn new(store: Box<dyn KeyValueStore>, clock: AudioClock, options: SessionOptions) -> Self {
        let settings = Settings::load(store.as_ref());
        let mut property = options.judge;
        property.validate();

        let mut clock = clock;
        clock.set_volume(settings.volume);
        clock.set_offset(settings.global_offset_ms);

        let mut input = InputCapture::new(options.column_count, &settings.key_bindings);
        input.set_accepting(false);

        Self {
            store,
            hit_manager: HitManager::new(&[], options.column_count, property.clone()),
            score: ScoreState::new(&property),
            settings,
            property,
            column_count: options.column_count,
            autoplay_enabled: options.autoplay,
            clock,
            input,
            latency: LatencyMonitor::new(LATENCY_SAMPLES),
            events: EventBus::new(),
            chart: None,
            notes: Vec::new(),
            velocity: ScrollVelocity::default(),
            autoplay: Vec::new(),
            autoplay_cursor: 0,
            state: SessionState::Idle,
            last_tick: None,
            destroyed: false,
        }
    }

    /// Session on a silent clock driven by `time`.
    pub fn with_time(
        store: Box<dyn KeyValueStore>,
        time: Rc<dyn TimeSource>,
        options: SessionOptions,
    ) -> Self {
        Self::new(store, AudioClock::new(time), options)
    }

    /// Parse the chart and load its audio. The session is left Idle.
    pub async fn init(&mut self, chart_text: &str, audio: AudioSource) -> Result<(), LoadError> {
        let chart = Chart::parse(chart_text, self.column_count);
        if let Some(keys) = chart.metadata.key_count
            && keys != self.column_count
        {
            warn!(
                "session: chart declares {keys} keys, playing on {} columns",
                self.column_count
            );
        }

        match audio {
            AudioSource::File(path) => self.clock.load_file(&path).await?,
            AudioSource::Bytes { data, ext_hint } => self.clock.load_bytes(data, ext_hint).await?,
            AudioSource::Silence => self
                .clock
                .load_silence(chart.last_time() + SONG_END_PADDING_MS),
        }

        self.velocity = chart.scroll_velocity();
        self.hit_manager = HitManager::new(&chart.notes, self.column_count, self.property.clone());
        self.notes = chart.notes.clone();
        self.autoplay = if self.autoplay_enabled {
            create_autoplay_log(&chart.notes)
        } else {
            Vec::new()
        };
        info!(
            "session: loaded {:?} [{}] with {} notes ({} holds)",
            chart.metadata.title,
            chart.metadata.version,
            chart.total_notes(),
            chart.hold_count()
        );
        self.chart = Some(chart);
        self.destroyed = false;
        self.reset_play_state();

        self.events.emit(&SessionEvent::Init);
        Ok(())
    }

    pub fn start(&mut self) {
        if self.destroyed || self.chart.is_none() {
            warn!("session: start() without a loaded chart ignored");
            return;
        }
        match self.state {
            SessionState::Playing => return,
            SessionState::Paused => {
                self.resume();
                return;
            }
            SessionState::Idle => {}
        }

        self.state = SessionState::Playing;
        self.input.clear_queue();
        self.input.set_accepting(true);
        self.last_tick = None;
        self.clock.play();
        info!("session: started");
        self.events.emit(&SessionEvent::Started);
    }

    pub fn pause(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        self.clock.stop();
        self.state = SessionState::Paused;
        self.input.set_accepting(false);
        self.input.clear_queue();
        info!("session: paused at {:.0} ms", self.clock.time());
        self.events.emit(&SessionEvent::Pause);
    }

    pub fn resume(&mut self) {
        if self.state != SessionState::Paused {
            return;
        }
        self.state = SessionState::Playing;
        self.input.set_accepting(true);
        self.last_tick = None;
        self.clock.play();
        info!("session: resumed");
        self.events.emit(&SessionEvent::Resume);
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            SessionState::Playing => self.pause(),
            SessionState::Paused => self.resume(),
            SessionState::Idle => {}
        }
    }

    /// Rewind to the start with fresh notes and score, then play.
    pub fn restart(&mut self) {
        let Some(chart) = &self.chart else {
            warn!("session: restart() before init ignored");
            return;
        };
        if self.destroyed {
            return;
        }
        self.notes = chart.notes.clone();
        self.reset_play_state();
        info!("session: restart");
        self.events.emit(&SessionEvent::Restart);
        self.start();
    }

    /// Stop everything and drop listeners. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            info!("session: destroyed");
        }
        self.reset_play_state();
        self.notes.iter_mut().for_each(Note::reset);
        self.events.clear();
        self.destroyed = true;
    }

    fn reset_play_state(&mut self) {
        self.state = SessionState::Idle;
        self.clock.full_stop();
        self.input.clear_queue();
        self.input.set_accepting(false);
        self.hit_manager.reset();
        self.score.reset();
        self.latency.clear();
        self.autoplay_cursor = 0;
        self.last_tick = None;
    }

    /// Set the calibration offset and persist it.
    pub fn set_offset(&mut self, offset_ms: f64) -> Result<()> {
        let offset_ms = if offset_ms.is_finite() { offset_ms } else { 0.0 };
        self.settings.global_offset_ms = offset_ms;
        self.clock.set_offset(offset_ms);
        debug!("session: offset {offset_ms} ms");
        self.store.set(KEY_GLOBAL_OFFSET, &offset_ms.to_string())
    }

    /// Adjust scroll speed by `delta`, clamped to its range, and persist it.
    pub fn change_scroll_speed(&mut self, delta: f64) -> Result<f64> {
        let speed = (self.settings.scroll_speed + delta).clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED);
        // Avoid 0.1 + 0.05 = 0.15000000000000002 in the stored value
        let speed = (speed * 100.0).round() / 100.0;
        self.settings.scroll_speed = speed;
        debug!("session: scroll speed {speed}");
        self.store.set(KEY_SCROLL_SPEED, &speed.to_string())?;
        Ok(speed)
    }

    pub fn set_logic_rate(&mut self, hz: u32) -> Result<u32> {
        let hz = hz.clamp(MIN_LOGIC_RATE, MAX_LOGIC_RATE);
        self.settings.logic_rate_hz = hz;
        self.store.set(KEY_LOGIC_RATE, &hz.to_string())?;
        Ok(hz)
    }

    pub fn handle_command(&mut self, command: SessionCommand) -> Result<()> {
        debug!("session: command {command:?}");
        match command {
            SessionCommand::Start => self.start(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.resume(),
            SessionCommand::TogglePause => self.toggle_pause(),
            SessionCommand::Restart => self.restart(),
            SessionCommand::Destroy => self.destroy(),
            SessionCommand::SetOffset(ms) => self.set_offset(ms)?,
            SessionCommand::ChangeScrollSpeed(delta) => {
                self.change_scroll_speed(delta)?;
            }
            SessionCommand::SetLogicRate(hz) => {
                self.set_logic_rate(hz)?;
            }
        }
        Ok(())
    }

    fn apply_control(&mut self, action: ControlAction) {
        let persisted = match action {
            ControlAction::Restart => {
                self.restart();
                return;
            }
            ControlAction::PauseToggle => {
                self.toggle_pause();
                return;
            }
            ControlAction::OffsetAdjust(delta) => {
                self.set_offset(self.settings.global_offset_ms + delta)
            }
            ControlAction::ScrollSpeedAdjust(delta) => self.change_scroll_speed(delta).map(|_| ()),
        };
        if let Err(e) = persisted {
            warn!("session: failed to persist setting: {e:#}");
        }
    }

    /// Press edge from the host. `timestamp` is in the clock's host time base.
    pub fn key_down(&mut self, key: &str, timestamp: f64, repeat: bool) -> Option<InputSignal> {
        let signal = self.input.key_down(key, timestamp, repeat)?;
        match signal {
            InputSignal::KeyDown(_) => self.latency.record(self.clock.host_now(), timestamp),
            InputSignal::Control(action) => self.apply_control(action),
            InputSignal::KeyUp(_) => {}
        }
        Some(signal)
    }

    /// Release edge from the host. Releases are judged immediately, even
    /// while paused, so a hold let go during pause cannot survive the resume.
    pub fn key_up(&mut self, key: &str, timestamp: f64) -> Option<InputSignal> {
        let signal = self.input.key_up(key)?;
        let InputSignal::KeyUp(column) = signal else {
            return Some(signal);
        };
        match self.state {
            SessionState::Playing => {
                let (time, now) = (self.clock.time(), self.clock.host_now());
                // The matching press may still be queued
                self.judge_pending(time, now);
                let release_time = if self.property.latency_compensation {
                    time - (now - timestamp).max(0.0)
                } else {
                    time
                };
                self.release(column, release_time);
            }
            // A hold let go during pause is judged at the frozen chart time
            SessionState::Paused => {
                let frozen = self.clock.time();
                self.release(column, frozen);
            }
            SessionState::Idle => {}
        }
        Some(signal)
    }

    /// Run one judgement step unless the previous one was too recent.
    pub fn logic_tick(&mut self) -> bool {
        let now = self.clock.host_now();
        let period = 1000.0 / f64::from(self.settings.logic_rate_hz);
        if let Some(last) = self.last_tick
            && now - last < period * MIN_TICK_FRACTION
        {
            return false;
        }
        self.last_tick = Some(now);
        self.logic_step();
        true
    }

    /// Judge queued presses, then sweep for misses and finished holds.
    pub fn logic_step(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        let time = self.clock.time();
        let now = self.clock.host_now();

        if !self.autoplay.is_empty() {
            self.feed_autoplay(time, now);
        }
        self.judge_pending(time, now);

        let mut swept = Vec::new();
        self.hit_manager
            .update(&mut self.notes, time, |result| swept.push(result));
        for result in swept {
            self.apply_judgement(result);
        }
    }

    fn feed_autoplay(&mut self, time: f64, now: f64) {
        while let Some(edge) = self.autoplay.get(self.autoplay_cursor).copied() {
            if edge.time > time {
                break;
            }
            self.autoplay_cursor += 1;
            if edge.pressed {
                // Back-date so latency correction lands the press on edge.time
                self.input.press_column(edge.column, now - (time - edge.time));
            } else {
                self.judge_pending(time, now);
                self.input.release_column(edge.column);
                self.release(edge.column, edge.time);
            }
        }
    }

    fn judge_pending(&mut self, time: f64, now: f64) {
        let input = &mut self.input;
        let results =
            self.hit_manager
                .process_input_hits(&mut self.notes, time, now, |col| {
                    input.consume_input(col)
                });
        for result in results {
            self.apply_judgement(result);
        }
    }

    fn release(&mut self, column: usize, time: f64) {
        if let Some(result) = self
            .hit_manager
            .process_release(&mut self.notes, column, time)
        {
            self.apply_judgement(result);
        }
    }

    fn apply_judgement(&mut self, result: JudgementResult) {
        debug!(
            "judge: col {} {:?} {} ({:+.1} ms)",
            result.column, result.kind, result.tier, result.error_ms
        );
        self.score.add_hit(result.tier);
        self.events.emit(&SessionEvent::Hit(result));
    }

    /// Current frame, without drawing it.
    pub fn frame(&self) -> RenderFrame {
        let mut frame = RenderFrame::build(
            &self.notes,
            &self.hit_manager,
            &self.velocity,
            self.clock.time(),
            self.settings.scroll_speed,
        );
        frame.render_tail = self.settings.render_tail;
        frame.held = (0..self.column_count)
            .map(|col| self.input.is_pressing(col))
            .collect();
        frame.combo = self.score.combo();
        frame.accuracy = self.score.accuracy();
        frame
    }

    /// Draw one frame. A renderer fault pauses the session; score is kept.
    pub fn render_frame(&mut self, renderer: &mut dyn Renderer) {
        if self.state != SessionState::Playing {
            return;
        }
        let frame = self.frame();
        if let Err(fault) = renderer.draw(&frame) {
            error!("session: {fault}, pausing");
            self.pause();
        }
    }

    /// Every note judged and the clock past the last one.
    pub fn is_song_finished(&self) -> bool {
        let Some(chart) = &self.chart else {
            return false;
        };
        self.state == SessionState::Playing
            && self.hit_manager.is_finished()
            && self.clock.time() > chart.last_time()
    }

    pub fn score(&self) -> ScoreSnapshot {
        self.score.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn hit_manager(&self) -> &HitManager {
        &self.hit_manager
    }

    pub fn input(&self) -> &InputCapture {
        &self.input
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Mean input delivery delay over recent presses, ms.
    pub fn input_latency(&self) -> f64 {
        self.latency.average()
    }

    pub fn logic_rate_hz(&self) -> u32 {
        self.settings.logic_rate_hz
    }
}
