//! Session loop: one biased `select!` over commands, input edges, the logic
//! interval and the render interval. Runs on a current-thread runtime so
//! the session is only ever borrowed by one branch at a time.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use crate::events::SessionCommand;
use crate::render::Renderer;
use crate::session::GameSession;

/// Key edge delivered by the host's input thread or event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEdge {
    Down {
        key: String,
        timestamp: f64,
        repeat: bool,
    },
    Up {
        key: String,
        timestamp: f64,
    },
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Display refresh cap, Hz
    pub render_rate_hz: u32,
    pub exit_on_song_end: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            render_rate_hz: 240,
            exit_on_song_end: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Destroyed,
    CommandsClosed,
    SongEnded,
}

fn ticker(rate_hz: u32) -> Interval {
    let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Drive `session` until it is destroyed, the command channel closes, or
/// (with `exit_on_song_end`) the chart is fully judged.
///
/// A closed input channel only disables that branch.
pub async fn run(
    session: &mut GameSession,
    renderer: &mut dyn Renderer,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    mut input: mpsc::UnboundedReceiver<InputEdge>,
    config: &LoopConfig,
) -> LoopExit {
    let mut logic_rate = session.logic_rate_hz();
    let mut logic = ticker(logic_rate);
    let mut render = ticker(config.render_rate_hz);
    let mut input_open = true;

    info!(
        "loop: logic {logic_rate} Hz, render {} Hz",
        config.render_rate_hz
    );

    let exit = loop {
        if session.is_destroyed() {
            break LoopExit::Destroyed;
        }
        if config.exit_on_song_end && session.is_song_finished() {
            break LoopExit::SongEnded;
        }
        if session.logic_rate_hz() != logic_rate {
            logic_rate = session.logic_rate_hz();
            logic = ticker(logic_rate);
            debug!("loop: logic rate now {logic_rate} Hz");
        }

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(command) => {
                    if let Err(e) = session.handle_command(command) {
                        warn!("loop: command failed: {e:#}");
                    }
                }
                None => break LoopExit::CommandsClosed,
            },
            edge = input.recv(), if input_open => match edge {
                Some(InputEdge::Down { key, timestamp, repeat }) => {
                    session.key_down(&key, timestamp, repeat);
                }
                Some(InputEdge::Up { key, timestamp }) => {
                    session.key_up(&key, timestamp);
                }
                None => {
                    debug!("loop: input channel closed");
                    input_open = false;
                }
            },
            _ = logic.tick() => {
                session.logic_tick();
            }
            _ = render.tick() => {
                session.render_frame(renderer);
            }
        }
    };

    info!("loop: exit ({exit:?})");
    exit
}
