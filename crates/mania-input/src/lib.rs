// Keyboard input capture, control keys, latency tracking, autoplay

pub mod autoplay;
mod capture;
mod control_keys;
mod latency;

pub use autoplay::{KeyInputLog, create_autoplay_log};
pub use capture::{InputCapture, InputSignal};
pub use control_keys::{ControlAction, control_action_for};
pub use latency::LatencyMonitor;
