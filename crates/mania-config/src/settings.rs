use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

pub const KEY_BINDINGS: &str = "keybinds";
pub const KEY_GLOBAL_OFFSET: &str = "globalOffset";
pub const KEY_SCROLL_SPEED: &str = "scrollSpeed";
pub const KEY_VOLUME: &str = "volume";
pub const KEY_RENDER_TAIL: &str = "renderTail";
pub const KEY_LOGIC_RATE: &str = "logicRate";

pub const MIN_SCROLL_SPEED: f64 = 0.1;
pub const MAX_SCROLL_SPEED: f64 = 4.0;
pub const MIN_LOGIC_RATE: u32 = 60;
pub const MAX_LOGIC_RATE: u32 = 1000;

/// Player settings consumed by the game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// One key name per column
    pub key_bindings: Vec<String>,
    pub global_offset_ms: f64,
    pub scroll_speed: f64,
    pub volume: f32,
    pub render_tail: bool,
    pub logic_rate_hz: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_bindings: ["d", "f", "j", "k"].map(String::from).to_vec(),
            global_offset_ms: 0.0,
            scroll_speed: 0.8,
            volume: 0.2,
            render_tail: false,
            logic_rate_hz: MAX_LOGIC_RATE,
        }
    }
}

/// Parse a stored value, falling back to the default with a warning.
fn parse_or<T: std::str::FromStr>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match store.get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("settings: ignoring invalid {key}={raw:?}");
            default
        }),
    }
}

impl Settings {
    /// Read settings from a store; absent or invalid keys keep their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let key_bindings = match store.get(KEY_BINDINGS) {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .collect(),
            _ => defaults.key_bindings,
        };
        let render_tail = match store.get(KEY_RENDER_TAIL).as_deref() {
            Some("1") | Some("true") => true,
            Some(_) | None => defaults.render_tail,
        };

        let mut settings = Self {
            key_bindings,
            global_offset_ms: parse_or(store, KEY_GLOBAL_OFFSET, defaults.global_offset_ms),
            scroll_speed: parse_or(store, KEY_SCROLL_SPEED, defaults.scroll_speed),
            volume: parse_or(store, KEY_VOLUME, defaults.volume),
            render_tail,
            logic_rate_hz: parse_or(store, KEY_LOGIC_RATE, defaults.logic_rate_hz),
        };
        settings.validate();
        settings
    }

    /// Write every field back to the store.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(KEY_BINDINGS, &self.key_bindings.join(","))?;
        store.set(KEY_GLOBAL_OFFSET, &self.global_offset_ms.to_string())?;
        store.set(KEY_SCROLL_SPEED, &self.scroll_speed.to_string())?;
        store.set(KEY_VOLUME, &self.volume.to_string())?;
        store.set(KEY_RENDER_TAIL, if self.render_tail { "1" } else { "0" })?;
        store.set(KEY_LOGIC_RATE, &self.logic_rate_hz.to_string())?;
        Ok(())
    }

    /// Clamp values to usable ranges.
    pub fn validate(&mut self) {
        if !self.global_offset_ms.is_finite() {
            self.global_offset_ms = 0.0;
        }
        self.scroll_speed = if self.scroll_speed.is_finite() {
            self.scroll_speed.clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED)
        } else {
            Self::default().scroll_speed
        };
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 2.0)
        } else {
            Self::default().volume
        };
        self.logic_rate_hz = self.logic_rate_hz.clamp(MIN_LOGIC_RATE, MAX_LOGIC_RATE);
        self.key_bindings.retain(|k| !k.is_empty());
        if self.key_bindings.is_empty() {
            self.key_bindings = Self::default().key_bindings;
        }
    }
}
