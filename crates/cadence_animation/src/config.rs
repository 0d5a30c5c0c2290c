//! Construction-time configuration for the ticker, tweens and timelines
//!
//! Everything here deserializes from TOML so a host can keep animation
//! defaults next to its other settings:
//!
//! ```toml
//! [ticker]
//! interval_ms = 16.0
//! timing_mode = "raf_synched"
//!
//! [tween]
//! loop_count = -1
//! bounce = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// Loop count meaning "repeat forever"
pub const LOOP_FOREVER: i32 = -1;

/// How the ticker asks to be woken up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Frame callbacks, ticking only once the interval has (nearly) elapsed
    RafSynched,
    /// Frame callbacks, ticking on every frame regardless of interval
    Raf,
    /// Plain timeouts at the configured interval
    #[default]
    Timeout,
}

/// Ticker settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TickerConfig {
    /// Target milliseconds between ticks
    #[serde(default = "default_interval")]
    pub interval_ms: f64,
    #[serde(default)]
    pub timing_mode: TimingMode,
    /// Cap on the delta reported to listeners. Zero disables the cap.
    #[serde(default)]
    pub max_delta: f64,
    #[serde(default)]
    pub paused: bool,
}

fn default_interval() -> f64 {
    50.0
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            timing_mode: TimingMode::default(),
            max_delta: 0.0,
            paused: false,
        }
    }
}

impl TickerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AnimationError::Config(e.to_string()))
    }

    pub fn with_interval(mut self, interval_ms: f64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_framerate(mut self, fps: f64) -> Self {
        self.interval_ms = 1000.0 / fps;
        self
    }

    pub fn with_timing_mode(mut self, mode: TimingMode) -> Self {
        self.timing_mode = mode;
        self
    }

    pub fn with_max_delta(mut self, max_delta: f64) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// Playback settings shared by tweens and timelines
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TweenProps {
    /// Extra repetitions after the first play. [`LOOP_FOREVER`] repeats indefinitely.
    pub loop_count: i32,
    pub reversed: bool,
    /// Alternate direction on every other loop
    pub bounce: bool,
    /// Multiplier applied to every advance delta
    pub time_scale: f64,
    /// Start paused instead of registering with the registry
    pub paused: bool,
    /// Advance one unit per tick instead of by elapsed milliseconds
    pub use_ticks: bool,
    /// Keep advancing while the ticker reports a global pause
    pub ignore_global_pause: bool,
    /// Initial raw position, applied after construction
    pub position: Option<f64>,
    /// Remove every other tween on the same target first
    pub override_existing: bool,
}

impl Default for TweenProps {
    fn default() -> Self {
        Self {
            loop_count: 0,
            reversed: false,
            bounce: false,
            time_scale: 1.0,
            paused: false,
            use_ticks: false,
            ignore_global_pause: false,
            position: None,
            override_existing: false,
        }
    }
}

impl TweenProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AnimationError::Config(e.to_string()))
    }

    pub fn with_loop(mut self, loop_count: i32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_loop_forever(mut self) -> Self {
        self.loop_count = LOOP_FOREVER;
        self
    }

    pub fn with_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn with_use_ticks(mut self, use_ticks: bool) -> Self {
        self.use_ticks = use_ticks;
        self
    }

    pub fn with_ignore_global_pause(mut self, ignore: bool) -> Self {
        self.ignore_global_pause = ignore;
        self
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}

/// Timeline settings: tween playback plus initial labels
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TimelineProps {
    #[serde(flatten)]
    pub playback: TweenProps,
    #[serde(default)]
    pub labels: Vec<(String, f64)>,
}

impl TimelineProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AnimationError::Config(e.to_string()))
    }

    pub fn with_playback(mut self, playback: TweenProps) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_label(mut self, name: &str, position: f64) -> Self {
        self.labels.push((name.to_string(), position));
        self
    }
}

/// Combined settings file, as loaded by demos and hosts
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub tween: TweenProps,
}

impl AnimationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AnimationError::Config(e.to_string()))
    }
}
