//! Writer configuration: validated glyph height plus machine and pacing knobs.
//!
//! Every field has a default so a config file only needs to name what it
//! overrides. Derived per-component settings are handed to the layout engine,
//! the encoder, and the streamer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::encode::EncoderSettings;
use crate::error::ConfigError;
use crate::glyph::BASE_FONT_HEIGHT;
use crate::layout::LayoutSettings;
use crate::stream::StreamerConfig;

pub const MIN_HEIGHT_MM: f32 = 4.0;
pub const MAX_HEIGHT_MM: f32 = 10.0;

/// Inter-word gap in font design units.
pub const DEFAULT_WORD_GAP_UNITS: f32 = 4.0;

/// Requested glyph height, guaranteed to lie in `[4, 10]` mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightMm(f32);

impl HeightMm {
    pub fn new(requested: f32) -> Result<Self, ConfigError> {
        if !(MIN_HEIGHT_MM..=MAX_HEIGHT_MM).contains(&requested) {
            return Err(ConfigError::HeightOutOfRange { requested });
        }
        Ok(Self(requested))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Design units to millimetres: `height / 18`.
    pub fn scale(self) -> f32 {
        self.0 / BASE_FONT_HEIGHT
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub font: Option<PathBuf>,
    pub height_mm: f32,
    pub max_line_width_mm: f32,
    /// Defaults to the glyph height when unset.
    pub line_height_mm: Option<f32>,
    pub word_gap_units: f32,
    pub feed_rate: u32,
    pub pen_down_power: u32,
    pub settle_delay_ms: u64,
    pub ack_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub metrics_interval_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            font: None,
            height_mm: 5.0,
            max_line_width_mm: 100.0,
            line_height_mm: None,
            word_gap_units: DEFAULT_WORD_GAP_UNITS,
            feed_rate: 1000,
            pen_down_power: 1000,
            settle_delay_ms: 100,
            ack_timeout_ms: 5_000,
            ready_timeout_ms: 10_000,
            poll_interval_ms: 20,
            metrics_interval_ms: 5_000,
        }
    }
}

impl WriterConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check every setting; the height check runs first.
    pub fn validate(&self) -> Result<HeightMm, ConfigError> {
        let height = HeightMm::new(self.height_mm)?;
        positive("max_line_width_mm", self.max_line_width_mm)?;
        if let Some(line_height) = self.line_height_mm {
            positive("line_height_mm", line_height)?;
        }
        if self.word_gap_units.is_nan() || self.word_gap_units < 0.0 {
            return Err(ConfigError::InvalidSetting {
                name: "word_gap_units",
                reason: format!("must be zero or positive, got {}", self.word_gap_units),
            });
        }
        if self.feed_rate == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "feed_rate",
                reason: "must be greater than zero".to_string(),
            });
        }
        for (name, value) in [
            ("ack_timeout_ms", self.ack_timeout_ms),
            ("ready_timeout_ms", self.ready_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidSetting {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(height)
    }

    pub fn layout_settings(&self) -> Result<LayoutSettings, ConfigError> {
        let height = self.validate()?;
        let scale = height.scale();
        Ok(LayoutSettings {
            scale,
            max_line_width: self.max_line_width_mm,
            line_height: self.line_height_mm.unwrap_or(height.get()),
            word_gap: scale * self.word_gap_units,
        })
    }

    pub fn encoder_settings(&self) -> EncoderSettings {
        EncoderSettings {
            pen_down_power: self.pen_down_power,
            feed_rate: self.feed_rate,
        }
    }

    pub fn streamer_config(&self) -> StreamerConfig {
        StreamerConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
            ready_timeout: Duration::from_millis(self.ready_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            metrics_interval: Duration::from_millis(self.metrics_interval_ms),
            ..StreamerConfig::default()
        }
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting {
            name,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}
