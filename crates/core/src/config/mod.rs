use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Result, VideoWallError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub analyzer: AnalyzerConfig,
    pub haptics: HapticsConfig,
    pub feed: FeedConfig,
}

impl AppConfig {
    /// Reads and validates a JSON configuration file. Missing fields fall back
    /// to their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analyzer.validate()?;
        self.haptics.validate()?;
        if !(self.feed.swipe_threshold.is_finite() && self.feed.swipe_threshold >= 0.0) {
            return Err(VideoWallError::InvalidConfig(format!(
                "swipe threshold must be a non-negative number, got {}",
                self.feed.swipe_threshold
            )));
        }
        Ok(())
    }
}

/// Card playback behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    pub load_timeout_ms: u64,
    pub advance_delay_ms: u64,
}

impl PlaybackConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            load_timeout_ms: 10_000,
            advance_delay_ms: 500,
        }
    }
}

/// Loudness analyzer and spectrum tap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub enabled: bool,
    pub fft_size: usize,
    pub smoothing: f32,
    pub intense_threshold: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl AnalyzerConfig {
    fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32_768).contains(&self.fft_size) {
            return Err(VideoWallError::InvalidConfig(format!(
                "fft_size must be a power of two between 32 and 32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(VideoWallError::InvalidConfig(format!(
                "smoothing must lie in [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(VideoWallError::InvalidConfig(
                "min_decibels must be below max_decibels".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fft_size: 32,
            smoothing: 0.5,
            intense_threshold: 0.7,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Vibration output settings. `enabled` plays the role of the "mobile device"
/// gate: desktops never vibrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticsConfig {
    pub enabled: bool,
    pub min_pulse_ms: u32,
    pub max_pulse_ms: u32,
    pub intensity: f32,
}

impl HapticsConfig {
    fn validate(&self) -> Result<()> {
        if self.min_pulse_ms > self.max_pulse_ms {
            return Err(VideoWallError::InvalidConfig(format!(
                "min_pulse_ms ({}) exceeds max_pulse_ms ({})",
                self.min_pulse_ms, self.max_pulse_ms
            )));
        }
        if !(self.intensity.is_finite() && self.intensity >= 0.0) {
            return Err(VideoWallError::InvalidConfig(format!(
                "intensity must be a non-negative number, got {}",
                self.intensity
            )));
        }
        Ok(())
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_pulse_ms: 10,
            max_pulse_ms: 400,
            intensity: 1.0,
        }
    }
}

/// Feed navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub swipe_threshold: f32,
    pub shuffle_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 50.0,
            shuffle_seed: None,
        }
    }
}
