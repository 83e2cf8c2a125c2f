//! Engine configuration.

use crate::error::{Error, Result};

/// What [`AudioEngine`](crate::AudioEngine) asks the device for.
///
/// The device may not grant all of it; the negotiated values are reported by the engine
/// after [`init`](crate::AudioEngine::init).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Fixed callback size in frames, or `None` for the device default
    pub buffer_frames: Option<u32>,
    /// Length of the sample history kept for visualization
    pub history_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            buffer_frames: Some(256),
            history_seconds: 10.0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_buffer_frames(mut self, buffer_frames: Option<u32>) -> Self {
        self.buffer_frames = buffer_frames;
        self
    }

    pub fn with_history_seconds(mut self, seconds: f32) -> Self {
        self.history_seconds = seconds;
        self
    }

    /// History capacity in samples at `sample_rate`, at least one.
    pub fn history_len(&self, sample_rate: u32) -> usize {
        ((self.history_seconds as f64 * sample_rate as f64).round() as usize).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if !(8_000..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(Error::InvalidConfig(format!(
                "channels {} out of range (1-2)",
                self.channels
            )));
        }
        if self.buffer_frames == Some(0) {
            return Err(Error::InvalidConfig("buffer_frames must be non-zero".into()));
        }
        if !(self.history_seconds > 0.0 && self.history_seconds.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "history_seconds {} must be positive",
                self.history_seconds
            )));
        }
        Ok(())
    }
}
