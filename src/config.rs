// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Playback parameters and their validation.

use std::path::PathBuf;
use std::time::Duration;

use snafu::Snafu;

use crate::util::amplitude_from_decibels;

/// Problems with the playback parameters. These are detected when the session
/// is built and are never recovered from.
#[derive(Debug, PartialEq, Snafu)]
pub enum ConfigError {
    #[snafu(display("Parameter {} must not be zero", name))]
    ZeroParameter { name: &'static str },
    #[snafu(display(
        "Tone of {} Hz is not below the Nyquist frequency at {} Hz",
        frequency,
        sample_rate
    ))]
    AboveNyquist { frequency: u32, sample_rate: u32 },
    #[snafu(display(
        "Sample rate {} Hz is not a multiple of the tone frequency {} Hz",
        sample_rate,
        frequency
    ))]
    UnevenPeriod { sample_rate: u32, frequency: u32 },
    #[snafu(display(
        "Ring capacity {} is not a multiple of {} samples per period on {} channels",
        capacity,
        period_len,
        channels
    ))]
    RingNotMultiple {
        capacity: usize,
        period_len: usize,
        channels: usize,
    },
    #[snafu(display(
        "Frame of {} samples does not fit into a ring of {} samples",
        frame_samples,
        capacity
    ))]
    FrameTooLarge {
        frame_samples: usize,
        capacity: usize,
    },
    #[snafu(display(
        "One second at {} Hz on {} channels does not fit into memory",
        sample_rate,
        channels
    ))]
    CapacityOverflow { sample_rate: u32, channels: usize },
    #[snafu(display("Damping of {} dB is not an attenuation", decibels))]
    InvalidDamping { decibels: f64 },
}

/// Resolution the tone is synthesized at before it is brought to 16 bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceResolution {
    Bits16,
    /// Synthesized in the 24-bit range and reduced with the bit depth reducer.
    Bits24,
}

impl std::str::FromStr for SourceResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16" => Ok(SourceResolution::Bits16),
            "24" => Ok(SourceResolution::Bits24),
            other => Err(format!("unsupported source resolution {:?}, use 16 or 24", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Output device, `"default"` leaves the choice to the audio system.
    pub device: String,
    /// Samples per second and channel.
    pub sample_rate: u32,
    pub channels: usize,
    /// Frequency of the sine tone in Hz.
    pub tone_frequency: u32,
    /// Sample groups (one sample per channel) handed to the sink at once.
    pub frame_len: usize,
    /// Number of passes over the one second ring.
    pub duration_secs: u32,
    /// Headroom of the synthesized tone, must not be positive.
    pub damping_db: f64,
    pub source: SourceResolution,
    /// Sleep for the duration of a frame after each write.
    pub pacing: bool,
    /// Render into this file instead of playing.
    pub output: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 48000,
            channels: 2,
            tone_frequency: 1000,
            // 24 ms at 48 kHz
            frame_len: 1152,
            duration_secs: 30,
            damping_db: -3.0,
            source: SourceResolution::Bits16,
            pacing: true,
            output: None,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("sample_rate", self.sample_rate as usize),
            ("channels", self.channels),
            ("tone_frequency", self.tone_frequency as usize),
            ("frame_len", self.frame_len),
        ];
        if let Some(&(name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroParameter { name });
        }
        let capacity = (self.sample_rate as usize)
            .checked_mul(self.channels)
            .ok_or(ConfigError::CapacityOverflow {
                sample_rate: self.sample_rate,
                channels: self.channels,
            })?;
        if self.damping_db > 0.0 || !self.damping_db.is_finite() {
            return Err(ConfigError::InvalidDamping {
                decibels: self.damping_db,
            });
        }
        if u64::from(self.tone_frequency) * 2 >= u64::from(self.sample_rate) {
            return Err(ConfigError::AboveNyquist {
                frequency: self.tone_frequency,
                sample_rate: self.sample_rate,
            });
        }
        if self.sample_rate % self.tone_frequency != 0 {
            return Err(ConfigError::UnevenPeriod {
                sample_rate: self.sample_rate,
                frequency: self.tone_frequency,
            });
        }
        if self.frame_len > self.sample_rate as usize {
            return Err(ConfigError::FrameTooLarge {
                frame_samples: self.frame_len.saturating_mul(self.channels),
                capacity,
            });
        }
        Ok(())
    }

    /// Amplitude factor corresponding to `damping_db`.
    pub fn damping_factor(&self) -> f64 {
        amplitude_from_decibels(self.damping_db)
    }

    /// Interleaved samples in one second of audio, saturating for
    /// configurations that [`validate`](Self::validate) rejects.
    pub fn ring_capacity(&self) -> usize {
        (self.sample_rate as usize).saturating_mul(self.channels)
    }

    /// Time it takes the device to play one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(self.frame_len as u64 * 1_000_000 / u64::from(self.sample_rate))
    }
}
