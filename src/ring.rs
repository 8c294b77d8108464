// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The ring buffer holding one second of interleaved audio.

use log::debug;

use crate::config::ConfigError;
use crate::endian::{normalize_to_big_endian, to_wire_word};
use crate::waveform::WaveformPeriod;

/// Fixed-capacity buffer of interleaved samples, logically circular.
///
/// The content is a whole number of tone periods, so reading past the end and
/// continuing at the start keeps the tone phase continuous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBuffer {
    /// Samples as they go over the wire, see [`to_wire_word`].
    samples: Vec<u16>,
    channels: usize,
    big_endian: bool,
}

impl RingBuffer {
    /// Fill a ring of `capacity` samples by repeating `period`, copying every
    /// sample to all `channels`.
    pub fn replicate(
        period: &WaveformPeriod,
        capacity: usize,
        channels: usize,
    ) -> Result<Self, ConfigError> {
        let group_len = period.len() * channels;
        if group_len == 0 {
            return Err(ConfigError::ZeroParameter {
                name: if channels == 0 { "channels" } else { "period" },
            });
        }
        if capacity == 0 || capacity % group_len != 0 {
            return Err(ConfigError::RingNotMultiple {
                capacity,
                period_len: period.len(),
                channels,
            });
        }

        let mut samples = Vec::with_capacity(capacity);
        for _ in 0..capacity / group_len {
            for &sample in period.iter() {
                let word = to_wire_word(sample);
                samples.extend(std::iter::repeat(word).take(channels));
            }
        }
        debug!(
            "replicated {} periods of {} samples into {} slots",
            capacity / group_len,
            period.len(),
            capacity
        );

        Ok(Self {
            samples,
            channels,
            big_endian: false,
        })
    }

    /// Total number of interleaved samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Whether the samples are already in wire byte order.
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Bring the samples into big-endian byte order, in place.
    ///
    /// Only the first call has an effect; swapping again would undo it.
    pub fn normalize_byte_order(&mut self, host_little_endian: bool) {
        if self.big_endian {
            return;
        }
        normalize_to_big_endian(&mut self.samples, host_little_endian);
        self.big_endian = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::SineSynth;

    fn period() -> WaveformPeriod {
        SineSynth::new(48000, 1000, 1.0).period()
    }

    #[test]
    fn mono_repeats_period() {
        let period = period();
        let ring = RingBuffer::replicate(&period, 96000, 1).unwrap();
        assert_eq!(ring.capacity(), 96000);
        for (p, &sample) in ring.samples().iter().enumerate() {
            assert_eq!(sample, ring.samples()[p % 48]);
            assert_eq!(sample, to_wire_word(period.samples()[p % 48]));
        }
    }

    #[test]
    fn stereo_duplicates_channels() {
        let period = period();
        let ring = RingBuffer::replicate(&period, 96000, 2).unwrap();
        assert_eq!(ring.capacity(), 96000);
        assert_eq!(ring.channels(), 2);
        for (index, pair) in ring.samples().chunks_exact(2).enumerate() {
            assert_eq!(pair[0], pair[1]);
            assert_eq!(pair[0], to_wire_word(period.samples()[index % 48]));
        }
    }

    #[test]
    fn rejects_partial_period() {
        assert_eq!(
            RingBuffer::replicate(&period(), 1000, 2),
            Err(ConfigError::RingNotMultiple {
                capacity: 1000,
                period_len: 48,
                channels: 2
            })
        );
        assert!(RingBuffer::replicate(&period(), 0, 1).is_err());
        assert!(RingBuffer::replicate(&period(), 96, 0).is_err());
    }

    #[test]
    fn normalizes_once() {
        let mut ring = RingBuffer::replicate(&period(), 480, 1).unwrap();
        let original = ring.clone();
        ring.normalize_byte_order(true);
        assert!(ring.is_big_endian());
        ring.normalize_byte_order(true);
        for (swapped, plain) in ring.samples().iter().zip(original.samples()) {
            assert_eq!(*swapped, plain.swap_bytes());
        }
    }
}
