// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Sampling one period of the reference sine tone.

use std::f64::consts::PI;

/// Largest magnitude of an intermediate 24-bit sample.
pub const INT24_MAX: i32 = 8_388_607;
/// Smallest intermediate 24-bit sample.
pub const INT24_MIN: i32 = -8_388_608;

/// Exactly one cycle of the tone, as signed 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformPeriod {
    samples: Vec<i16>,
}

#[allow(clippy::len_without_is_empty)]
impl WaveformPeriod {
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Number of samples in one period.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &i16> {
        self.samples.iter()
    }
}

/// Generates the lookup table for a sine tone at a fixed sample rate.
///
/// The sample rate must be an exact multiple of the frequency, otherwise the
/// period is truncated and no longer loops seamlessly.
/// [`PlaybackConfig::validate`](crate::config::PlaybackConfig::validate) checks this.
#[derive(Debug, Copy, Clone)]
pub struct SineSynth {
    sample_rate: u32,
    frequency: u32,
    /// Amplitude factor in `(0, 1]` that keeps the peak away from full scale.
    damping: f64,
}

impl SineSynth {
    pub fn new(sample_rate: u32, frequency: u32, damping: f64) -> Self {
        Self {
            sample_rate,
            frequency,
            damping,
        }
    }

    /// Samples per cycle of the tone.
    ///
    /// ```
    /// # use pcm_tone::waveform::SineSynth;
    /// assert_eq!(SineSynth::new(48000, 1000, 1.0).period_len(), 48);
    /// ```
    pub fn period_len(&self) -> usize {
        (self.sample_rate / self.frequency) as usize
    }

    fn angle(&self, index: usize) -> f64 {
        2.0 * PI * f64::from(self.frequency) / f64::from(self.sample_rate) * index as f64
    }

    /// One damped period at 16-bit resolution, rounded to the nearest sample value.
    pub fn period(&self) -> WaveformPeriod {
        let peak = f64::from(i16::MAX) * self.damping;
        let samples = (0..self.period_len())
            .map(|k| {
                let value = (peak * self.angle(k).sin()).round();
                value.max(f64::from(i16::MIN)).min(f64::from(i16::MAX)) as i16
            })
            .collect();
        WaveformPeriod { samples }
    }

    /// One full-scale period in the 24-bit range, truncated toward zero.
    ///
    /// No damping is applied here, the headroom is added when reducing to 16 bits.
    pub fn period_24bit(&self) -> Vec<i32> {
        (0..self.period_len())
            .map(|k| (f64::from(INT24_MAX) * self.angle(k).sin()) as i32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::amplitude_from_decibels;
    use expect_test::expect;

    #[test]
    fn period_length() {
        assert_eq!(SineSynth::new(48000, 1000, 1.0).period().len(), 48);
        assert_eq!(SineSynth::new(48000, 400, 1.0).period().len(), 120);
        assert_eq!(SineSynth::new(44100, 441, 0.5).period().len(), 100);
    }

    #[test]
    fn damping_bounds_the_peak() {
        for &damping in &[1.0, 0.9, amplitude_from_decibels(-3.0), 0.25] {
            let limit = (f64::from(i16::MAX) * damping).round() as i32;
            let period = SineSynth::new(48000, 1000, damping).period();
            assert!(period.iter().all(|&s| i32::from(s).abs() <= limit));
            assert_eq!(period.iter().map(|&s| i32::from(s)).max(), Some(limit));
        }
    }

    #[test]
    fn full_scale_does_not_wrap() {
        let period = SineSynth::new(48000, 12000, 1.0).period();
        assert_eq!(period.samples(), &[0, i16::MAX, 0, -i16::MAX]);
    }

    /// The -3 dB lookup table used by the stereo demo.
    #[test]
    fn lookup_table_1khz() {
        let period = SineSynth::new(48000, 1000, amplitude_from_decibels(-3.0)).period();
        let expected = expect!["[0, 3028, 6004, 8877, 11599, 14122, 16403, 18404, 20089, 21431, 22407, 22999, 23197, 22999, 22407, 21431, 20089, 18404, 16403, 14122, 11599, 8877, 6004, 3028, 0, -3028, -6004, -8877, -11599, -14122, -16403, -18404, -20089, -21431, -22407, -22999, -23197, -22999, -22407, -21431, -20089, -18404, -16403, -14122, -11599, -8877, -6004, -3028]"];
        expected.assert_eq(&format!("{:?}", period.samples()));
    }

    #[test]
    fn period_24bit_range() {
        let period = SineSynth::new(48000, 1000, 0.5).period_24bit();
        assert_eq!(period.len(), 48);
        assert_eq!(period[0], 0);
        assert_eq!(period[12], INT24_MAX);
        assert_eq!(period[36], -INT24_MAX);
    }
}
