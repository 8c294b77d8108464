// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Reducing 24-bit samples to the 16-bit playback resolution.

use crate::waveform::WaveformPeriod;

/// Numerator of the -1 dB damping factor, relative to [`DAMPING_DENOMINATOR`].
pub const DAMPING_NUMERATOR: i32 = 29204;
pub const DAMPING_DENOMINATOR: i32 = 32768;

/// Truncate a 24-bit sample to 16 bits.
///
/// The low byte is rounded away, the result clamped to the 16-bit range and
/// then damped by roughly 1 dB. Clamping happens first so that the damped value
/// always stays within range.
///
/// ```
/// # use pcm_tone::depth::reduce_sample;
/// assert_eq!(reduce_sample(0), 0);
/// assert_eq!(reduce_sample(256 * 1000), 891);
/// ```
pub fn reduce_sample(sample: i32) -> i16 {
    let shifted = sample.saturating_add(128) >> 8;
    let clamped = shifted.max(i32::from(i16::MIN)).min(i32::from(i16::MAX));
    (clamped * DAMPING_NUMERATOR / DAMPING_DENOMINATOR) as i16
}

/// Reduce a whole 24-bit period, e.g. from [`SineSynth::period_24bit`](crate::waveform::SineSynth::period_24bit).
pub fn reduce_period(samples: &[i32]) -> WaveformPeriod {
    WaveformPeriod::from_samples(samples.iter().map(|&s| reduce_sample(s)).collect())
}
