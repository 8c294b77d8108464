// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Utility functions that I don't know where to put else

/// Compute an amplitude factor from a level measured in decibels.
///
/// # Example
///
/// ```
/// # use pcm_tone::util::*;
///
/// assert_eq!(amplitude_from_decibels(0.0), 1.0);
/// assert!((amplitude_from_decibels(-20.0) - 0.1).abs() < 1e-12);
/// assert!((amplitude_from_decibels(-3.0) - 0.707_945_784).abs() < 1e-9);
/// ```
pub fn amplitude_from_decibels(decibels: f64) -> f64 {
    10.0f64.powf(decibels / 20.0)
}

/// Inverse of [`amplitude_from_decibels`].
///
/// ```
/// # use pcm_tone::util::*;
///
/// assert_eq!(amplitude_to_decibels(10.0), 20.0);
/// ```
pub fn amplitude_to_decibels(factor: f64) -> f64 {
    20.0 * factor.log10()
}
