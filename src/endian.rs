// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Bringing 16-bit samples into the big-endian byte order of the wire format.

/// Whether this host stores integers least significant byte first.
///
/// Compares a known value against its network (big-endian) representation.
pub fn host_is_little_endian() -> bool {
    u32::to_be(23) != 23
}

/// Swap the bytes of every sample in place if the host is little endian.
///
/// Applying this twice restores the original buffer, so it must run exactly
/// once per buffer before the buffer is handed to the sink.
///
/// ```
/// # use pcm_tone::endian::normalize_to_big_endian;
/// let mut samples = [0x1234u16, 0xff00];
/// normalize_to_big_endian(&mut samples, true);
/// assert_eq!(samples, [0x3412, 0x00ff]);
/// normalize_to_big_endian(&mut samples, false);
/// assert_eq!(samples, [0x3412, 0x00ff]);
/// ```
pub fn normalize_to_big_endian(samples: &mut [u16], host_little_endian: bool) {
    if !host_little_endian {
        return;
    }
    for sample in samples.iter_mut() {
        *sample = sample.swap_bytes();
    }
}

/// Reinterpret a signed sample as the unsigned word that is sent over the wire.
pub fn to_wire_word(sample: i16) -> u16 {
    u16::from_ne_bytes(sample.to_ne_bytes())
}
