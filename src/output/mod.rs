// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Where the audio ends up.

use std::io;
use std::process::ExitStatus;

use snafu::Snafu;

pub mod sox;

pub use sox::{SoxSink, SoxTarget};

#[derive(Debug, Snafu)]
pub enum SinkError {
    #[snafu(display("Failed to start {}: {}", program, source))]
    Spawn { program: String, source: io::Error },
    #[snafu(display("Failed to write audio to sox stream: {}", source))]
    Stream { source: io::Error },
    #[snafu(display("Audio output is already closed"))]
    Closed,
    #[snafu(display("Cannot recover audio output after: {}", cause))]
    Unrecoverable { cause: String },
    #[snafu(display("Failed to drain audio output: {}", source))]
    Drain { source: io::Error },
    #[snafu(display("Audio output exited with {}", status))]
    Exited { status: ExitStatus },
}

/// A blocking consumer of interleaved 16-bit big-endian samples.
pub trait AudioSink {
    /// Hand the samples to the device, blocking until it accepted some of them.
    ///
    /// Returns the number of sample groups (one sample per channel) that were
    /// accepted, which is less than offered on a short write.
    fn write_frames(&mut self, samples: &[u16]) -> Result<usize, SinkError>;

    /// Try to get the device going again after `error` was returned by a write.
    fn recover(&mut self, error: &SinkError) -> Result<(), SinkError>;

    /// Block until everything written so far has been played.
    fn drain(&mut self) -> Result<(), SinkError>;
}
