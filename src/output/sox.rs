// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Easy interface for getting sound to play using a sox subprocess.

use std::io;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use log::{debug, error, warn};
use snafu::ResultExt;

use super::{AudioSink, Drain, SinkError, Spawn};

pub enum SoxTarget<'a> {
    /// Play on the given device, `"default"` lets sox pick one.
    Play { device: &'a str },
    File(&'a Path),
}

/// Pipes raw signed 16-bit big-endian PCM into `play` or `sox`.
pub struct SoxSink {
    player: Child,
    audio_stream: Option<ChildStdin>,
    buffer: Vec<u8>,
    channels: usize,
    drained: bool,
}

impl SoxSink {
    pub fn new(sample_rate: u32, channels: usize, target: SoxTarget) -> Result<Self, SinkError> {
        let sample_rate_str = format!("{}", sample_rate);
        let channels_str = format!("{}", channels);
        let input_args = &[
            "--channels",
            &channels_str,
            "--rate",
            &sample_rate_str,
            "--type",
            "s16",
            "--endian",
            "big",
            "/dev/stdin",
        ];

        // For properly recording the sox dependency on nix:
        let (play, sox) = if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
            debug!("using sox from nix store {}", sox_bin);
            let play = Path::new(sox_bin).join("play");
            let sox = Path::new(sox_bin).join("sox");
            (play, sox)
        } else {
            ("play".into(), "sox".into())
        };

        let mut player = match target {
            SoxTarget::Play { device } => {
                let mut command = Command::new(&play);
                command
                    .args(input_args)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                if device != "default" {
                    command.env("AUDIODEV", device);
                }
                command.spawn().context(Spawn {
                    program: play.display().to_string(),
                })?
            }
            SoxTarget::File(outfile) => Command::new(&sox)
                .args(input_args)
                .arg(outfile)
                .stdin(Stdio::piped())
                .spawn()
                .context(Spawn {
                    program: sox.display().to_string(),
                })?,
        };

        let audio_stream = player.stdin.take();

        Ok(Self {
            player,
            audio_stream,
            buffer: Vec::new(),
            channels,
            drained: false,
        })
    }
}

/// Copy the samples to bytes in memory order. The samples are expected to be
/// in wire byte order already.
fn copy_bytes_to(samples: &[u16], bytes: &mut Vec<u8>) {
    bytes.clear();
    for sample in samples {
        bytes.extend_from_slice(&sample.to_ne_bytes());
    }
}

impl AudioSink for SoxSink {
    fn write_frames(&mut self, samples: &[u16]) -> Result<usize, SinkError> {
        let audio_stream = self.audio_stream.as_mut().ok_or(SinkError::Closed)?;
        copy_bytes_to(samples, &mut self.buffer);

        let group_bytes = 2 * self.channels;
        let mut written = audio_stream
            .write(&self.buffer)
            .map_err(|source| SinkError::Stream { source })?;

        // Never leave half a sample group in the pipe.
        let partial = written % group_bytes;
        if partial != 0 {
            let group_end = written + group_bytes - partial;
            audio_stream
                .write_all(&self.buffer[written..group_end])
                .map_err(|source| SinkError::Stream { source })?;
            written = group_end;
        }

        Ok(written / group_bytes)
    }

    fn recover(&mut self, error: &SinkError) -> Result<(), SinkError> {
        if let SinkError::Stream { source } = error {
            if let io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock = source.kind() {
                warn!("resuming audio output after: {}", source);
                return Ok(());
            }
        }
        if let Ok(Some(status)) = self.player.try_wait() {
            return Err(SinkError::Exited { status });
        }
        Err(SinkError::Unrecoverable {
            cause: error.to_string(),
        })
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        // sox finishes playing and exits once its input is closed.
        if let Some(mut audio_stream) = self.audio_stream.take() {
            audio_stream.flush().context(Drain)?;
        }
        let status = self.player.wait().context(Drain)?;
        self.drained = true;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Exited { status })
        }
    }
}

impl Drop for SoxSink {
    fn drop(&mut self) {
        drop(self.audio_stream.take());
        if !self.drained {
            if let Err(err) = self.player.kill() {
                debug!("sox already gone: {}", err);
            }
        }
        if let Err(err) = self.player.wait() {
            error!("Failed to release sox process: {}", err);
        }
    }
}
