// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Slicing the ring buffer into fixed-size write frames.
//!
//! The segmenter keeps a cursor into the ring that survives across passes over
//! the buffer. A frame that would run past the end of the ring is spliced
//! together from the tail and the head of the buffer, and the cursor continues
//! behind the head part instead of restarting at zero, so the tone stays phase
//! continuous.

use log::trace;

use crate::config::ConfigError;
use crate::ring::RingBuffer;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// A view into the ring, no copy was made.
    Contiguous,
    /// Tail and head of the ring copied into the splice buffer.
    Spliced,
}

/// One chunk of interleaved samples ready for the sink.
#[derive(Debug)]
pub struct WriteFrame<'a> {
    samples: &'a [u16],
    channels: usize,
    kind: FrameKind,
}

impl<'a> WriteFrame<'a> {
    pub fn samples(&self) -> &'a [u16] {
        self.samples
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn is_spliced(&self) -> bool {
        self.kind == FrameKind::Spliced
    }

    /// Number of sample groups, i.e. one sample for every channel.
    pub fn groups(&self) -> usize {
        self.samples.len() / self.channels
    }
}

/// Where the segmenter stands after the sink consumed a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassProgress {
    Continue,
    /// The end of the ring was reached or crossed.
    Completed,
}

/// A frame handed out and not yet accounted for.
#[derive(Debug, Copy, Clone)]
enum Pending {
    Contiguous,
    /// The cursor moves behind the head part once the splice was delivered.
    Spliced { head_count: usize },
}

pub struct RingSegmenter {
    ring: RingBuffer,
    /// Sample groups per frame.
    frame_len: usize,
    /// Offset of the next frame in samples.
    cursor: usize,
    /// Storage for spliced frames, reused between wraps.
    splice: Vec<u16>,
    pending: Option<Pending>,
}

impl RingSegmenter {
    pub fn new(ring: RingBuffer, frame_len: usize) -> Result<Self, ConfigError> {
        if frame_len == 0 {
            return Err(ConfigError::ZeroParameter { name: "frame_len" });
        }
        let frame_samples = match frame_len.checked_mul(ring.channels()) {
            Some(frame_samples) if frame_samples <= ring.capacity() => frame_samples,
            _ => {
                return Err(ConfigError::FrameTooLarge {
                    frame_samples: frame_len.saturating_mul(ring.channels()),
                    capacity: ring.capacity(),
                })
            }
        };
        Ok(Self {
            ring,
            frame_len,
            cursor: 0,
            splice: Vec::with_capacity(frame_samples),
            pending: None,
        })
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Interleaved samples in a frame.
    pub fn frame_samples(&self) -> usize {
        self.frame_len * self.ring.channels()
    }

    /// Produce the frame starting at the cursor.
    ///
    /// The cursor stays put until [`consume`](Self::consume) reports what the
    /// sink took, or [`reissue`](Self::reissue) asks for the same frame again.
    pub fn next_frame(&mut self) -> WriteFrame<'_> {
        let frame_samples = self.frame_samples();
        let capacity = self.ring.capacity();
        let frame_end = self.cursor + frame_samples;
        let channels = self.ring.channels();

        if frame_end <= capacity {
            self.pending = Some(Pending::Contiguous);
            return WriteFrame {
                samples: &self.ring.samples()[self.cursor..frame_end],
                channels,
                kind: FrameKind::Contiguous,
            };
        }

        let tail_count = capacity - self.cursor;
        let head_count = frame_samples - tail_count;
        trace!(
            "splicing {} tail samples at {} with {} head samples",
            tail_count,
            self.cursor,
            head_count
        );

        let samples = self.ring.samples();
        self.splice.clear();
        self.splice.extend_from_slice(&samples[self.cursor..]);
        self.splice.extend_from_slice(&samples[..head_count]);
        self.pending = Some(Pending::Spliced { head_count });

        WriteFrame {
            samples: &self.splice,
            channels,
            kind: FrameKind::Spliced,
        }
    }

    /// Account for `groups` sample groups of the last frame taken by the sink.
    ///
    /// A contiguous frame advances the cursor by what was taken. A delivered
    /// splice moves it behind the head part, even on a short write.
    pub fn consume(&mut self, groups: usize) -> PassProgress {
        match self.pending.take() {
            Some(Pending::Contiguous) => {
                self.cursor += groups.min(self.frame_len) * self.ring.channels();
                if self.cursor >= self.ring.capacity() {
                    self.cursor -= self.ring.capacity();
                    PassProgress::Completed
                } else {
                    PassProgress::Continue
                }
            }
            Some(Pending::Spliced { head_count }) => {
                self.cursor = head_count;
                PassProgress::Completed
            }
            None => PassProgress::Continue,
        }
    }

    /// Forget the last frame without moving the cursor, so that the next call
    /// to [`next_frame`](Self::next_frame) produces it again.
    pub fn reissue(&mut self) {
        self.pending = None;
    }
}
