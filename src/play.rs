// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Streaming the tone to an audio sink, one frame at a time.

use std::thread;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use snafu::{ResultExt, Snafu};

use crate::config::{ConfigError, PlaybackConfig, SourceResolution};
use crate::depth;
use crate::endian;
use crate::output::{AudioSink, SinkError, SoxSink, SoxTarget};
use crate::ring::RingBuffer;
use crate::segment::{PassProgress, RingSegmenter};
use crate::util::amplitude_to_decibels;
use crate::waveform::SineSynth;

#[derive(Debug, Snafu)]
pub enum PlaybackError {
    #[snafu(display("Invalid playback configuration: {}", source))]
    Config { source: ConfigError },
    #[snafu(display("Audio output failed: {}", source))]
    Sink { source: SinkError },
}

/// Everything the playback loop owns: the ring with the tone and the cursor into it.
pub struct Session {
    segmenter: RingSegmenter,
}

impl Session {
    /// Synthesize the tone, fill the ring and bring it into wire byte order.
    pub fn new(config: &PlaybackConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let headroom = match config.source {
            SourceResolution::Bits16 => config.damping_factor(),
            SourceResolution::Bits24 => {
                f64::from(depth::DAMPING_NUMERATOR) / f64::from(depth::DAMPING_DENOMINATOR)
            }
        };
        info!("headroom {:.2} dB", amplitude_to_decibels(headroom));

        let period = match config.source {
            SourceResolution::Bits16 => SineSynth::new(
                config.sample_rate,
                config.tone_frequency,
                config.damping_factor(),
            )
            .period(),
            SourceResolution::Bits24 => depth::reduce_period(
                &SineSynth::new(config.sample_rate, config.tone_frequency, 1.0).period_24bit(),
            ),
        };
        debug!("lookup table[{}] {:?}", period.len(), period.samples());

        let mut ring = RingBuffer::replicate(&period, config.ring_capacity(), config.channels)?;
        let little_endian = endian::host_is_little_endian();
        info!(
            "CPU is using {}",
            if little_endian {
                "little endian"
            } else {
                "big endian"
            }
        );
        ring.normalize_byte_order(little_endian);
        info!(
            "ring holds {} samples ({} channels)",
            ring.capacity(),
            ring.channels()
        );

        let segmenter = RingSegmenter::new(ring, config.frame_len)?;
        Ok(Self { segmenter })
    }

    pub fn segmenter(&self) -> &RingSegmenter {
        &self.segmenter
    }
}

/// What happened during a playback.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Passes over the whole ring.
    pub passes: u32,
    /// Sample groups accepted by the sink.
    pub groups_written: usize,
    pub short_writes: usize,
    pub recoveries: usize,
}

/// Play the tone described by `config` on the speakers, or into the output file.
pub fn run(config: &PlaybackConfig) -> Result<PlaybackReport, PlaybackError> {
    let mut session = Session::new(config).context(Config)?;

    let target = match &config.output {
        None => SoxTarget::Play {
            device: &config.device,
        },
        Some(path) => SoxTarget::File(path),
    };
    let mut sink = SoxSink::new(config.sample_rate, config.channels, target).context(Sink)?;

    // Rendering into a file needs no real-time cadence.
    let pacing = if config.pacing && config.output.is_none() {
        Some(config.frame_duration())
    } else {
        None
    };

    info!(
        "playing {} Hz at {} Hz on {} channels for {} seconds",
        config.tone_frequency, config.sample_rate, config.channels, config.duration_secs
    );
    play(&mut session, &mut sink, config.duration_secs, pacing)
}

/// Run `passes` passes over the ring, then drain the sink.
///
/// The sink is drained even when streaming stopped because of a failure.
pub fn play<S: AudioSink>(
    session: &mut Session,
    sink: &mut S,
    passes: u32,
    pacing: Option<Duration>,
) -> Result<PlaybackReport, PlaybackError> {
    let mut report = PlaybackReport::default();
    let streamed = stream(&mut session.segmenter, sink, passes, pacing, &mut report);

    // pass the remaining samples, otherwise they're dropped on close
    let drained = sink.drain();
    if let Err(err) = &drained {
        error!("draining audio output failed: {}", err);
    }

    streamed.context(Sink)?;
    drained.context(Sink)?;
    Ok(report)
}

fn stream<S: AudioSink>(
    segmenter: &mut RingSegmenter,
    sink: &mut S,
    passes: u32,
    pacing: Option<Duration>,
    report: &mut PlaybackReport,
) -> Result<(), SinkError> {
    debug!(
        "streaming frames of {} sample groups ({} samples)",
        segmenter.frame_len(),
        segmenter.frame_samples()
    );
    for pass in 0..passes {
        loop {
            let frame = segmenter.next_frame();
            let requested = frame.groups();

            let accepted = match sink.write_frames(frame.samples()) {
                Ok(accepted) => {
                    if accepted < requested {
                        warn!(
                            "Short write (expected {}, wrote {})",
                            requested, accepted
                        );
                        report.short_writes += 1;
                    } else {
                        trace!("wrote {} frames", accepted);
                    }
                    accepted
                }
                Err(err) => {
                    warn!("write failed, recovering: {}", err);
                    if let Err(fatal) = sink.recover(&err) {
                        error!("writing audio failed: {}", fatal);
                        return Err(fatal);
                    }
                    report.recoveries += 1;
                    // Nothing was taken, write the same frame again.
                    segmenter.reissue();
                    continue;
                }
            };
            report.groups_written += accepted;

            let progress = segmenter.consume(accepted);
            if let Some(delay) = pacing {
                thread::sleep(delay);
            }
            if progress == PassProgress::Completed {
                break;
            }
        }
        report.passes += 1;
        info!("Passed audio-write iterations: {}.", pass + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    enum Step {
        /// Accept at most this many groups.
        Accept(usize),
        Fail(io::ErrorKind),
    }

    /// Records everything written, following a script of short writes and failures.
    struct MemorySink {
        channels: usize,
        written: Vec<u16>,
        script: VecDeque<Step>,
        drained: bool,
    }

    impl MemorySink {
        fn new(channels: usize, script: Vec<Step>) -> Self {
            Self {
                channels,
                written: Vec::new(),
                script: script.into(),
                drained: false,
            }
        }
    }

    impl AudioSink for MemorySink {
        fn write_frames(&mut self, samples: &[u16]) -> Result<usize, SinkError> {
            let groups = samples.len() / self.channels;
            let accepted = match self.script.pop_front() {
                None => groups,
                Some(Step::Accept(limit)) => limit.min(groups),
                Some(Step::Fail(kind)) => {
                    return Err(SinkError::Stream {
                        source: io::Error::from(kind),
                    })
                }
            };
            self.written
                .extend_from_slice(&samples[..accepted * self.channels]);
            Ok(accepted)
        }

        fn recover(&mut self, error: &SinkError) -> Result<(), SinkError> {
            match error {
                SinkError::Stream { source } if source.kind() == io::ErrorKind::Interrupted => {
                    Ok(())
                }
                _ => Err(SinkError::Unrecoverable {
                    cause: error.to_string(),
                }),
            }
        }

        fn drain(&mut self) -> Result<(), SinkError> {
            self.drained = true;
            Ok(())
        }
    }

    fn config() -> PlaybackConfig {
        PlaybackConfig {
            sample_rate: 4800,
            tone_frequency: 100,
            channels: 2,
            frame_len: 113,
            pacing: false,
            ..PlaybackConfig::default()
        }
    }

    fn assert_continuous(session: &Session, written: &[u16]) {
        let ring = session.segmenter().ring().samples();
        for (index, sample) in written.iter().enumerate() {
            assert_eq!(*sample, ring[index % ring.len()], "sample {}", index);
        }
    }

    #[test]
    fn plays_whole_passes() {
        let mut session = Session::new(&config()).unwrap();
        let mut sink = MemorySink::new(2, vec![]);
        let report = play(&mut session, &mut sink, 3, None).unwrap();

        assert_eq!(report.passes, 3);
        assert_eq!(report.short_writes, 0);
        assert_eq!(sink.written.len(), report.groups_written * 2);
        assert!(sink.written.len() >= 3 * 9600);
        assert!(sink.drained);
        assert_continuous(&session, &sink.written);
    }

    #[test]
    fn short_write_is_resumed() {
        let mut session = Session::new(&config()).unwrap();
        let mut sink = MemorySink::new(2, vec![Step::Accept(50), Step::Accept(0)]);
        let report = play(&mut session, &mut sink, 1, None).unwrap();

        assert_eq!(report.short_writes, 2);
        assert_eq!(report.passes, 1);
        assert_continuous(&session, &sink.written);
    }

    #[test]
    fn recoverable_failure_retries_frame() {
        let mut session = Session::new(&config()).unwrap();
        let mut sink = MemorySink::new(
            2,
            vec![Step::Accept(113), Step::Fail(io::ErrorKind::Interrupted)],
        );
        let report = play(&mut session, &mut sink, 2, None).unwrap();

        assert_eq!(report.recoveries, 1);
        assert_eq!(report.passes, 2);
        assert_continuous(&session, &sink.written);
    }

    /// The 43rd frame crosses the end of the ring; failing it must not lose it.
    #[test]
    fn recoverable_failure_retries_splice() {
        let mut session = Session::new(&config()).unwrap();
        let mut script: Vec<Step> = (0..42).map(|_| Step::Accept(113)).collect();
        script.push(Step::Fail(io::ErrorKind::Interrupted));
        let mut sink = MemorySink::new(2, script);
        let report = play(&mut session, &mut sink, 2, None).unwrap();

        assert_eq!(report.recoveries, 1);
        assert_eq!(report.passes, 2);
        assert!(sink.written.len() > 2 * 9600);
        assert_continuous(&session, &sink.written);
    }

    #[test]
    fn fatal_failure_stops_and_drains() {
        let mut session = Session::new(&config()).unwrap();
        let mut sink = MemorySink::new(
            2,
            vec![
                Step::Accept(113),
                Step::Accept(113),
                Step::Fail(io::ErrorKind::BrokenPipe),
            ],
        );
        let result = play(&mut session, &mut sink, 5, None);

        assert!(matches!(
            result,
            Err(PlaybackError::Sink {
                source: SinkError::Unrecoverable { .. }
            })
        ));
        assert!(sink.drained);
        assert_eq!(sink.written.len(), 2 * 226);
        assert_eq!(session.segmenter().cursor(), 2 * 226);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PlaybackConfig {
            tone_frequency: 7,
            ..config()
        };
        assert!(matches!(
            Session::new(&config),
            Err(ConfigError::UnevenPeriod { .. })
        ));
    }

    #[test]
    fn ring_is_in_wire_order() {
        for &source in &[SourceResolution::Bits16, SourceResolution::Bits24] {
            let session = Session::new(&PlaybackConfig {
                source,
                ..PlaybackConfig::default()
            })
            .unwrap();
            let ring = session.segmenter().ring();
            assert!(ring.is_big_endian());
            assert_eq!(ring.capacity(), 96000);

            // quarter period of the 1 kHz tone: the positive peak on both channels
            let peak = match source {
                SourceResolution::Bits16 => 23197i16,
                SourceResolution::Bits24 => 29203,
            };
            let bytes: Vec<u8> = ring.samples()[24..26]
                .iter()
                .flat_map(|s| s.to_ne_bytes().to_vec())
                .collect();
            let mut expected = peak.to_be_bytes().to_vec();
            expected.extend_from_slice(&peak.to_be_bytes());
            assert_eq!(bytes, expected);
        }
    }
}
