// pcm-tone -- streaming a PCM test tone through a ring buffer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `pcmtone` streams a sine test tone to the speakers in fixed-size frames.

use std::path::PathBuf;

use log::{error, info};
use structopt::StructOpt;

use pcm_tone::config::{PlaybackConfig, SourceResolution};
use pcm_tone::play;

#[derive(Debug, StructOpt)]
#[structopt(name = "pcmtone", about = "Streaming a sine test tone")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Playback device, passed on to sox.
    #[structopt(short, long, default_value = "default")]
    device: String,

    /// Sample rate in Hz.
    #[structopt(long, default_value = "48000")]
    rate: u32,

    #[structopt(short, long, default_value = "2")]
    channels: usize,

    /// Frequency of the tone in Hz, must divide the sample rate.
    #[structopt(short, long, default_value = "1000")]
    tone: u32,

    /// Sample groups written at once.
    #[structopt(short, long, default_value = "1152")]
    frame: usize,

    /// Playback time in seconds.
    #[structopt(long, default_value = "30")]
    duration: u32,

    /// Headroom of the synthesized tone.
    #[structopt(long, default_value = "-3.0", allow_hyphen_values = true)]
    damping_db: f64,

    /// Resolution of the synthesized tone (16 or 24).
    #[structopt(long, default_value = "16")]
    source_bits: SourceResolution,

    /// Write as fast as the output accepts instead of once per frame duration.
    #[structopt(long)]
    no_pacing: bool,

    /// Output file (any sox-supported format). The tone is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("failed to set up logging: {}", err);
    }

    let config = PlaybackConfig {
        device: opt.device,
        sample_rate: opt.rate,
        channels: opt.channels,
        tone_frequency: opt.tone,
        frame_len: opt.frame,
        duration_secs: opt.duration,
        damping_db: opt.damping_db,
        source: opt.source_bits,
        pacing: !opt.no_pacing,
        output: opt.output,
    };

    match play::run(&config) {
        Ok(report) => info!(
            "done: {} passes, {} frames, {} short writes, {} recoveries",
            report.passes, report.groups_written, report.short_writes, report.recoveries
        ),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
