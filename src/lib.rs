// Generating the tone
pub mod depth;
pub mod waveform;

// Getting it to the speakers
pub mod endian;
pub mod output;
pub mod play;
pub mod ring;
pub mod segment;

// Utility modules
pub mod config;
pub mod util;
