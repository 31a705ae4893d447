//! Rusty Soundbank: SoundFont 2 to SFZ conversion.
//!
//! A bank is decoded by [`sf2`] into the [`bank`] model, and [`convert`]
//! writes one `.sfz` document plus a folder of WAV samples per preset.

pub mod bank;
pub mod convert;
pub mod error;
pub mod export;
pub mod format;
pub mod generator;
pub mod mapping;
pub mod sf2;
pub mod sfz;

pub use bank::SoundBank;
pub use convert::{Converter, OutputLayout, PresetReport};
pub use error::{ConvertError, ExportError, Sf2Error};
pub use export::{SampleSink, WavSink};
pub use sf2::{load, read_sound_bank};
