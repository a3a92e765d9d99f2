//! Audio output for the exercise.
//!
//! This module provides:
//! - The [`AudioDevice`] capability the engine plays through
//! - A SoundFont synthesizer device using rustysynth and rodio
//! - The playback sequencer that orders and times the two notes

pub mod device;
pub mod engine;
pub mod sequencer;

pub use device::{AudioDevice, DeviceError, Polyphony, Readiness};
pub use engine::SynthDevice;
pub use sequencer::{
    schedule, PlayOutcome, PlaybackError, PlaybackSequencer, PresentationMode, ReadyState,
    ScheduledNote, Timing, UnknownMode,
};
