//! The audio device capability the exercise engine plays through.
//!
//! The engine never synthesizes sound itself. It asks a device to become
//! ready, then hands it note triggers with a start offset on the device's
//! own timeline.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by an audio device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A note was triggered before the readiness handshake completed.
    #[error("audio device is not ready")]
    NotReady,
    /// The device could not be unlocked (no output available, etc.).
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
    /// The device does not know how to sound a pitch label.
    #[error("unknown pitch label: {0:?}")]
    UnknownPitch(String),
}

/// How many notes a device can sound at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polyphony {
    /// One voice: a new note cuts off the previous one.
    Mono,
    /// Any number of simultaneous voices.
    Poly,
}

/// Result of asking a device to become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The device accepts note triggers from now on.
    Ready,
    /// The handshake has started but not finished; ask again later.
    Pending,
}

/// Capability surface of an output device.
pub trait AudioDevice {
    /// Voice capacity of the device.
    fn polyphony(&self) -> Polyphony;

    /// Performs (or continues) the unlock handshake.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unavailable`] if the device cannot be unlocked.
    /// Callers may retry.
    fn request_ready(&mut self) -> Result<Readiness, DeviceError>;

    /// Schedules `pitch` to sound for `duration`, starting `start_offset`
    /// after the device's current time. Returns without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not ready or does not recognize the
    /// pitch label.
    fn trigger_note(
        &mut self,
        pitch: &str,
        duration: Duration,
        start_offset: Duration,
    ) -> Result<(), DeviceError>;
}
