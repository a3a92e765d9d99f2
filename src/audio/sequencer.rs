//! Playback sequencing for interval problems.
//!
//! Turns a problem and a presentation mode into two timed note triggers,
//! and performs the device's one-time readiness handshake before the
//! first of them.

use super::device::{AudioDevice, DeviceError, Polyphony, Readiness};
use crate::theory::{NoteIndex, Problem, ScaleTable};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Length of each note: an eighth note at 120 BPM.
pub const DEFAULT_NOTE_DURATION: Duration = Duration::from_millis(250);

/// Gap between the two note starts in sequential modes.
pub const DEFAULT_NOTE_DELAY: Duration = Duration::from_secs(1);

/// Temporal arrangement of the two notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    /// Lower note first, then the upper.
    #[default]
    Ascending,
    /// Upper note first, then the lower.
    Descending,
    /// Both notes together.
    Harmonic,
}

impl PresentationMode {
    /// All modes in cycling order.
    pub const ALL: [PresentationMode; 3] = [
        PresentationMode::Ascending,
        PresentationMode::Descending,
        PresentationMode::Harmonic,
    ];

    /// Lowercase name used in configuration and on screen.
    pub fn name(self) -> &'static str {
        match self {
            PresentationMode::Ascending => "ascending",
            PresentationMode::Descending => "descending",
            PresentationMode::Harmonic => "harmonic",
        }
    }

    /// Returns true if a device with `polyphony` can realize this mode.
    pub fn supported_by(self, polyphony: Polyphony) -> bool {
        self != PresentationMode::Harmonic || polyphony == Polyphony::Poly
    }

    /// The next mode after this one that `polyphony` supports.
    pub fn next_supported(self, polyphony: Polyphony) -> Self {
        let start = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        (1..=Self::ALL.len())
            .map(|step| Self::ALL[(start + step) % Self::ALL.len()])
            .find(|m| m.supported_by(polyphony))
            .unwrap_or(self)
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A mode name that matches no [`PresentationMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown presentation mode: {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for PresentationMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" | "up" => Ok(PresentationMode::Ascending),
            "descending" | "desc" | "down" => Ok(PresentationMode::Descending),
            "harmonic" | "together" => Ok(PresentationMode::Harmonic),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Note length and spacing used for every presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub note_duration: Duration,
    pub delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            note_duration: DEFAULT_NOTE_DURATION,
            delay: DEFAULT_NOTE_DELAY,
        }
    }
}

/// One planned note trigger, relative to the moment playback was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledNote {
    pub note: NoteIndex,
    pub start: Duration,
    pub duration: Duration,
}

/// Plans the two notes of `problem` for `mode`, in trigger order.
pub fn schedule(problem: &Problem, mode: PresentationMode, timing: Timing) -> [ScheduledNote; 2] {
    let (a, b) = (problem.first_note, problem.second_note());
    let (lead, follow, offset) = match mode {
        PresentationMode::Ascending => (a, b, timing.delay),
        PresentationMode::Descending => (b, a, timing.delay),
        PresentationMode::Harmonic => (a, b, Duration::ZERO),
    };
    [
        ScheduledNote {
            note: lead,
            start: Duration::ZERO,
            duration: timing.note_duration,
        },
        ScheduledNote {
            note: follow,
            start: offset,
            duration: timing.note_duration,
        },
    ]
}

/// Outcome of a successful readiness request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The handshake ran and completed during this call.
    Unlocked,
    /// The device was already unlocked; it was not contacted.
    AlreadyReady,
    /// The handshake is still in progress.
    Pending,
}

/// Outcome of a play request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Both notes were handed to the device.
    Scheduled,
    /// The device is still unlocking; nothing was scheduled.
    AwaitingDevice,
}

/// Errors from [`PlaybackSequencer::play`].
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// Harmonic playback requested on a single-voice device.
    #[error("{0} playback needs a polyphonic device")]
    Unsupported(PresentationMode),
    /// A scheduled note has no label in the scale table.
    #[error("note index {0} is outside the scale")]
    NoteOutOfRange(NoteIndex),
}

/// Issues note triggers to an audio device.
#[derive(Debug, Clone)]
pub struct PlaybackSequencer {
    timing: Timing,
    ready: bool,
}

impl PlaybackSequencer {
    /// Creates a sequencer that has not unlocked any device yet.
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            ready: false,
        }
    }

    /// Whether the readiness handshake has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Runs the unlock handshake unless it already completed.
    ///
    /// # Errors
    ///
    /// Propagates device failures. The next call tries again.
    pub fn request_ready<D: AudioDevice>(&mut self, device: &mut D) -> Result<ReadyState, DeviceError> {
        if self.ready {
            return Ok(ReadyState::AlreadyReady);
        }
        match device.request_ready()? {
            Readiness::Ready => {
                self.ready = true;
                tracing::info!("audio device ready");
                Ok(ReadyState::Unlocked)
            }
            Readiness::Pending => {
                tracing::debug!("audio device handshake pending");
                Ok(ReadyState::Pending)
            }
        }
    }

    /// Plays `problem` on `device` in `mode`.
    ///
    /// Each call schedules its own pair of notes; earlier requests that are
    /// still sounding are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Unsupported`] for harmonic playback on a mono
    /// device, and device errors from the handshake or the triggers.
    pub fn play<D: AudioDevice>(
        &mut self,
        problem: &Problem,
        mode: PresentationMode,
        scale: &ScaleTable,
        device: &mut D,
    ) -> Result<PlayOutcome, PlaybackError> {
        if !mode.supported_by(device.polyphony()) {
            return Err(PlaybackError::Unsupported(mode));
        }

        if self.request_ready(device)? == ReadyState::Pending {
            return Ok(PlayOutcome::AwaitingDevice);
        }

        let notes = schedule(problem, mode, self.timing);
        let labels = notes
            .iter()
            .map(|n| scale.label(n.note).ok_or(PlaybackError::NoteOutOfRange(n.note)))
            .collect::<Result<Vec<_>, _>>()?;

        for (note, label) in notes.iter().zip(labels) {
            device.trigger_note(label, note.duration, note.start)?;
        }
        tracing::debug!(
            first = problem.first_note,
            interval = problem.interval,
            %mode,
            "scheduled interval playback"
        );
        Ok(PlayOutcome::Scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::testing::RecordingDevice;
    use crate::theory::MIDDLE_C;

    fn scale() -> ScaleTable {
        ScaleTable::chromatic(MIDDLE_C, 26)
    }

    #[test]
    fn test_schedule_offsets_per_mode() {
        let timing = Timing {
            note_duration: Duration::from_millis(250),
            delay: Duration::from_millis(700),
        };
        let problem = Problem::new(2, 5);

        let [a, b] = schedule(&problem, PresentationMode::Ascending, timing);
        assert_eq!((a.note, b.note), (2, 7));
        assert_eq!(b.start - a.start, timing.delay);

        let [a, b] = schedule(&problem, PresentationMode::Descending, timing);
        assert_eq!((a.note, b.note), (7, 2));
        assert_eq!(b.start - a.start, timing.delay);

        let [a, b] = schedule(&problem, PresentationMode::Harmonic, timing);
        assert_eq!(a.start, b.start);
        assert_eq!((a.note, b.note), (2, 7));
        assert!(a.duration == timing.note_duration && b.duration == timing.note_duration);
    }

    #[test]
    fn test_harmonic_starts_together_for_any_delay() {
        for delay_ms in [0, 1, 250, 1000, 5000] {
            let timing = Timing {
                note_duration: DEFAULT_NOTE_DURATION,
                delay: Duration::from_millis(delay_ms),
            };
            for interval in 1..=14 {
                let [a, b] = schedule(&Problem::new(0, interval), PresentationMode::Harmonic, timing);
                assert_eq!(a.start, b.start);
            }
        }
    }

    #[test]
    fn test_play_triggers_labels() {
        let mut device = RecordingDevice::new(Polyphony::Poly);
        let mut sequencer = PlaybackSequencer::new(Timing::default());

        let outcome = sequencer
            .play(&Problem::new(0, 7), PresentationMode::Descending, &scale(), &mut device)
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Scheduled);
        assert_eq!(device.triggers.len(), 2);
        assert_eq!(device.triggers[0].pitch, "G4");
        assert_eq!(device.triggers[0].start_offset, Duration::ZERO);
        assert_eq!(device.triggers[1].pitch, "C4");
        assert_eq!(device.triggers[1].start_offset, DEFAULT_NOTE_DELAY);
    }

    #[test]
    fn test_handshake_runs_once() {
        let mut device = RecordingDevice::new(Polyphony::Poly);
        let mut sequencer = PlaybackSequencer::new(Timing::default());

        assert_eq!(sequencer.request_ready(&mut device).unwrap(), ReadyState::Unlocked);
        assert_eq!(sequencer.request_ready(&mut device).unwrap(), ReadyState::AlreadyReady);
        assert_eq!(device.handshakes, 1);

        sequencer
            .play(&Problem::new(0, 3), PresentationMode::Ascending, &scale(), &mut device)
            .unwrap();
        assert_eq!(device.handshakes, 1);
    }

    #[test]
    fn test_failed_handshake_is_retried() {
        let mut device = RecordingDevice::scripted(
            Polyphony::Poly,
            vec![Err("no output".into()), Ok(Readiness::Pending)],
        );
        let mut sequencer = PlaybackSequencer::new(Timing::default());
        let problem = Problem::new(0, 4);

        let err = sequencer
            .play(&problem, PresentationMode::Ascending, &scale(), &mut device)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Device(DeviceError::Unavailable(_))));
        assert!(!sequencer.is_ready());

        let outcome = sequencer
            .play(&problem, PresentationMode::Ascending, &scale(), &mut device)
            .unwrap();
        assert_eq!(outcome, PlayOutcome::AwaitingDevice);
        assert!(device.triggers.is_empty());

        let outcome = sequencer
            .play(&problem, PresentationMode::Ascending, &scale(), &mut device)
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Scheduled);
        assert_eq!(device.handshakes, 3);
        assert_eq!(device.triggers.len(), 2);
    }

    #[test]
    fn test_overlapping_requests_all_schedule() {
        let mut device = RecordingDevice::new(Polyphony::Poly);
        let mut sequencer = PlaybackSequencer::new(Timing::default());
        let problem = Problem::new(1, 9);

        for _ in 0..3 {
            sequencer
                .play(&problem, PresentationMode::Ascending, &scale(), &mut device)
                .unwrap();
        }
        assert_eq!(device.triggers.len(), 6);
    }

    #[test]
    fn test_harmonic_rejected_on_mono_device() {
        let mut device = RecordingDevice::new(Polyphony::Mono);
        let mut sequencer = PlaybackSequencer::new(Timing::default());

        let err = sequencer
            .play(&Problem::new(0, 7), PresentationMode::Harmonic, &scale(), &mut device)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Unsupported(PresentationMode::Harmonic)));
        assert_eq!(device.handshakes, 0);
        assert!(device.triggers.is_empty());
    }

    #[test]
    fn test_note_outside_scale_is_not_triggered() {
        let mut device = RecordingDevice::new(Polyphony::Poly);
        let mut sequencer = PlaybackSequencer::new(Timing::default());
        let short = ScaleTable::chromatic(MIDDLE_C, 8);

        let err = sequencer
            .play(&Problem::new(3, 7), PresentationMode::Ascending, &short, &mut device)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NoteOutOfRange(10)));
        assert!(device.triggers.is_empty());
    }

    #[test]
    fn test_mode_parsing_and_cycling() {
        assert_eq!("Harmonic".parse::<PresentationMode>(), Ok(PresentationMode::Harmonic));
        assert_eq!(" desc ".parse::<PresentationMode>(), Ok(PresentationMode::Descending));
        assert_eq!(
            "sideways".parse::<PresentationMode>(),
            Err(UnknownMode("sideways".to_string()))
        );

        let poly = Polyphony::Poly;
        assert_eq!(PresentationMode::Descending.next_supported(poly), PresentationMode::Harmonic);
        assert_eq!(PresentationMode::Harmonic.next_supported(poly), PresentationMode::Ascending);
        assert_eq!(
            PresentationMode::Descending.next_supported(Polyphony::Mono),
            PresentationMode::Ascending
        );
    }
}
