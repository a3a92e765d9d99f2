//! SoundFont-backed audio device.
//!
//! Synthesizes notes with rustysynth and streams them through rodio. Note
//! triggers are queued against a sample clock that the audio thread advances
//! as it renders, so scheduling never blocks the caller.

use super::device::{AudioDevice, DeviceError, Polyphony, Readiness};
use crate::theory::name_to_note;
use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size in frames. Queued events fire on buffer boundaries,
/// so this is also the scheduling resolution (about 6 ms).
const BUFFER_SIZE: usize = 256;

/// MIDI channel all notes are played on.
const CHANNEL: i32 = 0;

/// Velocity for every note.
const VELOCITY: i32 = 100;

/// A note-on or note-off at a point on the sample clock.
#[derive(Debug, Clone, Copy)]
struct TimedEvent {
    /// Frame at which the event fires.
    at: u64,
    key: i32,
    on: bool,
}

/// State shared between the device and the audio thread.
struct Timeline {
    /// Frames rendered so far.
    clock: AtomicU64,
    /// Events not yet fired, in no particular order.
    pending: Mutex<Vec<TimedEvent>>,
}

/// Audio source that renders the synthesizer and fires queued events.
struct SynthSource {
    synth: Arc<Mutex<Synthesizer>>,
    timeline: Arc<Timeline>,
    polyphony: Polyphony,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<Synthesizer>>, timeline: Arc<Timeline>, polyphony: Polyphony) -> Self {
        Self {
            synth,
            timeline,
            polyphony,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }

    /// Removes and returns events due before `until`, earliest first.
    /// Offs sort before ons at the same frame so back-to-back notes retrigger.
    fn take_due(&self, until: u64) -> Vec<TimedEvent> {
        let Ok(mut pending) = self.timeline.pending.lock() else {
            return Vec::new();
        };
        let mut due: Vec<TimedEvent> = Vec::new();
        pending.retain(|event| {
            if event.at < until {
                due.push(*event);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.at, e.on));
        due
    }

    fn render_block(&mut self) {
        let start = self.timeline.clock.load(Ordering::Acquire);
        let end = start + BUFFER_SIZE as u64;
        let due = self.take_due(end);

        if let Ok(mut synth) = self.synth.lock() {
            for event in due {
                if event.on {
                    if self.polyphony == Polyphony::Mono {
                        synth.note_off_all(false);
                    }
                    synth.note_on(CHANNEL, event.key, VELOCITY);
                } else {
                    synth.note_off(CHANNEL, event.key);
                }
            }
            synth.render(&mut self.left_buf, &mut self.right_buf);
        } else {
            self.left_buf.fill(0.0);
            self.right_buf.fill(0.0);
        }

        self.timeline.clock.store(end, Ordering::Release);
        self.buf_pos = 0;
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            self.render_block();
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// An open rodio output. Dropping it closes the stream.
struct Output {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
}

/// Converts a duration to a whole number of frames.
fn frames(duration: Duration) -> u64 {
    (duration.as_secs_f64() * SAMPLE_RATE as f64).round() as u64
}

/// Audio device that plays notes from a SoundFont.
///
/// The SoundFont is loaded when the device is built, but the system audio
/// output is only opened by the first [`AudioDevice::request_ready`] call
/// and stays open until the device is dropped.
pub struct SynthDevice {
    synth: Arc<Mutex<Synthesizer>>,
    timeline: Arc<Timeline>,
    polyphony: Polyphony,
    output: Option<Output>,
}

impl SynthDevice {
    /// Loads a SoundFont and prepares a synthesizer for it.
    ///
    /// # Errors
    ///
    /// Returns error if the SoundFont file cannot be read or is invalid.
    pub fn new<P: AsRef<Path>>(soundfont_path: P, polyphony: Polyphony) -> Result<Self> {
        let mut file = BufReader::new(File::open(soundfont_path.as_ref()).with_context(|| {
            format!(
                "Failed to open SoundFont: {}",
                soundfont_path.as_ref().display()
            )
        })?);
        let soundfont = Arc::new(
            SoundFont::new(&mut file)
                .map_err(|e| anyhow::anyhow!("Failed to load SoundFont: {:?}", e))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| anyhow::anyhow!("Failed to create synthesizer: {:?}", e))?;

        tracing::debug!(path = %soundfont_path.as_ref().display(), "SoundFont loaded");

        Ok(Self {
            synth: Arc::new(Mutex::new(synth)),
            timeline: Arc::new(Timeline {
                clock: AtomicU64::new(0),
                pending: Mutex::new(Vec::new()),
            }),
            polyphony,
            output: None,
        })
    }

    fn open_output(&self) -> Result<Output, DeviceError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        let source = SynthSource::new(
            Arc::clone(&self.synth),
            Arc::clone(&self.timeline),
            self.polyphony,
        );
        handle
            .play_raw(source)
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        Ok(Output {
            _stream: stream,
            _handle: handle,
        })
    }
}

impl AudioDevice for SynthDevice {
    fn polyphony(&self) -> Polyphony {
        self.polyphony
    }

    fn request_ready(&mut self) -> Result<Readiness, DeviceError> {
        if self.output.is_none() {
            self.output = Some(self.open_output()?);
            tracing::info!("audio output opened");
        }
        Ok(Readiness::Ready)
    }

    fn trigger_note(
        &mut self,
        pitch: &str,
        duration: Duration,
        start_offset: Duration,
    ) -> Result<(), DeviceError> {
        if self.output.is_none() {
            return Err(DeviceError::NotReady);
        }
        let key = name_to_note(pitch).ok_or_else(|| DeviceError::UnknownPitch(pitch.to_string()))?;

        let now = self.timeline.clock.load(Ordering::Acquire);
        let on = now + frames(start_offset);
        let off = on + frames(duration).max(1);

        let mut pending = self
            .timeline
            .pending
            .lock()
            .map_err(|_| DeviceError::Unavailable("audio timeline poisoned".to_string()))?;
        pending.push(TimedEvent {
            at: on,
            key: key as i32,
            on: true,
        });
        pending.push(TimedEvent {
            at: off,
            key: key as i32,
            on: false,
        });
        Ok(())
    }
}

impl Drop for SynthDevice {
    fn drop(&mut self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off_all(true);
        }
        if self.output.take().is_some() {
            tracing::debug!("audio output closed");
        }
    }
}
