//! Exercise configuration.
//!
//! An [`ExerciseConfig`] carries the pitch and interval tables plus every
//! knob of the engine. Two built-in profiles cover the common setups, and
//! any of them can be saved to or loaded from JSON.

use crate::audio::{Polyphony, PresentationMode, Timing, UnknownMode};
use crate::theory::{name_to_note, GenerationConstraints, IntervalTable, ScaleTable, MIDDLE_C};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors found while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown profile {0:?} (expected \"classic\" or \"locked\")")]
    UnknownProfile(String),
    #[error("{name} range {min}..={max} is empty")]
    EmptyRange {
        name: &'static str,
        min: usize,
        max: usize,
    },
    #[error("interval 0 is not a valid interval")]
    ZeroInterval,
    #[error("interval {interval} has no name (table ends at {max})")]
    UnnamedInterval { interval: usize, max: usize },
    #[error("no note pair fits a scale of {scale_len} notes")]
    Infeasible { scale_len: usize },
    #[error("scale label {label:?} at index {index} is not a pitch name")]
    UnknownPitch { index: usize, label: String },
    #[error("scale label {label:?} at index {index} is not one semitone above the previous label")]
    NotChromatic { index: usize, label: String },
}

/// Inclusive range of indices, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub min: usize,
    pub max: usize,
}

impl IndexRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Full configuration of an exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfig {
    /// Pitch labels, one semitone apart, lowest first.
    pub scale: Vec<String>,
    /// Interval names indexed by semitones; entry 0 is never shown.
    pub intervals: Vec<String>,
    pub first_note_range: IndexRange,
    pub interval_range: IndexRange,
    /// Push intervals of a fifth or less up an extra fifth half the time.
    pub compound_bias: bool,
    /// Require a correct answer before moving to the next problem.
    pub strict_progression: bool,
    /// Presentation mode name: "ascending", "descending" or "harmonic".
    pub mode: String,
    pub note_duration_ms: u64,
    pub delay_ms: u64,
    /// Play each new problem right away once audio is unlocked.
    pub auto_play: bool,
    /// Let the synthesizer sound several notes at once.
    pub polyphonic: bool,
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self::locked()
    }
}

impl ExerciseConfig {
    /// Two octaves from C4, intervals up to an octave, free progression,
    /// single-voice synth.
    pub fn classic() -> Self {
        Self {
            scale: ScaleTable::chromatic(MIDDLE_C, 24).labels().to_vec(),
            intervals: IntervalTable::standard(12).names().to_vec(),
            first_note_range: IndexRange::new(0, 11),
            interval_range: IndexRange::new(1, 12),
            compound_bias: false,
            strict_progression: false,
            mode: PresentationMode::Ascending.name().to_string(),
            note_duration_ms: 250,
            delay_ms: 1000,
            auto_play: false,
            polyphonic: false,
        }
    }

    /// C4 to C#6, intervals up to a major ninth, and a correct answer is
    /// required before the next problem.
    pub fn locked() -> Self {
        Self {
            scale: ScaleTable::chromatic(MIDDLE_C, 26).labels().to_vec(),
            intervals: IntervalTable::standard(14).names().to_vec(),
            first_note_range: IndexRange::new(0, 11),
            interval_range: IndexRange::new(1, 14),
            compound_bias: false,
            strict_progression: true,
            mode: PresentationMode::Ascending.name().to_string(),
            note_duration_ms: 250,
            delay_ms: 1000,
            auto_play: true,
            polyphonic: true,
        }
    }

    /// Looks up a built-in profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] for any other name.
    pub fn profile(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::classic()),
            "locked" => Ok(Self::locked()),
            _ => Err(ConfigError::UnknownProfile(name.to_string())),
        }
    }

    /// Parses a configuration from JSON. Missing fields take the default
    /// profile's values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn scale_table(&self) -> ScaleTable {
        ScaleTable::new(self.scale.clone())
    }

    pub fn interval_table(&self) -> IntervalTable {
        IntervalTable::new(self.intervals.clone())
    }

    pub fn timing(&self) -> Timing {
        Timing {
            note_duration: Duration::from_millis(self.note_duration_ms),
            delay: Duration::from_millis(self.delay_ms),
        }
    }

    pub fn polyphony(&self) -> Polyphony {
        if self.polyphonic {
            Polyphony::Poly
        } else {
            Polyphony::Mono
        }
    }

    /// Parses the configured presentation mode.
    pub fn presentation_mode(&self) -> Result<PresentationMode, UnknownMode> {
        self.mode.parse()
    }

    /// Checks the tables and ranges, returning the constraints the problem
    /// generator will use.
    ///
    /// # Errors
    ///
    /// Fails if a scale label is not a pitch one semitone above the one
    /// before it, a range is empty, an interval in range has no name, or no
    /// first note and interval combination fits inside the scale.
    pub fn validate(&self) -> Result<GenerationConstraints, ConfigError> {
        self.validate_scale()?;

        let IndexRange { min, max } = self.first_note_range;
        if min > max {
            return Err(ConfigError::EmptyRange {
                name: "first note",
                min,
                max,
            });
        }

        let IndexRange { min, max } = self.interval_range;
        if min > max {
            return Err(ConfigError::EmptyRange {
                name: "interval",
                min,
                max,
            });
        }
        if min == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        let table = self.interval_table();
        if !table.contains(max) {
            return Err(ConfigError::UnnamedInterval {
                interval: max,
                max: table.max_interval(),
            });
        }

        let scale_len = self.scale.len();
        if self.first_note_range.min + self.interval_range.min >= scale_len {
            return Err(ConfigError::Infeasible { scale_len });
        }

        Ok(GenerationConstraints {
            first_note_range: self.first_note_range.min..=self.first_note_range.max,
            interval_range: self.interval_range.min..=self.interval_range.max,
            compound_bias: self.compound_bias,
            scale_len,
        })
    }

    fn validate_scale(&self) -> Result<(), ConfigError> {
        let mut previous: Option<u8> = None;
        for (index, label) in self.scale.iter().enumerate() {
            let key = name_to_note(label).ok_or_else(|| ConfigError::UnknownPitch {
                index,
                label: label.clone(),
            })?;
            if previous.is_some_and(|p| p.checked_add(1) != Some(key)) {
                return Err(ConfigError::NotChromatic {
                    index,
                    label: label.clone(),
                });
            }
            previous = Some(key);
        }
        Ok(())
    }
}
