//! Music theory data for the interval exercise.
//!
//! This module provides the pitch and interval lookup tables the engine
//! draws problems from, plus helpers for converting between pitch labels
//! like "F#4" and MIDI key numbers.

mod answer;
mod problem;

pub use answer::{evaluate, Answer, Evaluation, Verdict};
pub use problem::{GenerationConstraints, Problem, ProblemGenerator, COMPOUND_SHIFT};

/// Index into a [`ScaleTable`]. Always `< scale.len()` for notes the engine emits.
pub type NoteIndex = usize;

/// Interval size in semitones. Zero is never a valid interval.
pub type IntervalSize = usize;

/// Pitch class names within an octave, ascending from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Conventional interval names indexed by semitone count.
/// Index 0 is a placeholder and never shown.
pub const INTERVAL_NAMES: [&str; 15] = [
    "Unison",
    "Minor 2nd",
    "Major 2nd",
    "Minor 3rd",
    "Major 3rd",
    "Perfect 4th",
    "Tritone",
    "Perfect 5th",
    "Minor 6th",
    "Major 6th",
    "Minor 7th",
    "Major 7th",
    "Octave",
    "Minor 9th",
    "Major 9th",
];

/// MIDI key number of middle C (C4).
pub const MIDDLE_C: u8 = 60;

/// Converts a MIDI note number to a note name with octave.
///
/// # Examples
///
/// ```
/// use intervaltui::theory::note_to_name;
///
/// assert_eq!(note_to_name(60), "C4");
/// assert_eq!(note_to_name(73), "C#5");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Converts a note name like "C4" or "F#5" to a MIDI note number.
///
/// Returns None if the name is malformed or falls outside 0-127.
pub fn name_to_note(name: &str) -> Option<u8> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    // Octave digits (or a leading minus sign) follow the pitch class
    let octave_start = name.find(|c: char| c.is_ascii_digit() || c == '-')?;

    let note_part = &name[..octave_start];
    let octave_part = &name[octave_start..];

    let note_index = NOTE_NAMES.iter().position(|&n| n == note_part)?;
    let octave: i16 = octave_part.parse().ok()?;

    let midi_note = (octave + 1) * 12 + note_index as i16;
    u8::try_from(midi_note).ok().filter(|n| *n <= 127)
}

/// Ordered pitch labels, ascending by one semitone per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleTable {
    labels: Vec<String>,
}

impl ScaleTable {
    /// Wraps an ordered list of pitch labels.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Builds a chromatic run of `len` labels starting at MIDI key `start`.
    /// Stops early if the run would pass key 127.
    pub fn chromatic(start: u8, len: usize) -> Self {
        let labels = (start as usize..start as usize + len)
            .take_while(|key| *key <= 127)
            .map(|key| note_to_name(key as u8))
            .collect();
        Self { labels }
    }

    /// Number of labels in the table.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a note index, if it is inside the table.
    pub fn label(&self, index: NoteIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// All labels in ascending order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Interval names indexed by semitone count. Index 0 is a sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    names: Vec<String>,
}

impl IntervalTable {
    /// Wraps an ordered list of interval names, sentinel first.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The first `max_interval` conventional names (plus the sentinel).
    pub fn standard(max_interval: IntervalSize) -> Self {
        let names = INTERVAL_NAMES
            .iter()
            .take(max_interval + 1)
            .map(|n| n.to_string())
            .collect();
        Self { names }
    }

    /// Largest interval that has a name.
    pub fn max_interval(&self) -> IntervalSize {
        self.names.len().saturating_sub(1)
    }

    /// Name for an interval size. The sentinel at index 0 has no name.
    pub fn name(&self, interval: IntervalSize) -> Option<&str> {
        if interval == 0 {
            return None;
        }
        self.names.get(interval).map(String::as_str)
    }

    /// All names, sentinel first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns true if `interval` is a nameable (non-sentinel) entry.
    pub fn contains(&self, interval: IntervalSize) -> bool {
        self.name(interval).is_some()
    }
}
