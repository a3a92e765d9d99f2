//! Interval problem representation and random generation.

use super::{IntervalSize, NoteIndex};
use rand::Rng;
use std::ops::RangeInclusive;

/// Semitones added by the compound-interval bias.
pub const COMPOUND_SHIFT: IntervalSize = 7;

/// A pair of notes the user must identify the interval between.
///
/// The second note is always derived from the first, so the two can never
/// disagree with `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    /// Lower note of the pair.
    pub first_note: NoteIndex,
    /// Distance to the upper note in semitones.
    pub interval: IntervalSize,
}

impl Problem {
    /// Creates a problem from its two defining values.
    pub fn new(first_note: NoteIndex, interval: IntervalSize) -> Self {
        Self {
            first_note,
            interval,
        }
    }

    /// Upper note of the pair.
    pub fn second_note(&self) -> NoteIndex {
        self.first_note + self.interval
    }
}

/// Validated ranges a [`ProblemGenerator`] draws from.
///
/// Construct via [`crate::config::ExerciseConfig::validate`], which checks
/// that at least one in-bounds pair exists, so generation always terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConstraints {
    /// Candidate first notes.
    pub first_note_range: RangeInclusive<NoteIndex>,
    /// Candidate interval sizes.
    pub interval_range: RangeInclusive<IntervalSize>,
    /// Shift intervals of a fifth or less up by [`COMPOUND_SHIFT`] half the time.
    pub compound_bias: bool,
    /// Length of the scale table second notes must fit in.
    pub scale_len: usize,
}

impl GenerationConstraints {
    /// Returns true if `problem` is something the generator may emit.
    pub fn admits(&self, problem: &Problem) -> bool {
        self.first_note_range.contains(&problem.first_note)
            && self.interval_range.contains(&problem.interval)
            && problem.second_note() < self.scale_len
    }
}

/// Draws random problems within a set of constraints.
#[derive(Debug, Clone)]
pub struct ProblemGenerator {
    constraints: GenerationConstraints,
}

impl ProblemGenerator {
    /// Creates a generator for the given constraints.
    pub fn new(constraints: GenerationConstraints) -> Self {
        Self { constraints }
    }

    /// The constraints this generator draws from.
    pub fn constraints(&self) -> &GenerationConstraints {
        &self.constraints
    }

    /// Generates a problem using entropy from `rng`.
    ///
    /// Draws that would put the second note past the end of the scale, or
    /// that the compound bias pushes outside the interval range, are thrown
    /// away and redrawn.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Problem {
        let c = &self.constraints;
        let mut rejected = 0usize;

        loop {
            let first_note = rng.random_range(c.first_note_range.clone());
            let mut interval = rng.random_range(c.interval_range.clone());

            if c.compound_bias && interval <= COMPOUND_SHIFT && rng.random_bool(0.5) {
                interval += COMPOUND_SHIFT;
            }

            let problem = Problem::new(first_note, interval);
            if c.admits(&problem) {
                if rejected > 0 {
                    tracing::trace!(rejected, "resampled out-of-range draws");
                }
                return problem;
            }
            rejected += 1;
        }
    }
}
