//! Answer checking.

use super::{IntervalSize, Problem};

/// The user's current answer: an interval size, or nothing yet.
pub type Answer = Option<IntervalSize>;

/// Result of comparing an answer against a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The answer names the problem's interval.
    Correct,
    /// The answer names some other interval.
    Incorrect,
    /// No answer has been given.
    Unanswered,
}

/// Outcome of an answered problem. Unlike [`Evaluation`] it has no
/// "unanswered" case, so a session can only hold it after a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Evaluation {
    /// The verdict, if an answer was given.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Evaluation::Correct => Some(Verdict::Correct),
            Evaluation::Incorrect => Some(Verdict::Incorrect),
            Evaluation::Unanswered => None,
        }
    }
}

/// Compares `answer` against the interval of `problem`.
pub fn evaluate(problem: &Problem, answer: Answer) -> Evaluation {
    match answer {
        None => Evaluation::Unanswered,
        Some(choice) if choice == problem.interval => Evaluation::Correct,
        Some(_) => Evaluation::Incorrect,
    }
}
