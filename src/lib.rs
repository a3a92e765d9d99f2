//! intervaltui - A terminal ear-training app for musical intervals.
//!
//! This library provides the exercise engine (problem generation, answer
//! checking, playback sequencing and the session state machine) plus the
//! terminal front end built on top of it.

pub mod app;
pub mod audio;
pub mod config;
pub mod session;
pub mod theory;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{AudioDevice, PresentationMode, SynthDevice};
pub use config::ExerciseConfig;
pub use session::{Event, Session, SessionState, SessionView};
pub use theory::{Problem, ProblemGenerator};
