//! Application state and event handling.
//!
//! This module defines the terminal application state that sits between
//! the key events coming from the terminal and the exercise session.

use crate::audio::{AudioDevice, PlayOutcome, PresentationMode, SynthDevice};
use crate::config::ExerciseConfig;
use crate::session::{Event, Ignored, Response, Session, SessionView};
use crate::theory::Verdict;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

/// How long status messages stay on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of columns in the answer grid.
pub const ANSWER_COLUMNS: usize = 2;

/// Main application state.
pub struct App<D: AudioDevice = SynthDevice> {
    /// The running exercise.
    session: Session<D, StdRng>,
    /// Index of the highlighted answer option.
    pub cursor: usize,
    /// Status message to display, with the time it was set.
    pub status_message: Option<(String, Instant)>,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    /// Help overlay scroll offset.
    pub help_scroll: u16,
    /// Set once the user asks to quit.
    pub should_quit: bool,
}

impl<D: AudioDevice> App<D> {
    /// Creates the application and starts a session on `device`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration does not validate.
    pub fn new(config: &ExerciseConfig, device: D, rng: StdRng) -> Result<Self> {
        let session = Session::start(config, device, rng).context("Invalid exercise configuration")?;
        Ok(Self {
            session,
            cursor: 0,
            status_message: None,
            show_help: false,
            help_scroll: 0,
            should_quit: false,
        })
    }

    /// Returns a reference to the session.
    pub fn session(&self) -> &Session<D, StdRng> {
        &self.session
    }

    /// Display state of the session.
    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, set_at)) = &self.status_message {
            if set_at.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Handles a key press. Returns true if the key was used.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.should_quit = true;
            return true;
        }

        if self.show_help {
            match code {
                KeyCode::Char('?') | KeyCode::Esc => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.help_scroll = self.help_scroll.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.help_scroll = self.help_scroll.saturating_add(1);
                }
                _ => return false,
            }
            return true;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('p') | KeyCode::Char(' ') => self.play(),
            KeyCode::Enter => self.select_at_cursor(),
            KeyCode::Char('n') => self.next_problem(),
            KeyCode::Char('m') => self.cycle_mode(),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-(ANSWER_COLUMNS as isize)),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(ANSWER_COLUMNS as isize),
            _ => return false,
        }
        true
    }

    /// Moves the answer cursor by `delta` options, staying on the grid.
    pub fn move_cursor(&mut self, delta: isize) {
        let count = self.view().options.len();
        if count == 0 {
            return;
        }
        let target = self.cursor as isize + delta;
        if (0..count as isize).contains(&target) {
            self.cursor = target as usize;
        }
    }

    /// Plays the current interval.
    pub fn play(&mut self) {
        match self.session.dispatch(Event::PlayRequested) {
            Ok(Response::Played(PlayOutcome::Scheduled)) => self.set_status("Playing"),
            Ok(Response::Played(PlayOutcome::AwaitingDevice)) => {
                self.set_status("Audio is starting up, press play again")
            }
            Ok(Response::Ignored(Ignored::UnknownMode)) => {
                self.set_status("Unknown presentation mode, press m to pick one")
            }
            Ok(_) => {}
            Err(e) => self.set_status(format!("Audio error: {}", e)),
        }
    }

    /// Answers with the option under the cursor.
    pub fn select_at_cursor(&mut self) {
        let choice = self.view().options.get(self.cursor).map(|o| o.interval);
        match self.session.dispatch(Event::SelectAnswer(choice)) {
            Ok(Response::Evaluated(Verdict::Correct)) => self.set_status("Correct"),
            Ok(Response::Evaluated(Verdict::Incorrect)) => self.set_status("Incorrect"),
            Ok(Response::Ignored(Ignored::AnswerLocked)) => {
                self.set_status("Already answered, press n for the next interval")
            }
            _ => {}
        }
    }

    /// Asks for the next problem.
    pub fn next_problem(&mut self) {
        match self.session.dispatch(Event::RequestNext) {
            Ok(Response::NewProblem { auto_played, .. }) => {
                self.cursor = 0;
                self.set_status(if auto_played { "New interval, playing" } else { "New interval" });
            }
            Ok(Response::Ignored(Ignored::Gated)) => {
                self.set_status("Name the interval correctly to continue")
            }
            _ => {}
        }
    }

    /// Switches to the next presentation mode the device can play.
    pub fn cycle_mode(&mut self) {
        let polyphony = self.session.device().polyphony();
        let next = match self.session.state().mode() {
            Ok(mode) => mode.next_supported(polyphony),
            Err(_) => PresentationMode::default(),
        };
        if let Ok(Response::ModeChanged(mode)) =
            self.session.dispatch(Event::ModeChanged(next.name().to_string()))
        {
            self.set_status(format!("Mode: {}", mode));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::testing::RecordingDevice;
    use crate::audio::Polyphony;
    use crate::session::{OptionState, Phase};
    use crate::theory::Problem;
    use rand::SeedableRng;

    fn app(config: ExerciseConfig) -> App<RecordingDevice> {
        let device = RecordingDevice::new(config.polyphony());
        App::new(&config, device, StdRng::seed_from_u64(17)).unwrap()
    }

    fn press(app: &mut App<RecordingDevice>, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cursor_stays_on_grid() {
        let mut app = app(ExerciseConfig::locked());
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor, 0);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor, 3);

        for _ in 0..20 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.cursor, 13);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.cursor, 13);
    }

    #[test]
    fn test_select_and_advance_with_keys() {
        let mut app = app(ExerciseConfig::locked());
        app.session.set_problem(Problem::new(0, 7));

        // Cursor on "Minor 2nd": wrong
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view().options[0].state, OptionState::Incorrect);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session().state().problem(), Some(&Problem::new(0, 7)));

        // Move to "Perfect 5th" (index 6) and answer
        for _ in 0..3 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.cursor, 6);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.session().state().phase(),
            Phase::Answered(Verdict::Correct)
        );

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.cursor, 0);
        assert_eq!(app.session().state().phase(), Phase::AwaitingAnswer);
    }

    #[test]
    fn test_play_key_unlocks_device() {
        let mut app = app(ExerciseConfig::locked());
        assert!(press(&mut app, KeyCode::Char('p')));
        assert!(app.session().audio_ready());
        assert_eq!(app.session().device().triggers.len(), 2);
        assert_eq!(app.status_message.as_ref().map(|(m, _)| m.as_str()), Some("Playing"));
    }

    #[test]
    fn test_mode_cycle_skips_harmonic_on_mono() {
        let mut app = app(ExerciseConfig::classic());
        assert_eq!(app.session().device().polyphony(), Polyphony::Mono);

        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.session().state().mode(), Ok(PresentationMode::Descending));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.session().state().mode(), Ok(PresentationMode::Ascending));
    }

    #[test]
    fn test_help_overlay_captures_keys() {
        let mut app = app(ExerciseConfig::locked());
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.help_scroll, 1);

        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app(ExerciseConfig::locked());
        app.show_help = true;
        app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
