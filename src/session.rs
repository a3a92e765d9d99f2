//! The exercise session.
//!
//! [`SessionState`] is the pure state machine: current problem, current
//! answer and progression gating. [`Session`] wraps it together with the
//! audio device, the playback sequencer and the random source, and handles
//! UI events one at a time.

use crate::audio::{
    AudioDevice, PlayOutcome, PlaybackError, PlaybackSequencer, PresentationMode, UnknownMode,
};
use crate::config::{ConfigError, ExerciseConfig};
use crate::theory::{
    evaluate, Answer, Evaluation, IntervalSize, IntervalTable, Problem, ProblemGenerator,
    ScaleTable, Verdict,
};
use rand::Rng;

/// Where the session is in the answer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No problem has been generated yet.
    Idle,
    /// A problem is waiting for its first answer.
    AwaitingAnswer,
    /// The current answer has been checked.
    Answered(Verdict),
}

/// Events the UI sends into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Replace the current problem unconditionally.
    NewProblem,
    /// Play the current problem in the current mode.
    PlayRequested,
    /// The user picked an interval. `None` comes from a malformed event.
    SelectAnswer(Option<IntervalSize>),
    /// Move on to the next problem, if allowed.
    RequestNext,
    /// Change the presentation mode by name.
    ModeChanged(String),
}

/// Why an event left the session unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// There is no current problem to answer.
    NoProblem,
    /// The problem was already answered correctly.
    AnswerLocked,
    /// The selection is missing or has no interval name.
    InvalidAnswer,
    /// Strict progression requires a correct answer first.
    Gated,
    /// The current presentation mode name is not recognized.
    UnknownMode,
}

/// What a handled event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// A fresh problem replaced the old one.
    NewProblem { problem: Problem, auto_played: bool },
    /// The selected answer was checked.
    Evaluated(Verdict),
    /// Playback was requested from the device.
    Played(PlayOutcome),
    /// Future playback will use this mode.
    ModeChanged(PresentationMode),
    /// Nothing changed.
    Ignored(Ignored),
}

/// Display state of one answer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// Not the current selection.
    Unselected,
    /// Selected, and it was right.
    Correct,
    /// Selected, and it was wrong.
    Incorrect,
}

/// One answer button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub interval: IntervalSize,
    pub label: String,
    pub state: OptionState,
}

/// Feedback line shown after an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub verdict: Verdict,
    pub message: String,
}

/// Everything the UI needs to draw the exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Labels of the two notes, lower first, when they may be shown.
    pub notes: Option<(String, String)>,
    pub options: Vec<AnswerOption>,
    pub feedback: Option<Feedback>,
    pub next_enabled: bool,
    /// Current presentation mode name, as configured.
    pub mode: String,
    pub audio_ready: bool,
}

/// The exercise state machine.
#[derive(Debug, Clone)]
pub struct SessionState {
    generator: ProblemGenerator,
    scale: ScaleTable,
    intervals: IntervalTable,
    strict_progression: bool,
    problem: Option<Problem>,
    answer: Answer,
    phase: Phase,
    mode_name: String,
    mode: Result<PresentationMode, UnknownMode>,
}

impl SessionState {
    /// Builds an idle state machine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the tables or ranges are unusable. An
    /// unrecognized mode name is not an error here; it is reported when
    /// playback is attempted.
    pub fn new(config: &ExerciseConfig) -> Result<Self, ConfigError> {
        let constraints = config.validate()?;
        let mode = config.presentation_mode();
        if let Err(e) = &mode {
            tracing::error!("configuration error: {}", e);
        }
        Ok(Self {
            generator: ProblemGenerator::new(constraints),
            scale: config.scale_table(),
            intervals: config.interval_table(),
            strict_progression: config.strict_progression,
            problem: None,
            answer: None,
            phase: Phase::Idle,
            mode_name: config.mode.clone(),
            mode,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }

    pub fn scale(&self) -> &ScaleTable {
        &self.scale
    }

    /// The presentation mode, or the unrecognized name that was configured.
    pub fn mode(&self) -> Result<PresentationMode, &UnknownMode> {
        self.mode.as_ref().copied()
    }

    /// Correctness of the current answer against the current problem.
    pub fn correctness(&self) -> Evaluation {
        match &self.problem {
            Some(problem) => evaluate(problem, self.answer),
            None => Evaluation::Unanswered,
        }
    }

    /// Whether `RequestNext` would produce a new problem right now.
    pub fn next_enabled(&self) -> bool {
        !self.strict_progression || self.phase == Phase::Answered(Verdict::Correct)
    }

    /// Replaces the current problem and clears the answer.
    pub fn new_problem<R: Rng>(&mut self, rng: &mut R) -> Problem {
        let problem = self.generator.generate(rng);
        self.problem = Some(problem);
        self.answer = None;
        self.phase = Phase::AwaitingAnswer;
        tracing::debug!(
            first = problem.first_note,
            interval = problem.interval,
            "new problem"
        );
        problem
    }

    /// Records and checks an answer.
    pub fn select_answer(&mut self, choice: Option<IntervalSize>) -> Result<Verdict, Ignored> {
        let Some(problem) = self.problem else {
            return Err(Ignored::NoProblem);
        };
        let choice = match choice {
            Some(c) if self.intervals.contains(c) => c,
            _ => {
                tracing::warn!(?choice, "ignoring invalid answer selection");
                return Err(Ignored::InvalidAnswer);
            }
        };
        if self.phase == Phase::Answered(Verdict::Correct) {
            return Err(Ignored::AnswerLocked);
        }

        self.answer = Some(choice);
        // An answer was just recorded, so the evaluation always has a verdict
        let verdict = evaluate(&problem, self.answer)
            .verdict()
            .unwrap_or(Verdict::Incorrect);
        self.phase = Phase::Answered(verdict);
        Ok(verdict)
    }

    /// Advances to a new problem if progression allows it.
    pub fn request_next<R: Rng>(&mut self, rng: &mut R) -> Result<Problem, Ignored> {
        if !self.next_enabled() {
            return Err(Ignored::Gated);
        }
        Ok(self.new_problem(rng))
    }

    /// Changes the presentation mode for future playback.
    pub fn set_mode(&mut self, name: &str) -> Result<PresentationMode, UnknownMode> {
        self.mode_name = name.to_string();
        self.mode = name.parse();
        if let Err(e) = &self.mode {
            tracing::error!("configuration error: {}", e);
        }
        self.mode.clone()
    }

    /// Builds the display state for the UI.
    pub fn view(&self, audio_ready: bool) -> SessionView {
        let reveal = !self.strict_progression || self.phase == Phase::Answered(Verdict::Correct);
        let labels = self.problem.and_then(|p| {
            let first = self.scale.label(p.first_note)?;
            let second = self.scale.label(p.second_note())?;
            Some((first.to_string(), second.to_string()))
        });

        let range = self.generator.constraints().interval_range.clone();
        let options = range
            .filter_map(|interval| {
                let label = self.intervals.name(interval)?;
                let state = match (self.answer, self.phase) {
                    (Some(a), Phase::Answered(Verdict::Correct)) if a == interval => {
                        OptionState::Correct
                    }
                    (Some(a), Phase::Answered(Verdict::Incorrect)) if a == interval => {
                        OptionState::Incorrect
                    }
                    _ => OptionState::Unselected,
                };
                Some(AnswerOption {
                    interval,
                    label: label.to_string(),
                    state,
                })
            })
            .collect();

        let feedback = match self.phase {
            Phase::Answered(Verdict::Correct) => Some(Feedback {
                verdict: Verdict::Correct,
                message: match &labels {
                    Some((a, b)) => format!("Correct! ({}, {})", a, b),
                    None => "Correct!".to_string(),
                },
            }),
            Phase::Answered(Verdict::Incorrect) => Some(Feedback {
                verdict: Verdict::Incorrect,
                message: if self.strict_progression {
                    "That's not right. Try again.".to_string()
                } else {
                    "That's not right. Try again or move on.".to_string()
                },
            }),
            Phase::Idle | Phase::AwaitingAnswer => None,
        };

        SessionView {
            notes: if reveal { labels } else { None },
            options,
            feedback,
            next_enabled: self.next_enabled(),
            mode: self.mode_name.clone(),
            audio_ready,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_problem(&mut self, problem: Problem) {
        self.problem = Some(problem);
        self.answer = None;
        self.phase = Phase::AwaitingAnswer;
    }
}

/// A running exercise: state machine, audio device and random source.
///
/// The device is owned for the lifetime of the session and released when
/// the session is dropped.
pub struct Session<D: AudioDevice, R: Rng> {
    state: SessionState,
    sequencer: PlaybackSequencer,
    device: D,
    rng: R,
    auto_play: bool,
}

impl<D: AudioDevice, R: Rng> Session<D, R> {
    /// Starts a session and generates its first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate.
    pub fn start(config: &ExerciseConfig, device: D, rng: R) -> Result<Self, ConfigError> {
        let mut session = Self {
            state: SessionState::new(config)?,
            sequencer: PlaybackSequencer::new(config.timing()),
            device,
            rng,
            auto_play: config.auto_play,
        };
        session.state.new_problem(&mut session.rng);
        tracing::info!(
            strict = config.strict_progression,
            mode = %config.mode,
            "session started"
        );
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Whether the audio device has been unlocked.
    pub fn audio_ready(&self) -> bool {
        self.sequencer.is_ready()
    }

    /// Display state for the UI.
    pub fn view(&self) -> SessionView {
        self.state.view(self.sequencer.is_ready())
    }

    /// Handles one UI event to completion.
    ///
    /// # Errors
    ///
    /// Only playback can fail. The error is recoverable: the session state is
    /// unchanged and the same request can be retried.
    pub fn dispatch(&mut self, event: Event) -> Result<Response, PlaybackError> {
        let response = match event {
            Event::NewProblem => {
                let problem = self.state.new_problem(&mut self.rng);
                Response::NewProblem {
                    problem,
                    auto_played: false,
                }
            }
            Event::PlayRequested => self.play()?,
            Event::SelectAnswer(choice) => match self.state.select_answer(choice) {
                Ok(verdict) => Response::Evaluated(verdict),
                Err(reason) => Response::Ignored(reason),
            },
            Event::RequestNext => match self.state.request_next(&mut self.rng) {
                Ok(problem) => Response::NewProblem {
                    problem,
                    auto_played: self.auto_play_new(),
                },
                Err(reason) => Response::Ignored(reason),
            },
            Event::ModeChanged(name) => match self.state.set_mode(&name) {
                Ok(mode) => Response::ModeChanged(mode),
                Err(_) => Response::Ignored(Ignored::UnknownMode),
            },
        };
        tracing::trace!(?response, "event handled");
        Ok(response)
    }

    fn play(&mut self) -> Result<Response, PlaybackError> {
        let Some(problem) = self.state.problem else {
            return Ok(Response::Ignored(Ignored::NoProblem));
        };
        let mode = match self.state.mode() {
            Ok(mode) => mode,
            Err(e) => {
                tracing::error!("configuration error: {}, playback skipped", e);
                return Ok(Response::Ignored(Ignored::UnknownMode));
            }
        };
        let outcome = self
            .sequencer
            .play(&problem, mode, &self.state.scale, &mut self.device)?;
        Ok(Response::Played(outcome))
    }

    /// Plays a freshly granted problem when auto-play is on and the device
    /// was already unlocked by an earlier user action.
    fn auto_play_new(&mut self) -> bool {
        if !self.auto_play || !self.sequencer.is_ready() {
            return false;
        }
        match self.play() {
            Ok(Response::Played(PlayOutcome::Scheduled)) => true,
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("auto-play failed: {}", e);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_problem(&mut self, problem: Problem) {
        self.state.set_problem(problem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::testing::RecordingDevice;
    use crate::audio::{Polyphony, Readiness};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(config: ExerciseConfig) -> Session<RecordingDevice, StdRng> {
        let device = RecordingDevice::new(config.polyphony());
        Session::start(&config, device, StdRng::seed_from_u64(5)).unwrap()
    }

    /// A strict session showing C4 to G4.
    fn fifth_session() -> Session<RecordingDevice, StdRng> {
        let mut s = session(ExerciseConfig::locked());
        s.set_problem(Problem::new(0, 7));
        s
    }

    #[test]
    fn test_state_starts_idle() {
        let mut state = SessionState::new(&ExerciseConfig::locked()).unwrap();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.select_answer(Some(3)), Err(Ignored::NoProblem));

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(state.request_next(&mut rng), Err(Ignored::Gated));
        state.new_problem(&mut rng);
        assert_eq!(state.phase(), Phase::AwaitingAnswer);
        assert_eq!(state.correctness(), Evaluation::Unanswered);
    }

    #[test]
    fn test_start_generates_problem() {
        let s = session(ExerciseConfig::locked());
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        let problem = s.state().problem().copied().unwrap();
        assert!(problem.second_note() < s.state().scale().len());
        assert_eq!(s.state().answer(), None);
    }

    #[test]
    fn test_gate_blocks_until_correct() {
        let mut s = fifth_session();

        assert_eq!(s.dispatch(Event::RequestNext).unwrap(), Response::Ignored(Ignored::Gated));

        assert_eq!(
            s.dispatch(Event::SelectAnswer(Some(3))).unwrap(),
            Response::Evaluated(Verdict::Incorrect)
        );
        assert_eq!(s.state().correctness(), Evaluation::Incorrect);
        assert_eq!(s.dispatch(Event::RequestNext).unwrap(), Response::Ignored(Ignored::Gated));
        assert_eq!(s.state().problem(), Some(&Problem::new(0, 7)));

        assert_eq!(
            s.dispatch(Event::SelectAnswer(Some(7))).unwrap(),
            Response::Evaluated(Verdict::Correct)
        );
        assert_eq!(s.state().problem(), Some(&Problem::new(0, 7)));
        assert_eq!(s.state().phase(), Phase::Answered(Verdict::Correct));

        let response = s.dispatch(Event::RequestNext).unwrap();
        assert!(matches!(response, Response::NewProblem { .. }));
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        assert_eq!(s.state().answer(), None);
    }

    #[test]
    fn test_new_problem_bypasses_gate_and_clears_answer() {
        let mut s = fifth_session();
        s.dispatch(Event::SelectAnswer(Some(7))).unwrap();
        assert_eq!(s.state().phase(), Phase::Answered(Verdict::Correct));

        let response = s.dispatch(Event::NewProblem).unwrap();
        assert!(matches!(
            response,
            Response::NewProblem {
                auto_played: false,
                ..
            }
        ));
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        assert_eq!(s.state().answer(), None);

        // Under strict progression a wrong answer does not block it either
        s.set_problem(Problem::new(0, 7));
        s.dispatch(Event::SelectAnswer(Some(3))).unwrap();
        assert_eq!(s.dispatch(Event::RequestNext).unwrap(), Response::Ignored(Ignored::Gated));
        assert!(matches!(
            s.dispatch(Event::NewProblem).unwrap(),
            Response::NewProblem { .. }
        ));
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        assert_eq!(s.state().answer(), None);
        assert_eq!(s.state().correctness(), Evaluation::Unanswered);
    }

    #[test]
    fn test_correct_answer_is_locked() {
        let mut s = fifth_session();
        s.dispatch(Event::SelectAnswer(Some(7))).unwrap();

        assert_eq!(
            s.dispatch(Event::SelectAnswer(Some(2))).unwrap(),
            Response::Ignored(Ignored::AnswerLocked)
        );
        assert_eq!(s.state().answer(), Some(7));
        assert_eq!(s.state().correctness(), Evaluation::Correct);
    }

    #[test]
    fn test_invalid_selection_ignored() {
        let mut s = fifth_session();
        for choice in [None, Some(0), Some(15), Some(99)] {
            assert_eq!(
                s.dispatch(Event::SelectAnswer(choice)).unwrap(),
                Response::Ignored(Ignored::InvalidAnswer)
            );
        }
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        assert_eq!(s.state().answer(), None);
    }

    #[test]
    fn test_relaxed_progression_always_advances() {
        let mut s = session(ExerciseConfig::classic());
        s.set_problem(Problem::new(0, 7));
        assert!(matches!(
            s.dispatch(Event::RequestNext).unwrap(),
            Response::NewProblem { .. }
        ));

        s.dispatch(Event::SelectAnswer(Some(1))).unwrap();
        assert!(s.view().next_enabled);
        assert!(matches!(
            s.dispatch(Event::RequestNext).unwrap(),
            Response::NewProblem { .. }
        ));
    }

    #[test]
    fn test_play_does_not_touch_answer_state() {
        let mut s = fifth_session();
        s.dispatch(Event::SelectAnswer(Some(4))).unwrap();

        assert_eq!(
            s.dispatch(Event::PlayRequested).unwrap(),
            Response::Played(PlayOutcome::Scheduled)
        );
        assert_eq!(s.state().phase(), Phase::Answered(Verdict::Incorrect));
        assert_eq!(s.state().answer(), Some(4));
        assert_eq!(s.device().triggers.len(), 2);
        assert_eq!(s.device().triggers[0].pitch, "C4");
        assert_eq!(s.device().triggers[1].pitch, "G4");
        assert!(s.audio_ready());
    }

    #[test]
    fn test_mode_change_keeps_problem() {
        let mut s = fifth_session();
        s.dispatch(Event::SelectAnswer(Some(2))).unwrap();

        assert_eq!(
            s.dispatch(Event::ModeChanged("descending".into())).unwrap(),
            Response::ModeChanged(PresentationMode::Descending)
        );
        assert_eq!(s.state().problem(), Some(&Problem::new(0, 7)));
        assert_eq!(s.state().answer(), Some(2));

        s.dispatch(Event::PlayRequested).unwrap();
        assert_eq!(s.device().triggers[0].pitch, "G4");
        assert_eq!(s.device().triggers[1].pitch, "C4");
    }

    #[test]
    fn test_unknown_mode_skips_playback() {
        let mut s = fifth_session();
        assert_eq!(
            s.dispatch(Event::ModeChanged("sideways".into())).unwrap(),
            Response::Ignored(Ignored::UnknownMode)
        );
        assert_eq!(
            s.dispatch(Event::PlayRequested).unwrap(),
            Response::Ignored(Ignored::UnknownMode)
        );
        assert_eq!(s.device().handshakes, 0);
        assert!(s.device().triggers.is_empty());
        assert_eq!(s.state().phase(), Phase::AwaitingAnswer);
        assert_eq!(s.view().mode, "sideways");
    }

    #[test]
    fn test_device_failure_is_recoverable() {
        let config = ExerciseConfig::locked();
        let device = RecordingDevice::scripted(Polyphony::Poly, vec![Err("busy".into())]);
        let mut s = Session::start(&config, device, StdRng::seed_from_u64(9)).unwrap();
        s.set_problem(Problem::new(0, 7));
        s.dispatch(Event::SelectAnswer(Some(3))).unwrap();

        assert!(s.dispatch(Event::PlayRequested).is_err());
        assert_eq!(s.state().phase(), Phase::Answered(Verdict::Incorrect));
        assert!(!s.audio_ready());

        assert_eq!(
            s.dispatch(Event::PlayRequested).unwrap(),
            Response::Played(PlayOutcome::Scheduled)
        );
        assert_eq!(s.device().handshakes, 2);
    }

    #[test]
    fn test_pending_handshake_schedules_nothing() {
        let config = ExerciseConfig::locked();
        let device = RecordingDevice::scripted(Polyphony::Poly, vec![Ok(Readiness::Pending)]);
        let mut s = Session::start(&config, device, StdRng::seed_from_u64(9)).unwrap();

        assert_eq!(
            s.dispatch(Event::PlayRequested).unwrap(),
            Response::Played(PlayOutcome::AwaitingDevice)
        );
        assert!(s.device().triggers.is_empty());
    }

    #[test]
    fn test_auto_play_after_unlock() {
        let mut s = fifth_session();

        // Not unlocked yet: progression does not play anything
        s.dispatch(Event::SelectAnswer(Some(7))).unwrap();
        assert_eq!(
            s.dispatch(Event::RequestNext).unwrap(),
            Response::NewProblem {
                problem: *s.state().problem().unwrap(),
                auto_played: false
            }
        );
        assert!(s.device().triggers.is_empty());

        s.dispatch(Event::PlayRequested).unwrap();
        let answer = s.state().problem().unwrap().interval;
        s.dispatch(Event::SelectAnswer(Some(answer))).unwrap();
        let response = s.dispatch(Event::RequestNext).unwrap();
        assert!(matches!(
            response,
            Response::NewProblem {
                auto_played: true,
                ..
            }
        ));
        assert_eq!(s.device().triggers.len(), 4);
    }

    #[test]
    fn test_view_reveals_notes_after_correct() {
        let mut s = fifth_session();
        let view = s.view();
        assert_eq!(view.notes, None);
        assert_eq!(view.options.len(), 14);
        assert!(view.options.iter().all(|o| o.state == OptionState::Unselected));
        assert!(!view.next_enabled);
        assert_eq!(view.feedback, None);

        s.dispatch(Event::SelectAnswer(Some(3))).unwrap();
        let view = s.view();
        assert_eq!(view.options[2].label, "Minor 3rd");
        assert_eq!(view.options[2].state, OptionState::Incorrect);
        let feedback = view.feedback.unwrap();
        assert_eq!(feedback.verdict, Verdict::Incorrect);
        assert_eq!(feedback.message, "That's not right. Try again.");

        s.dispatch(Event::SelectAnswer(Some(7))).unwrap();
        let view = s.view();
        assert_eq!(view.notes, Some(("C4".to_string(), "G4".to_string())));
        assert_eq!(view.options[6].state, OptionState::Correct);
        assert_eq!(view.options[2].state, OptionState::Unselected);
        assert_eq!(view.feedback.unwrap().message, "Correct! (C4, G4)");
        assert!(view.next_enabled);
    }

    #[test]
    fn test_relaxed_view_always_shows_notes() {
        let mut s = session(ExerciseConfig::classic());
        s.set_problem(Problem::new(2, 5));
        let view = s.view();
        assert_eq!(view.notes, Some(("D4".to_string(), "G4".to_string())));
        assert_eq!(view.options.len(), 12);
        assert!(view.next_enabled);
    }
}
