//! intervaltui - A terminal ear-training app for musical intervals.
//!
//! Plays two notes through a SoundFont synthesizer and asks which interval
//! separates them.
//!
//! # Features
//!
//! - Ascending, descending and harmonic presentation
//! - Built-in "classic" and "locked" profiles, or a JSON config file
//! - Optional strict progression: answer correctly before moving on
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --soundfont piano.sf2
//! cargo run -- --profile classic --mode descending piano.sf2
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

mod app;
mod audio;
mod config;
mod session;
mod theory;
mod ui;

use app::App;
use audio::SynthDevice;
use config::ExerciseConfig;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no SoundFont is given on the command line.
const SOUNDFONT_ENV: &str = "INTERVALTUI_SOUNDFONT";

/// Command-line options for the application.
#[derive(Debug, Default)]
struct CliOptions {
    /// Built-in profile name.
    profile: Option<String>,
    /// JSON configuration file, overrides the profile.
    config: Option<PathBuf>,
    /// Path to the SoundFont file.
    soundfont: Option<PathBuf>,
    /// Presentation mode override.
    mode: Option<String>,
    /// Seed for a reproducible sequence of problems.
    seed: Option<u64>,
}

fn print_help(program: &str) {
    eprintln!("intervaltui - Terminal interval ear training");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [SOUNDFONT.sf2]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --profile NAME     Built-in profile: locked (default) or classic");
    eprintln!("  -c, --config PATH      Load exercise settings from a JSON file");
    eprintln!("  -sf, --soundfont PATH  SoundFont file (.sf2) used for playback");
    eprintln!("  -m, --mode NAME        Presentation mode: ascending, descending, harmonic");
    eprintln!("  -s, --seed N           Seed the problem generator");
    eprintln!("  -h, --help             Print this help message");
    eprintln!();
    eprintln!(
        "If no soundfont is given, the {} environment variable is used.",
        SOUNDFONT_ENV
    );
}

impl CliOptions {
    /// Parses command-line arguments.
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let program = args.first().map(String::as_str).unwrap_or("intervaltui");
        let mut options = Self::default();
        let mut i = 1;

        while i < args.len() {
            let flag = args[i].as_str();
            let mut value = || -> Result<String> {
                i += 1;
                match args.get(i) {
                    Some(v) => Ok(v.clone()),
                    None => bail!("{} requires an argument", flag),
                }
            };
            match flag {
                "--profile" | "-p" => options.profile = Some(value()?),
                "--config" | "-c" => options.config = Some(PathBuf::from(value()?)),
                "--soundfont" | "-sf" => options.soundfont = Some(PathBuf::from(value()?)),
                "--mode" | "-m" => options.mode = Some(value()?),
                "--seed" | "-s" => {
                    let raw = value()?;
                    let seed = raw
                        .parse()
                        .with_context(|| format!("Invalid seed: {}", raw))?;
                    options.seed = Some(seed);
                }
                "--help" | "-h" => {
                    print_help(program);
                    std::process::exit(0);
                }
                other => {
                    // A bare .sf2 path is taken as the SoundFont
                    if other.to_ascii_lowercase().ends_with(".sf2") {
                        options.soundfont = Some(PathBuf::from(other));
                    } else {
                        bail!("Unknown option: {} (use --help for usage)", other);
                    }
                }
            }
            i += 1;
        }

        Ok(options)
    }

    /// Resolves the exercise configuration from the profile, config file and
    /// mode override, in that order.
    fn exercise_config(&self) -> Result<ExerciseConfig> {
        let mut config = match &self.config {
            Some(path) => ExerciseConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => match &self.profile {
                Some(name) => ExerciseConfig::profile(name)?,
                None => ExerciseConfig::default(),
            },
        };
        if let Some(mode) = &self.mode {
            config.mode = mode.clone();
        }
        Ok(config)
    }

    fn soundfont_path(&self) -> Result<PathBuf> {
        let path = self
            .soundfont
            .clone()
            .or_else(|| std::env::var_os(SOUNDFONT_ENV).map(PathBuf::from))
            .with_context(|| {
                format!(
                    "No SoundFont given: pass --soundfont PATH or set {}",
                    SOUNDFONT_ENV
                )
            })?;
        if !path.exists() {
            bail!("SoundFont not found: {}", path.display());
        }
        Ok(path)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    // Initialize logging (silent unless RUST_LOG is set)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = cli.exercise_config()?;
    let soundfont_path = cli.soundfont_path()?;
    let device = SynthDevice::new(&soundfont_path, config.polyphony())
        .context("Failed to initialize audio")?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut app = App::new(&config, device, rng).context("Failed to initialize application")?;

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    // The session (and with it the audio output) ends here
    drop(app);
    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop. Events are handled one at a time, each to
/// completion, before the next is read.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
