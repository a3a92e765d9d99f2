//! Help overlay rendering.
//!
//! Displays keyboard shortcuts in a modal overlay.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::centered_rect;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "?",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "q / Esc",
        description: "Quit",
    },
    KeyBinding {
        key: "Ctrl+C",
        description: "Force quit",
    },
];

const EXERCISE_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "p / Space",
        description: "Play the two notes (first press turns audio on)",
    },
    KeyBinding {
        key: "Enter",
        description: "Answer with the highlighted interval",
    },
    KeyBinding {
        key: "n",
        description: "Next interval",
    },
    KeyBinding {
        key: "m",
        description: "Cycle mode: ascending, descending, harmonic",
    },
];

const NAVIGATION_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "h / Left",
        description: "Previous option",
    },
    KeyBinding {
        key: "l / Right",
        description: "Next option",
    },
    KeyBinding {
        key: "k / Up",
        description: "Option above",
    },
    KeyBinding {
        key: "j / Down",
        description: "Option below",
    },
];

const SECTIONS: &[(&str, &[KeyBinding])] = &[
    ("General", GENERAL_BINDINGS),
    ("Exercise", EXERCISE_BINDINGS),
    ("Navigation", NAVIGATION_BINDINGS),
];

/// Builds the scrollable help content.
fn help_lines() -> Vec<Line<'static>> {
    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(Color::White);

    let mut lines = Vec::new();
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(Span::styled(*title, section_style)));
        for binding in *bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:15}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Some profiles only allow moving on after a correct answer.",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// Renders the help overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `scroll` - Vertical scroll offset
pub fn render_help(frame: &mut Frame, scroll: u16) {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Scrollable content
            Constraint::Length(1), // Fixed footer
        ])
        .split(inner);

    let help_text = Paragraph::new(help_lines())
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(help_text, chunks[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Scroll: Up/Down/j/k  |  Close: ?/Esc",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, chunks[1]);
}
