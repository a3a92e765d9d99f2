//! Note panel: the two note labels, presentation mode and audio status.

use crate::session::SessionView;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Placeholder shown while the notes are hidden.
const HIDDEN_NOTE: &str = "?";

/// Renders one labelled note column.
fn note_column(title: &'static str, label: &str) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(title, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            label.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
}

/// Renders the note panel.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `view` - Current session display state
pub fn render_notes(frame: &mut Frame, area: Rect, view: &SessionView) {
    let block = Block::default()
        .title(" Notes ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let (first, second) = match &view.notes {
        Some((a, b)) => (a.as_str(), b.as_str()),
        None => (HIDDEN_NOTE, HIDDEN_NOTE),
    };
    frame.render_widget(note_column("First Note", first), columns[0]);
    frame.render_widget(note_column("Second Note", second), columns[1]);

    let (audio, audio_color) = if view.audio_ready {
        ("audio on", Color::Green)
    } else {
        ("audio off (press p)", Color::DarkGray)
    };
    let info = Line::from(vec![
        Span::styled("Mode: ", Style::default().fg(Color::DarkGray)),
        Span::styled(view.mode.clone(), Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(audio, Style::default().fg(audio_color)),
    ]);
    frame.render_widget(Paragraph::new(info).alignment(Alignment::Center), rows[1]);
}
