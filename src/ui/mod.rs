//! Terminal user interface components.
//!
//! This module draws the exercise: the note panel, the answer grid, the
//! feedback line and a status bar, plus the help overlay.

mod answers;
mod help;
mod notes;

use crate::app::App;
use crate::audio::AudioDevice;
use crate::session::Feedback;
use crate::theory::Verdict;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub use answers::render_answers;
pub use help::render_help;
pub use notes::render_notes;

/// Renders the complete UI.
///
/// The layout is divided into:
/// - Top: title
/// - Note panel with the two note labels, mode and audio status
/// - Answer grid
/// - Feedback for the last answer
/// - Bottom: status message or key hints
pub fn render<D: AudioDevice>(frame: &mut Frame, app: &App<D>) {
    let view = app.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(6), // Notes
            Constraint::Min(9),    // Answers
            Constraint::Length(3), // Feedback
            Constraint::Length(1), // Status
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_notes(frame, chunks[1], &view);
    render_answers(frame, chunks[2], &view, app.cursor);
    render_feedback(frame, chunks[3], view.feedback.as_ref());
    render_status(frame, chunks[4], app);

    if app.show_help {
        render_help(frame, app.help_scroll);
    }
}

fn render_title(frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Intervals Practice",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  Identify the interval between two notes",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(title, area);
}

fn render_feedback(frame: &mut Frame, area: Rect, feedback: Option<&Feedback>) {
    let (line, border) = match feedback {
        Some(f) => {
            let (mark, color) = match f.verdict {
                Verdict::Correct => ("[ok] ", Color::Green),
                Verdict::Incorrect => ("[x] ", Color::Red),
            };
            (
                Line::from(vec![
                    Span::styled(mark, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::styled(f.message.clone(), Style::default().fg(color)),
                ]),
                color,
            )
        }
        None => (Line::from(""), Color::Gray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(
        Paragraph::new(line).alignment(Alignment::Center).block(block),
        area,
    );
}

fn render_status<D: AudioDevice>(frame: &mut Frame, area: Rect, app: &App<D>) {
    let line = match &app.status_message {
        Some((message, _)) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(vec![
            Span::styled("[p]", Style::default().fg(Color::Yellow)),
            Span::styled(" Play  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::styled(" Answer  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[n]", Style::default().fg(Color::Yellow)),
            Span::styled(" Next  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[m]", Style::default().fg(Color::Yellow)),
            Span::styled(" Mode  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[?]", Style::default().fg(Color::Yellow)),
            Span::styled(" Help  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
