//! Answer grid.
//!
//! Lays the interval options out in two columns and colors the selected
//! one by whether it was right.

use crate::app::ANSWER_COLUMNS;
use crate::session::{AnswerOption, OptionState, SessionView};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

fn option_style(option: &AnswerOption, under_cursor: bool) -> Style {
    let style = match option.state {
        OptionState::Correct => Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD),
        OptionState::Incorrect => Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
        OptionState::Unselected => Style::default().fg(Color::White),
    };
    if under_cursor {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Renders the answer options.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `view` - Current session display state
/// * `cursor` - Index of the highlighted option
pub fn render_answers(frame: &mut Frame, area: Rect, view: &SessionView, cursor: usize) {
    let block = Block::default()
        .title(" What is the interval played? ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, ANSWER_COLUMNS as u32); ANSWER_COLUMNS])
        .split(inner);

    let mut lines: [Vec<Line>; ANSWER_COLUMNS] = Default::default();
    for (i, option) in view.options.iter().enumerate() {
        let text = format!(" {:<14}", option.label);
        lines[i % ANSWER_COLUMNS].push(Line::from(Span::styled(
            text,
            option_style(option, i == cursor),
        )));
    }

    for (column, column_lines) in lines.into_iter().enumerate() {
        frame.render_widget(Paragraph::new(column_lines), columns[column]);
    }
}
