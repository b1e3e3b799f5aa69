use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{
    app::{App, InputMode},
    clock::Clock,
    format::{format_hms, format_hours_minutes},
    session::SessionState,
    storage::BlobStore,
    ui::tail_to_width,
};

const PLACEHOLDER: &str = "What are you working on?";

pub fn render_timer<C: Clock, S: BlobStore>(app: &App<C, S>, area: Rect, buf: &mut Buffer) {
    let state = app.state();
    let accent = match state {
        SessionState::Idle => Color::Gray,
        SessionState::Running => Color::Green,
        SessionState::Paused => Color::Yellow,
    };

    let title = match state {
        SessionState::Idle => " Timer ".to_string(),
        SessionState::Running => " Timer · RUNNING ".to_string(),
        SessionState::Paused => " Timer · PAUSED ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(title);
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // elapsed
            Constraint::Length(1), // task
            Constraint::Length(1), // pause summary
            Constraint::Length(1), // controls
        ])
        .split(inner);

    let now = app.manager.now();
    let elapsed = app.manager.elapsed(now).unwrap_or(0);
    Paragraph::new(Span::styled(
        format_hms(elapsed),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(rows[0], buf);

    task_line(app, rows[1].width as usize)
        .alignment(Alignment::Center)
        .render(rows[1], buf);

    if let Some(paused) = app.manager.paused_total(now) {
        let secs = paused.num_seconds().max(0) as u64;
        if secs > 0 {
            Paragraph::new(Span::styled(
                format!("paused {}", format_hours_minutes(secs)),
                Style::default().add_modifier(Modifier::DIM),
            ))
            .alignment(Alignment::Center)
            .render(rows[2], buf);
        }
    }

    Paragraph::new(Span::styled(
        controls_hint(app),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(rows[3], buf);
}

fn task_line<'a, C: Clock, S: BlobStore>(app: &'a App<C, S>, width: usize) -> Paragraph<'a> {
    if let InputMode::EditingTask { buffer } = &app.mode {
        // room for the prompt and cursor
        let visible = tail_to_width(buffer, width.saturating_sub(4));
        return Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(visible),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    }

    match app.manager.active() {
        Some(session) => {
            let name = if session.task_name().trim().is_empty() {
                app.manager.default_task_name()
            } else {
                session.task_name()
            };
            Paragraph::new(Span::styled(
                name,
                Style::default().add_modifier(Modifier::BOLD),
            ))
        }
        None if app.task_input.is_empty() => Paragraph::new(Span::styled(
            PLACEHOLDER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        None => Paragraph::new(Span::raw(app.task_input.as_str())),
    }
}

fn controls_hint<C: Clock, S: BlobStore>(app: &App<C, S>) -> String {
    match app.mode {
        InputMode::EditingTask { .. } | InputMode::Renaming { .. } => {
            "(enter) save / (esc) cancel".to_string()
        }
        InputMode::ConfirmDelete { .. } => "(y)es / (n)o".to_string(),
        InputMode::Normal => app
            .controls()
            .iter()
            .map(|control| control.key_hint())
            .collect::<Vec<_>>()
            .join(" / "),
    }
}
