pub mod history;
pub mod popup;
pub mod timer;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::{app::App, clock::Clock, storage::BlobStore};

const HORIZONTAL_MARGIN: u16 = 2;
const TIMER_PANEL_HEIGHT: u16 = 6;

impl<C: Clock, S: BlobStore> Widget for &App<C, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),                  // title
                Constraint::Length(TIMER_PANEL_HEIGHT), // timer
                Constraint::Min(3),                     // history
                Constraint::Length(1),                  // status
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Work Time Tracker",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        timer::render_timer(self, chunks[1], buf);
        history::render_history(self, chunks[2], buf);

        if let Some(status) = &self.status {
            let style = if status.is_error {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC)
            };
            Paragraph::new(Span::styled(status.message.as_str(), style)).render(chunks[3], buf);
        }

        popup::render_popup(self, area, buf);
    }
}

/// Trailing part of `text` that fits in `max_width` columns, so the end of
/// a long input stays visible while typing
pub fn tail_to_width(text: &str, max_width: usize) -> &str {
    let mut width = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        width += c.width().unwrap_or(0);
        if width > max_width {
            break;
        }
        start = idx;
    }
    &text[start..]
}
