use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, InputMode},
    clock::Clock,
    storage::BlobStore,
    ui::tail_to_width,
};

const POPUP_WIDTH: u16 = 50;
const POPUP_HEIGHT: u16 = 5;

/// Overlay for modal history edits; draws nothing in the other modes
pub fn render_popup<C: Clock, S: BlobStore>(app: &App<C, S>, area: Rect, buf: &mut Buffer) {
    let (title, lines) = match &app.mode {
        InputMode::Renaming { buffer, .. } => {
            let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);
            let visible = tail_to_width(buffer, popup.width.saturating_sub(6) as usize);
            (
                " Rename Session ",
                vec![
                    Line::from(vec![
                        Span::styled("> ", Style::default().fg(Color::Cyan)),
                        Span::raw(visible),
                        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
                    ]),
                    Line::from(Span::styled(
                        "(enter) save / (esc) cancel",
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                ],
            )
        }
        InputMode::ConfirmDelete { id } => {
            let task = app
                .history
                .get(id)
                .map(|record| record.task_name.as_str())
                .unwrap_or_default();
            (
                " Delete Session ",
                vec![
                    Line::from(format!("Delete \"{task}\"? This cannot be undone.")),
                    Line::from(Span::styled(
                        "(y)es / (n)o",
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                ],
            )
        }
        InputMode::Normal | InputMode::EditingTask { .. } => return,
    };

    let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);
    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered_rect(50, 5, area), Rect::new(15, 9, 50, 5));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(2, 1, 10, 3);
        assert_eq!(centered_rect(50, 5, area), Rect::new(2, 1, 10, 3));
    }
}
