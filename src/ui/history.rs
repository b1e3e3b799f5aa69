use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::{
    app::App,
    clock::Clock,
    format::{format_ago, format_clock_time, format_day, format_hours_minutes, group_by_day},
    session::SessionRecord,
    storage::BlobStore,
};

const EMPTY_NAME: &str = "(No task name)";

pub fn render_history<C: Clock, S: BlobStore>(app: &App<C, S>, area: Rect, buf: &mut Buffer) {
    let records = app.history.records();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(history_title(app));

    if records.is_empty() {
        Paragraph::new(Span::styled(
            "No sessions recorded yet",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .block(block)
        .render(area, buf);
        return;
    }

    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let time_style = Style::default().add_modifier(Modifier::DIM);
    let duration_style = Style::default().fg(Color::Magenta);

    let mut items = Vec::new();
    let mut selected_row = None;
    let mut record_idx = 0;

    for group in group_by_day(records, &Local) {
        let first_start = group.records[0].started_at.with_timezone(&Local);
        items.push(ListItem::new(Line::from(vec![
            Span::styled(format_day(&first_start), header_style),
            Span::styled(
                format!("  {}", format_hours_minutes(group.total_seconds)),
                time_style,
            ),
        ])));

        for record in group.records {
            if record_idx == app.selected {
                selected_row = Some(items.len());
            }
            items.push(ListItem::new(record_line(record, time_style, duration_style)));
            record_idx += 1;
        }
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(selected_row);
    StatefulWidget::render(list, area, buf, &mut state);
}

fn record_line(record: &SessionRecord, time_style: Style, duration_style: Style) -> Line<'_> {
    let start = record.started_at.with_timezone(&Local);
    let end = record.ended_at.with_timezone(&Local);
    let name = if record.task_name.is_empty() {
        EMPTY_NAME
    } else {
        record.task_name.as_str()
    };

    Line::from(vec![
        Span::styled(
            format!(
                "  {:>8} - {:<8}",
                format_clock_time(&start),
                format_clock_time(&end)
            ),
            time_style,
        ),
        Span::styled(
            format!("{:>8}  ", format_hours_minutes(record.duration_seconds)),
            duration_style,
        ),
        Span::raw(name),
    ])
}

fn history_title<C: Clock, S: BlobStore>(app: &App<C, S>) -> String {
    let history = &app.history;
    match history.records().first() {
        None => " History ".to_string(),
        Some(latest) => {
            let now = app.manager.now().with_timezone(&Local);
            format!(
                " History · {} sessions · {} total · last {} ",
                history.len(),
                format_hours_minutes(history.total_seconds()),
                format_ago(&latest.ended_at.with_timezone(&Local), &now)
            )
        }
    }
}
