use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::catalog::QuestionSetId;
use crate::selector::candidates;
use crate::store::{PerformanceRecord, SetPools, StruggleKind};
use crate::ui::italic;

pub struct StruggleRowData {
    pub question: String,
    pub kind: StruggleKind,
    pub count: u32,
    pub priority: u32,
    pub avg_time_ms: Option<f64>,
    pub last_seen: Option<String>,
}

impl StruggleRowData {
    fn from_record(record: &PerformanceRecord, kind: StruggleKind, priority: u32) -> Self {
        Self {
            question: record.question.clone(),
            kind,
            count: record.count,
            priority,
            avg_time_ms: record.average_time_ms(),
            last_seen: record
                .last_seen
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

/// Rows for one set, highest selection priority first.
pub fn struggle_rows(pools: &SetPools) -> Vec<StruggleRowData> {
    let mut rows = candidates(pools, None)
        .into_iter()
        .map(|c| StruggleRowData::from_record(c.record, c.kind, c.priority))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.question.cmp(&b.question))
    });
    rows
}

/// Pure presenter for a single struggle row
pub fn present_row(data: &StruggleRowData, slow_limit_ms: u64) -> Row<'static> {
    let kind_color = match data.kind {
        StruggleKind::Wrong => Color::Red,
        StruggleKind::Slow => Color::Yellow,
    };

    let time_display = match data.avg_time_ms {
        Some(avg) => format!("{:.1}s", avg / 1000.0),
        None => "—".to_string(),
    };
    let time_style = match data.avg_time_ms {
        Some(avg) if avg > slow_limit_ms as f64 => Style::default().fg(Color::Red),
        Some(_) => Style::default().fg(Color::Green),
        None => Style::default(),
    };

    Row::new(vec![
        Cell::from(data.question.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(data.kind.to_string()).style(Style::default().fg(kind_color)),
        Cell::from(data.count.to_string()),
        Cell::from(time_display).style(time_style),
        Cell::from(
            data.last_seen
                .clone()
                .unwrap_or_else(|| "—".to_string()),
        ),
    ])
}

pub fn render_struggles(app: &App, f: &mut Frame) {
    let set = app.struggles_set;
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(0),    // table
            Constraint::Length(1), // legend
        ])
        .split(area);

    let position = QuestionSetId::ALL
        .iter()
        .position(|&s| s == set)
        .map_or(0, |i| i + 1);
    let title = Paragraph::new(format!(
        "Struggles: {} ({}/{})",
        set.name(),
        position,
        QuestionSetId::ALL.len()
    ))
    .block(Block::default().borders(Borders::ALL))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let rows = struggle_rows(app.controller.store().snapshot(set));
    if rows.is_empty() {
        let empty = Paragraph::new("Nothing to review in this set.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
    } else {
        // borders and header
        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let offset = app
            .scroll_offset
            .min(rows.len().saturating_sub(table_height));

        let header = Row::new(vec!["Question", "Pool", "Count", "Avg time", "Last seen"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let visible = rows
            .iter()
            .skip(offset)
            .take(table_height)
            .map(|row| present_row(row, set.slow_time_limit_ms()))
            .collect::<Vec<_>>();

        let table = Table::new(
            visible,
            [
                Constraint::Length(14),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(9),
                Constraint::Min(16),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} tracked", rows.len())),
        );
        f.render_widget(table, chunks[1]);
    }

    let legend = Paragraph::new(Span::styled(
        "(←/→) set / (↑/↓) scroll / (c)lear set / (b)ack / (esc)ape",
        italic(),
    ));
    f.render_widget(legend, chunks[2]);
}
