pub mod screen;
pub mod struggles;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

use crate::app::App;
use crate::session::HistoryEntry;

pub const HORIZONTAL_MARGIN: u16 = 5;
pub const VERTICAL_MARGIN: u16 = 2;

/// Draw whichever screen matches the app's view and phase.
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app).render(app, f);
}

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub(crate) fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Split `area` into a body centred vertically between two equal gaps.
pub(crate) fn centered(area: Rect, body_height: u16) -> Rect {
    let gap = area.height.saturating_sub(body_height) / 2;
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(gap),
            Constraint::Length(body_height),
            Constraint::Min(0),
        ])
        .split(area)[1]
}

/// One coloured span per answered question.
pub(crate) fn history_line(history: &[HistoryEntry]) -> Line<'static> {
    let spans = history
        .iter()
        .flat_map(|entry| {
            let color = match (entry.correct, entry.slow) {
                (false, _) => Color::Red,
                (true, true) => Color::Yellow,
                (true, false) => Color::Green,
            };
            [
                Span::styled(entry.label.clone(), Style::default().fg(color)),
                Span::raw("  "),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_body() {
        let area = Rect::new(0, 0, 80, 24);
        let body = centered(area, 4);
        assert_eq!(body.height, 4);
        assert_eq!(body.y, 10);
        assert_eq!(body.x, HORIZONTAL_MARGIN);
    }

    #[test]
    fn test_centered_body_taller_than_area() {
        let area = Rect::new(0, 0, 20, 3);
        let body = centered(area, 10);
        assert!(body.height <= 3);
    }

    #[test]
    fn test_history_line_colours() {
        let history = vec![
            HistoryEntry {
                label: "2 + 2".into(),
                correct: true,
                slow: false,
            },
            HistoryEntry {
                label: "3 + 9".into(),
                correct: true,
                slow: true,
            },
            HistoryEntry {
                label: "8 + 5".into(),
                correct: false,
                slow: false,
            },
        ];
        let line = history_line(&history);
        let colours: Vec<_> = line
            .spans
            .iter()
            .step_by(2)
            .map(|s| s.style.fg)
            .collect();
        assert_eq!(
            colours,
            vec![Some(Color::Green), Some(Color::Yellow), Some(Color::Red)]
        );
    }
}
