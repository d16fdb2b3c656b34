use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, View};
use crate::catalog::QuestionSetId;
use crate::session::Phase;
use crate::ui::{bold, centered, dim, history_line, italic, struggles, HORIZONTAL_MARGIN};
use crate::util::format_secs;

/// A UI screen boundary
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct SetSelectionScreen;

impl Screen for SetSelectionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        let title = Paragraph::new("Math Facts")
            .block(Block::default().borders(Borders::ALL))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(title, chunks[0]);

        let store = app.controller.store();
        let items = QuestionSetId::ALL
            .iter()
            .enumerate()
            .map(|(i, &set)| {
                let pending = store.snapshot(set).len();
                let marker = if i == app.menu_index { "> " } else { "  " };
                let mut spans = vec![
                    Span::raw(marker),
                    Span::styled(format!("{}. {}", i + 1, set.name()), bold()),
                ];
                if pending > 0 {
                    spans.push(Span::styled(
                        format!("  ({pending} to review)"),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                let style = if i == app.menu_index {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect::<Vec<_>>();

        f.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title("Choose a set")),
            chunks[1],
        );

        let legend = Paragraph::new(Span::styled(
            "(↑/↓) move / (enter) choose / (1-7) pick / (s)truggles / (esc)ape",
            italic(),
        ));
        f.render_widget(legend, chunks[2]);
    }
}

/// Shown after a set is chosen and before the first question.
pub struct WelcomeScreen;

impl Screen for WelcomeScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let Some(set) = app.controller.state().current_set else {
            return;
        };
        let def = set.definition();
        let review = app.controller.store().snapshot(set).len();

        let mut lines = vec![
            Line::from(Span::styled(def.name, bold().fg(Color::Cyan))),
            Line::from(""),
            Line::from(def.description),
            Line::from(Span::styled(
                format!(
                    "{} questions, slow after {}",
                    app.controller.config().max_questions,
                    format_secs(def.slow_time_limit_ms)
                ),
                dim(),
            )),
        ];
        if review > 0 {
            lines.push(Line::from(Span::styled(
                format!("{review} questions waiting for review"),
                Style::default().fg(Color::Yellow),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("(space) start / (esc)ape", italic())));

        let area = centered(f.area(), lines.len() as u16);
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

/// Question and, once revealed, its answer.
pub struct QuestionScreen;

impl Screen for QuestionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let controller = &app.controller;
        let state = controller.state();
        let (Some(set), Some(question)) = (state.current_set, state.current_question.as_deref())
        else {
            return;
        };
        let revealed = controller.phase() == Phase::ShowingAnswer;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(1), // progress
                Constraint::Min(5),    // question
                Constraint::Length(2), // history
                Constraint::Length(1), // legend
            ])
            .split(f.area());

        let mut progress = vec![Span::styled(
            format!(
                "{}  question {} / {}",
                set.name(),
                state.total_asked + 1,
                controller.config().max_questions
            ),
            dim(),
        )];
        if state.current_is_review {
            progress.push(Span::styled("  review", Style::default().fg(Color::Magenta)));
        }
        f.render_widget(Paragraph::new(Line::from(progress)), chunks[0]);

        let elapsed = controller.elapsed_ms().unwrap_or(0);
        let timer_style = if elapsed > set.slow_time_limit_ms() {
            Style::default().fg(Color::Red)
        } else {
            dim()
        };

        let mut body = vec![
            Line::from(Span::styled(format_secs(elapsed), timer_style)),
            Line::from(""),
            Line::from(Span::styled(question.to_string(), bold())),
        ];
        if revealed {
            let answer = state
                .current_answer
                .map(|a| a.to_string())
                .unwrap_or_default();
            body.push(Line::from(""));
            body.push(Line::from(Span::styled(
                format!("= {answer}"),
                bold().fg(Color::Green),
            )));
        }
        let body_area = centered(chunks[1], body.len() as u16);
        f.render_widget(Paragraph::new(body).alignment(Alignment::Center), body_area);

        f.render_widget(
            Paragraph::new(history_line(&state.history)).wrap(Wrap { trim: true }),
            chunks[2],
        );

        let legend = if revealed {
            "(y) got it / (n) missed it / (q)uit"
        } else {
            "(space) show answer / (q)uit"
        };
        f.render_widget(Paragraph::new(Span::styled(legend, italic())), chunks[3]);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let results = app.controller.results();
        let state = app.controller.state();

        let mut lines = Vec::new();
        if results.excellent {
            lines.push(Line::from(Span::styled(
                "Excellent!",
                bold().fg(Color::Yellow),
            )));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!("{}%", results.score_percent),
            bold(),
        )));
        lines.push(Line::from(format!(
            "{} correct / {} incorrect / {} asked",
            results.correct, results.incorrect, results.asked
        )));

        let average = if results.asked > 0 {
            results.total_thinking_time_ms / u64::from(results.asked)
        } else {
            0
        };
        lines.push(Line::from(Span::styled(
            format!(
                "thinking time {} (avg {})",
                format_secs(results.total_thinking_time_ms),
                format_secs(average)
            ),
            dim(),
        )));
        lines.push(Line::from(""));
        lines.push(history_line(&state.history));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "(r)estart / (s)truggles / (esc)ape",
            italic(),
        )));

        let area = centered(f.area(), lines.len() as u16);
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

pub struct StrugglesScreen;

impl Screen for StrugglesScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        struggles::render_struggles(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    if app.view == View::Struggles {
        return Box::new(StrugglesScreen);
    }
    match app.phase() {
        Phase::SetSelection => Box::new(SetSelectionScreen),
        Phase::WaitingToStart => Box::new(WelcomeScreen),
        Phase::ShowingQuestion | Phase::ShowingAnswer => Box::new(QuestionScreen),
        Phase::Complete => Box::new(ResultsScreen),
    }
}
