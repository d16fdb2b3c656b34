use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::catalog::QuestionSetId;
use crate::error::SessionError;
use crate::results_log::{append_result, ResultRow};
use crate::runtime::{DrillEvent, EventSource, Runner, Ticker};
use crate::session::{AnswerOutcome, Phase, SessionController};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Drill,
    Struggles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Exit,
}

/// Terminal-facing state wrapped around a [`SessionController`].
#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub view: View,
    /// Highlighted row on the set selection menu.
    pub menu_index: usize,
    /// Set whose pools the struggles view shows.
    pub struggles_set: QuestionSetId,
    pub scroll_offset: usize,
    pub last_outcome: Option<AnswerOutcome>,
    results_log: Option<PathBuf>,
    logged: bool,
}

impl App {
    pub fn new(controller: SessionController, results_log: Option<PathBuf>) -> Self {
        Self {
            controller,
            view: View::Drill,
            menu_index: 0,
            struggles_set: QuestionSetId::ALL[0],
            scroll_offset: 0,
            last_outcome: None,
            results_log,
            logged: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn highlighted_set(&self) -> QuestionSetId {
        QuestionSetId::ALL[self.menu_index % QuestionSetId::ALL.len()]
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Exit;
        }

        match self.view {
            View::Drill => self.on_drill_key(key),
            View::Struggles => self.on_struggles_key(key),
        }

        if self.phase() == Phase::Complete && !self.logged {
            self.log_results();
        }
        Action::Continue
    }

    fn on_drill_key(&mut self, key: KeyEvent) {
        let result = match (self.phase(), key.code) {
            (Phase::SetSelection, KeyCode::Up | KeyCode::Char('k')) => {
                let len = QuestionSetId::ALL.len();
                self.menu_index = (self.menu_index + len - 1) % len;
                Ok(())
            }
            (Phase::SetSelection, KeyCode::Down | KeyCode::Char('j')) => {
                self.menu_index = (self.menu_index + 1) % QuestionSetId::ALL.len();
                Ok(())
            }
            (Phase::SetSelection, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.controller.select_set(self.highlighted_set())
            }
            (Phase::SetSelection, KeyCode::Char(c @ '1'..='9')) => {
                match QuestionSetId::ALL.get(c as usize - '1' as usize) {
                    Some(&set) => {
                        self.menu_index = c as usize - '1' as usize;
                        self.controller.select_set(set)
                    }
                    None => Ok(()),
                }
            }
            (Phase::SetSelection, KeyCode::Char('s')) => {
                self.open_struggles(self.highlighted_set());
                Ok(())
            }
            (Phase::WaitingToStart, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.last_outcome = None;
                self.controller.start_session()
            }
            (Phase::ShowingQuestion, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.controller.reveal_answer()
            }
            (Phase::ShowingAnswer, KeyCode::Char('y') | KeyCode::Right) => self.grade(true),
            (Phase::ShowingAnswer, KeyCode::Char('n') | KeyCode::Left) => self.grade(false),
            (Phase::ShowingQuestion | Phase::ShowingAnswer, KeyCode::Char('q')) => {
                self.controller.quit()
            }
            (Phase::Complete, KeyCode::Char('r') | KeyCode::Enter) => {
                self.logged = false;
                self.last_outcome = None;
                self.controller.restart()
            }
            (Phase::Complete, KeyCode::Char('s')) => {
                if let Some(set) = self.controller.state().current_set {
                    self.open_struggles(set);
                }
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            debug!(error = %e, "key ignored");
        }
    }

    fn on_struggles_key(&mut self, key: KeyEvent) {
        let len = QuestionSetId::ALL.len();
        let idx = QuestionSetId::ALL
            .iter()
            .position(|&s| s == self.struggles_set)
            .unwrap_or(0);

        match key.code {
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => {
                self.struggles_set = QuestionSetId::ALL[(idx + 1) % len];
                self.scroll_offset = 0;
            }
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
                self.struggles_set = QuestionSetId::ALL[(idx + len - 1) % len];
                self.scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.controller.store().snapshot(self.struggles_set).len();
                if self.scroll_offset + 1 < max {
                    self.scroll_offset += 1;
                }
            }
            KeyCode::Char('c') => {
                info!(set = %self.struggles_set, "clearing struggle pools");
                self.controller.store_mut().clear_set(self.struggles_set);
                self.scroll_offset = 0;
            }
            KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Char('q') => {
                self.view = View::Drill;
            }
            _ => {}
        }
    }

    fn open_struggles(&mut self, set: QuestionSetId) {
        self.struggles_set = set;
        self.scroll_offset = 0;
        self.view = View::Struggles;
    }

    fn grade(&mut self, correct: bool) -> Result<(), SessionError> {
        let outcome = self.controller.record_answer(correct)?;
        self.last_outcome = Some(outcome);
        Ok(())
    }

    fn log_results(&mut self) {
        self.logged = true;
        let results = self.controller.results();
        let (Some(path), Some(set)) = (&self.results_log, self.controller.state().current_set)
        else {
            return;
        };
        if results.asked == 0 {
            return;
        }
        if let Err(e) = append_result(path, &ResultRow::new(set, &results)) {
            warn!(path = %path.display(), error = %e, "could not append session results");
        }
    }
}

/// Draw, wait for an event, repeat until the app asks to exit.
///
/// Ticks redraw too so the thinking timer keeps moving.
pub fn run<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        match runner.step() {
            DrillEvent::Key(key) => {
                if app.on_key(key) == Action::Exit {
                    return Ok(());
                }
            }
            DrillEvent::Resize | DrillEvent::Tick => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::results_log::read_results;
    use crate::selector::FreshSelector;
    use crate::session::SessionConfig;
    use crate::store::{MemoryKvStore, StruggleKind, StruggleStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        app.on_key(key(code))
    }

    fn create_test_app(max_questions: u32, results_log: Option<PathBuf>) -> (App, ManualClock) {
        let clock = ManualClock::default();
        let controller = SessionController::new(
            StruggleStore::load(Box::new(MemoryKvStore::new())),
            Box::new(FreshSelector),
            Box::new(StdRng::seed_from_u64(3)),
            Box::new(clock.clone()),
            SessionConfig {
                max_questions,
                history_display: None,
            },
        );
        (App::new(controller, results_log), clock)
    }

    #[test]
    fn test_escape_and_ctrl_c_exit() {
        let (mut app, _) = create_test_app(3, None);
        assert_eq!(press(&mut app, KeyCode::Esc), Action::Exit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Exit
        );
        assert_eq!(press(&mut app, KeyCode::Char('x')), Action::Continue);
    }

    #[test]
    fn test_menu_navigation_wraps() {
        let (mut app, _) = create_test_app(3, None);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.highlighted_set(), QuestionSetId::Squares);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.highlighted_set(), QuestionSetId::Addition);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), Phase::WaitingToStart);
        assert_eq!(
            app.controller.state().current_set,
            Some(QuestionSetId::Addition)
        );
    }

    #[test]
    fn test_digit_selects_set() {
        let (mut app, _) = create_test_app(3, None);
        press(&mut app, KeyCode::Char('5'));
        assert_eq!(
            app.controller.state().current_set,
            Some(QuestionSetId::Division)
        );
        assert_eq!(app.menu_index, 4);
    }

    #[test]
    fn test_out_of_range_digit_is_ignored() {
        let (mut app, _) = create_test_app(3, None);
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.phase(), Phase::SetSelection);
    }

    #[test]
    fn test_full_keyboard_session() {
        let (mut app, clock) = create_test_app(2, None);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.phase(), Phase::ShowingQuestion);

        // grading keys do nothing until the answer is shown
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.controller.state().total_asked, 0);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.phase(), Phase::ShowingAnswer);
        clock.advance_ms(500);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.last_outcome.map(|o| o.correct), Some(true));

        press(&mut app, KeyCode::Char(' '));
        clock.advance_ms(500);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.phase(), Phase::Complete);

        let results = app.controller.results();
        assert_eq!(results.correct, 1);
        assert_eq!(results.incorrect, 1);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.phase(), Phase::SetSelection);
        assert!(app.last_outcome.is_none());
    }

    #[test]
    fn test_quit_logs_results_once() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("results.csv");
        let (mut app, _) = create_test_app(10, Some(log.clone()));

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('y'));
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.phase(), Phase::Complete);

        // extra keys on the results screen must not append again
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('z'));

        let rows = read_results(&log).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].set, "multiplication");
        assert_eq!(rows[0].asked, 1);
        assert_eq!(rows[0].score_percent, 100);
    }

    #[test]
    fn test_empty_session_is_not_logged() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("results.csv");
        let (mut app, _) = create_test_app(10, Some(log.clone()));

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.phase(), Phase::Complete);
        assert!(!log.exists());
    }

    #[test]
    fn test_struggles_view_cycles_and_clears() {
        let (mut app, _) = create_test_app(3, None);
        app.controller.store_mut().record(
            QuestionSetId::Multiplication,
            "7 × 8",
            StruggleKind::Wrong,
            Some(6000),
        );

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.view, View::Struggles);
        assert_eq!(app.struggles_set, QuestionSetId::Multiplication);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.struggles_set, QuestionSetId::Addition);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.struggles_set, QuestionSetId::Squares);
        press(&mut app, KeyCode::Right);

        press(&mut app, KeyCode::Char('c'));
        assert!(app
            .controller
            .store()
            .snapshot(QuestionSetId::Multiplication)
            .is_empty());

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.view, View::Drill);
        assert_eq!(app.phase(), Phase::SetSelection);
    }
}
