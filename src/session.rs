use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::catalog::{Answer, HistoryDisplay, QuestionSetId};
use crate::clock::Clock;
use crate::error::SessionError;
use crate::selector::QuestionSelector;
use crate::store::{StruggleKind, StruggleStore};

pub const DEFAULT_MAX_QUESTIONS: u32 = 15;

/// Scores at or above this percentage earn the "Excellent!" banner.
pub const EXCELLENT_SCORE: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SetSelection,
    WaitingToStart,
    ShowingQuestion,
    ShowingAnswer,
    Complete,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_questions: u32,
    /// Overrides every set's own history display mode when present.
    pub history_display: Option<HistoryDisplay>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            history_display: None,
        }
    }
}

/// One answered question in the strip shown under the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub label: String,
    pub correct: bool,
    pub slow: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_set: Option<QuestionSetId>,
    pub current_question: Option<String>,
    pub current_answer: Option<Answer>,
    /// Whether the current question was resurfaced from the struggle pools.
    pub current_is_review: bool,
    pub previous_question_text: Option<String>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_asked: u32,
    pub total_thinking_time_ms: u64,
    pub question_started_at: Option<DateTime<Utc>>,
    pub history: Vec<HistoryEntry>,
}

/// What happened to a graded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub slow: bool,
    pub thinking_time_ms: u64,
    /// The question was tracked as a struggle and is now removed.
    pub mastered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResults {
    pub correct: u32,
    pub incorrect: u32,
    pub asked: u32,
    pub total_thinking_time_ms: u64,
    pub score_percent: u32,
    pub excellent: bool,
}

/// Drives one learner through a set of questions.
///
/// Owns the struggle store for the lifetime of the app; session counters are
/// reset on [`SessionController::restart`] while the store is left alone.
pub struct SessionController {
    store: StruggleStore,
    selector: Box<dyn QuestionSelector>,
    rng: Box<dyn RngCore>,
    clock: Box<dyn Clock>,
    config: SessionConfig,
    phase: Phase,
    state: SessionState,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn new(
        store: StruggleStore,
        selector: Box<dyn QuestionSelector>,
        rng: Box<dyn RngCore>,
        clock: Box<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            selector,
            rng,
            clock,
            config,
            phase: Phase::SetSelection,
            state: SessionState::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &StruggleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StruggleStore {
        &mut self.store
    }

    pub fn remaining(&self) -> u32 {
        self.config.max_questions.saturating_sub(self.state.total_asked)
    }

    /// Time spent on the current question so far.
    pub fn elapsed_ms(&self) -> Option<u64> {
        let started = self.state.question_started_at?;
        Some((self.clock.now() - started).num_milliseconds().max(0) as u64)
    }

    pub fn select_set(&mut self, set: QuestionSetId) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::SetSelection], "select a set")?;
        self.state.current_set = Some(set);
        self.phase = Phase::WaitingToStart;
        info!(%set, "question set selected");
        Ok(())
    }

    pub fn start_session(&mut self) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::WaitingToStart], "start a session")?;
        self.phase = Phase::ShowingQuestion;
        self.next_question();
        Ok(())
    }

    pub fn reveal_answer(&mut self) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::ShowingQuestion], "reveal the answer")?;
        self.phase = Phase::ShowingAnswer;
        Ok(())
    }

    /// Grade the current question and move on to the next one.
    pub fn record_answer(&mut self, correct: bool) -> Result<AnswerOutcome, SessionError> {
        self.expect_phase(&[Phase::ShowingAnswer], "record an answer")?;
        let (Some(set), Some(question)) = (
            self.state.current_set,
            self.state.current_question.clone(),
        ) else {
            return Err(self.invalid("record an answer"));
        };

        let now = self.clock.now();
        let thinking_time_ms = self.elapsed_ms().unwrap_or(0);
        self.state.total_thinking_time_ms += thinking_time_ms;

        let slow = thinking_time_ms > set.slow_time_limit_ms();
        let mut mastered = false;

        if correct {
            self.state.correct_count += 1;
            if slow {
                self.store.record_at(
                    set,
                    &question,
                    StruggleKind::Slow,
                    Some(thinking_time_ms),
                    now,
                );
            } else {
                mastered = self.store.remove(set, &question);
            }
        } else {
            self.state.incorrect_count += 1;
            self.store.record_at(
                set,
                &question,
                StruggleKind::Wrong,
                Some(thinking_time_ms),
                now,
            );
        }

        let label = match self.history_display(set) {
            HistoryDisplay::Question => question.clone(),
            HistoryDisplay::Answer => self
                .state
                .current_answer
                .map(|a| a.to_string())
                .unwrap_or_else(|| question.clone()),
        };
        self.state.history.push(HistoryEntry {
            label,
            correct,
            slow,
        });
        self.state.total_asked += 1;
        debug!(%set, %question, correct, slow, thinking_time_ms, "answer recorded");

        self.next_question();

        Ok(AnswerOutcome {
            correct,
            slow,
            thinking_time_ms,
            mastered,
        })
    }

    /// End the session early.
    pub fn quit(&mut self) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::ShowingQuestion, Phase::ShowingAnswer], "quit")?;
        info!(asked = self.state.total_asked, "session ended early");
        self.phase = Phase::Complete;
        Ok(())
    }

    /// Back to set selection with fresh counters. The struggle store is kept.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::Complete], "restart")?;
        self.state = SessionState::default();
        self.phase = Phase::SetSelection;
        Ok(())
    }

    pub fn results(&self) -> SessionResults {
        let asked = self.state.total_asked;
        let score_percent = if asked == 0 {
            0
        } else {
            (f64::from(self.state.correct_count) / f64::from(asked) * 100.0).round() as u32
        };

        SessionResults {
            correct: self.state.correct_count,
            incorrect: self.state.incorrect_count,
            asked,
            total_thinking_time_ms: self.state.total_thinking_time_ms,
            score_percent,
            excellent: asked > 0 && score_percent >= EXCELLENT_SCORE,
        }
    }

    fn history_display(&self, set: QuestionSetId) -> HistoryDisplay {
        self.config
            .history_display
            .unwrap_or(set.definition().history_display)
    }

    fn next_question(&mut self) {
        if self.state.total_asked >= self.config.max_questions {
            info!(asked = self.state.total_asked, "session complete");
            self.phase = Phase::Complete;
            return;
        }
        let Some(set) = self.state.current_set else {
            self.phase = Phase::Complete;
            return;
        };

        let review = self
            .selector
            .select_next(
                self.store.snapshot(set),
                self.state.previous_question_text.as_deref(),
                &mut *self.rng,
            )
            .map(|candidate| candidate.question().to_string())
            .and_then(|text| match set.answer_for(&text) {
                Ok(answer) => Some((text, answer)),
                Err(e) => {
                    warn!(%set, error = %e, "stored question is unusable, generating a fresh one");
                    None
                }
            });

        let (text, answer, is_review) = match review {
            Some((text, answer)) => (text, answer, true),
            None => {
                let question = set.generate(&mut *self.rng);
                (question.to_string(), question.answer(), false)
            }
        };
        debug!(%set, question = %text, is_review, "next question");

        self.state.previous_question_text = Some(text.clone());
        self.state.current_question = Some(text);
        self.state.current_answer = Some(answer);
        self.state.current_is_review = is_review;
        self.state.question_started_at = Some(self.clock.now());
        self.phase = Phase::ShowingQuestion;
    }

    fn expect_phase(&self, allowed: &[Phase], action: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }
}
