use std::str::FromStr;

use itertools::Itertools;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::answer::Answer;
use super::question::Question;
use crate::error::CatalogError;

/// Identifies one category of facts. The camelCase spelling is the key used
/// in the persisted struggle blob and on the command line.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum QuestionSetId {
    Multiplication,
    Addition,
    Subtraction,
    SubtractionNegative,
    Division,
    DivisionFractions,
    Squares,
}

impl QuestionSetId {
    /// Every set, in menu order.
    pub const ALL: [QuestionSetId; 7] = [
        QuestionSetId::Multiplication,
        QuestionSetId::Addition,
        QuestionSetId::Subtraction,
        QuestionSetId::SubtractionNegative,
        QuestionSetId::Division,
        QuestionSetId::DivisionFractions,
        QuestionSetId::Squares,
    ];

    pub fn definition(self) -> &'static QuestionSetDefinition {
        let def = &DEFINITIONS[self as usize];
        debug_assert_eq!(def.id, self);
        def
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    pub fn slow_time_limit_ms(self) -> u64 {
        self.definition().slow_time_limit_ms
    }

    pub fn generate(self, rng: &mut dyn RngCore) -> Question {
        (self.definition().generator)(rng)
    }

    /// Recompute the answer for a question from its display text.
    pub fn answer_for(self, text: &str) -> Result<Answer, CatalogError> {
        Ok(self.parse_question(text)?.answer())
    }

    /// Parse display text and check that this set could have produced it.
    pub fn parse_question(self, text: &str) -> Result<Question, CatalogError> {
        let question = Question::parse(text)?;
        if (self.definition().accepts)(&question) {
            Ok(question)
        } else {
            Err(CatalogError::WrongSet {
                question: text.to_string(),
                set: self,
            })
        }
    }
}

impl FromStr for QuestionSetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionSetId::ALL
            .into_iter()
            .find(|id| id.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known = QuestionSetId::ALL.iter().join(", ");
                format!("unknown question set '{s}' (expected one of: {known})")
            })
    }
}

/// What the session history strip shows for an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum HistoryDisplay {
    Question,
    Answer,
}

pub struct QuestionSetDefinition {
    pub id: QuestionSetId,
    pub name: &'static str,
    pub description: &'static str,
    pub slow_time_limit_ms: u64,
    pub history_display: HistoryDisplay,
    generator: fn(&mut dyn RngCore) -> Question,
    accepts: fn(&Question) -> bool,
}

impl std::fmt::Debug for QuestionSetDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSetDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("slow_time_limit_ms", &self.slow_time_limit_ms)
            .finish()
    }
}

// Indexed by `QuestionSetId as usize`; keep in declaration order.
static DEFINITIONS: [QuestionSetDefinition; 7] = [
    QuestionSetDefinition {
        id: QuestionSetId::Multiplication,
        name: "Multiplication Facts",
        description: "Practice multiplication up to 13×13",
        slow_time_limit_ms: 5000,
        history_display: HistoryDisplay::Question,
        generator: gen_multiplication,
        accepts: is_multiplication,
    },
    QuestionSetDefinition {
        id: QuestionSetId::Addition,
        name: "Addition Facts",
        description: "Practice addition with addends up to 20",
        slow_time_limit_ms: 3000,
        history_display: HistoryDisplay::Question,
        generator: gen_addition,
        accepts: is_addition,
    },
    QuestionSetDefinition {
        id: QuestionSetId::Subtraction,
        name: "Subtraction Facts",
        description: "Practice subtraction (0-20, no negative results)",
        slow_time_limit_ms: 4000,
        history_display: HistoryDisplay::Question,
        generator: gen_subtraction,
        accepts: is_non_negative_subtraction,
    },
    QuestionSetDefinition {
        id: QuestionSetId::SubtractionNegative,
        name: "Subtraction with Negatives",
        description: "Practice subtraction (0-20, including negative results)",
        slow_time_limit_ms: 6000,
        history_display: HistoryDisplay::Question,
        generator: gen_subtraction_negative,
        accepts: is_subtraction,
    },
    QuestionSetDefinition {
        id: QuestionSetId::Division,
        name: "Division Facts",
        description: "Practice division (up to 144, whole number results only)",
        slow_time_limit_ms: 6000,
        history_display: HistoryDisplay::Question,
        generator: gen_division,
        accepts: is_exact_division,
    },
    QuestionSetDefinition {
        id: QuestionSetId::DivisionFractions,
        name: "Division with Fractions",
        description: "Practice division with fraction and mixed number results",
        slow_time_limit_ms: 8000,
        history_display: HistoryDisplay::Question,
        generator: gen_division_fractions,
        accepts: is_division,
    },
    QuestionSetDefinition {
        id: QuestionSetId::Squares,
        name: "Square Numbers",
        description: "Practice multiplication and roots of square numbers",
        slow_time_limit_ms: 4000,
        history_display: HistoryDisplay::Question,
        generator: gen_squares,
        accepts: is_square_or_root,
    },
];

fn is_multiplication(q: &Question) -> bool {
    matches!(q, Question::Multiply(..))
}

fn is_addition(q: &Question) -> bool {
    matches!(q, Question::Add(..))
}

fn is_subtraction(q: &Question) -> bool {
    matches!(q, Question::Subtract(..))
}

fn is_non_negative_subtraction(q: &Question) -> bool {
    matches!(q, Question::Subtract(a, b) if a >= b)
}

fn is_division(q: &Question) -> bool {
    matches!(q, Question::Divide(..))
}

fn is_exact_division(q: &Question) -> bool {
    matches!(q, Question::Divide(a, b) if a % b == 0)
}

fn is_square_or_root(q: &Question) -> bool {
    match q {
        Question::Root(_) => true,
        Question::Multiply(a, b) => a == b,
        _ => false,
    }
}

fn gen_multiplication(rng: &mut dyn RngCore) -> Question {
    Question::Multiply(rng.gen_range(1..=13), rng.gen_range(1..=13))
}

fn gen_addition(rng: &mut dyn RngCore) -> Question {
    Question::Add(rng.gen_range(1..=20), rng.gen_range(1..=20))
}

fn gen_subtraction(rng: &mut dyn RngCore) -> Question {
    let minuend = rng.gen_range(1..=20);
    Question::Subtract(minuend, rng.gen_range(0..minuend))
}

fn gen_subtraction_negative(rng: &mut dyn RngCore) -> Question {
    Question::Subtract(rng.gen_range(0..=20), rng.gen_range(0..=20))
}

fn gen_division(rng: &mut dyn RngCore) -> Question {
    let quotient = rng.gen_range(1..=12);
    let divisor = rng.gen_range(1..=12);
    Question::Divide(quotient * divisor, divisor)
}

fn gen_division_fractions(rng: &mut dyn RngCore) -> Question {
    Question::Divide(rng.gen_range(1..=20), rng.gen_range(1..=20))
}

fn gen_squares(rng: &mut dyn RngCore) -> Question {
    let n = rng.gen_range(1..=13);
    if rng.gen_bool(0.4) {
        Question::Multiply(n, n)
    } else {
        Question::Root(n * n)
    }
}
