use std::fmt;

use super::answer::Answer;
use crate::error::CatalogError;

const TIMES: char = '×';
const DIVIDE: char = '÷';
const ROOT: char = '√';
const LEGACY_ROOT: &str = "&radic;";

/// Largest operand magnitude accepted from stored text. Generators stay far
/// below it, and every answer computed from operands in range fits in an i64.
pub const MAX_OPERAND: i64 = 10_000;

/// A single arithmetic fact, stored as operands rather than display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Question {
    Add(i64, i64),
    Subtract(i64, i64),
    Multiply(i64, i64),
    /// Dividend and divisor. The divisor is never zero.
    Divide(i64, i64),
    /// Square root of a perfect square.
    Root(i64),
}

impl Question {
    pub fn answer(&self) -> Answer {
        match *self {
            Question::Add(a, b) => Answer::Whole(a + b),
            Question::Subtract(a, b) => Answer::Whole(a - b),
            Question::Multiply(a, b) => Answer::Whole(a * b),
            Question::Divide(a, b) => Answer::from_division(a, b),
            Question::Root(n) => Answer::Whole(integer_sqrt(n)),
        }
    }

    /// Rebuild a question from the text it was displayed (and persisted) as.
    ///
    /// Accepts the current display format plus the spellings found in older
    /// stores: `&radic;` for the root sign, `x`/`*` for multiplication and `/`
    /// for division. Whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let parse_err = || CatalogError::Parse(text.to_string());

        let root_operand = compact
            .strip_prefix(LEGACY_ROOT)
            .or_else(|| compact.strip_prefix(ROOT));
        if let Some(operand) = root_operand {
            let n = parse_operand(operand).ok_or_else(parse_err)?;
            let root = integer_sqrt(n);
            if n < 0 || root * root != n {
                return Err(parse_err());
            }
            return Ok(Question::Root(n));
        }

        // Skip the first char so a negative left operand is not taken for the operator.
        let (idx, op) = compact
            .char_indices()
            .skip(1)
            .find(|&(_, c)| matches!(c, '+' | '-' | '*' | '/' | 'x' | 'X' | TIMES | DIVIDE))
            .ok_or_else(parse_err)?;

        let lhs = parse_operand(&compact[..idx]).ok_or_else(parse_err)?;
        let rhs = parse_operand(&compact[idx + op.len_utf8()..]).ok_or_else(parse_err)?;

        match op {
            '+' => Ok(Question::Add(lhs, rhs)),
            '-' => Ok(Question::Subtract(lhs, rhs)),
            '*' | 'x' | 'X' | TIMES => Ok(Question::Multiply(lhs, rhs)),
            _ if rhs == 0 => Err(CatalogError::ZeroDivisor(text.to_string())),
            _ => Ok(Question::Divide(lhs, rhs)),
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Question::Add(a, b) => write!(f, "{a} + {b}"),
            Question::Subtract(a, b) => write!(f, "{a} - {b}"),
            Question::Multiply(a, b) => write!(f, "{a} {TIMES} {b}"),
            Question::Divide(a, b) => write!(f, "{a} {DIVIDE} {b}"),
            Question::Root(n) => write!(f, "{ROOT} {n}"),
        }
    }
}

fn parse_operand(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .filter(|n| (-MAX_OPERAND..=MAX_OPERAND).contains(n))
}

fn integer_sqrt(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut root = (n as f64).sqrt() as i64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}
