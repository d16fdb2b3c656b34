use std::fmt;

/// The correct answer to a question, as it is shown to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Whole(i64),
    /// A proper fraction (`whole == 0`) or a mixed number, always in lowest terms.
    Fraction {
        whole: i64,
        numerator: i64,
        denominator: i64,
    },
}

impl Answer {
    /// Build the answer of `dividend ÷ divisor`.
    ///
    /// Exact divisions collapse to [`Answer::Whole`]; anything else becomes a
    /// simplified proper fraction or mixed number. `divisor` must be non-zero.
    pub fn from_division(dividend: i64, divisor: i64) -> Self {
        debug_assert!(divisor != 0, "divisor must be non-zero");

        if dividend % divisor == 0 {
            return Answer::Whole(dividend / divisor);
        }

        let whole = dividend / divisor;
        let remainder = (dividend % divisor).abs();
        let divisor = divisor.abs();
        let gcd = gcd(remainder, divisor);

        Answer::Fraction {
            whole,
            numerator: remainder / gcd,
            denominator: divisor / gcd,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Whole(n) => write!(f, "{n}"),
            Answer::Fraction {
                whole: 0,
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
            Answer::Fraction {
                whole,
                numerator,
                denominator,
            } => write!(f, "{whole} {numerator}/{denominator}"),
        }
    }
}

pub fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(7, 13), 1);
        assert_eq!(gcd(5, 0), 5);
    }

    #[test]
    fn test_exact_division_is_whole() {
        assert_eq!(Answer::from_division(12, 4), Answer::Whole(3));
        assert_eq!(Answer::from_division(7, 1), Answer::Whole(7));
    }

    #[test]
    fn test_proper_fraction_is_simplified() {
        let answer = Answer::from_division(4, 6);
        assert_eq!(
            answer,
            Answer::Fraction {
                whole: 0,
                numerator: 2,
                denominator: 3
            }
        );
        assert_eq!(answer.to_string(), "2/3");
    }

    #[test]
    fn test_mixed_number() {
        let answer = Answer::from_division(14, 4);
        assert_eq!(answer.to_string(), "3 1/2");
    }

    #[test]
    fn test_whole_display() {
        assert_eq!(Answer::Whole(-4).to_string(), "-4");
    }
}
