use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::store::{normalize_key, PerformanceRecord, SetPools, StruggleKind};

/// What to do when the back-off walk rejects every candidate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum ExhaustionPolicy {
    /// Report no pick; the caller generates a fresh question.
    #[default]
    ReturnNone,
    /// Pick the last candidate of the walk.
    TakeLast,
}

/// A struggle record eligible to be asked again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub record: &'a PerformanceRecord,
    pub kind: StruggleKind,
    pub priority: u32,
}

impl Candidate<'_> {
    pub fn question(&self) -> &str {
        &self.record.question
    }
}

/// Trait for deciding whether the next question comes from the struggle pools
pub trait QuestionSelector {
    /// Pick a struggle question, or `None` to have a fresh one generated.
    fn select_next<'a>(
        &self,
        pools: &'a SetPools,
        previous_question: Option<&str>,
        rng: &mut dyn RngCore,
    ) -> Option<Candidate<'a>>;
}

/// Never resurfaces anything; every question is freshly generated.
pub struct FreshSelector;

impl QuestionSelector for FreshSelector {
    fn select_next<'a>(
        &self,
        _pools: &'a SetPools,
        _previous_question: Option<&str>,
        _rng: &mut dyn RngCore,
    ) -> Option<Candidate<'a>> {
        None
    }
}

/// Priority-weighted selection with exponential back-off.
///
/// Wrong answers weigh `2 * count`, slow answers `count`. Candidates are put
/// in a random order where heavier items tend to come first, then walked
/// with an acceptance chance of 1/2, 1/4, 1/8, ... so even a pool holding a
/// single question does not get asked every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StruggleSelector {
    pub policy: ExhaustionPolicy,
}

impl StruggleSelector {
    pub fn new(policy: ExhaustionPolicy) -> Self {
        Self { policy }
    }
}

impl QuestionSelector for StruggleSelector {
    fn select_next<'a>(
        &self,
        pools: &'a SetPools,
        previous_question: Option<&str>,
        rng: &mut dyn RngCore,
    ) -> Option<Candidate<'a>> {
        let candidates = candidates(pools, previous_question);
        if candidates.is_empty() {
            return None;
        }

        let ordered = weighted_order(candidates, rng);

        let mut probability = 0.5;
        for candidate in &ordered {
            if rng.gen::<f64>() < probability {
                return Some(*candidate);
            }
            probability /= 2.0;
        }

        match self.policy {
            ExhaustionPolicy::ReturnNone => None,
            ExhaustionPolicy::TakeLast => ordered.last().copied(),
        }
    }
}

/// Every tracked record of the set except the question just asked.
pub fn candidates<'a>(pools: &'a SetPools, previous_question: Option<&str>) -> Vec<Candidate<'a>> {
    let previous_key = previous_question.map(normalize_key);

    pools
        .iter()
        .map(|(kind, record)| Candidate {
            record,
            kind,
            priority: match kind {
                StruggleKind::Wrong => record.count.saturating_mul(2),
                StruggleKind::Slow => record.count,
            },
        })
        .filter(|c| previous_key.as_deref() != Some(normalize_key(c.question()).as_str()))
        .collect()
}

/// Random permutation biased by priority (Efraimidis-Spirakis keys).
///
/// Each item draws `u^(1/priority)` and the list is sorted by that key,
/// highest first. With equal priorities this is a uniform shuffle.
pub fn weighted_order<'a>(
    candidates: Vec<Candidate<'a>>,
    rng: &mut dyn RngCore,
) -> Vec<Candidate<'a>> {
    let mut keyed: Vec<(f64, Candidate<'a>)> = candidates
        .into_iter()
        .map(|c| {
            let weight = f64::from(c.priority.max(1));
            // ln(u) / w orders the same as u^(1/w) without underflow
            let key = rng.gen::<f64>().ln() / weight;
            (key, c)
        })
        .collect();

    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    keyed.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(question: &str, count: u32) -> PerformanceRecord {
        PerformanceRecord {
            question: question.to_string(),
            count,
            last_seen: None,
            times: vec![],
        }
    }

    fn pools(wrong: &[(&str, u32)], slow: &[(&str, u32)]) -> SetPools {
        let mut pools = SetPools::default();
        for (q, count) in wrong {
            pools.wrong.insert(normalize_key(q), record(q, *count));
        }
        for (q, count) in slow {
            pools.slow.insert(normalize_key(q), record(q, *count));
        }
        pools
    }

    #[test]
    fn test_empty_pools_select_nothing() {
        let selector = StruggleSelector::default();
        let mut rng = StdRng::seed_from_u64(1);
        let empty = SetPools::default();
        for _ in 0..100 {
            assert!(selector.select_next(&empty, None, &mut rng).is_none());
        }
    }

    #[test]
    fn test_priorities() {
        let pools = pools(&[("3 + 4", 3)], &[("5 + 5", 4)]);
        let mut found = candidates(&pools, None);
        found.sort_by_key(|c| c.priority);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].kind, found[0].priority), (StruggleKind::Slow, 4));
        assert_eq!((found[1].kind, found[1].priority), (StruggleKind::Wrong, 6));
    }

    #[test]
    fn test_previous_question_is_never_selected() {
        let pools = pools(&[("3 + 4", 5), ("2 + 2", 1)], &[("9 + 9", 2)]);
        let selector = StruggleSelector::new(ExhaustionPolicy::TakeLast);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2000 {
            if let Some(c) = selector.select_next(&pools, Some("3 + 4"), &mut rng) {
                assert_ne!(c.question(), "3 + 4");
            }
        }
    }

    #[test]
    fn test_previous_question_match_ignores_whitespace() {
        let pools = pools(&[("3 + 4", 5)], &[]);
        assert!(candidates(&pools, Some("3+4")).is_empty());
    }

    #[test]
    fn test_only_candidate_was_previous() {
        let pools = pools(&[("3 + 4", 10)], &[]);
        let selector = StruggleSelector::new(ExhaustionPolicy::TakeLast);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(selector.select_next(&pools, Some("3 + 4"), &mut rng).is_none());
        }
    }

    #[test]
    fn test_single_candidate_is_not_always_selected() {
        let pools = pools(&[("3 + 4", 1)], &[]);
        let selector = StruggleSelector::default();
        let mut rng = StdRng::seed_from_u64(9);

        let hits = (0..10_000)
            .filter(|_| selector.select_next(&pools, None, &mut rng).is_some())
            .count();
        // acceptance chance for the only item is 1/2
        assert!((4_500..5_500).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn test_take_last_always_selects_something() {
        let pools = pools(&[("3 + 4", 1)], &[("1 + 1", 1)]);
        let selector = StruggleSelector::new(ExhaustionPolicy::TakeLast);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            assert!(selector.select_next(&pools, None, &mut rng).is_some());
        }
    }

    #[test]
    fn test_wrong_is_favoured_over_slow() {
        let pools = pools(&[("6 × 7", 3)], &[("8 × 9", 1)]);
        let selector = StruggleSelector::default();
        let mut rng = StdRng::seed_from_u64(2024);

        let (mut wrong, mut slow) = (0, 0);
        for _ in 0..10_000 {
            match selector.select_next(&pools, None, &mut rng).map(|c| c.kind) {
                Some(StruggleKind::Wrong) => wrong += 1,
                Some(StruggleKind::Slow) => slow += 1,
                None => {}
            }
        }
        assert!(wrong > slow, "wrong = {wrong}, slow = {slow}");
    }

    #[test]
    fn test_weighted_order_keeps_every_candidate() {
        let pools = pools(&[("1 + 1", 1), ("1 + 2", 2)], &[("1 + 3", 3), ("1 + 4", 4)]);
        let mut rng = StdRng::seed_from_u64(8);
        let ordered = weighted_order(candidates(&pools, None), &mut rng);
        let mut questions: Vec<&str> = ordered.iter().map(|c| c.question()).collect();
        questions.sort();
        assert_eq!(questions, vec!["1 + 1", "1 + 2", "1 + 3", "1 + 4"]);
    }

    #[test]
    fn test_weighted_order_with_equal_priority_is_unbiased() {
        let pools = pools(&[("1 + 1", 1), ("1 + 2", 1), ("1 + 3", 1)], &[]);
        let mut rng = StdRng::seed_from_u64(77);
        let mut first = std::collections::HashMap::new();
        for _ in 0..9_000 {
            let ordered = weighted_order(candidates(&pools, None), &mut rng);
            *first.entry(ordered[0].question().to_string()).or_insert(0) += 1;
        }
        for count in first.values() {
            assert!((2_700..3_300).contains(count), "{first:?}");
        }
    }

    #[test]
    fn test_fresh_selector() {
        let pools = pools(&[("3 + 4", 100)], &[]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(FreshSelector.select_next(&pools, None, &mut rng).is_none());
    }
}
