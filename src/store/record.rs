use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Only the most recent thinking times are kept per question.
pub const MAX_RECORDED_TIMES: usize = 10;

/// Which pool a struggling question is tracked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StruggleKind {
    /// Answered incorrectly.
    Wrong,
    /// Answered correctly, but over the set's time limit.
    Slow,
}

/// History of one struggling question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Display text, as the learner saw it.
    pub question: String,
    pub count: u32,
    #[serde(rename = "lastSeen", default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times: Vec<u64>,
}

impl PerformanceRecord {
    pub fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            count: 0,
            last_seen: None,
            times: Vec::new(),
        }
    }

    /// Count one more occurrence seen at `now`.
    pub fn bump(&mut self, now: DateTime<Utc>, thinking_time_ms: Option<u64>) {
        self.count += 1;
        self.last_seen = Some(now);

        if let Some(ms) = thinking_time_ms {
            self.times.push(ms);
            if self.times.len() > MAX_RECORDED_TIMES {
                let excess = self.times.len() - MAX_RECORDED_TIMES;
                self.times.drain(..excess);
            }
        }
    }

    pub fn average_time_ms(&self) -> Option<f64> {
        let times: Vec<f64> = self.times.iter().map(|&t| t as f64).collect();
        crate::util::mean(&times)
    }
}

/// Whitespace-free form of the question text, used as the map key so
/// `"3 + 4"` and `"3+4"` are the same question.
pub fn normalize_key(question: &str) -> String {
    question.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The two struggle pools of one question set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPools {
    #[serde(default)]
    pub wrong: BTreeMap<String, PerformanceRecord>,
    #[serde(default)]
    pub slow: BTreeMap<String, PerformanceRecord>,
}

impl SetPools {
    pub fn pool(&self, kind: StruggleKind) -> &BTreeMap<String, PerformanceRecord> {
        match kind {
            StruggleKind::Wrong => &self.wrong,
            StruggleKind::Slow => &self.slow,
        }
    }

    pub fn pool_mut(&mut self, kind: StruggleKind) -> &mut BTreeMap<String, PerformanceRecord> {
        match kind {
            StruggleKind::Wrong => &mut self.wrong,
            StruggleKind::Slow => &mut self.slow,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wrong.is_empty() && self.slow.is_empty()
    }

    pub fn len(&self) -> usize {
        self.wrong.len() + self.slow.len()
    }

    /// Whether the (unnormalized) question is tracked in either pool.
    pub fn contains(&self, question: &str) -> bool {
        let key = normalize_key(question);
        self.wrong.contains_key(&key) || self.slow.contains_key(&key)
    }

    /// Every record with the pool it lives in.
    pub fn iter(&self) -> impl Iterator<Item = (StruggleKind, &PerformanceRecord)> {
        self.wrong
            .values()
            .map(|r| (StruggleKind::Wrong, r))
            .chain(self.slow.values().map(|r| (StruggleKind::Slow, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("3 + 4"), "3+4");
        assert_eq!(normalize_key(" 12\t÷ 3 "), "12÷3");
        assert_eq!(normalize_key("√ 49"), "√49");
    }

    #[test]
    fn test_bump_caps_times() {
        let mut record = PerformanceRecord::new("3 + 4");
        let now = Utc::now();
        for ms in 1..=12 {
            record.bump(now, Some(ms));
        }
        assert_eq!(record.count, 12);
        assert_eq!(record.times, (3..=12).collect::<Vec<u64>>());
        assert_eq!(record.last_seen, Some(now));
    }

    #[test]
    fn test_bump_without_time() {
        let mut record = PerformanceRecord::new("3 + 4");
        record.bump(Utc::now(), None);
        assert_eq!(record.count, 1);
        assert!(record.times.is_empty());
        assert_eq!(record.average_time_ms(), None);
    }

    #[test]
    fn test_average_time() {
        let mut record = PerformanceRecord::new("3 + 4");
        record.bump(Utc::now(), Some(1000));
        record.bump(Utc::now(), Some(3000));
        assert_eq!(record.average_time_ms(), Some(2000.0));
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{"question":"6 × 7","count":2,"lastSeen":"2024-03-01T10:00:00.000Z","times":[5100,6200]}"#;
        let record: PerformanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.question, "6 × 7");
        assert_eq!(record.count, 2);
        assert!(record.last_seen.is_some());
        assert_eq!(record.times, vec![5100, 6200]);

        let back = serde_json::to_value(&record).unwrap();
        assert!(back.get("lastSeen").is_some());
        assert!(back.get("last_seen").is_none());
    }

    #[test]
    fn test_record_null_last_seen() {
        let json = r#"{"question":"1 + 1","count":1,"lastSeen":null,"times":[]}"#;
        let record: PerformanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.last_seen, None);
    }

    #[test]
    fn test_set_pools_contains_uses_normalized_key() {
        let mut pools = SetPools::default();
        pools
            .wrong
            .insert(normalize_key("3 + 4"), PerformanceRecord::new("3 + 4"));
        assert!(pools.contains("3+4"));
        assert!(!pools.contains("4 + 3"));
        assert_eq!(pools.len(), 1);
        assert_eq!(pools.iter().count(), 1);
    }
}
