use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::kv::KvStore;
use super::record::{normalize_key, PerformanceRecord, SetPools, StruggleKind};
use crate::catalog::QuestionSetId;

/// The single key the whole struggle blob is stored under.
pub const STORAGE_KEY: &str = "mathFactsProblematicQuestions";

static EMPTY_POOLS: SetPools = SetPools {
    wrong: BTreeMap::new(),
    slow: BTreeMap::new(),
};

/// Questions the learner got wrong or answered slowly, per question set.
///
/// The in-memory map is authoritative. Every mutation is written through to
/// the [`KvStore`] immediately; a failed write is logged and otherwise
/// ignored so a broken disk never ends a session.
pub struct StruggleStore {
    kv: Box<dyn KvStore>,
    pools: BTreeMap<QuestionSetId, SetPools>,
}

impl std::fmt::Debug for StruggleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StruggleStore")
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

impl StruggleStore {
    /// Load the blob from `kv`. Missing or unreadable data yields empty pools.
    pub fn load(kv: Box<dyn KvStore>) -> Self {
        let pools = match kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => parse_blob(&raw),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "could not read struggle store, starting empty");
                BTreeMap::new()
            }
        };

        let mut store = Self { kv, pools };
        store.ensure_all_sets();
        store.persist();
        store
    }

    /// Record one wrong or slow occurrence of `question`.
    pub fn record(
        &mut self,
        set: QuestionSetId,
        question: &str,
        kind: StruggleKind,
        thinking_time_ms: Option<u64>,
    ) {
        self.record_at(set, question, kind, thinking_time_ms, Utc::now());
    }

    pub fn record_at(
        &mut self,
        set: QuestionSetId,
        question: &str,
        kind: StruggleKind,
        thinking_time_ms: Option<u64>,
        now: DateTime<Utc>,
    ) {
        let key = normalize_key(question);
        let pools = self.pools.entry(set).or_default();

        // A question lives in one pool at a time; the latest outcome decides which.
        let other = match kind {
            StruggleKind::Wrong => StruggleKind::Slow,
            StruggleKind::Slow => StruggleKind::Wrong,
        };
        if pools.pool_mut(other).remove(&key).is_some() {
            debug!(%set, %key, from = %other, to = %kind, "moved struggle record");
        }

        let record = pools
            .pool_mut(kind)
            .entry(key)
            .or_insert_with(|| PerformanceRecord::new(question));
        record.bump(now, thinking_time_ms);
        debug!(%set, question, %kind, count = record.count, "recorded struggle");

        self.persist();
    }

    /// Forget `question` entirely (it has been mastered). Returns whether it
    /// was tracked.
    pub fn remove(&mut self, set: QuestionSetId, question: &str) -> bool {
        let key = normalize_key(question);
        let removed = match self.pools.get_mut(&set) {
            Some(pools) => {
                let wrong = pools.wrong.remove(&key).is_some();
                let slow = pools.slow.remove(&key).is_some();
                wrong || slow
            }
            None => false,
        };

        if removed {
            debug!(%set, question, "mastered, removed from struggle pools");
        }
        self.persist();
        removed
    }

    /// Wipe the durable blob and start over with empty pools.
    pub fn clear_all(&mut self) {
        if let Err(e) = self.kv.remove(STORAGE_KEY) {
            warn!(error = %e, "could not remove struggle store");
        }
        self.pools.clear();
        self.ensure_all_sets();
    }

    /// Reset the pools of a single set.
    pub fn clear_set(&mut self, set: QuestionSetId) {
        self.pools.insert(set, SetPools::default());
        self.persist();
    }

    pub fn snapshot(&self, set: QuestionSetId) -> &SetPools {
        self.pools.get(&set).unwrap_or(&EMPTY_POOLS)
    }

    pub fn all(&self) -> &BTreeMap<QuestionSetId, SetPools> {
        &self.pools
    }

    fn ensure_all_sets(&mut self) {
        for id in QuestionSetId::ALL {
            self.pools.entry(id).or_default();
        }
    }

    fn persist(&mut self) {
        let blob: BTreeMap<String, &SetPools> = self
            .pools
            .iter()
            .map(|(id, pools)| (id.to_string(), pools))
            .collect();

        let result = serde_json::to_string(&blob)
            .map_err(Into::into)
            .and_then(|json| self.kv.set(STORAGE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "could not persist struggle store, keeping in-memory state");
        }
    }
}

/// Parse the stored blob set by set, so one damaged entry does not cost the
/// learner the history of every other set.
fn parse_blob(raw: &str) -> BTreeMap<QuestionSetId, SetPools> {
    let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "struggle store is not valid JSON, starting empty");
            return BTreeMap::new();
        }
    };

    let mut pools = BTreeMap::new();
    for (name, value) in entries {
        let Ok(id) = name.parse::<QuestionSetId>() else {
            warn!(set = %name, "dropping struggle data for unknown question set");
            continue;
        };
        match serde_json::from_value::<SetPools>(value) {
            Ok(set_pools) => {
                pools.insert(id, set_pools);
            }
            Err(e) => {
                warn!(set = %id, error = %e, "malformed struggle data, resetting set");
            }
        }
    }
    pools
}
