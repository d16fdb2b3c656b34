pub mod kv;
pub mod record;
pub mod struggle;

pub use kv::{FileKvStore, KvStore, MemoryKvStore, SqliteKvStore};
pub use record::{normalize_key, PerformanceRecord, SetPools, StruggleKind, MAX_RECORDED_TIMES};
pub use struggle::{StruggleStore, STORAGE_KEY};
