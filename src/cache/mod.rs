//! Cache Module
//!
//! In-memory entry store with TTL expiration, insertion-order eviction and a
//! reverse tag index for bulk invalidation.

mod clock;
mod entry;
mod invalidation;
mod key;
mod options;
mod order;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryMetadata};
pub use invalidation::{compile_pattern, MAX_PATTERN_SIZE};
pub use key::{build_key, key_for, CacheKey, DEFAULT_METHOD, KEY_SEPARATOR};
pub use options::{CacheOptions, RequestOptions};
pub use order::InsertionOrder;
pub use stats::{CacheStats, EventKind, EventLog, StatsEvent};
pub use store::{EntryStore, Lookup};
pub use tags::{
    namespace_tag, normalize_tags, with_namespace_tag, TagIndex, DEFAULT_NAMESPACE,
    NAMESPACE_TAG_PREFIX,
};

// == Public Constants ==
/// Maximum number of hit/miss events retained in the event log
pub const EVENT_LOG_CAPACITY: usize = 100;
