use std::collections::HashMap;

use pulse_core::TokenTab;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    All,
    Tab(TokenTab),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Tags fetches so only the newest request per key may write to the store.
#[derive(Debug, Default)]
pub struct QueryTracker {
    issued: u64,
    latest: HashMap<QueryKey, RequestId>,
}

impl QueryTracker {
    pub fn begin(&mut self, key: QueryKey) -> RequestId {
        self.issued += 1;
        let id = RequestId(self.issued);
        self.latest.insert(key, id);
        id
    }

    pub fn is_current(&self, key: QueryKey, id: RequestId) -> bool {
        self.latest.get(&key) == Some(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    pub stale_time: Duration,
    pub refetch_interval: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::seconds(45),
            refetch_interval: Duration::seconds(120),
        }
    }
}

impl QueryConfig {
    pub fn is_stale(&self, fetched_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        fetched_at.is_none_or(|at| now - at >= self.stale_time)
    }

    pub fn needs_refetch(&self, fetched_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        fetched_at.is_none_or(|at| now - at >= self.refetch_interval)
    }
}
