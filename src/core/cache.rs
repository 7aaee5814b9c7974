use super::clock::Clock;
use super::summary::FinancialSummary;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_TTL_HOURS: i64 = 24;
/// Longest lifetime accepted from configuration: one year.
pub const MAX_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub link_id: String,
    pub summary: Arc<FinancialSummary>,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Most recent financial summary per link, kept in memory for a fixed TTL.
///
/// Lookups share a read lock; stores and evictions take the write lock. An
/// expired entry is never handed out and is dropped by the lookup that finds
/// it.
pub struct ContextCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ContextCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `summary` for `link_id`, replacing any previous entry and
    /// restarting its lifetime.
    pub async fn put(
        &self,
        link_id: &str,
        summary: impl Into<Arc<FinancialSummary>>,
        owner_name: &str,
    ) {
        let created_at = self.clock.now();
        let entry = CacheEntry {
            link_id: link_id.to_string(),
            summary: summary.into(),
            owner_name: owner_name.to_string(),
            created_at,
            expires_at: created_at
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut entries = self.entries.write().await;
        debug!(link_id, expires_at = %entry.expires_at, "Cache PUT");
        entries.insert(link_id.to_string(), entry);
    }

    pub async fn get(&self, link_id: &str) -> Option<Arc<FinancialSummary>> {
        self.entry(link_id).await.map(|e| e.summary)
    }

    pub async fn entry(&self, link_id: &str) -> Option<CacheEntry> {
        {
            let entries = self.entries.read().await;
            match entries.get(link_id) {
                None => {
                    debug!(link_id, "Cache MISS");
                    return None;
                }
                Some(entry) if !entry.is_expired(self.clock.now()) => {
                    debug!(link_id, "Cache HIT");
                    return Some(entry.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: upgrade to the write lock and evict, unless a fresh entry
        // was stored in between.
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        match entries.get(link_id) {
            Some(entry) if !entry.is_expired(now) => {
                debug!(link_id, "Cache HIT after refresh");
                Some(entry.clone())
            }
            Some(_) => {
                entries.remove(link_id);
                debug!(link_id, "Cache entry expired, evicted");
                None
            }
            None => None,
        }
    }

    pub async fn remove(&self, link_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        debug!(link_id, "Cache REMOVE");
        entries.remove(link_id).is_some()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        debug!("Cache CLEAR");
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        debug!(purged, "Cache PURGE");
        purged
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
