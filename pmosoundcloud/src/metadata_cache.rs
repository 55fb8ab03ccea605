//! Playback metadata cache and background-fetch guard
//!
//! A process-wide service object constructed once and passed by handle to
//! every component that needs it. Entries are keyed by track id and carry
//! a fixed TTL; entries past their TTL read as absent. The fetch guard
//! tracks one in-flight flag per `(client, track)` pair so concurrent
//! pollers never issue duplicate background fetches.
//!
//! The clock is injected so expiry is testable without waiting out the
//! TTL.

use crate::models::PlaybackMetadata;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Fixed time-to-live of cached playback metadata (24 hours)
pub const METADATA_TTL_SECS: i64 = 24 * 3600;

/// Injected clock used for TTL decisions
pub type ClockFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
struct CachedEntry {
    metadata: PlaybackMetadata,
    expires_at: DateTime<Utc>,
}

/// Metadata cache with TTL expiry plus the background-fetch guard
pub struct MetadataCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
    in_flight: Mutex<HashSet<(String, String)>>,
    ttl: Duration,
    clock: ClockFn,
}

impl MetadataCache {
    /// Create a cache with the fixed TTL and the system clock
    pub fn new() -> Self {
        Self::with_clock(Duration::seconds(METADATA_TTL_SECS), Arc::new(Utc::now))
    }

    /// Create a cache with an explicit TTL and clock (tests)
    pub fn with_clock(ttl: Duration, clock: ClockFn) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            ttl,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Read the metadata cached for a track; expired entries are absent
    pub fn get(&self, track_id: &str) -> Option<PlaybackMetadata> {
        let entries = self.entries.read().unwrap();
        entries
            .get(track_id)
            .filter(|entry| self.now() < entry.expires_at)
            .map(|entry| entry.metadata.clone())
    }

    /// Upsert the metadata for a track, restarting its TTL
    ///
    /// Single-key last-writer-wins: a foreground resolution may overwrite
    /// a concurrent background prefetch, both write the same shape.
    pub fn insert(&self, metadata: PlaybackMetadata) {
        let expires_at = self.now() + self.ttl;
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            metadata.track_id.clone(),
            CachedEntry {
                metadata,
                expires_at,
            },
        );
    }

    /// Atomically claim the background fetch for `(client, track)`
    ///
    /// Returns `true` when the caller now owns the fetch, `false` when one
    /// is already in flight for the pair.
    pub fn try_begin_fetch(&self, client_id: &str, track_id: &str) -> bool {
        let mut in_flight = self.in_flight.lock().unwrap();
        let claimed = in_flight.insert((client_id.to_string(), track_id.to_string()));
        if !claimed {
            debug!(
                "Fetch for track {} already in flight for client {}",
                track_id, client_id
            );
        }
        claimed
    }

    /// Clear the in-flight flag, on both success and failure paths
    pub fn end_fetch(&self, client_id: &str, track_id: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.remove(&(client_id.to_string(), track_id.to_string()));
    }

    /// Number of live (non-expired) entries
    pub fn entry_count(&self) -> usize {
        let now = self.now();
        let entries = self.entries.read().unwrap();
        entries.values().filter(|e| now < e.expires_at).count()
    }

    /// Number of fetches currently in flight
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        let now = self.now();
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, e| now < e.expires_at);
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.entries.read().unwrap().len())
            .field("in_flight", &self.in_flight_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}
