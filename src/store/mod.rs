//! Durable working state: feeds, destinations, and the dedup index.
//!
//! [`StateStore`] owns all mutable shared state plus the journal handle. It is
//! not internally thread-safe; callers share it behind a single
//! `tokio::sync::Mutex`, which serializes the poll cycle against command
//! mutations (one coarse lock domain covering both the dedup index + journal
//! and the feed/destination lists).
//!
//! Mutator contract: apply in memory, append to the journal, and report
//! success only once the append is on stable storage. In-memory state may run
//! ahead of durable state only transiently, inside a mutator call.

pub mod journal;
pub mod snapshot;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

pub use journal::{Journal, LogEntry};
pub use snapshot::PersistedState;

use crate::app::Result;
use crate::domain::FeedDescriptor;

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub snapshot: PathBuf,
    pub journal: PathBuf,
}

pub struct StateStore {
    feeds: Vec<FeedDescriptor>,
    destinations: Vec<i64>,
    seen: BTreeSet<u64>,
    journal: Journal,
}

impl StateStore {
    /// Rebuild working state and reopen the journal for a new run.
    ///
    /// Order matters: snapshot, then journal replay on top, then the config
    /// seed lists (descriptors from config override persisted formatting and
    /// hashing options for the same URL), then a fresh snapshot is written and
    /// the journal is recreated empty. Snapshot-write or journal-create
    /// failure is fatal here.
    pub fn open(
        paths: &StorePaths,
        seed_feeds: Vec<FeedDescriptor>,
        seed_destinations: Vec<i64>,
    ) -> Result<Self> {
        if let Some(parent) = paths.snapshot.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = paths.journal.parent() {
            fs::create_dir_all(parent)?;
        }

        let previous = snapshot::load(&paths.snapshot).unwrap_or_default();
        let mut feeds = previous.feeds;
        let mut destinations = previous.destinations;
        let mut seen: BTreeSet<u64> = previous.fingerprints.into_iter().collect();

        for entry in Journal::replay(&paths.journal)? {
            match entry {
                LogEntry::Fingerprint(hash) => {
                    seen.insert(hash);
                }
                LogEntry::Feed(url) => {
                    if !feeds.iter().any(|f| f.url == url) {
                        feeds.push(FeedDescriptor::new(url));
                    }
                }
                LogEntry::Destination(id) => {
                    if !destinations.contains(&id) {
                        destinations.push(id);
                    }
                }
            }
        }

        for seed in seed_feeds {
            match feeds.iter().position(|f| f.url == seed.url) {
                Some(i) => {
                    feeds[i].enabled = seed.enabled;
                    feeds[i].hashing = seed.hashing;
                    feeds[i].tag_remaps = seed.tag_remaps;
                }
                None => feeds.push(seed),
            }
        }
        for id in seed_destinations {
            if !destinations.contains(&id) {
                destinations.push(id);
            }
        }

        let persisted = PersistedState {
            fingerprints: seen.iter().copied().collect(),
            feeds: feeds.clone(),
            destinations: destinations.clone(),
        };
        // The snapshot must be durable before the old journal is truncated,
        // otherwise a crash between the two loses the replayed entries.
        snapshot::save(&paths.snapshot, &persisted)?;
        let journal = Journal::create(&paths.journal)?;

        Ok(Self {
            feeds,
            destinations,
            seen,
            journal,
        })
    }

    pub fn feeds(&self) -> &[FeedDescriptor] {
        &self.feeds
    }

    pub fn destinations(&self) -> &[i64] {
        &self.destinations
    }

    pub fn seen(&self, fingerprint: u64) -> bool {
        self.seen.contains(&fingerprint)
    }

    /// Mark a fingerprint as seen. Write-once: already-present fingerprints
    /// are a no-op with no journal traffic.
    pub fn record_fingerprint(&mut self, fingerprint: u64) -> Result<()> {
        if !self.seen.insert(fingerprint) {
            return Ok(());
        }
        self.journal.append(&LogEntry::Fingerprint(fingerprint))?;
        Ok(())
    }

    /// Register a feed. Duplicate URLs are a no-op.
    pub fn add_feed(&mut self, feed: FeedDescriptor) -> Result<()> {
        if self.feeds.iter().any(|f| f.url == feed.url) {
            return Ok(());
        }
        let url = feed.url.clone();
        self.feeds.push(feed);
        self.journal.append(&LogEntry::Feed(url))?;
        Ok(())
    }

    /// Register a destination. Duplicate ids are a no-op.
    pub fn add_destination(&mut self, id: i64) -> Result<()> {
        if self.destinations.contains(&id) {
            return Ok(());
        }
        self.destinations.push(id);
        self.journal.append(&LogEntry::Destination(id))?;
        Ok(())
    }

    /// Full working state as it would be snapshotted.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            fingerprints: self.seen.iter().copied().collect(),
            feeds: self.feeds.clone(),
            destinations: self.destinations.clone(),
        }
    }
}
