//! The poll cycle: the periodic driver of the ingestion pipeline.
//!
//! Each cycle walks every enabled feed, fetches and parses it, filters items
//! through the dedup index, journals each new fingerprint, and fans the item
//! out to every destination. The whole cycle runs as one critical section on
//! the state mutex: dedup decisions, journal appends, and the fan-out list are
//! atomic with respect to concurrent commands. A slow feed therefore delays
//! command mutations for up to the fetch timeout; that trade-off is bounded by
//! the fetcher's 10 second timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::interval;

use crate::domain::{fingerprint, FeedDescriptor};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::notifier::Notifier;
use crate::render;
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    /// Items not previously seen, journaled and fanned out this cycle.
    pub new_items: usize,
    /// Feed fetch/parse failures plus failed notification sends.
    pub errors: usize,
}

pub struct Poller {
    state: Arc<Mutex<StateStore>>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    notifier: Arc<dyn Notifier + Send + Sync>,
    wake: Arc<Notify>,
}

impl Poller {
    pub fn new(
        state: Arc<Mutex<StateStore>>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        notifier: Arc<dyn Notifier + Send + Sync>,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            state,
            fetcher,
            normalizer,
            notifier,
            wake,
        }
    }

    /// Run cycles forever: once immediately, then on every period tick and on
    /// every out-of-band wake from the command dispatcher. Returns on Ctrl-C
    /// or SIGTERM delivery (via `ctrl_c`).
    pub async fn run(&self, period: Duration) {
        tracing::info!(period_secs = period.as_secs(), "poller started");
        self.run_cycle().await;

        let mut timer = interval(period);
        timer.tick().await; // consume the immediate first tick

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    return;
                }
                _ = timer.tick() => {
                    tracing::debug!("scheduled poll cycle");
                    self.run_cycle().await;
                }
                _ = self.wake.notified() => {
                    tracing::debug!("on-demand poll cycle");
                    self.run_cycle().await;
                }
            }
        }
    }

    /// One complete pass over all enabled feeds.
    ///
    /// Never fails as a whole: feed-level and destination-level errors are
    /// logged and skipped, and the cycle continues with the next feed or
    /// destination.
    pub async fn run_cycle(&self) -> CycleStats {
        let mut state = self.state.lock().await;
        let feeds: Vec<FeedDescriptor> = state.feeds().to_vec();
        let destinations: Vec<i64> = state.destinations().to_vec();
        let mut stats = CycleStats::default();

        for feed in feeds.iter().filter(|f| f.enabled) {
            let body = match self.fetcher.fetch(&feed.url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(url = %feed.url, error = %e, "feed unavailable this cycle");
                    stats.errors += 1;
                    continue;
                }
            };

            let (meta, items) = match self.normalizer.normalize(&body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(url = %feed.url, error = %e, "feed unparseable this cycle");
                    stats.errors += 1;
                    continue;
                }
            };

            let title = meta.title.as_deref().unwrap_or(&feed.url);

            // Oldest first, so a batch of new items reaches destinations in
            // chronological order.
            for item in items.iter().rev() {
                let fp = fingerprint(item, &feed.hashing);
                if state.seen(fp) {
                    continue;
                }
                if let Err(e) = state.record_fingerprint(fp) {
                    // Not durable, so the notification is withheld; after a
                    // restart the item is delivered again (at-least-once).
                    tracing::error!(url = %feed.url, error = %e, "failed to journal fingerprint, withholding notification");
                    stats.errors += 1;
                    continue;
                }

                let text = render::message(title, item, &feed.tag_remaps);
                for &chat_id in &destinations {
                    if let Err(e) = self.notifier.send(chat_id, &text, true).await {
                        tracing::warn!(chat_id, url = %feed.url, error = %e, "notification failed");
                        stats.errors += 1;
                    }
                }
                stats.new_items += 1;
            }
        }

        tracing::info!(
            new_items = stats.new_items,
            errors = stats.errors,
            "poll cycle complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::app::{Result, TidingsError};
    use crate::store::StorePaths;

    struct MapFetcher {
        bodies: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| TidingsError::FeedParse(format!("no body for {}", url)))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<(i64, String)>>,
        fail_for: Option<i64>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, chat_id: i64, text: &str, _html: bool) -> Result<()> {
            if self.fail_for == Some(chat_id) {
                return Err(TidingsError::Telegram("unreachable chat".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id, text.to_string()));
            Ok(())
        }
    }

    const FEED_URL: &str = "https://example.com/feed.xml";

    // Newest-first, as feeds are published.
    const THREE_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Blog</title>
  <item><title>Third</title><link>https://example.com/3</link></item>
  <item><title>Second</title><link>https://example.com/2</link></item>
  <item><title>First</title><link>https://example.com/1</link></item>
</channel></rss>"#;

    fn poller_with(
        dir: &tempfile::TempDir,
        destinations: Vec<i64>,
        body: &str,
        notifier: Arc<RecordingNotifier>,
    ) -> Poller {
        let paths = StorePaths {
            snapshot: dir.path().join("snapshot.json"),
            journal: dir.path().join("journal.log"),
        };
        let state = StateStore::open(
            &paths,
            vec![FeedDescriptor::new(FEED_URL.into())],
            destinations,
        )
        .unwrap();
        let fetcher = MapFetcher {
            bodies: HashMap::from([(FEED_URL.to_string(), body.as_bytes().to_vec())]),
        };
        Poller::new(
            Arc::new(Mutex::new(state)),
            Arc::new(fetcher),
            Normalizer::new(),
            notifier,
            Arc::new(Notify::new()),
        )
    }

    #[tokio::test]
    async fn test_first_cycle_notifies_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = poller_with(&dir, vec![7], THREE_ITEMS, notifier.clone());

        let stats = poller.run_cycle().await;
        assert_eq!(stats.new_items, 3);
        assert_eq!(stats.errors, 0);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].1.contains("https://example.com/1"));
        assert!(sent[1].1.contains("https://example.com/2"));
        assert!(sent[2].1.contains("https://example.com/3"));
    }

    #[tokio::test]
    async fn test_second_cycle_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = poller_with(&dir, vec![7], THREE_ITEMS, notifier.clone());

        poller.run_cycle().await;
        let stats = poller.run_cycle().await;

        assert_eq!(stats.new_items, 0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_destination_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier {
            fail_for: Some(13),
            ..RecordingNotifier::default()
        });
        let poller = poller_with(&dir, vec![13, 7], THREE_ITEMS, notifier.clone());

        let stats = poller.run_cycle().await;
        assert_eq!(stats.new_items, 3);
        assert_eq!(stats.errors, 3);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|(chat_id, _)| *chat_id == 7));
    }

    #[tokio::test]
    async fn test_unfetchable_feed_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths {
            snapshot: dir.path().join("snapshot.json"),
            journal: dir.path().join("journal.log"),
        };
        let state = StateStore::open(
            &paths,
            vec![
                FeedDescriptor::new("https://down.example.com/feed.xml".into()),
                FeedDescriptor::new(FEED_URL.into()),
            ],
            vec![7],
        )
        .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = Poller::new(
            Arc::new(Mutex::new(state)),
            Arc::new(MapFetcher {
                bodies: HashMap::from([(FEED_URL.to_string(), THREE_ITEMS.as_bytes().to_vec())]),
            }),
            Normalizer::new(),
            notifier.clone(),
            Arc::new(Notify::new()),
        );

        let stats = poller.run_cycle().await;
        // First feed errors, second still delivers everything.
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.new_items, 3);
        assert_eq!(notifier.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_disabled_feed_not_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths {
            snapshot: dir.path().join("snapshot.json"),
            journal: dir.path().join("journal.log"),
        };
        let mut disabled = FeedDescriptor::new(FEED_URL.into());
        disabled.enabled = false;
        let state = StateStore::open(&paths, vec![disabled], vec![7]).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = Poller::new(
            Arc::new(Mutex::new(state)),
            Arc::new(MapFetcher {
                bodies: HashMap::from([(FEED_URL.to_string(), THREE_ITEMS.as_bytes().to_vec())]),
            }),
            Normalizer::new(),
            notifier.clone(),
            Arc::new(Notify::new()),
        );

        let stats = poller.run_cycle().await;
        assert_eq!(stats.new_items, 0);
        assert_eq!(stats.errors, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fingerprints_journaled_for_new_items() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = poller_with(&dir, vec![7], THREE_ITEMS, notifier);

        poller.run_cycle().await;
        poller.run_cycle().await;

        let entries = crate::store::Journal::replay(&dir.path().join("journal.log")).unwrap();
        // Three entries from the first cycle, none from the second.
        assert_eq!(entries.len(), 3);
    }
}
