//! # Tidings
//!
//! A feed-polling notification daemon: watches a set of RSS/Atom feeds on an
//! interval and fans out newly seen items to subscribed Telegram chats.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Dedup/StateStore → Render → Notifier
//!                             ↑ ↓
//!                    Snapshot + Journal (durable state)
//! ```
//!
//! The poll cycle ([`poller`]) and the command handler ([`dispatcher`]) run
//! concurrently and share one lock-guarded [`store::StateStore`], which owns
//! the dedup index, the feed and destination lists, and the append-only
//! journal. At startup the snapshot is loaded, the previous run's journal is
//! replayed on top, a fresh snapshot is written, and the journal is recreated
//! empty. Delivery is at-least-once across restarts, exactly-once within a
//! run.

/// Application context and error handling.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration file loading (`~/.config/tidings/config.toml`).
pub mod config;

/// Inbound command parsing and dispatch.
pub mod dispatcher;

/// Core domain models: feed descriptors, items, fingerprints.
pub mod domain;

/// HTTP feed fetching.
///
/// - [`fetcher::Fetcher`]: async trait for the transport boundary
/// - [`fetcher::HttpFetcher`]: reqwest-based implementation
pub mod fetcher;

/// Feed parsing and normalization via feed-rs.
pub mod normalizer;

/// Outbound notification capability and the Telegram Bot API client.
pub mod notifier;

/// The periodic poll cycle.
pub mod poller;

/// Notification body rendering: hashtags and HTML layout.
pub mod render;

/// Durable state: snapshot, journal, and the in-memory working set.
pub mod store;
