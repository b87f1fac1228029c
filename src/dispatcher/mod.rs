//! Inbound command handling.
//!
//! Commands arrive over the notification channel (`/add_feed <url>`,
//! `/add_chat_id <id>`, `/update_feeds`, `/start`, `/ping`) and are parsed
//! into a closed [`Command`] enum. Every recognized command gets a direct
//! reply, either an acknowledgement or the failure reason; unrecognized text
//! is ignored. Mutating commands validate first and only touch the state
//! store on success.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use url::Url;

use crate::domain::FeedDescriptor;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::notifier::{Notifier, TelegramClient};
use crate::store::StateStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a feed URL after a validation fetch+parse.
    AddFeed(String),
    /// Register a destination chat after a liveness probe. Argument is kept
    /// raw so number-parse failures can be reported back to the requester.
    AddDestination(String),
    /// Schedule an out-of-band poll cycle.
    Update,
    Greet,
    Ping,
}

impl Command {
    /// Parse a message text into a command. Returns `None` for anything that
    /// isn't a recognized `/command`, including plain chatter.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix('/')?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        // Commands in group chats arrive as /name@botname.
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "add_feed" => Some(Command::AddFeed(args.to_string())),
            "add_chat_id" => Some(Command::AddDestination(args.to_string())),
            "update_feeds" => Some(Command::Update),
            "start" => Some(Command::Greet),
            "ping" => Some(Command::Ping),
            _ => None,
        }
    }
}

pub struct Dispatcher {
    state: Arc<Mutex<StateStore>>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    notifier: Arc<dyn Notifier + Send + Sync>,
    wake: Arc<Notify>,
}

impl Dispatcher {
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

    /// Execute one command and produce the reply text for the requester.
    pub async fn handle(&self, command: Command) -> String {
        match command {
            Command::Greet => "Hi!".to_string(),
            Command::Ping => "pong".to_string(),
            Command::Update => {
                self.wake.notify_one();
                "Update scheduled".to_string()
            }
            Command::AddFeed(url) => self.add_feed(url).await,
            Command::AddDestination(arg) => self.add_destination(&arg).await,
        }
    }

    async fn add_feed(&self, url: String) -> String {
        if url.is_empty() || Url::parse(&url).is_err() {
            return "Please send me a URL".to_string();
        }

        {
            let state = self.state.lock().await;
            if state.feeds().iter().any(|f| f.url == url) {
                return "Already watching that feed".to_string();
            }
        }

        // One synchronous fetch+parse attempt before mutating anything. The
        // state lock is not held across the network round-trip.
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => return format!("Could not fetch the feed: {}", e),
        };
        if self.normalizer.normalize(&body).is_err() {
            return "Check that the URL provides a valid RSS/Atom feed".to_string();
        }

        let mut state = self.state.lock().await;
        match state.add_feed(FeedDescriptor::new(url)) {
            Ok(()) => format!("Done! Watching {} feeds", state.feeds().len()),
            Err(e) => {
                tracing::error!(error = %e, "failed to record new feed");
                "Failed to record the feed, try again later".to_string()
            }
        }
    }

    async fn add_destination(&self, arg: &str) -> String {
        let chat_id: i64 = match arg.parse() {
            Ok(id) => id,
            Err(_) => return "Please send me a numeric chat id".to_string(),
        };

        if let Err(e) = self.notifier.probe(chat_id).await {
            tracing::debug!(chat_id, error = %e, "destination probe failed");
            return "Check that the bot has access to that chat".to_string();
        }

        let mut state = self.state.lock().await;
        match state.add_destination(chat_id) {
            Ok(()) => "Done!".to_string(),
            Err(e) => {
                tracing::error!(error = %e, "failed to record new destination");
                "Failed to record the chat, try again later".to_string()
            }
        }
    }

    /// Consume the inbound update stream forever, dispatching each command
    /// and replying to its chat. Transport errors back off briefly and retry.
    pub async fn run(&self, telegram: Arc<TelegramClient>) {
        let mut offset = 0i64;
        loop {
            let updates = match telegram.updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else { continue };
                let Some(text) = message.text.as_deref() else { continue };
                let Some(command) = Command::parse(text) else { continue };

                tracing::info!(chat_id = message.chat.id, ?command, "handling command");
                let reply = self.handle(command).await;
                if let Err(e) = self.notifier.send(message.chat.id, &reply, false).await {
                    tracing::warn!(chat_id = message.chat.id, error = %e, "failed to reply");
                }
            }
        }
    }
}
