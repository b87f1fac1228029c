use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::app::error::{Result, TidingsError};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::notifier::{Notifier, TelegramClient};
use crate::poller::Poller;
use crate::store::StateStore;

/// Wires the components together: the lock-guarded state store, the fetch and
/// notification capabilities, and the wake handle connecting the dispatcher
/// to the poller.
pub struct AppContext {
    pub state: Arc<Mutex<StateStore>>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
    pub telegram: Arc<TelegramClient>,
    pub wake: Arc<Notify>,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<Self> {
        let paths = config
            .store_paths()
            .map_err(|e| TidingsError::Config(e.to_string()))?;
        let state = StateStore::open(&paths, config.feeds.clone(), config.destinations.clone())?;

        let telegram = Arc::new(TelegramClient::new(
            &config.telegram.token,
            config.telegram.proxy.as_deref(),
        )?);

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            fetcher: Arc::new(HttpFetcher::new()?),
            normalizer: Normalizer::new(),
            telegram,
            wake: Arc::new(Notify::new()),
        })
    }

    pub fn notifier(&self) -> Arc<dyn Notifier + Send + Sync> {
        self.telegram.clone()
    }

    pub fn poller(&self) -> Poller {
        Poller::new(
            self.state.clone(),
            self.fetcher.clone(),
            self.normalizer.clone(),
            self.notifier(),
            self.wake.clone(),
        )
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.state.clone(),
            self.fetcher.clone(),
            self.normalizer.clone(),
            self.notifier(),
            self.wake.clone(),
        )
    }
}
