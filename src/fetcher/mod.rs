pub mod http_fetcher;

pub use http_fetcher::HttpFetcher;

use async_trait::async_trait;

use crate::app::Result;

/// Feed transport boundary. Anything other than a 2xx response with a body is
/// an error; the caller decides whether that skips a cycle or fails a command.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
