pub mod telegram;

pub use telegram::TelegramClient;

use async_trait::async_trait;

use crate::app::Result;

/// Outbound notification capability.
///
/// One call delivers one message to one destination; failures are per
/// destination and never affect delivery to other destinations.
#[async_trait]
pub trait Notifier {
    async fn send(&self, chat_id: i64, text: &str, html: bool) -> Result<()>;

    /// Liveness probe for a destination: succeeds iff the channel can deliver
    /// to it. The default sends a throwaway message; implementations may
    /// clean up after themselves.
    async fn probe(&self, chat_id: i64) -> Result<()> {
        self.send(chat_id, "Test", false).await
    }
}
