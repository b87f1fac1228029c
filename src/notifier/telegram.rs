//! Telegram Bot API client: the concrete notification channel and the inbound
//! command stream (long-polling `getUpdates`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::{Result, TidingsError};
use crate::notifier::Notifier;

/// How long the server may hold a `getUpdates` request open.
const LONG_POLL_SECS: u64 = 120;

pub struct TelegramClient {
    client: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    /// Build the Bot API client. The client carries no global timeout because
    /// `getUpdates` long-polls; per-request timeouts are set in [`call`].
    pub fn new(token: &str, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .user_agent("tidings/0.1.0");
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base: format!("https://api.telegram.org/bot{}", token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let reply: ApiReply<T> = response.json().await?;
        if !reply.ok {
            return Err(TidingsError::Telegram(
                reply
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ));
        }
        reply
            .result
            .ok_or_else(|| TidingsError::Telegram(format!("{}: empty result", method)))
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, html: bool) -> Result<Message> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if html {
            payload["parse_mode"] = json!("HTML");
        }
        self.call("sendMessage", &payload, Duration::from_secs(10))
            .await
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let payload = json!({ "chat_id": chat_id, "message_id": message_id });
        self.call::<bool>("deleteMessage", &payload, Duration::from_secs(10))
            .await
            .map(|_| ())
    }

    /// Long-poll for inbound updates at or after `offset`.
    pub async fn updates(&self, offset: i64) -> Result<Vec<Update>> {
        let payload = json!({ "offset": offset, "timeout": LONG_POLL_SECS });
        self.call(
            "getUpdates",
            &payload,
            Duration::from_secs(LONG_POLL_SECS + 10),
        )
        .await
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str, html: bool) -> Result<()> {
        self.send_message(chat_id, text, html).await.map(|_| ())
    }

    /// Send-and-discard: the probe message is deleted best-effort so it does
    /// not linger in the chat.
    async fn probe(&self, chat_id: i64) -> Result<()> {
        let message = self.send_message(chat_id, "Test", false).await?;
        if let Err(e) = self.delete_message(chat_id, message.message_id).await {
            tracing::debug!(chat_id, error = %e, "could not delete probe message");
        }
        Ok(())
    }
}
