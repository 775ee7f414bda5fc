//! Telegram channel — long-polls the Bot API for messages and button presses.
//!
//! Replies are rendered as inline keyboards. Button presses edit the message
//! they came from; typed messages get a new message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::channel::{Channel, IncomingUpdate, UpdateKind, UpdateStream};
use super::keyboard;
use crate::conversation::{DeliveryMode, Reply};
use crate::dispatch::Notifier;
use crate::error::{ChannelError, DispatchError};

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-poll timeout passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Send a text message, Markdown first with plain-text fallback.
    /// Long messages are split; the keyboard goes on the last chunk.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&Value>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let markup = if i == last { markup } else { None };
            let body = message_body(chat_id, None, chunk, markup);
            self.post_with_fallback("sendMessage", body).await?;
        }
        Ok(())
    }

    /// Replace the text and keyboard of an existing message.
    pub async fn edit_message(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        markup: Option<&Value>,
    ) -> Result<(), ChannelError> {
        let body = message_body(chat_id, Some(message_id), text, markup);
        self.post_with_fallback("editMessageText", body).await
    }

    /// POST `body` with Markdown parse mode, retrying once without it when
    /// Telegram rejects the formatting.
    async fn post_with_fallback(&self, method: &str, body: Value) -> Result<(), ChannelError> {
        let mut markdown_body = body.clone();
        markdown_body["parse_mode"] = Value::String("Markdown".into());

        let markdown_resp = self
            .client
            .post(self.api_url(method))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        let markdown_err = markdown_resp.text().await.unwrap_or_default();
        if is_not_modified(&markdown_err) {
            tracing::debug!(method, "Telegram reports message is not modified");
            return Ok(());
        }
        tracing::warn!(
            status = ?markdown_status,
            method,
            "Telegram {method} with Markdown failed; retrying without parse_mode"
        );

        let plain_resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            if is_not_modified(&plain_err) {
                return Ok(());
            }
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "{method} failed (markdown: {}, plain: {})",
                    markdown_status, plain_err
                ),
            });
        }

        Ok(())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<UpdateStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let results = match poll_results(&data) {
                    Ok(results) => results,
                    Err(reason) => {
                        tracing::warn!("Telegram getUpdates rejected: {reason}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(parsed) = parse_update(update) else {
                        continue;
                    };

                    if !is_update_allowed(&allowed_users, &parsed) {
                        tracing::warn!(
                            "Telegram: ignoring update from unauthorized user: \
                             username={}, user_id={}",
                            parsed.user_name.as_deref().unwrap_or("unknown"),
                            parsed.user_id
                        );
                        continue;
                    }

                    if tx.send(parsed).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn acknowledge(&self, update: &IncomingUpdate) -> Result<(), ChannelError> {
        let UpdateKind::Callback { query_id, .. } = &update.kind else {
            return Ok(());
        };

        let resp = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&serde_json::json!({ "callback_query_id": query_id }))
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("answerCallbackQuery returned {}", resp.status()),
            });
        }
        Ok(())
    }

    async fn deliver(&self, update: &IncomingUpdate, reply: &Reply) -> Result<(), ChannelError> {
        if let Some(preamble) = &reply.preamble {
            self.send_message(&update.chat_id, preamble, None).await?;
        }

        let (text, markup) = keyboard::render(&reply.instruction);

        if let (DeliveryMode::EditInPlace, Some(message_id)) = (reply.delivery, update.message_id) {
            match self
                .edit_message(&update.chat_id, message_id, &text, markup.as_ref())
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        chat_id = %update.chat_id,
                        message_id,
                        "Edit in place failed, sending a new message: {e}"
                    );
                }
            }
        }

        self.send_message(&update.chat_id, &text, markup.as_ref())
            .await
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Operator notifications ──────────────────────────────────────────

/// Sends operator reports to a fixed Telegram chat (user, group or channel).
pub struct OperatorChat {
    channel: Arc<TelegramChannel>,
    chat_id: String,
}

impl OperatorChat {
    pub fn new(channel: Arc<TelegramChannel>, chat_id: impl Into<String>) -> Self {
        Self {
            channel,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for OperatorChat {
    fn destination(&self) -> String {
        format!("telegram:{}", self.chat_id)
    }

    async fn notify(&self, text: &str) -> Result<(), DispatchError> {
        self.channel
            .send_message(&self.chat_id, text, None)
            .await
            .map_err(|e| DispatchError::DispatchFailure {
                reason: e.to_string(),
            })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(token: &SecretString, method: &str) -> String {
    format!("https://api.telegram.org/bot{}/{method}", token.expose_secret())
}

fn message_body(chat_id: &str, message_id: Option<i64>, text: &str, markup: Option<&Value>) -> Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(id) = message_id {
        body["message_id"] = Value::from(id);
    }
    if let Some(markup) = markup {
        body["reply_markup"] = markup.clone();
    }
    body
}

/// Turn one getUpdates entry into an `IncomingUpdate`. Anything that is not
/// a text message or a callback query is skipped.
fn parse_update(update: &Value) -> Option<IncomingUpdate> {
    if let Some(query) = update.get("callback_query") {
        let from = query.get("from")?;
        let user_id = from.get("id").and_then(Value::as_i64)?.to_string();
        let query_id = query.get("id").and_then(Value::as_str)?.to_string();
        let data = query
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let message = query.get("message");
        let chat_id = message
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .map(|id| id.to_string())
            .unwrap_or_else(|| user_id.clone());

        let mut parsed = IncomingUpdate::new(
            "telegram",
            user_id,
            chat_id,
            UpdateKind::Callback { query_id, data },
        );
        if let Some(id) = message
            .and_then(|m| m.get("message_id"))
            .and_then(Value::as_i64)
        {
            parsed = parsed.with_message_id(id);
        }
        if let Some(name) = from.get("username").and_then(Value::as_str) {
            parsed = parsed.with_user_name(name);
        }
        return Some(parsed);
    }

    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;
    let from = message.get("from")?;
    let user_id = from.get("id").and_then(Value::as_i64)?.to_string();
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_else(|| user_id.clone());

    let mut parsed = IncomingUpdate::new(
        "telegram",
        user_id,
        chat_id,
        UpdateKind::Text(text.to_string()),
    );
    if let Some(name) = from.get("username").and_then(Value::as_str) {
        parsed = parsed.with_user_name(name);
    }
    Some(parsed)
}

/// Entries of a getUpdates reply, or the reason Telegram refused the poll
/// (revoked token, webhook conflict and the like).
fn poll_results(data: &Value) -> Result<&[Value], String> {
    if data.get("ok").and_then(Value::as_bool) == Some(false) {
        let code = data.get("error_code").and_then(Value::as_i64).unwrap_or_default();
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description");
        return Err(format!("{code} {description}"));
    }
    data.get("result")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| "reply has no result".to_string())
}

/// Telegram answers an edit that changes nothing with a 400; the message
/// on screen is already what we wanted.
fn is_not_modified(error_body: &str) -> bool {
    error_body.contains("message is not modified")
}

/// Whether the sender's id or username is on the allowlist.
fn is_update_allowed(allowed_users: &[String], update: &IncomingUpdate) -> bool {
    let mut identities = vec![update.user_id.as_str()];
    if let Some(name) = update.user_name.as_deref() {
        identities.push(name);
    }
    check_user_allowed(allowed_users, identities)
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Split a message into chunks of at most `max_len` bytes.
/// Tries to split on newlines, then spaces, then hard-cuts on a char
/// boundary.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut limit = max_len;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }

        // Find a good split point
        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { limit } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
