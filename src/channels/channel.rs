//! Channel trait and the updates channels produce.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use super::callback::CallbackAction;
use crate::conversation::{InboundEvent, Reply};
use crate::error::ChannelError;

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// A typed message (commands included).
    Text(String),
    /// An inline button press.
    Callback { query_id: String, data: String },
}

/// One update from a channel, addressed back to where it came from.
#[derive(Debug, Clone)]
pub struct IncomingUpdate {
    pub channel: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub chat_id: String,
    /// For callbacks: the message carrying the pressed button.
    pub message_id: Option<i64>,
    pub kind: UpdateKind,
    pub received_at: DateTime<Utc>,
}

impl IncomingUpdate {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        chat_id: impl Into<String>,
        kind: UpdateKind,
    ) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            user_name: None,
            chat_id: chat_id.into(),
            message_id: None,
            kind,
            received_at: Utc::now(),
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_message_id(mut self, id: i64) -> Self {
        self.message_id = Some(id);
        self
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, UpdateKind::Callback { .. })
    }

    /// Map to a conversation event. `/start` and `/reset` are commands;
    /// other commands and unknown callback data map to nothing.
    pub fn to_event(&self) -> Option<InboundEvent> {
        let user = self.user_id.clone();
        match &self.kind {
            UpdateKind::Callback { data, .. } => {
                CallbackAction::parse(data).map(|a| a.into_event(user))
            }
            UpdateKind::Text(text) => {
                let trimmed = text.trim();
                let Some(command) = trimmed.strip_prefix('/') else {
                    return Some(InboundEvent::Text {
                        user,
                        text: text.clone(),
                    });
                };
                // "/start@SomeBot payload" → "start"
                let name = command
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default();
                match name {
                    "start" => Some(InboundEvent::Start { user }),
                    "reset" => Some(InboundEvent::Reset { user }),
                    _ => None,
                }
            }
        }
    }
}

pub type UpdateStream = Pin<Box<dyn Stream<Item = IncomingUpdate> + Send>>;

/// A bidirectional transport for the questionnaire.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start receiving updates.
    async fn start(&self) -> Result<UpdateStream, ChannelError>;

    /// Tell the transport a button press was received (stops the spinner).
    async fn acknowledge(&self, update: &IncomingUpdate) -> Result<(), ChannelError>;

    /// Render `reply` back to where `update` came from.
    async fn deliver(&self, update: &IncomingUpdate, reply: &Reply) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
