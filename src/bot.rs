//! Bot runner — pulls updates from a channel and answers each one on its own
//! task.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::channels::{Channel, IncomingUpdate};
use crate::conversation::{ConversationService, Reply};
use crate::error::ChannelError;

pub struct BotRunner {
    channel: Arc<dyn Channel>,
    service: Arc<ConversationService>,
}

impl BotRunner {
    pub fn new(channel: Arc<dyn Channel>, service: Arc<ConversationService>) -> Self {
        Self { channel, service }
    }

    /// Run until the channel's update stream ends.
    pub async fn run(&self) -> Result<(), ChannelError> {
        let mut updates = self.channel.start().await?;
        info!(channel = self.channel.name(), "Bot started");

        while let Some(update) = updates.next().await {
            let channel = Arc::clone(&self.channel);
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                process_update(channel.as_ref(), &service, update).await;
            });
        }

        info!(channel = self.channel.name(), "Update stream closed");
        self.channel.shutdown().await
    }
}

/// Acknowledge, handle and answer one update. Returns the reply that was
/// delivered (or attempted), `None` when the update maps to no event.
pub async fn process_update(
    channel: &dyn Channel,
    service: &ConversationService,
    update: IncomingUpdate,
) -> Option<Reply> {
    if update.is_callback() {
        if let Err(e) = channel.acknowledge(&update).await {
            warn!(user = %update.user_id, "Failed to acknowledge button press: {e}");
        }
    }

    let Some(event) = update.to_event() else {
        debug!(user = %update.user_id, kind = ?update.kind, "Ignoring update with no event");
        return None;
    };

    let reply = service.handle(event).await;
    if let Err(e) = channel.deliver(&update, &reply).await {
        error!(
            user = %update.user_id,
            chat_id = %update.chat_id,
            "Failed to deliver reply: {e}"
        );
    }
    Some(reply)
}
