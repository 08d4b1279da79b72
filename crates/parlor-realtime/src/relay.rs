//! Message relay — persist-then-broadcast for chat messages.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::traits::MessageStore;
use parlor_core::types::{
    ChannelId, NewMessage, SenderInfo, StoredMessage, TenantId, DEFAULT_CONTENT_TYPE,
};

use crate::connection::ConnectionId;
use crate::events::{MessagePayload, OutboundEvent};
use crate::groups::{GroupEvent, GroupName, GroupRegistry};
use crate::receipts::ReadReceiptTracker;

/// Relays chat messages: validate, persist, broadcast, in that order.
///
/// A per-channel async mutex spans persist + publish, so a channel's delivery
/// order is exactly its persist order. Channels are independent; a slow store
/// call in one channel never delays another.
pub struct MessageRelay {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn GroupRegistry>,
    receipts: Arc<ReadReceiptTracker>,
    ordering: DashMap<ChannelId, Arc<Mutex<()>>>,
}

impl MessageRelay {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn GroupRegistry>,
        receipts: Arc<ReadReceiptTracker>,
    ) -> Self {
        Self {
            store,
            registry,
            receipts,
            ordering: DashMap::new(),
        }
    }

    /// Persists a message and broadcasts it to the channel's chat group.
    ///
    /// Nothing is broadcast if the store rejects the append. The author's
    /// connection is excluded from delivery (echo suppression); their other
    /// devices receive the message through the same group. The author's own
    /// read is recorded silently.
    pub async fn relay(
        &self,
        origin: ConnectionId,
        tenant_id: TenantId,
        channel_id: ChannelId,
        sender: SenderInfo,
        content: String,
        content_type: Option<String>,
    ) -> AppResult<StoredMessage> {
        if content.trim().is_empty() {
            return Err(AppError::validation("Message content must not be empty"));
        }

        let lock = self
            .ordering
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _ordered = lock.lock().await;

        let author_id = sender.user_id;
        let stored = self
            .store
            .append(NewMessage {
                channel_id,
                tenant_id,
                sender,
                content,
                content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            })
            .await?;

        let group = GroupName::Chat {
            tenant_id,
            channel_id,
        };
        self.registry
            .publish(
                &group,
                GroupEvent::from_connection(
                    origin,
                    OutboundEvent::ChatMessage {
                        message: MessagePayload::from_stored(&stored, Vec::new()),
                    },
                ),
            )
            .await?;

        if let Err(err) = self.receipts.note_own_message(author_id, &stored).await {
            warn!(
                message_id = %stored.id,
                user_id = %author_id,
                error = %err,
                "Failed to record author's own read"
            );
        }

        Ok(stored)
    }
}
