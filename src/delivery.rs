use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::StoreError;
use crate::models::{Audience, Message, MessageStatus, NewMessage, Sender};
use crate::store::{current_time_label, ChatStore};

pub const DELIVERED_AFTER: Duration = Duration::from_millis(1000);
pub const READ_AFTER: Duration = Duration::from_millis(1500);

/// Local stand-in for delivery acknowledgments. A sent message is advanced
/// `sent -> delivered -> read` by a spawned worker on fixed delays; no real
/// counterparty is involved. If the thread or message is gone when a step
/// fires, the update drops silently through the store's no-op path.
pub struct DeliverySimulator {
    store: Arc<ChatStore>,
    delivered_after: Duration,
    read_after: Duration,
}

/// The appended message plus the ack worker's handle. Tests join the
/// handle with near-zero delays instead of sleeping wall-clock time.
pub struct SendReceipt {
    pub message: Message,
    pub acks: JoinHandle<()>,
}

impl DeliverySimulator {
    pub fn new(store: Arc<ChatStore>) -> Self {
        Self::with_delays(store, DELIVERED_AFTER, READ_AFTER)
    }

    pub fn with_delays(
        store: Arc<ChatStore>,
        delivered_after: Duration,
        read_after: Duration,
    ) -> Self {
        DeliverySimulator {
            store,
            delivered_after,
            read_after,
        }
    }

    /// The normal outbound send path: append at `sent`, then schedule the
    /// two acknowledgment steps. Returns `None` without side effects for
    /// blank text, a missing thread, or a reported thread.
    pub fn send(
        &self,
        thread_id: &str,
        text: &str,
        audience: Audience,
    ) -> Result<Option<SendReceipt>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let appended = self.store.append_message(
            thread_id,
            NewMessage {
                text: text.to_string(),
                sender: Sender::Local,
                time_label: current_time_label(),
                status: MessageStatus::Sent,
            },
            audience,
        )?;
        let message = match appended {
            Some(message) => message,
            None => return Ok(None),
        };

        let store = Arc::clone(&self.store);
        let thread_id = thread_id.to_string();
        let message_id = message.id.clone();
        let delivered_after = self.delivered_after;
        let read_after = self.read_after;
        let acks = thread::spawn(move || {
            thread::sleep(delivered_after);
            let _ = store.update_message_status(
                &thread_id,
                &message_id,
                MessageStatus::Delivered,
                audience,
            );
            thread::sleep(read_after);
            let _ = store.update_message_status(
                &thread_id,
                &message_id,
                MessageStatus::Read,
                audience,
            );
        });

        Ok(Some(SendReceipt { message, acks }))
    }
}
