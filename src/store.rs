use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::db::{open_store, MemorySlot, SlotStore};
use crate::diagnostics;
use crate::error::StoreError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{
    avatar_initials, Audience, ChatDocument, ChatThread, InboxStats, Message, MessageStatus,
    NewMessage, Sender,
};
use crate::seed::default_fixtures;

/// Single source of truth for chat threads, unread accounting, and
/// moderation state. Constructed once per application instance and handed
/// to consumers; every operation is a read-modify-write of the whole slot
/// document, so two stores sharing a slot race last-writer-wins over the
/// entire structure.
pub struct ChatStore {
    slot: Mutex<Box<dyn SlotStore>>,
    bus: EventBus,
    log_dir: Option<PathBuf>,
}

impl ChatStore {
    pub fn new(slot: impl SlotStore + 'static) -> Self {
        ChatStore {
            slot: Mutex::new(Box::new(slot)),
            bus: EventBus::new(),
            log_dir: None,
        }
    }

    /// Opens the default chat slot in the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(ChatStore::new(open_store(path)?))
    }

    pub fn in_memory() -> Self {
        ChatStore::new(MemorySlot::new())
    }

    /// Enables audit logging of moderation and reset operations.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<StoreEvent> {
        self.bus.subscribe()
    }

    /// Both buckets, seeding the fixture document on first access.
    pub fn get_all_chats(&self) -> Result<ChatDocument, StoreError> {
        let mut slot = self.lock_slot()?;
        load_or_seed(slot.as_mut())
    }

    pub fn get_chat_by_id(
        &self,
        thread_id: &str,
        audience: Audience,
    ) -> Result<Option<ChatThread>, StoreError> {
        let doc = self.get_all_chats()?;
        Ok(doc.thread(audience, thread_id).cloned())
    }

    /// Creates a thread for a new counterparty, prepended to its bucket.
    /// Blank or whitespace-only names are ignored and nothing is persisted.
    pub fn create_thread(
        &self,
        counterparty_name: &str,
        audience: Audience,
    ) -> Result<Option<ChatThread>, StoreError> {
        let name = counterparty_name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let stamp = next_stamp();
        let thread = ChatThread {
            id: format!("thread:{}", stamp),
            counterparty_id: format!("c:{}", stamp),
            counterparty_name: name.to_string(),
            avatar_initials: avatar_initials(name),
            last_message_text: String::new(),
            last_message_time_label: String::new(),
            unread_count: 0,
            is_online: false,
            is_reported: false,
            order_history_count: 0,
            messages: Vec::new(),
        };
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        doc.bucket_mut(audience).insert(0, thread.clone());
        persist(slot.as_mut(), &doc)?;
        Ok(Some(thread))
    }

    /// Appends a message and refreshes the thread's last-message cache.
    /// The unread count moves only for counterparty messages. Returns the
    /// stored message, or `None` when the thread is absent or reported —
    /// a reported thread accepts no further messages from either side.
    pub fn append_message(
        &self,
        thread_id: &str,
        message: NewMessage,
        audience: Audience,
    ) -> Result<Option<Message>, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(None),
        };
        if thread.is_reported {
            self.audit("append_refused", &format!("thread {} is reported", thread_id));
            return Ok(None);
        }
        let stored = Message {
            id: format!("msg:{}", next_stamp()),
            text: message.text,
            sender: message.sender,
            time_label: message.time_label,
            status: message.status,
        };
        thread.messages.push(stored.clone());
        thread.touch_last_message(&stored);
        let from_counterparty = stored.sender == Sender::Counterparty;
        if from_counterparty {
            thread.unread_count += 1;
        }
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        if from_counterparty {
            self.bus.publish(StoreEvent::UnreadChanged);
        }
        Ok(Some(stored))
    }

    /// In-place status update; absent thread or message is a silent no-op,
    /// which also covers acknowledgment timers outliving their target.
    pub fn update_message_status(
        &self,
        thread_id: &str,
        message_id: &str,
        status: MessageStatus,
        audience: Audience,
    ) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(false),
        };
        let message = match thread.message_mut(message_id) {
            Some(message) => message,
            None => return Ok(false),
        };
        if message.status == status {
            return Ok(true);
        }
        message.status = status;
        persist(slot.as_mut(), &doc)?;
        Ok(true)
    }

    pub fn mark_thread_read(
        &self,
        thread_id: &str,
        audience: Audience,
    ) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(false),
        };
        if thread.unread_count == 0 {
            return Ok(true);
        }
        thread.unread_count = 0;
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        self.bus.publish(StoreEvent::UnreadChanged);
        Ok(true)
    }

    /// Moderation lock. Once set, the thread accepts no further messages
    /// until `unreport_thread` clears it.
    pub fn report_thread(&self, thread_id: &str, audience: Audience) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(false),
        };
        if thread.is_reported {
            return Ok(true);
        }
        thread.is_reported = true;
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        self.audit("report", &format!("thread {} reported", thread_id));
        self.bus.publish(StoreEvent::ThreadReported);
        Ok(true)
    }

    /// Administrative escape hatch; not reachable from the normal flow.
    pub fn unreport_thread(&self, thread_id: &str, audience: Audience) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(false),
        };
        if !thread.is_reported {
            return Ok(true);
        }
        thread.is_reported = false;
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        self.audit("unreport", &format!("thread {} unreported", thread_id));
        Ok(true)
    }

    /// Moderation bulk clear: drops every message and the last-message
    /// cache; individual messages are never deleted any other way.
    pub fn clear_messages(&self, thread_id: &str, audience: Audience) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let thread = match doc.thread_mut(audience, thread_id) {
            Some(thread) => thread,
            None => return Ok(false),
        };
        let had_unread = thread.unread_count > 0;
        thread.messages.clear();
        thread.last_message_text.clear();
        thread.last_message_time_label.clear();
        thread.unread_count = 0;
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        self.audit("clear_messages", &format!("thread {} cleared", thread_id));
        if had_unread {
            self.bus.publish(StoreEvent::UnreadChanged);
        }
        Ok(true)
    }

    pub fn delete_thread(&self, thread_id: &str, audience: Audience) -> Result<bool, StoreError> {
        let mut slot = self.lock_slot()?;
        let mut doc = load_or_seed(slot.as_mut())?;
        let bucket = doc.bucket_mut(audience);
        let before = bucket.len();
        let had_unread = bucket
            .iter()
            .any(|t| t.id == thread_id && t.unread_count > 0);
        bucket.retain(|t| t.id != thread_id);
        if bucket.len() == before {
            return Ok(false);
        }
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        if had_unread {
            self.bus.publish(StoreEvent::UnreadChanged);
        }
        Ok(true)
    }

    pub fn unread_count(&self, audience: Audience) -> Result<u32, StoreError> {
        Ok(self.get_all_chats()?.unread_total(audience))
    }

    pub fn total_unread_count(&self) -> Result<u32, StoreError> {
        let doc = self.get_all_chats()?;
        Ok(doc.unread_total(Audience::Buyer) + doc.unread_total(Audience::Admin))
    }

    pub fn inbox_stats(&self) -> Result<InboxStats, StoreError> {
        let doc = self.get_all_chats()?;
        let messages: u32 = doc
            .buyer
            .iter()
            .chain(doc.admin.iter())
            .map(|t| t.messages.len() as u32)
            .sum();
        Ok(InboxStats {
            buyer_threads: doc.buyer.len() as u32,
            admin_threads: doc.admin.len() as u32,
            messages,
            unread: doc.unread_total(Audience::Buyer) + doc.unread_total(Audience::Admin),
        })
    }

    /// Destructive demo/testing reset: drops the slot and reseeds.
    pub fn reset_to_fixtures(&self) -> Result<ChatDocument, StoreError> {
        let mut slot = self.lock_slot()?;
        slot.clear()?;
        let doc = default_fixtures();
        persist(slot.as_mut(), &doc)?;
        drop(slot);
        self.audit("reset", "slot reseeded with fixtures");
        self.bus.publish(StoreEvent::UnreadChanged);
        Ok(doc)
    }

    fn lock_slot(&self) -> Result<MutexGuard<'_, Box<dyn SlotStore>>, StoreError> {
        self.slot
            .lock()
            .map_err(|_| StoreError::InvalidArgument("slot lock poisoned".to_string()))
    }

    fn audit(&self, op: &str, detail: &str) {
        if let Some(dir) = &self.log_dir {
            let _ = diagnostics::log_event(dir, op, detail);
        }
    }
}

fn load_or_seed(slot: &mut dyn SlotStore) -> Result<ChatDocument, StoreError> {
    match slot.read()? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => {
            let doc = default_fixtures();
            persist(slot, &doc)?;
            Ok(doc)
        }
    }
}

fn persist(slot: &mut dyn SlotStore, doc: &ChatDocument) -> Result<(), StoreError> {
    slot.write(&serde_json::to_string(doc)?)
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that never repeats or goes backward within the
/// process, so ids stay distinguishable even for back-to-back calls.
fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let prev = LAST_STAMP
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
            Some(if now > last { now } else { last + 1 })
        })
        .unwrap_or(now);
    if now > prev {
        now
    } else {
        prev + 1
    }
}

pub fn current_time_label() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
