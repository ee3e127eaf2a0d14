use serde::{Deserialize, Serialize};

/// Selects one of the two independent thread collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Buyer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "self")]
    Local,
    #[serde(rename = "counterparty")]
    Counterparty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub time_label: String,
    pub status: MessageStatus,
}

/// Append input before an id has been assigned.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub sender: Sender,
    pub time_label: String,
    pub status: MessageStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub id: String,
    pub counterparty_id: String,
    pub counterparty_name: String,
    pub avatar_initials: String,
    pub last_message_text: String,
    pub last_message_time_label: String,
    pub unread_count: u32,
    pub is_online: bool,
    pub is_reported: bool,
    pub order_history_count: u32,
    pub messages: Vec<Message>,
}

impl ChatThread {
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    pub(crate) fn touch_last_message(&mut self, message: &Message) {
        self.last_message_text = message.text.clone();
        self.last_message_time_label = message.time_label.clone();
    }
}

/// The whole persisted structure; every slot read/write moves this as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDocument {
    pub buyer: Vec<ChatThread>,
    pub admin: Vec<ChatThread>,
}

impl ChatDocument {
    pub fn bucket(&self, audience: Audience) -> &[ChatThread] {
        match audience {
            Audience::Buyer => &self.buyer,
            Audience::Admin => &self.admin,
        }
    }

    pub fn bucket_mut(&mut self, audience: Audience) -> &mut Vec<ChatThread> {
        match audience {
            Audience::Buyer => &mut self.buyer,
            Audience::Admin => &mut self.admin,
        }
    }

    pub fn thread(&self, audience: Audience, thread_id: &str) -> Option<&ChatThread> {
        self.bucket(audience).iter().find(|t| t.id == thread_id)
    }

    pub fn thread_mut(&mut self, audience: Audience, thread_id: &str) -> Option<&mut ChatThread> {
        self.bucket_mut(audience)
            .iter_mut()
            .find(|t| t.id == thread_id)
    }

    pub fn unread_total(&self, audience: Audience) -> u32 {
        self.bucket(audience).iter().map(|t| t.unread_count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxStats {
    pub buyer_threads: u32,
    pub admin_threads: u32,
    pub messages: u32,
    pub unread: u32,
}

/// First letter of the first two words, uppercased.
pub fn avatar_initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(avatar_initials("Ahmad Rizki"), "AR");
        assert_eq!(avatar_initials("budi"), "B");
        assert_eq!(avatar_initials("Dewi Ayu Lestari"), "DA");
        assert_eq!(avatar_initials("  "), "");
    }

    #[test]
    fn unread_total_sums_one_bucket_only() {
        let mut doc = ChatDocument::default();
        doc.buyer.push(thread_with_unread("t1", 2));
        doc.buyer.push(thread_with_unread("t2", 3));
        doc.admin.push(thread_with_unread("t1", 7));
        assert_eq!(doc.unread_total(Audience::Buyer), 5);
        assert_eq!(doc.unread_total(Audience::Admin), 7);
    }

    #[test]
    fn thread_lookup_is_scoped_to_audience() {
        let mut doc = ChatDocument::default();
        doc.buyer.push(thread_with_unread("t1", 0));
        assert!(doc.thread(Audience::Buyer, "t1").is_some());
        assert!(doc.thread(Audience::Admin, "t1").is_none());
    }

    fn thread_with_unread(id: &str, unread: u32) -> ChatThread {
        ChatThread {
            id: id.to_string(),
            counterparty_id: format!("c-{}", id),
            counterparty_name: "Test".to_string(),
            avatar_initials: "T".to_string(),
            last_message_text: String::new(),
            last_message_time_label: String::new(),
            unread_count: unread,
            is_online: false,
            is_reported: false,
            order_history_count: 0,
            messages: Vec::new(),
        }
    }
}
