use crate::models::{
    avatar_initials, ChatDocument, ChatThread, Message, MessageStatus, Sender,
};

/// Cold-start document written on first access when the slot is empty.
/// Unread counts are kept consistent with the trailing counterparty
/// messages in each thread, the same way live bookkeeping would leave them.
pub fn default_fixtures() -> ChatDocument {
    let buyer = vec![
        thread(
            "t1",
            "u101",
            "Ahmad Rizki",
            true,
            false,
            4,
            vec![
                msg("seed:m1", Sender::Counterparty, "Halo, apakah produk ini ready stock?", "09:12", MessageStatus::Read),
                msg("seed:m2", Sender::Local, "Ready kak, silakan diorder.", "09:15", MessageStatus::Read),
                msg("seed:m3", Sender::Counterparty, "Baik, saya order 2 ya.", "09:20", MessageStatus::Delivered),
                msg("seed:m4", Sender::Counterparty, "Kira-kira sampai kapan?", "09:21", MessageStatus::Delivered),
            ],
            2,
        ),
        thread(
            "t2",
            "u102",
            "Siti Rahayu",
            false,
            false,
            1,
            vec![
                msg("seed:m1", Sender::Counterparty, "Terima kasih, paketnya sudah sampai!", "14:02", MessageStatus::Read),
                msg("seed:m2", Sender::Local, "Sama-sama kak, ditunggu ordernya lagi.", "14:10", MessageStatus::Read),
            ],
            0,
        ),
        thread(
            "t3",
            "u103",
            "Budi Santoso",
            false,
            true,
            0,
            vec![
                msg("seed:m1", Sender::Counterparty, "Barang tidak sesuai deskripsi!", "11:45", MessageStatus::Read),
                msg("seed:m2", Sender::Local, "Mohon maaf kak, bisa kirim fotonya?", "11:50", MessageStatus::Read),
            ],
            0,
        ),
    ];

    let admin = vec![
        thread(
            "t1",
            "a1",
            "Admin Marketplace",
            true,
            false,
            0,
            vec![
                msg("seed:m1", Sender::Counterparty, "Dokumen toko Anda sudah diverifikasi.", "08:30", MessageStatus::Read),
                msg("seed:m2", Sender::Counterparty, "Jangan lupa lengkapi alamat gudang.", "08:31", MessageStatus::Delivered),
            ],
            1,
        ),
        thread(
            "t2",
            "a2",
            "Tim Promosi",
            false,
            false,
            0,
            vec![
                msg("seed:m1", Sender::Local, "Apakah toko saya bisa ikut kampanye 9.9?", "16:40", MessageStatus::Read),
                msg("seed:m2", Sender::Counterparty, "Bisa, pendaftaran dibuka minggu depan.", "17:05", MessageStatus::Read),
            ],
            0,
        ),
    ];

    ChatDocument { buyer, admin }
}

fn thread(
    id: &str,
    counterparty_id: &str,
    counterparty_name: &str,
    is_online: bool,
    is_reported: bool,
    order_history_count: u32,
    messages: Vec<Message>,
    unread_count: u32,
) -> ChatThread {
    let last = messages.last();
    ChatThread {
        id: id.to_string(),
        counterparty_id: counterparty_id.to_string(),
        counterparty_name: counterparty_name.to_string(),
        avatar_initials: avatar_initials(counterparty_name),
        last_message_text: last.map(|m| m.text.clone()).unwrap_or_default(),
        last_message_time_label: last.map(|m| m.time_label.clone()).unwrap_or_default(),
        unread_count,
        is_online,
        is_reported,
        order_history_count,
        messages,
    }
}

fn msg(id: &str, sender: Sender, text: &str, time_label: &str, status: MessageStatus) -> Message {
    Message {
        id: id.to_string(),
        text: text.to_string(),
        sender,
        time_label: time_label.to_string(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Audience;

    #[test]
    fn fixtures_have_both_buckets() {
        let doc = default_fixtures();
        assert!(!doc.buyer.is_empty());
        assert!(!doc.admin.is_empty());
    }

    #[test]
    fn fixture_unread_matches_trailing_counterparty_messages() {
        let doc = default_fixtures();
        for thread in doc.buyer.iter().chain(doc.admin.iter()) {
            let trailing = thread
                .messages
                .iter()
                .rev()
                .take_while(|m| m.sender == Sender::Counterparty)
                .count() as u32;
            assert!(
                thread.unread_count <= trailing,
                "thread {} claims more unread than trailing counterparty messages",
                thread.id
            );
        }
    }

    #[test]
    fn fixture_last_message_cache_matches_messages() {
        let doc = default_fixtures();
        let thread = doc.thread(Audience::Buyer, "t1").expect("seeded thread");
        let last = thread.messages.last().expect("messages");
        assert_eq!(thread.last_message_text, last.text);
        assert_eq!(thread.last_message_time_label, last.time_label);
    }
}
