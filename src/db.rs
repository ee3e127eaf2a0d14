use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::migrations::MIGRATIONS;

/// Default slot name; mirrors the single storage key the console UI reads.
pub const CHAT_SLOT: &str = "seller_chats";

/// A named slot holding one JSON document. Reads and writes always move the
/// whole document; there is no partial update. The second write to the same
/// slot wins wholesale over the first.
pub trait SlotStore: Send {
    fn read(&mut self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, document: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

pub struct SqliteSlot {
    pub path: PathBuf,
    conn: Connection,
    slot: String,
}

/// Opens (creating if needed) the slot database at `path` with the default
/// chat slot name.
pub fn open_store(path: impl AsRef<Path>) -> Result<SqliteSlot, StoreError> {
    SqliteSlot::open(path, CHAT_SLOT)
}

impl SqliteSlot {
    pub fn open(path: impl AsRef<Path>, slot: &str) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA journal_size_limit = 67108864; \
             PRAGMA temp_store = MEMORY;",
        )?;
        apply_migrations(&conn)?;
        Ok(SqliteSlot {
            path,
            conn,
            slot: slot.to_string(),
        })
    }

    pub fn open_in_memory(slot: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(SqliteSlot {
            path: PathBuf::new(),
            conn,
            slot: slot.to_string(),
        })
    }
}

impl SlotStore for SqliteSlot {
    fn read(&mut self) -> Result<Option<String>, StoreError> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM slots WHERE name = ?1;",
                params![self.slot],
                |row| row.get(0),
            )
            .optional()?;
        Ok(document)
    }

    fn write(&mut self, document: &str) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO slots (name, document, written_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name) DO UPDATE SET document = ?2, written_at = ?3;",
            params![self.slot, document, now],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM slots WHERE name = ?1;", params![self.slot])?;
        Ok(())
    }
}

/// Backend for tests and demos; same contract, no file behind it.
#[derive(Default)]
pub struct MemorySlot {
    document: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlot {
    fn read(&mut self) -> Result<Option<String>, StoreError> {
        Ok(self.document.clone())
    }

    fn write(&mut self, document: &str) -> Result<(), StoreError> {
        self.document = Some(document.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.document = None;
        Ok(())
    }
}

pub fn apply_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        version = next_version;
    }
    Ok(())
}
