pub mod db;
pub mod delivery;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod models;
pub mod seed;
pub mod store;
mod migrations;

pub use db::{open_store, MemorySlot, SlotStore, SqliteSlot};
pub use error::StoreError;
pub use store::ChatStore;
