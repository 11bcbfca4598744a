//! Session state: the persisted bearer token and its change notifications.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` is the durable backing store (file or memory), `store` is the
//! in-memory cache in front of it that every other layer reads from and that
//! the route guard subscribes to.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, StorageError, TokenStorage};
pub use store::{ClearReason, SessionEvent, SessionSnapshot, SessionStore, StorageBus, StorageChange};
