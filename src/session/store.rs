//! Session store: single source of truth for the current bearer token.
//!
//! DESIGN
//! ======
//! Storage is authoritative; the store keeps an in-memory copy plus a
//! generation counter that increases on every change. Only `set_token` and
//! `clear_token` mutate the session from inside the process. Changes made by
//! another store sharing the same storage (another "tab") arrive through the
//! `StorageBus` and are folded in by `resync`.
//!
//! Subscribers get `SessionEvent`s over a tokio broadcast channel. The
//! generation carried by each event lets consumers drop work started for a
//! session that no longer exists.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::storage::TokenStorage;
use crate::config::TOKEN_STORAGE_KEY;

const EVENT_CAPACITY: usize = 64;

/// Why the session was cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearReason {
    /// The user logged out.
    Logout,
    /// The API answered 401 to an authenticated request.
    Unauthorized,
    /// Role verification rejected the token.
    RoleRejected,
    /// Another store sharing the storage removed the token.
    External,
}

/// Session change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    TokenSet { generation: u64 },
    TokenCleared { generation: u64, reason: ClearReason },
}

impl SessionEvent {
    #[must_use]
    pub fn generation(self) -> u64 {
        match self {
            Self::TokenSet { generation } | Self::TokenCleared { generation, .. } => generation,
        }
    }
}

/// Token and generation read atomically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub generation: u64,
}

// =============================================================================
// CROSS-TAB BUS
// =============================================================================

/// A storage write performed by one store, announced to the others.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub origin: u64,
    pub key: String,
}

/// Best-effort broadcast of storage writes between stores that share a
/// backend, standing in for the browser's cross-tab storage event.
#[derive(Clone, Debug)]
pub struct StorageBus {
    tx: broadcast::Sender<StorageChange>,
    next_origin: Arc<AtomicU64>,
}

impl Default for StorageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx, next_origin: Arc::new(AtomicU64::new(1)) }
    }

    fn register(&self) -> u64 {
        self.next_origin.fetch_add(1, Ordering::Relaxed)
    }

    fn publish(&self, change: StorageChange) {
        // No other tabs listening is fine.
        let _ = self.tx.send(change);
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Cached {
    token: Option<String>,
    generation: u64,
}

pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    key: String,
    cached: Mutex<Cached>,
    events: broadcast::Sender<SessionEvent>,
    bus: Option<(StorageBus, u64)>,
}

impl SessionStore {
    /// Open a store over `storage`, loading any token already persisted.
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self::open(storage, None)
    }

    /// Like [`SessionStore::new`], also joining a cross-tab bus.
    #[must_use]
    pub fn with_bus(storage: Arc<dyn TokenStorage>, bus: &StorageBus) -> Self {
        let origin = bus.register();
        Self::open(storage, Some((bus.clone(), origin)))
    }

    fn open(storage: Arc<dyn TokenStorage>, bus: Option<(StorageBus, u64)>) -> Self {
        let key = TOKEN_STORAGE_KEY.to_owned();
        let token = read_token(storage.as_ref(), &key);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { storage, key, cached: Mutex::new(Cached { token, generation: 0 }), events, bus }
    }

    fn cached(&self) -> MutexGuard<'_, Cached> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.cached().token.clone()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.cached().generation
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let cached = self.cached();
        SessionSnapshot { token: cached.token.clone(), generation: cached.generation }
    }

    /// Receive every subsequent session change.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Persist `token` and announce the new session.
    pub fn set_token(&self, token: &str) -> u64 {
        let event = {
            let mut cached = self.cached();
            if let Err(e) = self.storage.set(&self.key, token) {
                tracing::warn!(error = %e, "failed to persist session token");
            }
            cached.token = Some(token.to_owned());
            cached.generation += 1;
            SessionEvent::TokenSet { generation: cached.generation }
        };
        tracing::info!(generation = event.generation(), "session token set");
        self.announce(event);
        event.generation()
    }

    /// Remove the token and announce the end of the session.
    pub fn clear_token(&self, reason: ClearReason) -> u64 {
        let event = {
            let mut cached = self.cached();
            self.clear_locked(&mut cached, reason)
        };
        tracing::info!(generation = event.generation(), ?reason, "session token cleared");
        self.announce(event);
        event.generation()
    }

    /// Clear the session only if it is still at `generation`.
    ///
    /// Used when the evidence against the token (a 401, a rejected role
    /// lookup) was gathered for a session that may since have been replaced.
    pub fn clear_if_current(&self, generation: u64, reason: ClearReason) -> bool {
        let event = {
            let mut cached = self.cached();
            if cached.generation != generation {
                tracing::debug!(generation, current = cached.generation, ?reason, "ignoring stale clear");
                return false;
            }
            self.clear_locked(&mut cached, reason)
        };
        tracing::info!(generation = event.generation(), ?reason, "session token cleared");
        self.announce(event);
        true
    }

    fn clear_locked(&self, cached: &mut Cached, reason: ClearReason) -> SessionEvent {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, "failed to remove persisted session token");
        }
        cached.token = None;
        cached.generation += 1;
        SessionEvent::TokenCleared { generation: cached.generation, reason }
    }

    /// Reload the token from storage after an external change.
    ///
    /// Returns the event emitted, or `None` when storage matched the cache.
    pub fn resync(&self) -> Option<SessionEvent> {
        let event = {
            let mut cached = self.cached();
            let stored = read_token(self.storage.as_ref(), &self.key);
            if stored == cached.token {
                return None;
            }
            cached.generation += 1;
            let event = if stored.is_some() {
                SessionEvent::TokenSet { generation: cached.generation }
            } else {
                SessionEvent::TokenCleared { generation: cached.generation, reason: ClearReason::External }
            };
            cached.token = stored;
            event
        };
        tracing::info!(generation = event.generation(), "session resynchronized from storage");
        let _ = self.events.send(event);
        Some(event)
    }

    /// Follow writes made by other stores on the bus until this store is
    /// dropped. Returns `None` when the store was opened without a bus.
    #[must_use]
    pub fn spawn_bus_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (bus, origin) = self.bus.as_ref()?;
        let origin = *origin;
        let mut rx = bus.subscribe();
        let key = self.key.clone();
        let store = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) if change.origin == origin || change.key != key => {}
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let Some(store) = store.upgrade() else { break };
                        store.resync();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    fn announce(&self, event: SessionEvent) {
        let _ = self.events.send(event);
        if let Some((bus, origin)) = &self.bus {
            bus.publish(StorageChange { origin: *origin, key: self.key.clone() });
        }
    }
}

fn read_token(storage: &dyn TokenStorage, key: &str) -> Option<String> {
    storage.get(key).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to read session token; treating as logged out");
        None
    })
}
