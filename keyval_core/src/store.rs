use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tokio::time::{Duration, Instant};

use crate::error::StoreError;
use crate::value::Value;

pub type Key = String;

/// Contract shared by a single shard and the cluster that routes over many.
///
/// A missing or expired key is never an error: reads return `Ok(None)` and
/// `expire` returns `false`. The only runtime error is [`StoreError::WrongType`],
/// raised when an operation expects one value shape and the key holds the other.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stops background work. The first call succeeds; calling it again
    /// returns [`StoreError::Closed`].
    async fn shutdown(&self) -> Result<(), StoreError>;

    /// Updates only the expiration of an existing key, leaving the value
    /// untouched. Checks raw presence: a lazily-expired key that has not
    /// been swept yet still counts as existing, and a fresh positive `ttl`
    /// makes it readable again.
    async fn expire(&self, key: &str, ttl: Duration) -> bool;

    /// Creates or overwrites the key with a scalar value. This is the one
    /// operation allowed to replace a hash item with a scalar one.
    /// A zero `ttl` means the item never expires.
    async fn set(&self, key: Key, value: String, ttl: Duration);

    /// Returns the scalar value, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Deletes the key if present. Idempotent.
    async fn remove(&self, key: &str);

    /// Snapshot of all keys that are not expired at scan time. Weakly
    /// consistent with concurrent writers.
    async fn keys(&self) -> Vec<Key>;

    /// Returns the value stored at `field`, or `None` if the key is absent,
    /// expired, or the field is missing.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Sets `field` within the key's hash. An absent or expired key gets a
    /// fresh hash item with no expiration.
    async fn hset(&self, key: Key, field: String, value: String) -> Result<(), StoreError>;

    /// Deletes `field` from the key's hash. Deleting a missing field or a
    /// missing key is not an error.
    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError>;
}

/// A stored item: the tagged value plus its expiration marker.
#[derive(Debug, Clone)]
struct Item {
    value: Value,
    expires_at: Option<Instant>,
}

impl Item {
    fn expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() > at,
            None => false,
        }
    }
}

/// Converts a TTL into an absolute expiration. Zero means never.
fn expiration(ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        Some(Instant::now() + ttl)
    }
}

/// One shard: a key-to-item map behind its own reader/writer lock, with an
/// optional background sweeper that physically removes expired items.
#[derive(Debug)]
pub struct Store {
    items: Arc<RwLock<HashMap<Key, Item>>>,
    shutdown_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Store {
    /// Creates a store. A positive `clean_interval` starts a sweeper that
    /// wakes on that interval and deletes expired items; zero disables it
    /// and expiration is enforced lazily at access time.
    pub fn new(clean_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let items = Arc::new(RwLock::new(HashMap::new()));

        if !clean_interval.is_zero() {
            tokio::spawn(run_cleaner(Arc::clone(&items), clean_interval, shutdown_rx));
        }

        Self {
            items,
            shutdown_tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Raw entry count, including expired-but-unswept items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

/// Sweeper loop: wakes every `interval`, deletes expired items, and exits
/// when the shutdown signal fires or the store is dropped.
async fn run_cleaner(
    items: Arc<RwLock<HashMap<Key, Item>>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => delete_expired_items(&items).await,
            _ = shutdown_rx.changed() => return,
        }
    }
}

async fn delete_expired_items(items: &RwLock<HashMap<Key, Item>>) {
    let mut items = items.write().await;
    let before = items.len();
    items.retain(|_, item| !item.expired());

    let removed = before - items.len();
    if removed > 0 {
        tracing::debug!(removed, "swept expired items");
    }
}

#[async_trait]
impl Storage for Store {
    async fn shutdown(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let _ = self.shutdown_tx.send(true);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let expires_at = expiration(ttl);

        let mut items = self.items.write().await;
        match items.get_mut(key) {
            Some(item) => {
                item.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    async fn set(&self, key: Key, value: String, ttl: Duration) {
        let item = Item {
            value: Value::String(value),
            expires_at: expiration(ttl),
        };
        self.items.write().await.insert(key, item);
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.read().await;
        let item = match items.get(key) {
            Some(item) if !item.expired() => item,
            _ => return Ok(None),
        };

        match item.value.as_string() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(StoreError::WrongType),
        }
    }

    async fn remove(&self, key: &str) {
        self.items.write().await.remove(key);
    }

    async fn keys(&self) -> Vec<Key> {
        let items = self.items.read().await;
        items
            .iter()
            .filter(|(_, item)| !item.expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.read().await;
        let item = match items.get(key) {
            Some(item) if !item.expired() => item,
            _ => return Ok(None),
        };

        match item.value.as_hash() {
            Some(hash) => Ok(hash.get(field).cloned()),
            None => Err(StoreError::WrongType),
        }
    }

    async fn hset(&self, key: Key, field: String, value: String) -> Result<(), StoreError> {
        let mut items = self.items.write().await;

        let live = items.get(&key).map_or(false, |item| !item.expired());
        if !live {
            // absent, or expired and treated as absent: start a fresh hash
            let mut hash = HashMap::new();
            hash.insert(field, value);
            items.insert(
                key,
                Item {
                    value: Value::Hash(hash),
                    expires_at: None,
                },
            );
            return Ok(());
        }

        match items.get_mut(&key).and_then(|item| item.value.as_hash_mut()) {
            Some(hash) => {
                hash.insert(field, value);
                Ok(())
            }
            None => Err(StoreError::WrongType),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        let mut items = self.items.write().await;

        let expired = match items.get(key) {
            Some(item) => item.expired(),
            None => return Ok(()),
        };
        if expired {
            items.remove(key);
            return Ok(());
        }

        match items.get_mut(key).and_then(|item| item.value.as_hash_mut()) {
            Some(hash) => {
                hash.remove(field);
                Ok(())
            }
            None => Err(StoreError::WrongType),
        }
    }
}
