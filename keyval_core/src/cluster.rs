use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::Duration;

use crate::error::{ConfigError, StoreError};
use crate::hasher;
use crate::store::{Key, Storage, Store};

/// A fixed collection of independent shards with deterministic key routing.
///
/// Every single-key operation is delegated unchanged to exactly one shard;
/// only [`Storage::keys`] fans out across all of them. The shard list is
/// immutable after construction, so routing never changes for the lifetime
/// of a cluster instance.
pub struct Cluster {
    shards: Vec<Store>,
    count: usize,
}

impl Cluster {
    /// Creates `count` independent shards, each sweeping on `clean_interval`
    /// (zero disables active sweeping). Fails if `count` is zero.
    pub fn new(count: usize, clean_interval: Duration) -> Result<Self, ConfigError> {
        if count < 1 {
            return Err(ConfigError::Invalid(
                "cluster needs at least one shard".to_string(),
            ));
        }

        let shards = (0..count).map(|_| Store::new(clean_interval)).collect();
        Ok(Self { shards, count })
    }

    pub fn shard_count(&self) -> usize {
        self.count
    }

    fn shard_index(&self, key: &str) -> usize {
        hasher::sum32(key) as usize % self.count
    }

    fn shard(&self, key: &str) -> &Store {
        &self.shards[self.shard_index(key)]
    }
}

#[async_trait]
impl Storage for Cluster {
    async fn shutdown(&self) -> Result<(), StoreError> {
        for shard in &self.shards {
            shard.shutdown().await?;
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> bool {
        self.shard(key).expire(key, ttl).await
    }

    async fn set(&self, key: Key, value: String, ttl: Duration) {
        self.shard(&key).set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.shard(key).get(key).await
    }

    async fn remove(&self, key: &str) {
        self.shard(key).remove(key).await
    }

    async fn keys(&self) -> Vec<Key> {
        // one concurrent scan per shard, joined before concatenation; a key
        // lives on exactly one shard so no dedup is needed
        let scans = join_all(self.shards.iter().map(|shard| shard.keys())).await;
        scans.into_iter().flatten().collect()
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.shard(key).hget(key, field).await
    }

    async fn hset(&self, key: Key, field: String, value: String) -> Result<(), StoreError> {
        self.shard(&key).hset(key, field, value).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        self.shard(key).hdel(key, field).await
    }
}
