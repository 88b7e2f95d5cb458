// src/services/storage_service.rs
use crate::errors::BackdropError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable key-value storage behind the project store. Implementations must
/// tolerate missing keys (`get` returns `None`) so a fresh deployment starts
/// with empty state.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BackdropError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), BackdropError>;
    async fn clear(&self, key: &str) -> Result<(), BackdropError>;
}

pub struct RedisStorage {
    client: Client,
}

impl RedisStorage {
    pub async fn new(redis_url: &str) -> Result<Self, BackdropError> {
        let client = Client::open(redis_url).map_err(|e| BackdropError::Storage(e.to_string()))?;

        // Test connection
        let mut conn = client
            .get_async_connection()
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, BackdropError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))?;

        conn.get(key)
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackdropError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))?;

        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))
    }

    async fn clear(&self, key: &str) -> Result<(), BackdropError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| BackdropError::Storage(e.to_string()))
    }
}

/// Process-local storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, BackdropError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackdropError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), BackdropError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_set_get_clear() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some("v".to_string()));

        storage.clear("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }
}
