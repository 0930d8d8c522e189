//! Persistence boundary.
//!
//! This module provides:
//! - The [`KeyValueStore`] trait (get/set/remove of JSON values)
//! - [`MemoryStore`] and [`FileStore`] implementations
//! - [`Records`], typed helpers for the values the application persists

pub mod file;
pub mod memory;
pub mod records;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use records::Records;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Built-in system prompt '{0}' cannot be deleted")]
    ProtectedPrompt(String),

    #[error("No interaction has been logged yet")]
    EmptyLog,

    #[error("Validation score {0} is out of range (0-10)")]
    InvalidScore(u8),
}

/// A flat key/value store of JSON documents. No transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
