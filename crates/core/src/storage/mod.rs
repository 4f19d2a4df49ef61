//! Key-value persistence layer
//!
//! A small string-keyed store stands in for browser local storage: the
//! session manager and task store only ever see the [`KeyValueStore`] trait.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Result;

/// Keys shared by the session manager and task store.
pub mod keys {
    /// Opaque session token.
    pub const TOKEN: &str = "token";
    /// JSON-serialized user record.
    pub const USER: &str = "user";
    /// JSON-serialized task collection across all users.
    pub const TASKS: &str = "tasks";
}

/// String-keyed persistent storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value for a key, if present
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
