//! Storage interfaces for the three record collections.
//!
//! Each trait exposes exactly what the service surfaces need. Both backends
//! implement all three traits on a single struct so one connection (or one
//! set of in-memory maps) backs the whole application.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Category, Task, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same key (id, or e-mail for users) already exists.
    #[error("duplicate key in {collection}: {key}")]
    Duplicate { collection: &'static str, key: String },
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
    /// A stored record cannot be represented on the wire.
    #[error("corrupt record {id} in {collection}: {reason}")]
    Corrupt { collection: &'static str, id: String, reason: String },
    #[error("lock poisoned on {0}")]
    Poisoned(&'static str),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, newest `created_at` first, ties by ascending id.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;
    /// Same ordering as `list_tasks`, restricted to an exact `category_id` match.
    async fn tasks_in_category(&self, category_id: &str) -> Result<Vec<Task>, StoreError>;
    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError>;
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;
    /// Returns `false` when no task with that id exists.
    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError>;
    /// Returns `false` when no task with that id exists.
    async fn delete_task(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn get_category(&self, id: &str) -> Result<Option<Category>, StoreError>;
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;
    async fn replace_category(&self, category: &Category) -> Result<bool, StoreError>;
    async fn delete_category(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` is expected lower-cased.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;
    /// Fails with `Duplicate` if the id or the e-mail is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
}
