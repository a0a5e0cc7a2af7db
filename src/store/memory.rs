use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CategoryStore, StoreError, TaskStore, UserStore};
use crate::models::{Category, Task, User};

/// Process-local store used when no MongoDB URI is configured and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tasks: Mutex<HashMap<String, Task>>,
    categories: Mutex<HashMap<String, Category>>,
    users: Mutex<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    collection: &'static str,
) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned(collection))
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = lock(&self.tasks, "tasks")?;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by(newest_first);
        Ok(all)
    }

    async fn tasks_in_category(&self, category_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = lock(&self.tasks, "tasks")?;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| t.category_id.as_deref() == Some(category_id))
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        Ok(matching)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(lock(&self.tasks, "tasks")?.get(id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = lock(&self.tasks, "tasks")?;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate { collection: "tasks", key: task.id.clone() });
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        let mut tasks = lock(&self.tasks, "tasks")?;
        match tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.tasks, "tasks")?.remove(id).is_some())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let categories = lock(&self.categories, "categories")?;
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>, StoreError> {
        Ok(lock(&self.categories, "categories")?.get(id).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = lock(&self.categories, "categories")?;
        if categories.contains_key(&category.id) {
            return Err(StoreError::Duplicate {
                collection: "categories",
                key: category.id.clone(),
            });
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn replace_category(&self, category: &Category) -> Result<bool, StoreError> {
        let mut categories = lock(&self.categories, "categories")?;
        match categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.categories, "categories")?.remove(id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = lock(&self.users, "users")?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users, "users")?.get(user_id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = lock(&self.users, "users")?;
        if users.contains_key(&user.user_id) {
            return Err(StoreError::Duplicate { collection: "users", key: user.user_id.clone() });
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { collection: "users", key: user.email.clone() });
        }
        users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }
}
