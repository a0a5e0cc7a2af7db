use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use super::{CategoryStore, StoreError, TaskStore, UserStore};
use crate::models::{Category, Task, User};

const TASKS: &str = "tasks";
const CATEGORIES: &str = "categories";
const USERS: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let store = MongoStore { db: client.database(db_name) };
        store.ensure_indexes().await?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(unique_email).await?;

        let by_category = IndexModel::builder()
            .keys(doc! { "category_id": 1, "created_at": -1 })
            .build();
        self.tasks().create_index(by_category).await?;
        Ok(())
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection(TASKS)
    }

    fn categories(&self) -> Collection<Category> {
        self.db.collection(CATEGORIES)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn insert_error(err: MongoError, collection: &'static str, key: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate { collection, key: key.to_string() }
    } else {
        StoreError::Mongo(err)
    }
}

#[async_trait]
impl TaskStore for MongoStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let cursor = self
            .tasks()
            .find(doc! {})
            .sort(doc! { "created_at": -1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn tasks_in_category(&self, category_id: &str) -> Result<Vec<Task>, StoreError> {
        let cursor = self
            .tasks()
            .find(doc! { "category_id": category_id })
            .sort(doc! { "created_at": -1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks().find_one(doc! { "_id": id }).await?)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks()
            .insert_one(task)
            .await
            .map_err(|e| insert_error(e, TASKS, &task.id))?;
        Ok(())
    }

    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        let res = self.tasks().replace_one(doc! { "_id": &task.id }, task).await?;
        Ok(res.matched_count > 0)
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        let res = self.tasks().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }
}

#[async_trait]
impl CategoryStore for MongoStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let cursor = self.categories().find(doc! {}).sort(doc! { "_id": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.categories().find_one(doc! { "_id": id }).await?)
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        self.categories()
            .insert_one(category)
            .await
            .map_err(|e| insert_error(e, CATEGORIES, &category.id))?;
        Ok(())
    }

    async fn replace_category(&self, category: &Category) -> Result<bool, StoreError> {
        let res = self
            .categories()
            .replace_one(doc! { "_id": &category.id }, category)
            .await?;
        Ok(res.matched_count > 0)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, StoreError> {
        let res = self.categories().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "_id": user_id }).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users()
            .insert_one(user)
            .await
            .map_err(|e| insert_error(e, USERS, &user.email))?;
        Ok(())
    }
}
