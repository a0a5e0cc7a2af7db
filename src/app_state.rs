use std::sync::Arc;

use crate::config::Config;
use crate::store::{CategoryStore, MemoryStore, MongoStore, TaskStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub users: Arc<dyn UserStore>,
    pub config: Config,
}

impl AppState {
    pub fn with_mongo(store: MongoStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self {
            tasks: store.clone(),
            categories: store.clone(),
            users: store,
            config,
        }
    }

    pub fn with_memory(store: MemoryStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self {
            tasks: store.clone(),
            categories: store.clone(),
            users: store,
            config,
        }
    }
}
