use std::sync::Arc;

use crate::routes::TokenKeys;
use crate::store::{MemoryStore, TaskStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new<S>(store: S, tokens: TokenKeys) -> Self
    where
        S: TaskStore + UserStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            tasks: store.clone(),
            users: store,
            tokens: Arc::new(tokens),
        }
    }

    pub fn in_memory(tokens: TokenKeys) -> Self {
        Self::new(MemoryStore::new(), tokens)
    }
}
