use crate::storage::TallyStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TallyStore>,
}

impl AppState {
    pub fn new(store: TallyStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
