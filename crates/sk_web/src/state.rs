use std::sync::Arc;
use sk_core::UserStorage;
use sk_scrapers::ArticleManager;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: ArticleManager,
    pub users: Arc<dyn UserStorage>,
}

impl AppState {
    pub fn new(manager: ArticleManager, users: Arc<dyn UserStorage>) -> Self {
        Self { manager, users }
    }
}
