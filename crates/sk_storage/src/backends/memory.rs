use async_trait::async_trait;
use chrono::Utc;
use sk_core::{Article, ArticleStorage, Error, NewArticle, NewUser, Result, User, UserStorage};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    users: Vec<User>,
}

impl MemoryStore {
    pub fn insert_article(&mut self, article: NewArticle) -> Result<Article> {
        if self
            .articles
            .iter()
            .any(|a| a.user_id == article.user_id && a.original_url == article.original_url)
        {
            return Err(Error::Conflict(format!(
                "article for {} already saved by user {}",
                article.original_url, article.user_id
            )));
        }
        let article = article.into_article(Utc::now());
        self.articles.push(article.clone());
        Ok(article)
    }

    pub fn insert_user(&mut self, user: NewUser) -> Result<User> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(Error::Conflict(format!("email {} already registered", user.email)));
        }
        let user = user.into_user(Utc::now());
        self.users.push(user.clone());
        Ok(user)
    }
}

/// Process-local store. Uniqueness checks and inserts happen under a single
/// write lock.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn find_by_user_and_url(&self, user_id: &str, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store
            .articles
            .iter()
            .find(|a| a.user_id == user_id && a.original_url == url)
            .cloned())
    }

    async fn create_article(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        store.insert_article(article)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        // Reverse insertion order first so the stable sort keeps the latest
        // insert ahead on equal timestamps.
        let mut articles = store
            .articles
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        store.insert_user(user)
    }
}
