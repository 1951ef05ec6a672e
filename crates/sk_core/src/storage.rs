use async_trait::async_trait;
use crate::types::{Article, NewArticle, NewUser, User};
use crate::{Error, Result};

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Look up the article a user saved for a URL
    async fn find_by_user_and_url(&self, user_id: &str, url: &str) -> Result<Option<Article>>;

    /// Create an article. Fails with `Error::Conflict` when the user already
    /// has an article for the same URL.
    async fn create_article(&self, article: NewArticle) -> Result<Article>;

    /// All articles of a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a user. Fails with `Error::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
}

/// Return the user registered under `user.email`, creating it on first sight.
/// The returned flag is true when the user was created by this call.
pub async fn get_or_create_user(storage: &dyn UserStorage, user: NewUser) -> Result<(User, bool)> {
    if let Some(existing) = storage.find_by_email(&user.email).await? {
        return Ok((existing, false));
    }

    let email = user.email.clone();
    match storage.create_user(user).await {
        Ok(created) => {
            tracing::info!("👤 Created user {} <{}>", created.id, created.email);
            Ok((created, true))
        }
        Err(Error::Conflict(reason)) => {
            tracing::warn!("User {} was created concurrently ({}), re-reading", email, reason);
            storage
                .find_by_email(&email)
                .await?
                .map(|u| (u, false))
                .ok_or_else(|| Error::Storage(format!("user {} vanished after conflict", email)))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    /// Reports the email as unknown once, then behaves like a store where a
    /// concurrent request already inserted the same user.
    struct RacingUsers {
        stored: Mutex<Option<User>>,
        raced: AtomicBool,
    }

    #[async_trait]
    impl UserStorage for RacingUsers {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(self.stored.lock().await.clone())
        }

        async fn create_user(&self, user: NewUser) -> Result<User> {
            *self.stored.lock().await = Some(user.into_user(Utc::now()));
            Err(Error::Conflict("email already registered".to_string()))
        }
    }

    #[tokio::test]
    async fn test_conflict_returns_existing_user() {
        let storage = RacingUsers {
            stored: Mutex::new(None),
            raced: AtomicBool::new(false),
        };
        let user = NewUser::new("Ada", "ada@example.com").unwrap();

        let (user, created) = get_or_create_user(&storage, user).await.unwrap();
        assert!(!created);
        assert_eq!(user.email, "ada@example.com");
    }
}
