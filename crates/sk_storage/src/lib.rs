use std::sync::Arc;
use sk_core::{ArticleStorage, Error, Result, UserStorage};

pub mod backends;

pub use backends::*;

/// Handles onto one backend, split by collection.
#[derive(Clone)]
pub struct Storage {
    pub articles: Arc<dyn ArticleStorage>,
    pub users: Arc<dyn UserStorage>,
    pub backend: &'static str,
}

impl Storage {
    pub fn from_backend<T>(backend: T, name: &'static str) -> Self
    where
        T: ArticleStorage + UserStorage + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            articles: backend.clone(),
            users: backend,
            backend: name,
        }
    }
}

/// Open the store named by a connection URL: `memory://` or `sqlite://<path>`.
pub async fn create_storage(database_url: &str) -> Result<Storage> {
    let database_url = database_url.trim();
    if database_url.is_empty() {
        return Err(Error::ConfigMissing("DATABASE_URL is not set".to_string()));
    }

    if database_url.starts_with("memory:") {
        return Ok(Storage::from_backend(InMemoryStorage::new(), "memory"));
    }

    if database_url.starts_with("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            let storage = SQLiteStorage::connect(database_url).await?;
            return Ok(Storage::from_backend(storage, "sqlite"));
        }
        #[cfg(not(feature = "sqlite"))]
        return Err(Error::ConfigMissing(
            "sqlite storage requested but sk_storage was built without the `sqlite` feature".to_string(),
        ));
    }

    Err(Error::ConfigMissing(format!(
        "unsupported database url {:?}, expected memory:// or sqlite://<path>",
        database_url
    )))
}
