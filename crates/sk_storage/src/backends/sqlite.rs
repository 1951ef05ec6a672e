use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sk_core::{Article, ArticleStorage, Error, NewArticle, NewUser, Result, User, UserStorage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        original_url TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        ai_summary TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, original_url)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_user_id ON articles (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

pub struct SQLiteStorage {
    pool: SqlitePool,
}

/// Current time at the precision stored, so a created record equals what
/// later reads return.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamps so that text order is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse date {:?}: {}", raw, e)))
}

fn storage_error(context: &str, e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(format!("{}: {}", context, db.message()))
        }
        e => Error::Storage(format!("{}: {}", context, e)),
    }
}

impl SQLiteStorage {
    /// Connect using a `sqlite://` URL, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| Error::ConfigMissing(format!("Invalid sqlite url {:?}: {}", database_url, e)))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to database: {}", e)))?;

        let storage = Self { pool };
        storage.migrate().await?;
        tracing::info!("💾 Connected to sqlite database {}", database_url);
        Ok(storage)
    }

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect(&format!("sqlite://{}", db_path.display())).await
    }

    async fn migrate(&self) -> Result<()> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }
        Ok(())
    }

    fn article_from_row(row: &SqliteRow) -> Result<Article> {
        let tags: String = row.get("tags");
        Ok(Article {
            id: row.get("id"),
            user_id: row.get("user_id"),
            original_url: row.get("original_url"),
            title: row.get("title"),
            description: row.get("description"),
            ai_summary: row.get("ai_summary"),
            tags: serde_json::from_str(&tags)?,
            is_read: row.get::<i64, _>("is_read") != 0,
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    }

    fn user_from_row(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn find_by_user_and_url(&self, user_id: &str, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE user_id = ? AND original_url = ?")
            .bind(user_id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to look up article", e))?;

        row.as_ref().map(Self::article_from_row).transpose()
    }

    async fn create_article(&self, article: NewArticle) -> Result<Article> {
        let article = article.into_article(now());
        let tags = serde_json::to_string(&article.tags)?;

        sqlx::query(
            r#"
            INSERT INTO articles
            (id, user_id, original_url, title, description, ai_summary, tags, is_read, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.id)
        .bind(&article.user_id)
        .bind(&article.original_url)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.ai_summary)
        .bind(tags)
        .bind(article.is_read as i64)
        .bind(format_timestamp(&article.created_at))
        .bind(format_timestamp(&article.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to store article", e))?;

        Ok(article)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list articles", e))?;

        rows.iter().map(Self::article_from_row).collect()
    }
}

#[async_trait]
impl UserStorage for SQLiteStorage {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to look up user", e))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user(now());

        sqlx::query("INSERT INTO users (id, name, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(format_timestamp(&user.created_at))
            .bind(format_timestamp(&user.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to store user", e))?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_article(user_id: &str, url: &str) -> NewArticle {
        NewArticle {
            user_id: user_id.to_string(),
            original_url: url.to_string(),
            title: "Test Article".to_string(),
            ai_summary: "A test summary.".to_string(),
            tags: vec!["web".to_string(), "example".to_string()],
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        // Test database will be automatically cleaned up when temp_dir is dropped
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        let created = storage.create_article(new_article("u1", "http://example.com")).await.unwrap();
        let found = storage
            .find_by_user_and_url("u1", "http://example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.tags, vec!["web", "example"]);
        assert!(!found.is_read);
        assert_eq!(found, created);
        assert!(storage.find_by_user_and_url("u2", "http://example.com").await.unwrap().is_none());
    }

    #[test]
    fn test_now_roundtrips_through_storage_format() {
        let ts = now();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
    }

    #[tokio::test]
    async fn test_unique_user_and_url() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db")).await.unwrap();

        storage.create_article(new_article("u1", "http://example.com")).await.unwrap();
        let dup = storage.create_article(new_article("u1", "http://example.com")).await;
        assert!(matches!(dup, Err(Error::Conflict(_))));

        storage.create_article(new_article("u2", "http://example.com")).await.unwrap();
        assert_eq!(storage.list_by_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db")).await.unwrap();

        for i in 0..4 {
            storage
                .create_article(new_article("u1", &format!("http://example.com/{}", i)))
                .await
                .unwrap();
        }

        let articles = storage.list_by_user("u1").await.unwrap();
        let urls = articles.iter().map(|a| a.original_url.as_str()).collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                "http://example.com/3",
                "http://example.com/2",
                "http://example.com/1",
                "http://example.com/0"
            ]
        );
    }

    #[tokio::test]
    async fn test_users_unique_email() {
        let storage = SQLiteStorage::connect("sqlite::memory:").await.unwrap();

        let user = storage
            .create_user(NewUser::new("Ada", "ada@example.com").unwrap())
            .await
            .unwrap();
        let found = storage.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found, user);

        let dup = storage.create_user(NewUser::new("Other", "ada@example.com").unwrap()).await;
        assert!(matches!(dup, Err(Error::Conflict(_))));
    }
}
