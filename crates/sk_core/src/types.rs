use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::{Error, Result};

/// A saved link, summarized and tagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub user_id: String,
    pub original_url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub ai_summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the pipeline when creating an article. The store
/// assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub user_id: String,
    pub original_url: String,
    pub title: String,
    pub ai_summary: String,
    pub tags: Vec<String>,
}

impl NewArticle {
    pub fn into_article(self, now: DateTime<Utc>) -> Article {
        Article {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            original_url: self.original_url,
            title: self.title,
            description: String::new(),
            ai_summary: self.ai_summary,
            tags: self.tags,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleStatus {
    /// Created by this request.
    New,
    /// Already stored for this user and URL.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated, normalized login request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap())
}

impl NewUser {
    pub fn new(name: &str, email: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::Validation("email is required".to_string()));
        }
        if !email_regex().is_match(&email) {
            return Err(Error::Validation(format!("invalid email address: {}", email)));
        }

        Ok(Self {
            name: name.to_string(),
            email,
        })
    }

    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = NewUser::new("  Ada ", "  Ada@Example.COM ").unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_new_user_rejects_bad_input() {
        assert!(matches!(NewUser::new("", "a@b.co"), Err(Error::Validation(_))));
        assert!(matches!(NewUser::new("Ada", "   "), Err(Error::Validation(_))));
        assert!(matches!(NewUser::new("Ada", "not-an-email"), Err(Error::Validation(_))));
        assert!(matches!(NewUser::new("Ada", "ada@localhost"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_article_json_shape() {
        let article = NewArticle {
            user_id: "u1".to_string(),
            original_url: "https://example.com/post".to_string(),
            title: "Example".to_string(),
            ai_summary: "A short summary.".to_string(),
            tags: vec!["web".to_string()],
        }
        .into_article(Utc::now());

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["originalUrl"], "https://example.com/post");
        assert_eq!(json["aiSummary"], "A short summary.");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["description"], "");
        assert!(json.get("createdAt").is_some());
        assert_eq!(article.created_at, article.updated_at);
    }
}
