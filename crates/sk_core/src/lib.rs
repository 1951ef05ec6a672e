pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod types;

pub use error::Error;
pub use fetch::PageFetcher;
pub use models::LanguageModel;
pub use storage::{ArticleStorage, UserStorage, get_or_create_user};
pub use types::{Article, ArticleStatus, NewArticle, NewUser, User};

pub type Result<T> = std::result::Result<T, Error>;
