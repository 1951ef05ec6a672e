pub mod extractor;
pub mod fetch;
pub mod manager;

pub use extractor::{ExtractedPage, Extractor};
pub use fetch::{create_fetcher, FetchConfig, FetcherKind, HttpFetcher};
pub use manager::{ArticleManager, PipelineStage};

#[cfg(feature = "browser")]
pub use fetch::BrowserFetcher;

pub mod prelude {
    pub use super::manager::ArticleManager;
    pub use sk_core::{Article, ArticleStatus, PageFetcher, Result, Error};
}
