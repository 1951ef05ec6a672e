use std::fmt;
use std::sync::Arc;
use sk_core::{Article, ArticleStatus, ArticleStorage, Error, LanguageModel, NewArticle, PageFetcher, Result};
use sk_inference::Summarizer;
use tracing::Instrument;
use url::Url;
use crate::extractor::Extractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    DedupCheck,
    Fetch,
    Extract,
    Summarize,
    Persist,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::DedupCheck => "dedup-check",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Summarize => "summarize",
            Self::Persist => "persist",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Saves links for users: fetch, extract, summarize, persist.
#[derive(Clone)]
pub struct ArticleManager {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Option<Summarizer>,
    extractor: Extractor,
}

impl ArticleManager {
    /// `model` is `None` when no AI credential is configured. The manager
    /// still serves listings but every save fails with `ConfigMissing`.
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Arc<dyn PageFetcher>,
        model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            summarizer: model.map(Summarizer::new),
            extractor: Extractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn storage(&self) -> Arc<dyn ArticleStorage> {
        self.storage.clone()
    }

    /// Save `url` for `user_id`. Returns the stored article and whether this
    /// call created it.
    pub async fn save_url(&self, user_id: &str, url: &str) -> Result<(Article, ArticleStatus)> {
        let user_id = user_id.trim();
        let url = url.trim();
        let span = tracing::info_span!("save_url", user_id = %user_id, url = %url);

        async move {
            let mut stage = PipelineStage::Init;
            let result = self.run(user_id, url, &mut stage).await;
            match &result {
                Ok((article, status)) => {
                    tracing::info!("✅ Article {} ready ({:?})", article.id, status)
                }
                Err(e) => tracing::error!(stage = %stage, "❌ Failed to save {}: {}", url, e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, user_id: &str, url: &str, stage: &mut PipelineStage) -> Result<(Article, ArticleStatus)> {
        validate_request(user_id, url)?;
        let summarizer = self.summarizer.as_ref().ok_or_else(|| {
            Error::ConfigMissing("GEMINI_API_KEY is missing, cannot summarize articles".to_string())
        })?;

        *stage = PipelineStage::DedupCheck;
        if let Some(existing) = self.storage.find_by_user_and_url(user_id, url).await? {
            tracing::info!("📚 Already saved as {}", existing.id);
            *stage = PipelineStage::Done;
            return Ok((existing, ArticleStatus::Existing));
        }

        *stage = PipelineStage::Fetch;
        tracing::info!("🌐 Fetching with {}", self.fetcher.name());
        let html = self.fetcher.fetch(url).await?;

        *stage = PipelineStage::Extract;
        let page = self.extractor.extract(&html)?;
        tracing::info!("📰 Extracted {} characters, title {:?}", page.text.chars().count(), page.title);

        *stage = PipelineStage::Summarize;
        let payload = summarizer.summarize(&page.text, &page.title).await?;
        tracing::info!("✨ Summary ready with {} tags", payload.tags.len());

        *stage = PipelineStage::Persist;
        let new_article = NewArticle {
            user_id: user_id.to_string(),
            original_url: url.to_string(),
            title: payload.title.unwrap_or(page.title),
            ai_summary: payload.summary,
            tags: payload.tags,
        };

        let saved = match self.storage.create_article(new_article).await {
            Ok(article) => {
                tracing::info!("💾 Stored article {}", article.id);
                (article, ArticleStatus::New)
            }
            Err(Error::Conflict(reason)) => {
                tracing::warn!("Saved concurrently by another request ({}), re-reading", reason);
                let existing = self
                    .storage
                    .find_by_user_and_url(user_id, url)
                    .await?
                    .ok_or_else(|| Error::Storage(format!("article for {} vanished after conflict", url)))?;
                (existing, ArticleStatus::Existing)
            }
            Err(e) => return Err(e),
        };

        *stage = PipelineStage::Done;
        Ok(saved)
    }

    /// A user's articles, newest first.
    pub async fn list_articles(&self, user_id: &str) -> Result<Vec<Article>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::Validation("userId is required".to_string()));
        }
        self.storage.list_by_user(user_id).await
    }
}

fn validate_request(user_id: &str, url: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(Error::Validation("userId is required".to_string()));
    }
    if url.is_empty() {
        return Err(Error::Validation("url is required".to_string()));
    }
    let parsed = Url::parse(url).map_err(|e| Error::Validation(format!("invalid url {:?}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Validation(format!(
            "unsupported url scheme {:?}, expected http or https",
            scheme
        ))),
    }
}
