use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sk_core::{PageFetcher, Result};

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

/// Desktop Chrome, so sites serve the same page a reader would get.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Hard limit on loading one page
    pub timeout: Duration,
    /// Browser executable, detected when unset
    pub chrome_executable: Option<PathBuf>,
    pub no_sandbox: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            chrome_executable: None,
            no_sandbox: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherKind {
    /// Plain HTTP GET
    Http,
    /// Headless browser, renders JavaScript
    Browser,
}

impl FromStr for FetcherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "browser" | "chrome" => Ok(Self::Browser),
            other => Err(format!("unknown fetcher {:?}, expected http or browser", other)),
        }
    }
}

impl fmt::Display for FetcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

pub fn create_fetcher(kind: FetcherKind, config: FetchConfig) -> Result<Arc<dyn PageFetcher>> {
    let fetcher: Arc<dyn PageFetcher> = match kind {
        FetcherKind::Http => Arc::new(HttpFetcher::new(config)?),
        #[cfg(feature = "browser")]
        FetcherKind::Browser => Arc::new(BrowserFetcher::new(config)),
        #[cfg(not(feature = "browser"))]
        FetcherKind::Browser => {
            return Err(sk_core::Error::ConfigMissing(
                "browser fetcher requested but sk_scrapers was built without the `browser` feature".to_string(),
            ))
        }
    };
    tracing::info!("🦗 Page fetcher ready (using {})", fetcher.name());
    Ok(fetcher)
}
