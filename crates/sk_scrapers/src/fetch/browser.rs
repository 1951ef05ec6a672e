use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use sk_core::{Error, PageFetcher, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use super::FetchConfig;

/// Sub-resources that never carry article text.
const BLOCKED_RESOURCES: [ResourceType; 4] = [
    ResourceType::Image,
    ResourceType::Stylesheet,
    ResourceType::Font,
    ResourceType::Media,
];

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Bound on each of close+wait and kill.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Renders pages in headless Chrome. Every fetch launches its own browser
/// and tears it down before returning.
pub struct BrowserFetcher {
    config: FetchConfig,
}

impl BrowserFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

/// One browser process plus the task driving its CDP connection.
///
/// `close` is the normal exit. If the session is dropped without it (the
/// request future was cancelled), the handler task is aborted and
/// chromiumoxide kills the child process when `Browser` drops.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(config: &FetchConfig) -> Result<Self> {
        let profile_dir = std::env::temp_dir().join(format!(
            "sk-browser-{}-{}",
            std::process::id(),
            SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut builder = BrowserConfig::builder()
            .request_timeout(config.timeout)
            .launch_timeout(Duration::from_secs(20))
            .user_data_dir(&profile_dir)
            .args(vec![
                format!("--user-agent={}", config.user_agent),
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-extensions".to_string(),
                "--no-first-run".to_string(),
                "--mute-audio".to_string(),
            ]);
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder
            .build()
            .map_err(|e| Error::Fetch(format!("Invalid browser configuration: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::Fetch(format!("Failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            profile_dir,
        })
    }

    async fn close(mut self) {
        shutdown(&mut self.browser, CLOSE_GRACE).await;
        self.handler.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            tracing::debug!("Failed to remove {}: {}", self.profile_dir.display(), e);
        }
    }
}

/// How a browser process went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Closed,
    Killed,
}

/// The parts of a browser process that shutdown needs.
#[async_trait]
trait BrowserProcess: Send {
    async fn close(&mut self) -> std::result::Result<(), String>;
    async fn wait(&mut self) -> std::result::Result<(), String>;
    async fn kill(&mut self) -> std::result::Result<(), String>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> std::result::Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> std::result::Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> std::result::Result<(), String> {
        match Browser::kill(self).await {
            Some(Err(e)) => Err(e.to_string()),
            _ => Ok(()),
        }
    }
}

/// Ask the process to close and wait for it to exit, within `grace`. A failed
/// or overdue close is followed by a kill, itself bounded by `grace`.
async fn shutdown<P: BrowserProcess + ?Sized>(process: &mut P, grace: Duration) -> Shutdown {
    let graceful = tokio::time::timeout(grace, async {
        process.close().await?;
        process.wait().await
    })
    .await;

    match graceful {
        Ok(Ok(())) => return Shutdown::Closed,
        Ok(Err(e)) => tracing::warn!("Failed to close browser ({}), killing it", e),
        Err(_) => tracing::warn!("Browser did not exit within {:?}, killing it", grace),
    }

    match tokio::time::timeout(grace, process.kill()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to kill browser: {}", e),
        Err(_) => tracing::warn!("Killing the browser took longer than {:?}", grace),
    }
    Shutdown::Killed
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn blocked_patterns() -> Vec<RequestPattern> {
    BLOCKED_RESOURCES
        .iter()
        .map(|kind| RequestPattern::builder().resource_type(kind.clone()).build())
        .collect()
}

async fn render(browser: &Browser, url: &str) -> std::result::Result<String, CdpError> {
    let page = browser.new_page("about:blank").await?;

    // Paused requests are only ever the blocked kinds, fail each one.
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let intercept_page = page.clone();
    let interceptor = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = intercept_page.execute(blocked).await {
                tracing::debug!("Failed to block {}: {}", event.request.url, e);
            }
        }
    });

    let result = load(&page, url).await;

    interceptor.abort();
    result
}

async fn load(page: &Page, url: &str) -> std::result::Result<String, CdpError> {
    page.execute(EnableParams::builder().patterns(blocked_patterns()).build())
        .await?;
    page.goto(url).await?;
    page.content().await
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let session = BrowserSession::launch(&self.config).await?;
        tracing::debug!("🌐 Browser launched for {}", url);

        let result = tokio::time::timeout(self.config.timeout, render(&session.browser, url)).await;

        session.close().await;
        tracing::debug!("🌐 Browser closed for {}", url);

        match result {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => Err(Error::Fetch(format!("Failed to load {}: {}", url, e))),
            Err(_) => Err(Error::Fetch(format!(
                "Timed out after {:?} loading {}",
                self.config.timeout, url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_patterns_cover_non_text_resources() {
        let patterns = blocked_patterns();
        assert_eq!(patterns.len(), 4);
        assert!(patterns.iter().all(|p| p.resource_type.is_some()));
        assert!(patterns
            .iter()
            .any(|p| matches!(p.resource_type, Some(ResourceType::Image))));
        assert!(!patterns
            .iter()
            .any(|p| matches!(p.resource_type, Some(ResourceType::Document))));
    }

    #[derive(Default)]
    struct FakeProcess {
        close_fails: bool,
        close_hangs: bool,
        wait_hangs: bool,
        closed: bool,
        killed: bool,
    }

    #[async_trait]
    impl BrowserProcess for FakeProcess {
        async fn close(&mut self) -> std::result::Result<(), String> {
            if self.close_hangs {
                std::future::pending::<()>().await;
            }
            if self.close_fails {
                return Err("Request timed out".to_string());
            }
            self.closed = true;
            Ok(())
        }

        async fn wait(&mut self) -> std::result::Result<(), String> {
            if self.wait_hangs {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn kill(&mut self) -> std::result::Result<(), String> {
            self.killed = true;
            Ok(())
        }
    }

    const GRACE: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_shutdown_closes_responsive_browser() {
        let mut process = FakeProcess::default();
        assert_eq!(shutdown(&mut process, GRACE).await, Shutdown::Closed);
        assert!(process.closed);
        assert!(!process.killed);
    }

    #[tokio::test]
    async fn test_shutdown_kills_when_close_fails() {
        let mut process = FakeProcess { close_fails: true, ..FakeProcess::default() };
        assert_eq!(shutdown(&mut process, GRACE).await, Shutdown::Killed);
        assert!(process.killed);
    }

    #[tokio::test]
    async fn test_shutdown_kills_hung_browser() {
        for mut process in [
            FakeProcess { close_hangs: true, ..FakeProcess::default() },
            FakeProcess { wait_hangs: true, ..FakeProcess::default() },
        ] {
            let result = tokio::time::timeout(Duration::from_secs(2), shutdown(&mut process, GRACE)).await;
            assert_eq!(result.unwrap(), Shutdown::Killed);
            assert!(process.killed);
        }
    }

    // Needs a local Chrome/Chromium and network access.
    #[tokio::test]
    #[ignore]
    async fn test_fetch_example_com() {
        let fetcher = BrowserFetcher::new(FetchConfig {
            no_sandbox: true,
            ..FetchConfig::default()
        });
        let html = fetcher.fetch("https://example.com").await.unwrap();
        assert!(html.contains("Example Domain"));
    }
}
