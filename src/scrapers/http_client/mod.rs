//! Page fetching over HTTP or from saved files.

mod response;
mod user_agent;

pub use response::FetchedPage;
pub use user_agent::{UserAgent, DEFAULT_USER_AGENT, IMPERSONATE};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Errors raised while fetching a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} is not an HTML page ({content_type})")]
    NotHtml { url: String, content_type: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Anything that can turn a URL into a page body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// HTTP fetcher backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a fetcher with the agent chosen by [`UserAgent::from_config`].
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = UserAgent::from_config(user_agent_config);
        let client = Client::builder()
            .user_agent(user_agent.as_str())
            .default_headers(user_agent.default_headers())
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        debug!(
            "GET {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(request_error)?;

        let page = FetchedPage {
            url: final_url,
            status: status.as_u16(),
            headers,
            body,
        };
        if !page.is_html() {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type: page.content_type().unwrap_or_default().to_string(),
            });
        }
        Ok(page)
    }
}

/// Reads saved pages from disk. Accepts plain paths and `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher;

impl FileFetcher {
    fn path_for(target: &str) -> PathBuf {
        ::url::Url::parse(target)
            .ok()
            .filter(|u| u.scheme() == "file")
            .and_then(|u| u.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(target))
    }
}

#[async_trait]
impl PageFetcher for FileFetcher {
    async fn fetch(&self, target: &str) -> Result<FetchedPage, FetchError> {
        let path = Self::path_for(target);
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        let url = std::fs::canonicalize(&path)
            .ok()
            .and_then(|p| ::url::Url::from_file_path(p).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| target.to_string());
        Ok(FetchedPage::local(url, body))
    }
}

/// Whether a target names a remote page rather than a saved file.
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Routes remote URLs over HTTP and everything else to disk.
#[derive(Clone)]
pub struct Fetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl Fetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            file: FileFetcher,
        }
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, target: &str) -> Result<FetchedPage, FetchError> {
        if is_remote(target) {
            self.http.fetch(target).await
        } else {
            self.file.fetch(target).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_fetcher_reads_saved_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>Saved</body></html>").unwrap();

        let page = FileFetcher
            .fetch(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(page.body.contains("Saved"));
        assert!(page.url.starts_with("file://"));
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_file() {
        let err = FileFetcher
            .fetch("/definitely/not/here.html")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://www.amazon.com/dp/B08N5WRWNW"));
        assert!(!is_remote("./saved/page.html"));
        assert!(!is_remote("file:///tmp/page.html"));
    }
}
