use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

pub const DEFAULT_USER_AGENT: &str = concat!("transcript-search/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 16 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError>;
}

pub(crate) fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(policy)
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        // The content type only picks a charset; every 2xx body is searched.
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            url: url.to_string(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

/// Dispatches `file:` URLs to the local filesystem and everything else to HTTP,
/// so a transcript directory can be searched without serving it.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    http: ReqwestFetcher,
    max_bytes: u64,
}

impl SiteFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let max_bytes = settings.max_bytes;
        Ok(Self {
            http: ReqwestFetcher::new(settings)?,
            max_bytes,
        })
    }

    async fn read_file(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, url.as_str()))?;

        let meta = tokio::fs::metadata(&path).await.map_err(io_error)?;
        if meta.len() > self.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: Some(meta.len()),
                },
                "file too large",
            ));
        }

        let bytes = tokio::fs::read(&path).await.map_err(io_error)?;
        let metadata = FetchMetadata {
            url: url.to_string(),
            final_url: url.to_string(),
            content_type: None,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}

#[async_trait::async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url).await,
            "file" => self.read_file(url).await,
            other => Err(FetchError::new(
                FailureKind::UnsupportedScheme {
                    scheme: other.to_string(),
                },
                url.as_str(),
            )),
        }
    }
}

fn io_error(err: std::io::Error) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
