//! Gist owner lookup for sites viewed through the gist-preview mirror.
//!
//! The owner login is needed to build raw-content URLs. It is loaded at most
//! once per [`GistContext`]; concurrent callers await the same in-flight
//! request and a failure is kept for the lifetime of the context.

use std::sync::{Arc, Mutex, PoisonError};

use engine_logging::{engine_error, engine_info};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::fetch::{build_client, FetchSettings};
use crate::{FailureKind, FetchError};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GistError {
    #[error("no gist id in the page address")]
    MissingGistId,
    #[error("gist metadata request failed: {0}")]
    Fetch(FetchError),
    #[error("gist metadata is malformed: {0}")]
    Malformed(String),
}

#[async_trait::async_trait]
pub trait GistMetadataSource: Send + Sync {
    async fn owner_login(&self, gist_id: &str) -> Result<String, GistError>;
}

#[derive(Debug, Deserialize)]
struct GistInfo {
    owner: Option<GistOwner>,
}

#[derive(Debug, Deserialize)]
struct GistOwner {
    login: String,
}

/// Reads `owner.login` from the GitHub gist API.
#[derive(Debug, Clone)]
pub struct GithubGistApi {
    client: reqwest::Client,
    api_base: String,
}

impl GithubGistApi {
    pub fn new(settings: &FetchSettings, api_base: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings)?,
            api_base: api_base.into(),
        })
    }
}

#[async_trait::async_trait]
impl GistMetadataSource for GithubGistApi {
    async fn owner_login(&self, gist_id: &str) -> Result<String, GistError> {
        let url = format!("{}/gists/{gist_id}", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|err| {
                let kind = if err.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Network
                };
                GistError::Fetch(FetchError::new(kind, err.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GistError::Fetch(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| GistError::Fetch(FetchError::new(FailureKind::Network, err.to_string())))?;
        let info: GistInfo =
            serde_json::from_slice(&body).map_err(|err| GistError::Malformed(err.to_string()))?;

        info.owner
            .map(|owner| owner.login)
            .filter(|login| !login.is_empty())
            .ok_or_else(|| GistError::Malformed("gist has no owner".to_string()))
    }
}

type OwnerLoad = Shared<BoxFuture<'static, Result<String, GistError>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GistState {
    NotLoaded,
    Loading,
    Loaded(String),
    Failed(GistError),
}

/// Single-initialization cell holding the gist owner.
pub struct GistContext {
    gist_id: Option<String>,
    source: Arc<dyn GistMetadataSource>,
    load: Mutex<Option<OwnerLoad>>,
}

impl GistContext {
    pub fn new(gist_id: Option<String>, source: Arc<dyn GistMetadataSource>) -> Self {
        Self {
            gist_id,
            source,
            load: Mutex::new(None),
        }
    }

    pub fn gist_id(&self) -> Option<&str> {
        self.gist_id.as_deref()
    }

    pub fn state(&self) -> GistState {
        let guard = self.load.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref().map(Shared::peek) {
            None => GistState::NotLoaded,
            Some(None) => GistState::Loading,
            Some(Some(Ok(owner))) => GistState::Loaded(owner.clone()),
            Some(Some(Err(err))) => GistState::Failed(err.clone()),
        }
    }

    /// Owner login if loading already succeeded.
    pub fn loaded_owner(&self) -> Option<String> {
        match self.state() {
            GistState::Loaded(owner) => Some(owner),
            _ => None,
        }
    }

    /// Loads the owner on first use; later calls share the first outcome.
    pub async fn owner(&self) -> Result<String, GistError> {
        let load = {
            let mut guard = self.load.lock().unwrap_or_else(PoisonError::into_inner);
            guard.get_or_insert_with(|| self.start_load()).clone()
        };
        load.await
    }

    fn start_load(&self) -> OwnerLoad {
        let source = Arc::clone(&self.source);
        let gist_id = self.gist_id.clone();
        async move {
            let Some(gist_id) = gist_id else {
                engine_error!("Gist preview host detected but the address has no gist id");
                return Err(GistError::MissingGistId);
            };
            engine_info!("Loading gist owner for gist {}", gist_id);
            match source.owner_login(&gist_id).await {
                Ok(owner) => {
                    engine_info!("Gist {} is owned by {}", gist_id, owner);
                    Ok(owner)
                }
                Err(err) => {
                    engine_error!("Failed to load gist info for {}: {}", gist_id, err);
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}
