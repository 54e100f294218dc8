use std::sync::Arc;

use url::Url;

use crate::gist::{GistContext, GistError, GistMetadataSource, GistState, GITHUB_API_BASE};

pub const GIST_PREVIEW_HOST: &str = "gistpreview.github.io";
pub const GIST_RAW_BASE: &str = "https://gist.githubusercontent.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistSettings {
    pub preview_host: String,
    pub api_base: String,
    pub raw_base: String,
}

impl Default for GistSettings {
    fn default() -> Self {
        Self {
            preview_host: GIST_PREVIEW_HOST.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
            raw_base: GIST_RAW_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingMode {
    /// Pages are fetched relative to the document location.
    Direct,
    /// The document is shown through the preview mirror; pages come from raw gist content.
    Indirected { gist_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("gist owner not loaded yet")]
    GistNotLoaded,
    #[error("cannot build url for {filename}: {message}")]
    InvalidUrl { filename: String, message: String },
}

/// One page of the transcript for a single search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub index: usize,
    pub filename: String,
    pub resolved_url: Url,
}

/// `page-007.html` style name; indices above 999 widen naturally.
pub fn page_filename(index: usize) -> String {
    format!("page-{index:03}.html")
}

pub fn detect_hosting_mode(location: &Url, preview_host: &str) -> HostingMode {
    if location.host_str() == Some(preview_host) {
        HostingMode::Indirected {
            gist_id: extract_gist_id(location),
        }
    } else {
        HostingMode::Direct
    }
}

/// Leading run of hex digits in the query string, e.g. `?78a436a8/index.html`.
pub fn extract_gist_id(location: &Url) -> Option<String> {
    let query = location.query()?;
    let id: String = query
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    (!id.is_empty()).then_some(id)
}

/// Maps page filenames to fetchable URLs for the current hosting mode.
pub struct PageResolver {
    location: Url,
    mode: HostingMode,
    raw_base: String,
    gist: Option<GistContext>,
}

impl PageResolver {
    pub fn new(location: Url, settings: &GistSettings, source: Arc<dyn GistMetadataSource>) -> Self {
        let mode = detect_hosting_mode(&location, &settings.preview_host);
        let gist = match &mode {
            HostingMode::Indirected { gist_id } => Some(GistContext::new(gist_id.clone(), source)),
            HostingMode::Direct => None,
        };
        Self {
            location,
            mode,
            raw_base: settings.raw_base.trim_end_matches('/').to_string(),
            gist,
        }
    }

    pub fn mode(&self) -> &HostingMode {
        &self.mode
    }

    pub fn gist_state(&self) -> Option<GistState> {
        self.gist.as_ref().map(GistContext::state)
    }

    /// Whether `prepare` still has to reach the network before pages resolve.
    /// A failed lookup is sticky and never retried, so it needs nothing.
    pub fn needs_gist_info(&self) -> bool {
        matches!(
            self.gist_state(),
            Some(GistState::NotLoaded | GistState::Loading)
        )
    }

    /// Loads the gist owner in indirected mode. Direct mode is always ready.
    pub async fn prepare(&self) -> Result<(), GistError> {
        match &self.gist {
            Some(gist) => gist.owner().await.map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn resolve(&self, filename: &str) -> Result<Url, ResolveError> {
        let invalid = |err: url::ParseError| ResolveError::InvalidUrl {
            filename: filename.to_string(),
            message: err.to_string(),
        };

        match &self.gist {
            None => self.location.join(filename).map_err(invalid),
            Some(gist) => {
                let owner = gist.loaded_owner().ok_or(ResolveError::GistNotLoaded)?;
                let gist_id = gist.gist_id().ok_or(ResolveError::GistNotLoaded)?;
                let raw = format!("{}/{owner}/{gist_id}/raw/{filename}", self.raw_base);
                Url::parse(&raw).map_err(invalid)
            }
        }
    }

    /// Descriptors for pages `1..=total_pages`, resolved for this run.
    pub fn pages(&self, total_pages: usize) -> Result<Vec<PageDescriptor>, ResolveError> {
        (1..=total_pages)
            .map(|index| {
                let filename = page_filename(index);
                let resolved_url = self.resolve(&filename)?;
                Ok(PageDescriptor {
                    index,
                    filename,
                    resolved_url,
                })
            })
            .collect()
    }
}
