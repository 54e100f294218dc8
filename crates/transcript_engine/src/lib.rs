//! Transcript search engine: page resolution, fetching, matching and the
//! batched scheduler that drives one search run.
mod decode;
mod engine;
mod fetch;
mod gist;
mod matcher;
mod resolver;
mod scheduler;
mod types;

pub use decode::{decode_page, DecodeError};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, SiteFetcher, DEFAULT_USER_AGENT};
pub use gist::{
    GistContext, GistError, GistMetadataSource, GistState, GithubGistApi, GITHUB_API_BASE,
};
pub use matcher::{
    result_entry_html, ContentMatcher, MatchResult, PageMatches, DEFAULT_BLOCK_CLASS,
    DEFAULT_EXCERPT_CHARS,
};
pub use resolver::{
    detect_hosting_mode, extract_gist_id, page_filename, GistSettings, HostingMode,
    PageDescriptor, PageResolver, ResolveError, GIST_PREVIEW_HOST, GIST_RAW_BASE,
};
pub use scheduler::{BatchScheduler, RunOutcome, SearchSink, DEFAULT_BATCH_SIZE};
pub use types::{
    AbortCause, FailureKind, FetchError, FetchMetadata, FetchOutput, Generation, PageReport,
    SearchEvent,
};
