use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use transcript_engine::{
    detect_hosting_mode, extract_gist_id, page_filename, FetchSettings, GistContext, GistError,
    GistMetadataSource, GistSettings, GistState, GithubGistApi, HostingMode, PageResolver,
    ResolveError,
};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CountingSource {
    calls: AtomicUsize,
    result: Result<String, GistError>,
}

impl CountingSource {
    fn new(result: Result<String, GistError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            result,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GistMetadataSource for CountingSource {
    async fn owner_login(&self, _gist_id: &str) -> Result<String, GistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.result.clone()
    }
}

fn loc(raw: &str) -> Url {
    Url::parse(raw).expect("valid url")
}

#[test]
fn page_filenames_are_zero_padded() {
    assert_eq!(page_filename(1), "page-001.html");
    assert_eq!(page_filename(42), "page-042.html");
    assert_eq!(page_filename(1234), "page-1234.html");
}

#[test]
fn hosting_mode_follows_preview_host() {
    assert_eq!(
        detect_hosting_mode(&loc("https://example.com/t/index.html"), "gistpreview.github.io"),
        HostingMode::Direct
    );
    assert_eq!(
        detect_hosting_mode(
            &loc("https://gistpreview.github.io/?78a436a8/index.html"),
            "gistpreview.github.io"
        ),
        HostingMode::Indirected {
            gist_id: Some("78a436a8".to_string())
        }
    );
}

#[test]
fn gist_id_is_leading_hex_of_query() {
    assert_eq!(
        extract_gist_id(&loc("https://gistpreview.github.io/?abc123def/page-002.html")),
        Some("abc123def".to_string())
    );
    assert_eq!(
        extract_gist_id(&loc("https://gistpreview.github.io/?xyz")),
        None
    );
    assert_eq!(extract_gist_id(&loc("https://gistpreview.github.io/")), None);
}

#[tokio::test]
async fn direct_mode_resolves_relative_to_location() {
    let source = CountingSource::new(Ok("unused".to_string()));
    let resolver = PageResolver::new(
        loc("https://example.com/t/index.html#search=foo"),
        &GistSettings::default(),
        source.clone(),
    );

    assert!(!resolver.needs_gist_info());
    resolver.prepare().await.expect("direct is ready");

    let pages = resolver.pages(2).expect("resolved");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].index, 1);
    assert_eq!(pages[0].filename, "page-001.html");
    assert_eq!(pages[0].resolved_url.as_str(), "https://example.com/t/page-001.html");
    assert_eq!(pages[1].resolved_url.as_str(), "https://example.com/t/page-002.html");
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn indirected_mode_requires_gist_owner() {
    let source = CountingSource::new(Ok("alice".to_string()));
    let settings = GistSettings::default();
    let resolver = PageResolver::new(
        loc("https://gistpreview.github.io/?78a436a8/index.html"),
        &settings,
        source.clone(),
    );

    assert!(resolver.needs_gist_info());
    assert_eq!(resolver.gist_state(), Some(GistState::NotLoaded));
    assert_eq!(
        resolver.resolve("page-001.html").unwrap_err(),
        ResolveError::GistNotLoaded
    );

    resolver.prepare().await.expect("owner loaded");
    assert!(!resolver.needs_gist_info());
    assert_eq!(
        resolver.resolve("page-003.html").expect("resolved").as_str(),
        "https://gist.githubusercontent.com/alice/78a436a8/raw/page-003.html"
    );
}

#[tokio::test]
async fn concurrent_callers_share_one_load() {
    let source = CountingSource::new(Ok("alice".to_string()));
    let gist = GistContext::new(Some("abc".to_string()), source.clone());

    let (first, second, third) = tokio::join!(gist.owner(), gist.owner(), gist.owner());
    assert_eq!(first, Ok("alice".to_string()));
    assert_eq!(second, Ok("alice".to_string()));
    assert_eq!(third, Ok("alice".to_string()));

    assert_eq!(gist.owner().await, Ok("alice".to_string()));
    assert_eq!(source.calls(), 1);
    assert_eq!(gist.state(), GistState::Loaded("alice".to_string()));
}

#[tokio::test]
async fn failed_load_is_not_retried() {
    let source = CountingSource::new(Err(GistError::Malformed("gist has no owner".to_string())));
    let gist = GistContext::new(Some("abc".to_string()), source.clone());

    assert!(gist.owner().await.is_err());
    assert!(gist.owner().await.is_err());
    assert_eq!(source.calls(), 1);
    assert!(matches!(gist.state(), GistState::Failed(GistError::Malformed(_))));
    assert_eq!(gist.loaded_owner(), None);
}

#[tokio::test]
async fn missing_gist_id_fails_without_request() {
    let source = CountingSource::new(Ok("alice".to_string()));
    let resolver = PageResolver::new(
        loc("https://gistpreview.github.io/"),
        &GistSettings::default(),
        source.clone(),
    );

    assert!(resolver.needs_gist_info());
    assert_eq!(resolver.prepare().await, Err(GistError::MissingGistId));
    assert_eq!(source.calls(), 0);
    assert_eq!(
        resolver.gist_state(),
        Some(GistState::Failed(GistError::MissingGistId))
    );
    // Sticky failure: nothing left to load.
    assert!(!resolver.needs_gist_info());
}

#[tokio::test]
async fn github_api_reads_owner_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gists/78a436a8"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"78a436a8","owner":{"login":"alice","id":1},"files":{}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let settings = GistSettings {
        api_base: server.uri(),
        raw_base: format!("{}/raw", server.uri()),
        ..GistSettings::default()
    };
    let api = GithubGistApi::new(&FetchSettings::default(), settings.api_base.clone())
        .expect("client");
    let resolver = PageResolver::new(
        loc("https://gistpreview.github.io/?78a436a8/index.html"),
        &settings,
        Arc::new(api),
    );

    let (first, second) = tokio::join!(resolver.prepare(), resolver.prepare());
    first.expect("loaded");
    second.expect("loaded");

    assert_eq!(
        resolver.resolve("page-001.html").expect("resolved").to_string(),
        format!("{}/raw/alice/78a436a8/raw/page-001.html", server.uri())
    );
}

#[tokio::test]
async fn github_api_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gists/dead"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gists/beef"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"owner":null}"#, "application/json"))
        .mount(&server)
        .await;

    let api = GithubGistApi::new(&FetchSettings::default(), server.uri()).expect("client");

    match api.owner_login("dead").await {
        Err(GistError::Fetch(err)) => {
            assert_eq!(err.kind, transcript_engine::FailureKind::HttpStatus(404))
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        api.owner_login("beef").await,
        Err(GistError::Malformed(_))
    ));
}
