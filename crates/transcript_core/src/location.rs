use url::Url;

/// Fragment prefix that carries a search query, e.g. `#search=hello%20world`.
pub const SEARCH_FRAGMENT_PREFIX: &str = "search=";

/// The address bar of the page hosting the search UI.
///
/// Only the fragment is ever rewritten; path and query string are preserved,
/// mirroring a non-history-creating URL replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Url::parse(raw).map(Self::new)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn has_search_fragment(&self) -> bool {
        self.url
            .fragment()
            .is_some_and(|fragment| fragment.starts_with(SEARCH_FRAGMENT_PREFIX))
    }

    /// Decoded query from `#search=...`, if present, non-empty and valid UTF-8.
    pub fn search_query(&self) -> Option<String> {
        let raw = self.url.fragment()?.strip_prefix(SEARCH_FRAGMENT_PREFIX)?;
        decode_query(raw).filter(|query| !query.is_empty())
    }

    pub fn with_search_query(&self, query: &str) -> Self {
        let mut url = self.url.clone();
        let fragment = format!("{SEARCH_FRAGMENT_PREFIX}{}", encode_query(query));
        url.set_fragment(Some(&fragment));
        Self { url }
    }

    pub fn without_fragment(&self) -> Self {
        let mut url = self.url.clone();
        url.set_fragment(None);
        Self { url }
    }
}

/// Percent-encode a query for the address-bar fragment.
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query).into_owned()
}

/// Decode a fragment-encoded query. `+` stays a literal plus sign.
pub fn decode_query(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|decoded| decoded.into_owned())
}
