use std::borrow::Cow;

use ego_tree::NodeRef;
use engine_logging::engine_warn;
use regex::{Regex, RegexBuilder};
use scraper::node::Node;
use scraper::{ElementRef, Html};

pub const DEFAULT_BLOCK_CLASS: &str = "message";
pub const DEFAULT_EXCERPT_CHARS: usize = 160;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// One message block containing the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub source_page: String,
    /// Element id of the block, empty when it has none.
    pub anchor_id: String,
    /// `source_page`, plus `#anchor_id` when the block has an id.
    pub link: String,
    /// Inner markup of the block with hits wrapped in `<mark>`.
    pub highlighted_html: String,
    /// Whitespace-collapsed text around the first hit.
    pub excerpt: String,
}

/// Markup for one entry of the aggregated results view.
/// `highlighted_html` is already markup and goes in unescaped.
pub fn result_entry_html(link: &str, source_page: &str, highlighted_html: &str) -> String {
    let mut out = String::with_capacity(highlighted_html.len() + 128);
    out.push_str("<div class=\"search-result\"><a href=\"");
    escape_attr(link, &mut out);
    out.push_str("\"><div class=\"search-result-page\">");
    escape_text(source_page, &mut out);
    out.push_str("</div><div class=\"search-result-content\">");
    out.push_str(highlighted_html);
    out.push_str("</div></a></div>");
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageMatches {
    pub count: usize,
    pub results: Vec<MatchResult>,
}

/// Scans message blocks of a page for a case-insensitive substring.
#[derive(Debug, Clone)]
pub struct ContentMatcher {
    block_class: String,
}

impl ContentMatcher {
    pub fn new(block_class: impl Into<String>) -> Self {
        Self {
            block_class: block_class.into(),
        }
    }

    pub fn find_matches(&self, page_filename: &str, html: &str, query: &str) -> PageMatches {
        if query.is_empty() {
            return PageMatches::default();
        }
        let needle = query.to_lowercase();
        let pattern = highlight_pattern(query);

        let document = Html::parse_document(html);
        let mut results = Vec::new();

        for block in document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().classes().any(|c| c == self.block_class))
        {
            let text: String = block.text().collect();
            if !text.to_lowercase().contains(&needle) {
                continue;
            }

            let anchor_id = block.value().id().unwrap_or_default().to_string();
            let link = if anchor_id.is_empty() {
                page_filename.to_string()
            } else {
                format!("{page_filename}#{anchor_id}")
            };

            let mut writer = HighlightWriter {
                out: String::new(),
                pattern: pattern.as_ref(),
                page_filename,
            };
            for child in block.children() {
                writer.write_node(child, false);
            }

            results.push(MatchResult {
                source_page: page_filename.to_string(),
                anchor_id,
                link,
                highlighted_html: writer.out,
                excerpt: excerpt(&text, pattern.as_ref(), DEFAULT_EXCERPT_CHARS),
            });
        }

        PageMatches {
            count: results.len(),
            results,
        }
    }
}

impl Default for ContentMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CLASS)
    }
}

fn highlight_pattern(query: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            engine_warn!("Highlighting disabled for query of {} bytes: {}", query.len(), err);
            None
        }
    }
}

/// Re-serializes a block's subtree, splitting text nodes into marked and
/// unmarked spans and pointing in-page anchors at the source page.
struct HighlightWriter<'a> {
    out: String,
    pattern: Option<&'a Regex>,
    page_filename: &'a str,
}

impl HighlightWriter<'_> {
    fn write_node(&mut self, node: NodeRef<'_, Node>, raw_text: bool) {
        match node.value() {
            Node::Text(text) if raw_text => self.out.push_str(text),
            Node::Text(text) => self.write_text(text),
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment);
                self.out.push_str("-->");
            }
            Node::Element(element) => {
                let name = element.name();
                self.out.push('<');
                self.out.push_str(name);
                // `attrs()` drops prefixes, which foreign content such as
                // `xlink:href` needs.
                for (attr, value) in element.attrs.iter() {
                    let value: &str = value;
                    let local: &str = &attr.local;
                    let value = if name == "a"
                        && attr.prefix.is_none()
                        && local == "href"
                        && value.starts_with('#')
                    {
                        Cow::Owned(format!("{}{value}", self.page_filename))
                    } else {
                        Cow::Borrowed(value)
                    };
                    self.out.push(' ');
                    if let Some(prefix) = &attr.prefix {
                        self.out.push_str(prefix);
                        self.out.push(':');
                    }
                    self.out.push_str(local);
                    self.out.push_str("=\"");
                    escape_attr(&value, &mut self.out);
                    self.out.push('"');
                }
                self.out.push('>');

                if VOID_ELEMENTS.contains(&name) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&name);
                for child in node.children() {
                    self.write_node(child, raw);
                }
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
            _ => {}
        }
    }

    fn write_text(&mut self, text: &str) {
        let Some(pattern) = self.pattern else {
            escape_text(text, &mut self.out);
            return;
        };
        let mut last = 0;
        for hit in pattern.find_iter(text) {
            escape_text(&text[last..hit.start()], &mut self.out);
            self.out.push_str("<mark>");
            escape_text(hit.as_str(), &mut self.out);
            self.out.push_str("</mark>");
            last = hit.end();
        }
        escape_text(&text[last..], &mut self.out);
    }
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn excerpt(text: &str, pattern: Option<&Regex>, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let hit = pattern
        .and_then(|pattern| pattern.find(&collapsed))
        .map_or(0, |hit| hit.start());
    let lead = max_chars / 4;
    let before: Vec<usize> = collapsed[..hit].char_indices().map(|(i, _)| i).collect();
    let start = if lead == 0 {
        hit
    } else if before.len() > lead {
        before[before.len() - lead]
    } else {
        0
    };
    let end = collapsed[start..]
        .char_indices()
        .nth(max_chars)
        .map_or(collapsed.len(), |(i, _)| start + i);

    let mut snippet = String::with_capacity(end - start + 8);
    if start > 0 {
        snippet.push('…');
    }
    snippet.push_str(&collapsed[start..end]);
    if end < collapsed.len() {
        snippet.push('…');
    }
    snippet
}
