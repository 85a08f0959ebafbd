use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The tag an extracted link was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    /// `<a href>`
    Anchor,
    /// `<link href>` with an asset-like `rel`
    Link,
    /// `<img src>`
    Image,
    /// `<script src>`
    Script,
}

/// One reference extracted from a page, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub kind: LinkKind,
    /// Raw attribute value as written in the page
    pub href: String,
    /// Serialized markup of the element carrying the link
    pub markup: String,
}

/// One parsed HTML page of the site
///
/// Built once by the page loader and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Site-root-relative path, forward slashes, percent-decoded
    pub relative_path: String,

    /// Contents of `<title>`, possibly empty
    pub title: String,

    /// Lowercase keywords from `<meta name="keywords">`, stopwords removed
    pub meta_keywords: BTreeSet<String>,

    /// Contents of `<meta name="description">`
    pub meta_description: String,

    /// Lowercase, stopword-filtered words of the visible text, space separated
    pub matching_text: String,

    /// Visible text as written, for human-readable snippets
    pub snippet_text: String,

    /// Links found on `a`, `link`, `img` and `script` tags
    pub links: Vec<PageLink>,

    /// Every `id` attribute plus every `<a name>` in the page
    pub fragment_targets: HashSet<String>,

    /// Set when the file could not be read; all other fields are then empty
    pub load_error: Option<String>,
}

impl Document {
    /// Create the placeholder for a page that failed to load
    pub fn failed(relative_path: String, error: String) -> Self {
        Self {
            relative_path,
            load_error: Some(error),
            ..Self::default()
        }
    }

    /// Iterate over the hrefs of `<a>` tags only
    pub fn anchor_hrefs(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .filter(|link| link.kind == LinkKind::Anchor)
            .map(|link| link.href.as_str())
    }

    /// Whether this is the site home page (`index.html` at the root)
    pub fn is_homepage(&self) -> bool {
        is_homepage(&self.relative_path)
    }
}

/// Whether a site-relative path is the home page
pub fn is_homepage(relative_path: &str) -> bool {
    relative_path == "index.html"
}

/// One broken-link finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkIssue {
    /// Page containing the link
    pub source_path: String,
    /// Markup of the offending element
    pub offending_tag: String,
    pub href: String,
    /// Human-readable reason, e.g. "HTTP 404 (GET 404 after HEAD 404)"
    pub reason: String,
}

/// A candidate place to add an internal link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub target_page: String,
    pub source_page: String,
    pub matched_terms: BTreeSet<String>,
    pub match_count: usize,
    /// Surrounding text from the source page with matched terms emphasized
    pub context_snippet: Option<String>,
}
