use crate::parsers::text;
use crate::results::{Document, LinkKind, PageLink};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Tags whose text counts as visible page content
const CONTENT_TAGS: &str = "p, h1, h2, h3, h4, h5, h6, li, span, article, section, td, th";

/// `rel` values that make a `<link>` worth checking
const ASSET_RELS: &[&str] = &["stylesheet", "icon", "apple-touch-icon", "manifest"];

/// Where links live in a page: which tag, which attribute, and an optional
/// extra condition on the element
pub struct LinkSource {
    pub tag: &'static str,
    pub attr: &'static str,
    pub kind: LinkKind,
    pub accept: fn(&ElementRef<'_>) -> bool,
}

pub const LINK_SOURCES: &[LinkSource] = &[
    LinkSource {
        tag: "a",
        attr: "href",
        kind: LinkKind::Anchor,
        accept: always,
    },
    LinkSource {
        tag: "link",
        attr: "href",
        kind: LinkKind::Link,
        accept: has_asset_rel,
    },
    LinkSource {
        tag: "img",
        attr: "src",
        kind: LinkKind::Image,
        accept: always,
    },
    LinkSource {
        tag: "script",
        attr: "src",
        kind: LinkKind::Script,
        accept: always,
    },
];

fn always(_: &ElementRef<'_>) -> bool {
    true
}

/// `rel` is a space-separated token list, so "shortcut icon" matches on "icon"
fn has_asset_rel(element: &ElementRef<'_>) -> bool {
    element.value().attr("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| ASSET_RELS.contains(&token.to_ascii_lowercase().as_str()))
    })
}

/// Parses one HTML page into a [`Document`]
pub fn parse(relative_path: &str, html: &str) -> Document {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "title");
    let meta_keywords = meta_content(&doc, "keywords")
        .map(|raw| text::keyword_set(&raw))
        .unwrap_or_default();
    let meta_description = meta_content(&doc, "description").unwrap_or_default();

    let snippet_text = visible_text(&doc);
    let matching_text = text::matching_text(&snippet_text);

    let links = extract_links(&doc);
    ::log::debug!(
        "HTML parser found {} links in {}",
        links.len(),
        relative_path
    );

    Document {
        relative_path: relative_path.to_string(),
        title,
        meta_keywords,
        meta_description,
        matching_text,
        snippet_text,
        links,
        fragment_targets: collect_fragment_targets(&doc),
        load_error: None,
    }
}

/// Walks the tree once, consulting [`LINK_SOURCES`] for every element
pub fn extract_links(doc: &Html) -> Vec<PageLink> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|element| {
            let name = element.value().name();
            let source = LINK_SOURCES.iter().find(|source| source.tag == name)?;
            let href = element.value().attr(source.attr)?;
            if !(source.accept)(&element) {
                return None;
            }
            Some(PageLink {
                kind: source.kind,
                href: href.to_string(),
                markup: element.html(),
            })
        })
        .collect()
}

/// Collects every `id` plus the `name` of every anchor
pub fn fragment_targets(html: &str) -> HashSet<String> {
    collect_fragment_targets(&Html::parse_document(html))
}

fn collect_fragment_targets(doc: &Html) -> HashSet<String> {
    let ids = Selector::parse("[id]").unwrap();
    let named = Selector::parse("a[name]").unwrap();

    let mut targets: HashSet<String> = doc
        .select(&ids)
        .filter_map(|e| e.value().attr("id"))
        .map(str::to_string)
        .collect();
    targets.extend(
        doc.select(&named)
            .filter_map(|e| e.value().attr("name"))
            .map(str::to_string),
    );
    targets
}

/// Text of the content-bearing tags, each element's text nodes trimmed and
/// joined with single spaces
pub fn visible_text(doc: &Html) -> String {
    let content = Selector::parse(CONTENT_TAGS).unwrap();
    doc.select(&content)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn first_text(doc: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// `content` of `<meta name="...">`, if the tag and attribute exist
pub(crate) fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
}
