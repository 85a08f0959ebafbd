use crate::crawlers::filesystem::Site;
use crate::graph::{LinkGraph, Orphans};
use crate::parsers::text;
use crate::results::{Document, Suggestion};
use std::collections::{BTreeMap, BTreeSet};

/// How many suggestions per target a report shows
pub const REPORT_LIMIT: usize = 5;

/// Suggestions per target page, best first
pub type Suggestions = BTreeMap<String, Vec<Suggestion>>;

/// The words a page is about: significant title words plus its keywords
pub fn topic_terms(document: &Document) -> BTreeSet<String> {
    let mut terms: BTreeSet<String> = text::significant_words(&document.title)
        .into_iter()
        .collect();
    terms.extend(document.meta_keywords.iter().cloned());
    terms
}

/// Suggests, for every page of the site, other pages that mention its topic
/// terms but do not link to it yet
///
/// Targets without topic terms get no entry; targets with terms but no
/// matching source get an empty list.
pub fn suggest(site: &Site, graph: &LinkGraph) -> Suggestions {
    let sources: Vec<&Document> = site.documents().values().collect();
    site.documents()
        .values()
        .filter_map(|target| {
            suggest_for(target, &sources, graph).map(|list| (target.relative_path.clone(), list))
        })
        .collect()
}

/// Same as [`suggest`], restricted to orphan targets
///
/// Only pages that are themselves linked from somewhere are proposed as
/// sources, so following a suggestion actually makes the orphan reachable.
pub fn suggest_for_orphans(orphans: &Orphans, site: &Site, graph: &LinkGraph) -> Suggestions {
    let sources: Vec<&Document> = site
        .documents()
        .values()
        .filter(|document| !orphans.contains(&document.relative_path))
        .collect();

    orphans
        .iter()
        .filter_map(|orphan| site.get(orphan))
        .filter_map(|target| {
            suggest_for(target, &sources, graph).map(|list| (target.relative_path.clone(), list))
        })
        .collect()
}

/// Ranked suggestions for one target, or `None` when it has no topic terms
pub fn suggest_for(
    target: &Document,
    sources: &[&Document],
    graph: &LinkGraph,
) -> Option<Vec<Suggestion>> {
    let terms = topic_terms(target);
    if terms.is_empty() {
        ::log::debug!("{} has no topic terms, skipping", target.relative_path);
        return None;
    }

    let mut suggestions: Vec<Suggestion> = sources
        .iter()
        .filter(|source| source.relative_path != target.relative_path)
        .filter(|source| !graph.links_to(&source.relative_path, &target.relative_path))
        .filter_map(|source| match_source(target, source, &terms))
        .collect();

    // Stable: equal counts keep source order
    suggestions.sort_by(|a, b| b.match_count.cmp(&a.match_count));

    ::log::debug!(
        "{} suggestions for {} ({} terms)",
        suggestions.len(),
        target.relative_path,
        terms.len()
    );
    Some(suggestions)
}

fn match_source(
    target: &Document,
    source: &Document,
    terms: &BTreeSet<String>,
) -> Option<Suggestion> {
    let matched: BTreeSet<String> = terms
        .iter()
        .filter(|term| text::contains_term(&source.matching_text, term))
        .cloned()
        .collect();
    if matched.is_empty() {
        return None;
    }

    Some(Suggestion {
        target_page: target.relative_path.clone(),
        source_page: source.relative_path.clone(),
        match_count: matched.len(),
        context_snippet: context_snippet(&source.snippet_text, &matched),
        matched_terms: matched,
    })
}

/// Text around the earliest occurrence of any matched term, with every
/// matched term emphasized
pub fn context_snippet(raw_text: &str, matched: &BTreeSet<String>) -> Option<String> {
    let (start, end) = matched
        .iter()
        .filter_map(|term| text::find_term(raw_text, term))
        .min_by_key(|(start, _)| *start)?;
    let snippet = text::snippet(raw_text, start, end);
    Some(text::emphasize(&snippet, matched))
}
