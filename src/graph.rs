use crate::crawlers::filesystem::Site;
use crate::resolve::{self, BrokenLinkPolicy, ResolvedTarget};
use crate::results::is_homepage;
use std::collections::{BTreeMap, BTreeSet};

/// Directed graph of internal `<a>` links between pages of a site
///
/// Every page of the site is a key, even when it links nowhere. Keys and
/// targets are always pages of the site and a page never targets itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    outgoing: BTreeMap<String, BTreeSet<String>>,
}

impl LinkGraph {
    /// Builds the graph from the anchors of every page
    ///
    /// Links that do not land on a known page (external, mailto, missing
    /// files, directories without an index) are dropped.
    pub fn build(site: &Site) -> Self {
        let mut outgoing = BTreeMap::new();

        for (source, document) in site.documents() {
            let mut targets = BTreeSet::new();
            for href in document.anchor_hrefs() {
                let resolved =
                    resolve::resolve_with(href, source, site.root(), BrokenLinkPolicy::Drop);
                if let ResolvedTarget::Internal { path, .. } = resolved {
                    if path != *source && site.contains(&path) {
                        targets.insert(path);
                    }
                }
            }
            ::log::trace!("{} links to {} pages", source, targets.len());
            outgoing.insert(source.clone(), targets);
        }

        Self { outgoing }
    }

    /// Builds a graph from explicit edges, adding any page named only as a target
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a [&'a str])>) -> Self {
        let mut outgoing: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (source, targets) in edges {
            let entry = outgoing.entry(source.to_string()).or_default();
            entry.extend(
                targets
                    .iter()
                    .filter(|t| **t != source)
                    .map(|t| t.to_string()),
            );
            for target in targets.iter() {
                outgoing.entry(target.to_string()).or_default();
            }
        }
        Self { outgoing }
    }

    /// Pages `source` links to
    pub fn targets(&self, source: &str) -> Option<&BTreeSet<String>> {
        self.outgoing.get(source)
    }

    /// Whether `source` already has an internal link to `target`
    pub fn links_to(&self, source: &str, target: &str) -> bool {
        self.outgoing
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Pages that link to `target`
    pub fn linked_by(&self, target: &str) -> BTreeSet<&str> {
        self.outgoing
            .iter()
            .filter(|(_, targets)| targets.contains(target))
            .map(|(source, _)| source.as_str())
            .collect()
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.outgoing.keys().map(String::as_str)
    }

    pub fn edges(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.outgoing
    }

    /// Every page that is the target of at least one link
    pub fn linked_pages(&self) -> BTreeSet<&str> {
        self.outgoing
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Pages with no incoming link, sorted
    pub fn orphans(&self) -> Orphans {
        let linked = self.linked_pages();
        Orphans {
            pages: self
                .pages()
                .filter(|page| !linked.contains(page))
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Pages that exist but receive no internal link
///
/// The home page is reported like any other page when nothing links to it;
/// [`Orphans::includes_homepage`] lets callers annotate it as expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Orphans {
    pub pages: BTreeSet<String>,
}

impl Orphans {
    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains(page)
    }

    pub fn includes_homepage(&self) -> bool {
        self.pages.iter().any(|page| is_homepage(page))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }
}

/// `keys(graph) - union(values(graph))`
pub fn find_orphans(graph: &LinkGraph) -> Orphans {
    graph.orphans()
}
