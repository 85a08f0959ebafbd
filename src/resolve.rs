//! Resolution of raw `href` values to pages of the site.
//!
//! A link is resolved relative to the page containing it (or to the site
//! root when it starts with `/`), normalized, percent-decoded, and checked
//! against the filesystem for the directory-to-`index.html` fallback.

use std::path::Path;
use url::Url;

/// Prefixes of links that never point at a page
pub const NON_NAVIGATIONAL_PREFIXES: &[&str] = &["mailto:", "tel:", "javascript:", "data:"];

/// The file served for a directory link
pub const INDEX_FILE: &str = "index.html";

/// What an `href` points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Has a scheme and a host
    External,
    /// mailto/tel/javascript/data, blank, or some other non-page scheme
    NonResolvable,
    /// `#fragment` (or an empty path) pointing back at the containing page
    SameFile { fragment: Option<String> },
    /// A site-relative path, which may or may not exist
    Internal {
        path: String,
        fragment: Option<String>,
    },
    /// Internal in form but unusable as a page
    Broken(BrokenTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenTarget {
    /// `..` climbed above the site root
    OutsideRoot,
    /// A directory with no `index.html` in it
    MissingIndex { directory: String },
}

/// How a component treats links that resolve to [`ResolvedTarget::Broken`]
///
/// The graph-based analyses silently drop them; the link checker reports
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokenLinkPolicy {
    /// Treat as [`ResolvedTarget::NonResolvable`]
    Drop,
    /// Keep as [`ResolvedTarget::Broken`]
    Report,
}

/// Resolves `href` found in `source_path` against the site at `site_root`
pub fn resolve(href: &str, source_path: &str, site_root: &Path) -> ResolvedTarget {
    if href.trim().is_empty() {
        return ResolvedTarget::NonResolvable;
    }
    if is_external(href) {
        return ResolvedTarget::External;
    }
    if is_non_navigational(href) || has_scheme(href) {
        return ResolvedTarget::NonResolvable;
    }

    let (path_part, fragment) = split_reference(href);
    if path_part.is_empty() {
        return ResolvedTarget::SameFile { fragment };
    }

    let decoded = match urlencoding::decode(path_part) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path_part.to_string(),
    };

    let base = if decoded.starts_with('/') {
        ""
    } else {
        parent_dir(source_path)
    };

    let Some(mut path) = normalize(base, &decoded) else {
        ::log::trace!("{} escapes the site root (from {})", href, source_path);
        return ResolvedTarget::Broken(BrokenTarget::OutsideRoot);
    };

    if site_root.join(&path).is_dir() {
        let index = join(&path, INDEX_FILE);
        if !site_root.join(&index).is_file() {
            return ResolvedTarget::Broken(BrokenTarget::MissingIndex { directory: path });
        }
        path = index;
    }

    ResolvedTarget::Internal { path, fragment }
}

/// [`resolve`], then apply `policy` to broken results
pub fn resolve_with(
    href: &str,
    source_path: &str,
    site_root: &Path,
    policy: BrokenLinkPolicy,
) -> ResolvedTarget {
    match (resolve(href, source_path, site_root), policy) {
        (ResolvedTarget::Broken(_), BrokenLinkPolicy::Drop) => ResolvedTarget::NonResolvable,
        (target, _) => target,
    }
}

/// Whether `href` has both a scheme and a host (or is protocol-relative)
pub fn is_external(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    Url::parse(href).is_ok_and(|url| url.has_host())
}

pub fn is_non_navigational(href: &str) -> bool {
    let lowered = href.trim_start().to_ascii_lowercase();
    NON_NAVIGATIONAL_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// `scheme:` with no host, e.g. `urn:isbn:...`
fn has_scheme(href: &str) -> bool {
    Url::parse(href).is_ok()
}

/// Splits off the fragment, percent-decoded, and drops the query string
fn split_reference(href: &str) -> (&str, Option<String>) {
    let (rest, fragment) = match href.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (href, None),
    };
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    let fragment = fragment
        .filter(|f| !f.is_empty())
        .map(|f| match urlencoding::decode(f) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => f.to_string(),
        });
    (path, fragment)
}

/// Directory part of a site-relative file path
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Appends `relative` to `base` collapsing `.`, `..` and empty segments
///
/// Returns `None` when `..` would climb above the root.
pub fn normalize(base: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(relative.split(['/', '\\'])) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
