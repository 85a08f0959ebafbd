//! SEO and social metadata audit.
//!
//! Every page is checked for its `<title>`, description, keywords, canonical
//! link, Open Graph and Twitter Card tags, and for consistency between them.
//! Each problem becomes one human-readable line in that page's issue list.

use crate::config::MetadataConfig;
use crate::crawlers::filesystem::{self, site_root};
use crate::error::{Error, Result};
use crate::parsers::html;
use crate::results::is_homepage;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Issues per page; pages without issues are left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub pages: usize,
    pub issues: BTreeMap<String, Vec<String>>,
}

/// Which attribute identifies a `<meta>` tag
#[derive(Debug, Clone, Copy)]
enum MetaKey<'a> {
    Name(&'a str),
    Property(&'a str),
}

impl MetaKey<'_> {
    fn describe(&self) -> String {
        match self {
            MetaKey::Name(name) => format!("<meta name='{name}'>"),
            MetaKey::Property(property) => format!("<meta property='{property}'>"),
        }
    }

    fn selector(&self) -> Option<Selector> {
        let css = match self {
            MetaKey::Name(name) => format!(r#"meta[name="{name}"]"#),
            MetaKey::Property(property) => format!(r#"meta[property="{property}"]"#),
        };
        Selector::parse(&css).ok()
    }
}

/// How a `<meta>` tag's content is validated
#[derive(Debug, Default)]
struct MetaCheck<'a> {
    min_length: usize,
    expected: Option<&'a str>,
    url: Option<UrlCheck<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct UrlCheck<'a> {
    context: &'static str,
    /// Images may live on a CDN, so a foreign host is accepted for them
    image: bool,
    local_root: Option<&'a Path>,
}

/// Audits pages against a [`MetadataConfig`]
pub struct MetadataAuditor<'a> {
    config: &'a MetadataConfig,
    site_root: &'a Path,
}

impl<'a> MetadataAuditor<'a> {
    pub fn new(config: &'a MetadataConfig, site_root: &'a Path) -> Self {
        Self { config, site_root }
    }

    /// Checks one page's markup
    pub fn audit_page(&self, relative_path: &str, content: &str) -> Vec<String> {
        let doc = Html::parse_document(content);
        let config = self.config;
        let mut issues = Vec::new();

        let title = match first_title(&doc) {
            None => {
                issues.push("<title> tag missing.".to_string());
                None
            }
            Some(title) => {
                if title.chars().count() < config.min_title_length {
                    issues.push(format!(
                        "<title> is empty or too short (minimum: {}, found: '{}').",
                        config.min_title_length, title
                    ));
                }
                Some(title)
            }
        };

        let description = self.meta(
            &doc,
            &mut issues,
            MetaKey::Name("description"),
            MetaCheck {
                min_length: config.min_description_length,
                ..MetaCheck::default()
            },
        );
        if let (Some(description), Some(default)) = (&description, &config.default_description) {
            if description.trim() == default.trim() && !is_homepage(relative_path) {
                issues.push(format!(
                    "Warning: meta description looks like the site-wide default and may not be specific to this page ('{relative_path}')."
                ));
            }
        }

        if let Some(author) = &config.expected_author {
            self.meta(
                &doc,
                &mut issues,
                MetaKey::Name("author"),
                MetaCheck {
                    min_length: 1,
                    expected: Some(author.as_str()),
                    ..MetaCheck::default()
                },
            );
        }

        let keywords = self.meta(
            &doc,
            &mut issues,
            MetaKey::Name("keywords"),
            MetaCheck {
                min_length: 1,
                ..MetaCheck::default()
            },
        );
        if let Some(keywords) = keywords.as_deref().filter(|k| !k.trim().is_empty()) {
            let count = keywords.split(',').filter(|k| !k.trim().is_empty()).count();
            if count < config.min_keywords_count {
                issues.push(format!(
                    "Meta keywords: expected at least {} keyword(s), found {} ('{}').",
                    config.min_keywords_count, count, keywords
                ));
            }
        }

        let canonical = self.canonical(&doc, &mut issues);

        let og_title = self.meta(&doc, &mut issues, MetaKey::Property("og:title"), required());
        let og_description = self.meta(
            &doc,
            &mut issues,
            MetaKey::Property("og:description"),
            MetaCheck {
                min_length: config.min_description_length,
                ..MetaCheck::default()
            },
        );
        let og_url = self.meta(
            &doc,
            &mut issues,
            MetaKey::Property("og:url"),
            MetaCheck {
                min_length: 1,
                url: Some(UrlCheck {
                    context: "Open Graph URL",
                    image: false,
                    local_root: None,
                }),
                ..MetaCheck::default()
            },
        );
        let og_image = self.meta(
            &doc,
            &mut issues,
            MetaKey::Property("og:image"),
            self.image_check("Open Graph Image URL"),
        );
        self.meta(
            &doc,
            &mut issues,
            MetaKey::Property("og:type"),
            MetaCheck {
                min_length: 1,
                expected: Some(config.expected_og_type.as_str()),
                ..MetaCheck::default()
            },
        );

        self.meta(
            &doc,
            &mut issues,
            MetaKey::Name("twitter:card"),
            MetaCheck {
                min_length: 1,
                expected: Some(config.expected_twitter_card.as_str()),
                ..MetaCheck::default()
            },
        );
        let twitter_title = self.meta(&doc, &mut issues, MetaKey::Name("twitter:title"), required());
        let twitter_description = self.meta(
            &doc,
            &mut issues,
            MetaKey::Name("twitter:description"),
            MetaCheck {
                min_length: config.min_description_length,
                ..MetaCheck::default()
            },
        );
        let twitter_image = self.meta(
            &doc,
            &mut issues,
            MetaKey::Name("twitter:image"),
            self.image_check("Twitter Image URL"),
        );

        // Consistency between the tags a template fills from the same value
        if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
            for (tag, value) in [("og:title", &og_title), ("twitter:title", &twitter_title)] {
                if let Some(value) = value.as_deref().filter(|v| *v != title) {
                    issues.push(format!(
                        "Inconsistency: <title> ('{title}') and {tag} ('{value}') differ."
                    ));
                }
            }
        }

        if let Some(description) = description.as_deref().filter(|d| !d.is_empty()) {
            for (tag, value) in [
                ("og:description", &og_description),
                ("twitter:description", &twitter_description),
            ] {
                if let Some(value) = value.as_deref().filter(|v| *v != description) {
                    issues.push(format!(
                        "Inconsistency: meta description ('{}...') and {} ('{}...') differ.",
                        prefix(description, 30),
                        tag,
                        prefix(value, 30)
                    ));
                }
            }
        }

        if let (Some(og), Some(twitter)) = (&og_image, &twitter_image) {
            if og != twitter {
                issues.push(format!(
                    "Inconsistency: og:image ('{og}') and twitter:image ('{twitter}') differ."
                ));
            }
        }
        if let (Some(og), Some(default_path)) = (&og_image, &config.default_image_path) {
            let uses_default = Url::parse(og).is_ok_and(|url| url.path() == default_path);
            if uses_default && twitter_image.as_ref() != Some(og) {
                issues.push(format!(
                    "Default image inconsistency: og:image is '{}', but twitter:image is '{}'.",
                    og,
                    twitter_image.as_deref().unwrap_or("missing")
                ));
            }
        }

        if let (Some(canonical), Some(og_url)) = (&canonical, &og_url) {
            if canonical != og_url {
                issues.push(format!(
                    "Inconsistency: canonical URL ('{canonical}') and og:url ('{og_url}') differ."
                ));
            }
        }

        issues
    }

    fn image_check(&self, context: &'static str) -> MetaCheck<'a> {
        MetaCheck {
            min_length: 1,
            url: Some(UrlCheck {
                context,
                image: true,
                local_root: Some(self.site_root),
            }),
            ..MetaCheck::default()
        }
    }

    /// Looks up one `<meta>` tag, records its problems and returns its content
    fn meta(
        &self,
        doc: &Html,
        issues: &mut Vec<String>,
        key: MetaKey<'_>,
        check: MetaCheck<'_>,
    ) -> Option<String> {
        let described = key.describe();
        let Some(tag) = key.selector().and_then(|s| doc.select(&s).next()) else {
            issues.push(format!("{described} missing."));
            return None;
        };
        let Some(content) = tag.value().attr("content") else {
            issues.push(format!("{described} has no 'content' attribute."));
            return None;
        };

        if content.trim().chars().count() < check.min_length {
            issues.push(format!(
                "Content of {} is empty or too short (minimum: {}, found: '{}').",
                described, check.min_length, content
            ));
        }
        if let Some(expected) = check.expected {
            if content != expected {
                issues.push(format!(
                    "Content of {described}: expected '{expected}', found '{content}'."
                ));
            }
        }
        if let Some(url_check) = check.url {
            issues.extend(self.validate_url(content, url_check));
        }
        Some(content.to_string())
    }

    fn canonical(&self, doc: &Html, issues: &mut Vec<String>) -> Option<String> {
        let selector = Selector::parse(r#"link[rel~="canonical"]"#).ok()?;
        let Some(tag) = doc.select(&selector).next() else {
            issues.push("<link rel='canonical'> missing.".to_string());
            return None;
        };
        match tag.value().attr("href").filter(|href| !href.is_empty()) {
            None => {
                issues.push("<link rel='canonical'> has no 'href' attribute.".to_string());
                None
            }
            Some(href) => {
                issues.extend(self.validate_url(
                    href,
                    UrlCheck {
                        context: "Canonical URL",
                        image: false,
                        local_root: None,
                    },
                ));
                Some(href.to_string())
            }
        }
    }

    /// Absolute, on the expected domain (images may use another host), and
    /// present in the built site when a local root is given
    fn validate_url(&self, raw: &str, check: UrlCheck<'_>) -> Vec<String> {
        let context = check.context;
        if raw.is_empty() {
            return vec![format!("{context}: URL is empty.")];
        }

        let url = match Url::parse(raw) {
            Ok(url) if url.has_host() => url,
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                return vec![format!(
                    "{context}: URL '{raw}' is not absolute (missing scheme or host)."
                )];
            }
            Err(_) => return vec![format!("{context}: URL '{raw}' has an invalid format.")],
        };

        let mut issues = Vec::new();
        let on_domain = match &self.config.expected_domain {
            Some(domain) => url.host_str() == Some(domain.as_str()),
            None => true,
        };
        if !on_domain && !check.image {
            issues.push(format!(
                "{}: URL '{}' does not belong to the expected domain '{}'.",
                context,
                raw,
                self.config.expected_domain.as_deref().unwrap_or_default()
            ));
        }

        if let Some(root) = check.local_root.filter(|_| on_domain) {
            let path = url.path();
            let decoded = urlencoding::decode(path).map_or_else(|_| path.to_string(), |p| p.into_owned());
            let local = root.join(decoded.trim_start_matches('/'));
            if !local.exists() {
                issues.push(format!(
                    "{}: local file for URL '{}' (path '{}') not found at '{}'.",
                    context,
                    raw,
                    path,
                    local.display()
                ));
            }
        }
        issues
    }
}

fn required<'a>() -> MetaCheck<'a> {
    MetaCheck {
        min_length: 1,
        ..MetaCheck::default()
    }
}

/// Trimmed text of `<title>`, `None` when the tag is absent
fn first_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector).next().map(html::element_text)
}

/// First `n` characters of `s`
fn prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

/// Audits every page under `root`
///
/// A page that cannot be read gets a single issue describing the failure.
pub fn audit_site(root: impl AsRef<Path>, config: &MetadataConfig) -> Result<MetadataReport> {
    let root = site_root(root.as_ref())?;
    let auditor = MetadataAuditor::new(config, &root);
    let mut report = MetadataReport::default();

    let files = filesystem::discover_html_files(&root)?;
    ::log::info!("Auditing metadata of {} pages", files.len());
    for path in files {
        let relative = filesystem::relative_path(&root, &path);
        report.pages += 1;

        let issues = match std::fs::read_to_string(&path) {
            Ok(content) => auditor.audit_page(&relative, &content),
            Err(e) => {
                let error = Error::read(&path, e);
                ::log::warn!("Failed to audit {}: {}", relative, error);
                vec![format!("Error processing metadata of {relative}: {error}")]
            }
        };
        ::log::debug!("{}: {} metadata issues", relative, issues.len());
        if !issues.is_empty() {
            report.issues.insert(relative, issues);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTION: &str = "Pesquisa em eletrônica de potência e controle.";

    fn config() -> MetadataConfig {
        MetadataConfig {
            expected_domain: Some("lab.example.org".to_string()),
            expected_author: Some("Equipe do Laboratório".to_string()),
            default_image_path: Some("/img/og.png".to_string()),
            default_description: Some(DESCRIPTION.to_string()),
            ..MetadataConfig::default()
        }
    }

    fn complete_page(description: &str) -> String {
        format!(
            r#"<html><head>
            <title>Eletrônica de Potência</title>
            <meta name="description" content="{description}">
            <meta name="author" content="Equipe do Laboratório">
            <meta name="keywords" content="eletrônica, potência">
            <link rel="canonical" href="https://lab.example.org/potencia.html">
            <meta property="og:title" content="Eletrônica de Potência">
            <meta property="og:description" content="{description}">
            <meta property="og:url" content="https://lab.example.org/potencia.html">
            <meta property="og:image" content="https://lab.example.org/img/og.png">
            <meta property="og:type" content="website">
            <meta name="twitter:card" content="summary_large_image">
            <meta name="twitter:title" content="Eletrônica de Potência">
            <meta name="twitter:description" content="{description}">
            <meta name="twitter:image" content="https://lab.example.org/img/og.png">
            </head><body></body></html>"#
        )
    }

    fn site_with_image() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/og.png"), b"png").unwrap();
        dir
    }

    #[test]
    fn test_complete_home_page_has_no_issues() {
        let dir = site_with_image();
        let config = config();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let issues = auditor.audit_page("index.html", &complete_page(DESCRIPTION));
        assert!(issues.is_empty(), "{issues:#?}");
    }

    #[test]
    fn test_default_description_on_inner_page() {
        let dir = site_with_image();
        let config = config();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let issues = auditor.audit_page("potencia.html", &complete_page(DESCRIPTION));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Warning: meta description looks like the site-wide default"));
    }

    #[test]
    fn test_empty_page_reports_every_missing_tag() {
        let dir = TempDir::new().unwrap();
        let config = MetadataConfig::default();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let issues = auditor.audit_page("x.html", "<html><body></body></html>");
        assert_eq!(
            issues,
            vec![
                "<title> tag missing.",
                "<meta name='description'> missing.",
                "<meta name='keywords'> missing.",
                "<link rel='canonical'> missing.",
                "<meta property='og:title'> missing.",
                "<meta property='og:description'> missing.",
                "<meta property='og:url'> missing.",
                "<meta property='og:image'> missing.",
                "<meta property='og:type'> missing.",
                "<meta name='twitter:card'> missing.",
                "<meta name='twitter:title'> missing.",
                "<meta name='twitter:description'> missing.",
                "<meta name='twitter:image'> missing.",
            ]
        );
    }

    #[test]
    fn test_short_values_and_wrong_expectations() {
        let dir = site_with_image();
        let config = config();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let page = complete_page(DESCRIPTION)
            .replace("<title>Eletrônica de Potência</title>", "<title>Oi</title>")
            .replace(r#"content="website""#, r#"content="article""#)
            .replace(r#"content="Equipe do Laboratório""#, r#"content="Outra Pessoa""#);
        let issues = auditor.audit_page("index.html", &page);

        assert!(issues.contains(&"<title> is empty or too short (minimum: 5, found: 'Oi').".to_string()));
        assert!(issues.contains(
            &"Content of <meta property='og:type'>: expected 'website', found 'article'.".to_string()
        ));
        assert!(issues.contains(
            &"Content of <meta name='author'>: expected 'Equipe do Laboratório', found 'Outra Pessoa'."
                .to_string()
        ));
        assert!(issues.iter().any(|i| i.starts_with("Inconsistency: <title> ('Oi') and og:title")));
    }

    #[test]
    fn test_url_checks() {
        let dir = site_with_image();
        let config = config();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let page = complete_page(DESCRIPTION)
            .replace(
                r#"<link rel="canonical" href="https://lab.example.org/potencia.html">"#,
                r#"<link rel="canonical" href="/potencia.html">"#,
            )
            .replace(
                r#"property="og:url" content="https://lab.example.org/potencia.html""#,
                r#"property="og:url" content="https://elsewhere.org/potencia.html""#,
            )
            .replace(
                r#"name="twitter:image" content="https://lab.example.org/img/og.png""#,
                r#"name="twitter:image" content="https://lab.example.org/img/missing.png""#,
            );
        let issues = auditor.audit_page("index.html", &page);

        assert!(issues.contains(
            &"Canonical URL: URL '/potencia.html' is not absolute (missing scheme or host)."
                .to_string()
        ));
        assert!(issues.contains(
            &"Open Graph URL: URL 'https://elsewhere.org/potencia.html' does not belong to the expected domain 'lab.example.org'."
                .to_string()
        ));
        assert!(issues.iter().any(|i| i.starts_with(
            "Twitter Image URL: local file for URL 'https://lab.example.org/img/missing.png'"
        )));
        assert!(issues.iter().any(|i| i.starts_with("Inconsistency: og:image")));
        assert!(issues.iter().any(|i| i.starts_with("Default image inconsistency")));
        assert!(issues.iter().any(|i| i.starts_with("Inconsistency: canonical URL")));
    }

    #[test]
    fn test_cdn_images_are_accepted() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let auditor = MetadataAuditor::new(&config, dir.path());
        let page = complete_page(DESCRIPTION)
            .replace("https://lab.example.org/img/og.png", "https://cdn.example.net/og.png");
        let issues = auditor.audit_page("index.html", &page);
        assert!(issues.is_empty(), "{issues:#?}");
    }

    #[test]
    fn test_keywords_count() {
        let dir = site_with_image();
        let config = MetadataConfig {
            min_keywords_count: 3,
            ..config()
        };
        let auditor = MetadataAuditor::new(&config, dir.path());
        let issues = auditor.audit_page("index.html", &complete_page(DESCRIPTION));
        assert_eq!(
            issues,
            vec!["Meta keywords: expected at least 3 keyword(s), found 2 ('eletrônica, potência')."]
        );
    }

    #[test]
    fn test_audit_site_lists_only_pages_with_issues() {
        let dir = site_with_image();
        fs::write(dir.path().join("index.html"), complete_page(DESCRIPTION)).unwrap();
        fs::write(dir.path().join("vazio.html"), "<p>sem metadados</p>").unwrap();

        let report = audit_site(dir.path(), &config()).unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.issues.keys().collect::<Vec<_>>(), vec!["vazio.html"]);
    }

    #[test]
    fn test_unreadable_page_yields_one_issue() {
        let dir = site_with_image();
        fs::write(dir.path().join("index.html"), complete_page(DESCRIPTION)).unwrap();
        fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0xfd]).unwrap();

        let report = audit_site(dir.path(), &config()).unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.issues.len(), 1);
        let issues = &report.issues["bad.html"];
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Error processing metadata of bad.html"), "{}", issues[0]);
    }
}
