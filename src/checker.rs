use crate::config::{self, AuditConfig, LinkCheckerConfig};
use crate::crawlers::filesystem::Site;
use crate::crawlers::web::{HttpProber, LinkCache};
use crate::error::Result;
use crate::filter::UrlFilter;
use crate::parsers::html;
use crate::resolve::{self, BrokenLinkPolicy, BrokenTarget, ResolvedTarget};
use crate::results::{Document, LinkIssue, PageLink};
use std::collections::HashSet;
use std::path::Path;

/// Everything one link-check run found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub issues: Vec<LinkIssue>,
    /// Pages examined, including ones that failed to load
    pub pages: usize,
    /// Links that were actually verified, broken or not
    pub checked: usize,
    /// mailto/tel/data/javascript links, excluded URLs, and external links
    /// when external checking is off
    pub skipped: usize,
}

/// What became of a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Ok,
    Skipped(&'static str),
    Broken(String),
}

/// Verifies every link of every page of a site
pub struct LinkChecker {
    /// `None` when external checking is disabled
    prober: Option<HttpProber>,
    filter: UrlFilter,
}

impl LinkChecker {
    pub fn new(config: &LinkCheckerConfig, user_agent: &str) -> Result<Self> {
        let prober = if config.check_external {
            Some(HttpProber::new(user_agent, config)?)
        } else {
            None
        };
        Ok(Self {
            prober,
            filter: UrlFilter::from_config(config)?,
        })
    }

    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(&config.link_checker, &config.user_agent())
    }

    pub fn checks_external(&self) -> bool {
        self.prober.is_some()
    }

    /// Checks every page of `site`, one link at a time
    ///
    /// External results go through `cache`; a page that failed to load yields
    /// a single issue and the run moves on.
    pub async fn check_site(&self, site: &Site, cache: &mut LinkCache) -> CheckReport {
        let mut report = CheckReport::default();
        if !self.checks_external() {
            ::log::warn!("External link checking is disabled");
        }

        let total = site.len();
        for (i, document) in site.documents().values().enumerate() {
            ::log::info!("[{}/{}] Checking links in {}", i + 1, total, document.relative_path);
            report.pages += 1;

            if let Some(error) = &document.load_error {
                report.issues.push(unreadable_page(document, error));
                continue;
            }

            for link in &document.links {
                match self.check_link(site, document, link, cache).await {
                    LinkOutcome::Ok => report.checked += 1,
                    LinkOutcome::Skipped(why) => {
                        ::log::trace!("Skipped {} ({})", link.href, why);
                        report.skipped += 1;
                    }
                    LinkOutcome::Broken(reason) => {
                        ::log::debug!("Broken link {} in {}: {}", link.href, document.relative_path, reason);
                        report.checked += 1;
                        report.issues.push(LinkIssue {
                            source_path: document.relative_path.clone(),
                            offending_tag: link.markup.clone(),
                            href: link.href.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        ::log::info!(
            "Link check finished: {} pages, {} links checked, {} skipped, {} broken",
            report.pages,
            report.checked,
            report.skipped,
            report.issues.len()
        );
        report
    }

    /// Checks one link found in `document`
    pub async fn check_link(
        &self,
        site: &Site,
        document: &Document,
        link: &PageLink,
        cache: &mut LinkCache,
    ) -> LinkOutcome {
        let target = resolve::resolve_with(
            &link.href,
            &document.relative_path,
            site.root(),
            BrokenLinkPolicy::Report,
        );

        match target {
            ResolvedTarget::NonResolvable => LinkOutcome::Skipped("not a checkable link"),
            ResolvedTarget::External => {
                let Some(prober) = &self.prober else {
                    return LinkOutcome::Skipped("external checking disabled");
                };
                if !self.filter.should_check(&link.href) {
                    return LinkOutcome::Skipped("excluded by pattern");
                }
                let status = prober.check(&link.href, cache).await;
                if status.ok {
                    LinkOutcome::Ok
                } else {
                    LinkOutcome::Broken(status.message)
                }
            }
            ResolvedTarget::SameFile { fragment } => match fragment {
                Some(fragment) => check_anchor(
                    &document.fragment_targets,
                    &fragment,
                    &document.relative_path,
                ),
                None => LinkOutcome::Ok,
            },
            ResolvedTarget::Internal { path, fragment } => {
                check_internal(site, &path, fragment.as_deref())
            }
            ResolvedTarget::Broken(BrokenTarget::OutsideRoot) => LinkOutcome::Broken(format!(
                "internal link points outside the site directory: {}",
                link.href
            )),
            ResolvedTarget::Broken(BrokenTarget::MissingIndex { directory }) => {
                LinkOutcome::Broken(format!(
                    "directory link '{directory}/' has no matching 'index.html'"
                ))
            }
        }
    }
}

/// The target must exist; when a fragment is given it must name an `id` or
/// an `<a name>` in the target
fn check_internal(site: &Site, path: &str, fragment: Option<&str>) -> LinkOutcome {
    if let Some(target) = site.get(path) {
        let Some(fragment) = fragment else {
            return LinkOutcome::Ok;
        };
        return match &target.load_error {
            Some(error) => LinkOutcome::Broken(format!(
                "could not check anchor '#{fragment}' in '{path}': {error}"
            )),
            None => check_anchor(&target.fragment_targets, fragment, path),
        };
    }

    // Not a loaded page: an asset, or a missing file
    let full = site.root().join(path);
    if !full.is_file() {
        return LinkOutcome::Broken(format!("target file not found: '{path}'"));
    }
    match fragment {
        None => LinkOutcome::Ok,
        Some(fragment) => match fragment_targets_on_disk(&full) {
            Ok(targets) => check_anchor(&targets, fragment, path),
            Err(e) => LinkOutcome::Broken(format!(
                "could not check anchor '#{fragment}' in '{path}': {e}"
            )),
        },
    }
}

fn check_anchor(targets: &HashSet<String>, fragment: &str, path: &str) -> LinkOutcome {
    if targets.contains(fragment) {
        LinkOutcome::Ok
    } else {
        LinkOutcome::Broken(format!("anchor '#{fragment}' not found in '{path}'"))
    }
}

fn fragment_targets_on_disk(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::Error::read(path, e))?;
    Ok(html::fragment_targets(&content))
}

fn unreadable_page(document: &Document, error: &str) -> LinkIssue {
    LinkIssue {
        source_path: document.relative_path.clone(),
        offending_tag: "N/A (error processing source file)".to_string(),
        href: "N/A".to_string(),
        reason: format!("critical read/parse error: {error}"),
    }
}

/// Loads the site at `root` and checks it with `config`, sharing `cache`
pub async fn check_links(
    root: impl AsRef<Path>,
    config: &AuditConfig,
    cache: &mut LinkCache,
) -> Result<CheckReport> {
    let site = Site::load(root)?;
    let checker = LinkChecker::from_config(config)?;
    Ok(checker.check_site(&site, cache).await)
}

/// One-shot check with default timeouts and a fresh cache
pub async fn check(
    root: impl AsRef<Path>,
    check_external: bool,
    user_agent_url: &str,
) -> Result<Vec<LinkIssue>> {
    let link_checker = LinkCheckerConfig {
        check_external,
        ..LinkCheckerConfig::default()
    };
    let checker = LinkChecker::new(&link_checker, &config::user_agent(user_agent_url))?;
    let site = Site::load(root)?;
    let mut cache = LinkCache::new();
    Ok(checker.check_site(&site, &mut cache).await.issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn offline() -> LinkChecker {
        let config = LinkCheckerConfig {
            check_external: false,
            ..LinkCheckerConfig::default()
        };
        LinkChecker::new(&config, "test").unwrap()
    }

    fn reasons(report: &CheckReport) -> Vec<(&str, &str)> {
        report
            .issues
            .iter()
            .map(|issue| (issue.href.as_str(), issue.reason.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_internal_links() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "index.html",
            r##"<html><head>
                <link rel="stylesheet" href="css/site.css">
                <link rel="canonical" href="https://example.org/">
            </head><body>
                <a href="about.html#bio">Bio</a>
                <a href="about.html#nope">Nope</a>
                <a href="#top">Top</a>
                <a href="#missing">Missing</a>
                <a href="ensino/">Ensino</a>
                <a href="assets/">Assets</a>
                <a href="../secret.html">Out</a>
                <a href="gone.html">Gone</a>
                <a href="mailto:me@example.org">Mail</a>
                <img src="img/logo.png">
                <a href="https://example.org/external">Ext</a>
                <span id="top"></span>
            </body></html>"##,
        );
        write(dir.path(), "about.html", r#"<h2 id="bio">Bio</h2>"#);
        write(dir.path(), "ensino/index.html", "<p>Ensino</p>");
        write(dir.path(), "css/site.css", "body {}");
        fs::create_dir_all(dir.path().join("assets")).unwrap();

        let site = Site::load(dir.path()).unwrap();
        let report = offline().check_site(&site, &mut LinkCache::new()).await;

        assert_eq!(
            reasons(&report),
            vec![
                ("about.html#nope", "anchor '#nope' not found in 'about.html'"),
                ("#missing", "anchor '#missing' not found in 'index.html'"),
                ("assets/", "directory link 'assets/' has no matching 'index.html'"),
                (
                    "../secret.html",
                    "internal link points outside the site directory: ../secret.html"
                ),
                ("gone.html", "target file not found: 'gone.html'"),
                ("img/logo.png", "target file not found: 'img/logo.png'"),
            ]
        );
        assert_eq!(report.pages, 3);
        // mailto + external with checking off
        assert_eq!(report.skipped, 2);
        assert_eq!(report.checked, 10);
        assert!(report.issues[0].offending_tag.starts_with("<a href=\"about.html#nope\""));
    }

    #[tokio::test]
    async fn test_encoded_anchors_match_decoded_ids() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "index.html",
            r##"<a href="#se%C3%A7%C3%A3o">Seção</a>
                <a href="about.html#m%C3%A9todo">Método</a>
                <a href="about.html#m%C3%A9todos">Métodos</a>
                <h2 id="seção">Seção</h2>"##,
        );
        write(dir.path(), "about.html", r#"<h2 id="método">Método</h2>"#);

        let site = Site::load(dir.path()).unwrap();
        let report = offline().check_site(&site, &mut LinkCache::new()).await;
        assert_eq!(
            reasons(&report),
            vec![(
                "about.html#m%C3%A9todos",
                "anchor '#métodos' not found in 'about.html'"
            )]
        );
    }

    #[tokio::test]
    async fn test_unreadable_page_yields_one_issue() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.html", r#"<a href="missing.html">x</a>"#);
        fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0xfd]).unwrap();

        let site = Site::load(dir.path()).unwrap();
        let report = offline().check_site(&site, &mut LinkCache::new()).await;

        assert_eq!(report.issues.len(), 2);
        let bad = &report.issues[0];
        assert_eq!(bad.source_path, "bad.html");
        assert_eq!(bad.href, "N/A");
        assert!(bad.reason.starts_with("critical read/parse error"));
        assert_eq!(report.issues[1].source_path, "good.html");
    }

    #[tokio::test]
    async fn test_external_links_use_shared_cache() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/ok")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("HEAD", "/missing")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let page = format!(
            r#"<a href="{0}/ok">a</a><a href="{0}/missing">b</a><a href="{0}/ok">again</a>"#,
            server.url()
        );
        write(dir.path(), "index.html", &page);
        write(dir.path(), "other.html", &page);

        let checker = LinkChecker::new(&LinkCheckerConfig::default(), "test").unwrap();
        let site = Site::load(dir.path()).unwrap();
        let mut cache = LinkCache::new();
        let report = checker.check_site(&site, &mut cache).await;

        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.reason.contains("HTTP 404")));
        assert_eq!(report.checked, 6);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_excluded_external_urls_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "index.html",
            r#"<a href="http://127.0.0.1:9/blocked">x</a>"#,
        );
        let config = LinkCheckerConfig {
            exclude_patterns: vec!["blocked".to_string()],
            ..LinkCheckerConfig::default()
        };
        let checker = LinkChecker::new(&config, "test").unwrap();
        let site = Site::load(dir.path()).unwrap();
        let report = checker.check_site(&site, &mut LinkCache::new()).await;
        assert!(report.issues.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_check_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = check(dir.path().join("nope"), false, "http://example.com").await;
        assert!(matches!(result, Err(crate::error::Error::NotADirectory(_))));
    }
}
