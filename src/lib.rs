pub mod checker;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod graph;
pub mod metadata;
pub mod parsers;
pub mod redirects;
pub mod report;
pub mod resolve;
pub mod results;
pub mod sitemap;
pub mod suggest;

// Re-export commonly used types for convenience
pub use checker::CheckReport;
pub use config::AuditConfig;
pub use crawlers::filesystem::Site;
pub use crawlers::web::LinkCache;
pub use error::{Error, Result};
pub use graph::{LinkGraph, Orphans};
pub use results::{Document, LinkIssue, Suggestion};

use std::path::{Path, PathBuf};

/// Main builder for audits of one built site
///
/// ```no_run
/// # async fn run() -> site_audit::Result<()> {
/// let report = site_audit::Audit::new("public_html")
///     .with_skip_external(true)
///     .check_links()
///     .await?;
/// println!("{}", site_audit::report::LinkReport(&report));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Audit {
    root: PathBuf,
    config: AuditConfig,
}

impl Audit {
    /// Create a new Audit builder for the site at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: AuditConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = AuditConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, config_str: &str) -> Result<Self> {
        let config = AuditConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Skip external links instead of requesting them
    pub fn with_skip_external(mut self, skip: bool) -> Self {
        if skip {
            self.config.link_checker.check_external = false;
        }
        self
    }

    /// Set the site URL announced in the User-Agent
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.config.site_url = site_url.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn load_site(&self) -> Result<Site> {
        Site::load(&self.root)
    }

    /// Loads the site and builds its internal link graph
    pub fn link_graph(&self) -> Result<(Site, LinkGraph)> {
        let site = self.load_site()?;
        let graph = LinkGraph::build(&site);
        Ok((site, graph))
    }

    pub fn orphans(&self) -> Result<Orphans> {
        let (_, graph) = self.link_graph()?;
        Ok(graph::find_orphans(&graph))
    }

    /// Link suggestions for every page of the site
    pub fn opportunities(&self) -> Result<(Site, suggest::Suggestions)> {
        let (site, graph) = self.link_graph()?;
        let suggestions = suggest::suggest(&site, &graph);
        Ok((site, suggestions))
    }

    /// Link suggestions for orphan pages only
    pub fn orphan_suggestions(&self) -> Result<(Site, Orphans, suggest::Suggestions)> {
        let (site, graph) = self.link_graph()?;
        let orphans = graph::find_orphans(&graph);
        let suggestions = suggest::suggest_for_orphans(&orphans, &site, &graph);
        Ok((site, orphans, suggestions))
    }

    /// Checks every link with a cache that lives for this call only
    pub async fn check_links(&self) -> Result<CheckReport> {
        let mut cache = LinkCache::new();
        checker::check_links(&self.root, &self.config, &mut cache).await
    }

    pub fn audit_metadata(&self) -> Result<metadata::MetadataReport> {
        metadata::audit_site(&self.root, &self.config.metadata)
    }

    /// Writes `sitemap.xml` using `base_url`, or the configured site URL
    pub fn write_sitemap(&self, base_url: Option<&str>) -> Result<PathBuf> {
        sitemap::write_sitemap(&self.root, self.sitemap_base_url(base_url))
    }

    /// The base URL [`Audit::write_sitemap`] builds `<loc>` values from
    pub fn sitemap_base_url<'a>(&'a self, base_url: Option<&'a str>) -> &'a str {
        match base_url {
            Some(base_url) => base_url,
            None => {
                if self.config.has_default_site_url() {
                    ::log::warn!(
                        "No base URL given and no site_url configured; sitemap URLs will use the placeholder {}",
                        self.config.site_url
                    );
                }
                &self.config.site_url
            }
        }
    }
}
