use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Top-level configuration for an audit run
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Public URL of the site, used in the User-Agent and as the sitemap base
    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default)]
    pub link_checker: LinkCheckerConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Settings for the link checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCheckerConfig {
    /// Whether external links are requested at all
    #[serde(default = "default_check_external")]
    pub check_external: bool,

    #[serde(default = "default_head_timeout_secs")]
    pub head_timeout_secs: u64,

    /// Timeout for the GET retried after a failed HEAD
    #[serde(default = "default_get_timeout_secs")]
    pub get_timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Regex patterns for external URLs that are skipped instead of requested
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Expectations the metadata auditor checks pages against
///
/// The optional fields switch their checks off when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Host every canonical, og:url and og:image is expected on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_author: Option<String>,

    #[serde(default = "default_og_type")]
    pub expected_og_type: String,

    #[serde(default = "default_twitter_card")]
    pub expected_twitter_card: String,

    /// Site-relative path of the shared fallback image, e.g. `/img/og-default.jpg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image_path: Option<String>,

    /// Site-wide fallback description that content pages should override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,

    #[serde(default = "default_min_title_length")]
    pub min_title_length: usize,

    #[serde(default = "default_min_description_length")]
    pub min_description_length: usize,

    #[serde(default = "default_min_keywords_count")]
    pub min_keywords_count: usize,
}

/// Placeholder site URL used when none is configured
pub const DEFAULT_SITE_URL: &str = "http://example.com/link-checker-script";

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

fn default_check_external() -> bool {
    true
}

fn default_head_timeout_secs() -> u64 {
    10
}

fn default_get_timeout_secs() -> u64 {
    15
}

fn default_max_redirects() -> usize {
    10
}

fn default_og_type() -> String {
    "website".to_string()
}

fn default_twitter_card() -> String {
    "summary_large_image".to_string()
}

fn default_min_title_length() -> usize {
    5
}

fn default_min_description_length() -> usize {
    20
}

fn default_min_keywords_count() -> usize {
    1
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            link_checker: LinkCheckerConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl Default for LinkCheckerConfig {
    fn default() -> Self {
        Self {
            check_external: default_check_external(),
            head_timeout_secs: default_head_timeout_secs(),
            get_timeout_secs: default_get_timeout_secs(),
            max_redirects: default_max_redirects(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            expected_domain: None,
            expected_author: None,
            expected_og_type: default_og_type(),
            expected_twitter_card: default_twitter_card(),
            default_image_path: None,
            default_description: None,
            min_title_length: default_min_title_length(),
            min_description_length: default_min_description_length(),
            min_keywords_count: default_min_keywords_count(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `site_url` is still the placeholder
    pub fn has_default_site_url(&self) -> bool {
        self.site_url == DEFAULT_SITE_URL
    }

    /// User-Agent sent with every outbound request
    pub fn user_agent(&self) -> String {
        user_agent(&self.site_url)
    }
}

pub fn user_agent(site_url: &str) -> String {
    format!("Mozilla/5.0 (compatible; SiteLinkCheckerBot/1.0; +{site_url})")
}
