use crate::config::LinkCheckerConfig;
use crate::error::Result;
use regex::Regex;
use url::Url;

/// Decides which external URLs the link checker actually requests
///
/// URLs matching any exclude pattern are counted as skipped. Hosts known to
/// block bots (LinkedIn's HTTP 999, for instance) are the usual candidates.
#[derive(Debug, Default)]
pub struct UrlFilter {
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles the given exclude patterns
    pub fn new<S: AsRef<str>>(exclude_patterns: &[S]) -> Result<Self> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern.as_ref())?);
        }
        Ok(Self { exclude_regexes })
    }

    pub fn from_config(config: &LinkCheckerConfig) -> Result<Self> {
        Self::new(config.exclude_patterns.as_slice())
    }

    /// Whether an external `href` should be requested
    pub fn should_check(&self, href: &str) -> bool {
        !self.exclude_regexes.iter().any(|regex| regex.is_match(href))
    }

    /// The URL a cache entry is keyed on: the fragment never reaches the server
    pub fn cache_key(href: &str) -> String {
        match Url::parse(href) {
            Ok(mut url) => {
                url.set_fragment(None);
                url.into()
            }
            Err(_) => href.to_string(),
        }
    }
}
