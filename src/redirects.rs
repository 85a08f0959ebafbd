use crate::config::AuditConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Response, header, redirect};
use std::time::Duration;
use url::Url;

/// One redirect response in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    pub url: String,
    pub status: u16,
    /// Canonical reason phrase, e.g. "Moved Permanently"
    pub reason: String,
    /// Raw `Location` header as sent by the server
    pub location: String,
}

/// The full chain from the requested URL to the final response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTrace {
    pub requested: String,
    pub hops: Vec<RedirectHop>,
    pub final_url: String,
    pub final_status: u16,
    pub final_reason: String,
}

impl RedirectTrace {
    pub fn redirected(&self) -> bool {
        !self.hops.is_empty()
    }
}

/// Follows redirects one request at a time so every hop can be recorded
pub struct RedirectTracer {
    client: Client,
    max_redirects: usize,
    timeout: Duration,
}

impl RedirectTracer {
    pub fn new(user_agent: &str, max_redirects: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            max_redirects,
            timeout,
        })
    }

    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(
            &config.user_agent(),
            config.link_checker.max_redirects,
            Duration::from_secs(config.link_checker.get_timeout_secs),
        )
    }

    /// GETs `url` and every `Location` it leads to
    ///
    /// Fails with [`Error::TooManyRedirects`] once the chain is longer than
    /// the limit; timeouts and transport failures surface as [`Error::Http`].
    pub async fn trace(&self, url: &str) -> Result<RedirectTrace> {
        let mut current = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        let mut hops = Vec::new();

        loop {
            ::log::debug!("GET {}", current);
            let response = self
                .client
                .get(current.clone())
                .timeout(self.timeout)
                .send()
                .await?;
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or_default().to_string();

            let location = match location(&response) {
                Some(location) if status.is_redirection() => location,
                _ => {
                    return Ok(RedirectTrace {
                        requested: url.to_string(),
                        hops,
                        final_url: current.into(),
                        final_status: status.as_u16(),
                        final_reason: reason,
                    });
                }
            };

            if hops.len() == self.max_redirects {
                return Err(Error::TooManyRedirects(self.max_redirects));
            }
            let next = current
                .join(&location)
                .map_err(|_| Error::InvalidUrl(location.clone()))?;
            ::log::debug!("{} {} -> {}", status.as_u16(), current, next);

            hops.push(RedirectHop {
                url: current.into(),
                status: status.as_u16(),
                reason,
                location,
            });
            current = next;
        }
    }
}

fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Traces `url` with the timeouts and User-Agent of `config`
pub async fn trace_redirects(url: &str, config: &AuditConfig) -> Result<RedirectTrace> {
    RedirectTracer::from_config(config)?.trace(url).await
}
