use crate::config::LinkCheckerConfig;
use crate::error::Result;
use crate::filter::UrlFilter;
use reqwest::{Client, StatusCode, redirect};
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of probing one external URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    pub ok: bool,
    pub message: String,
}

impl LinkStatus {
    fn ok(message: String) -> Self {
        Self { ok: true, message }
    }

    fn broken(message: String) -> Self {
        Self { ok: false, message }
    }
}

/// Results of external checks made during one run
///
/// Owned by whoever drives the run and handed to every check, so the same URL
/// is requested once per run no matter how many pages link to it. Nothing is
/// kept between runs.
#[derive(Debug, Default)]
pub struct LinkCache {
    entries: HashMap<String, LinkStatus>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&LinkStatus> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: String, status: LinkStatus) {
        self.entries.insert(url, status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Checks external URLs with HEAD, falling back to GET when HEAD fails
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    head_timeout: Duration,
    get_timeout: Duration,
}

impl HttpProber {
    /// Builds a client that follows up to `max_redirects` redirects and
    /// identifies itself with `user_agent`
    pub fn new(user_agent: &str, config: &LinkCheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self {
            client,
            head_timeout: Duration::from_secs(config.head_timeout_secs),
            get_timeout: Duration::from_secs(config.get_timeout_secs),
        })
    }

    /// Returns the cached status for `href`, probing it on a miss
    pub async fn check(&self, href: &str, cache: &mut LinkCache) -> LinkStatus {
        let key = UrlFilter::cache_key(href);
        if let Some(status) = cache.get(&key) {
            ::log::debug!("Cache hit for {}", key);
            return status.clone();
        }
        let status = self.probe(&key).await;
        cache.insert(key, status.clone());
        status
    }

    /// Requests `url` without consulting any cache
    ///
    /// Only a final status of 400 or more counts as broken. Servers that
    /// reject HEAD get a second chance with GET, whose status then decides.
    pub async fn probe(&self, url: &str) -> LinkStatus {
        let url = absolute_url(url);
        ::log::debug!("HEAD {}", url);

        let head = match self
            .client
            .head(&url)
            .timeout(self.head_timeout)
            .send()
            .await
        {
            Ok(response) => response.status(),
            Err(e) => return transport_failure(&url, &e),
        };

        if !is_failure(head) {
            return LinkStatus::ok(format!("OK (HEAD {})", head.as_u16()));
        }

        ::log::debug!("HEAD {} returned {}, retrying with GET", url, head);
        // The body is never read; dropping the response closes it
        let get = match self
            .client
            .get(&url)
            .timeout(self.get_timeout)
            .send()
            .await
        {
            Ok(response) => response.status(),
            Err(e) => return transport_failure(&url, &e),
        };

        let trail = format!("(GET {} after HEAD {})", get.as_u16(), head.as_u16());
        if is_failure(get) {
            LinkStatus::broken(format!("HTTP {} {}", get.as_u16(), trail))
        } else {
            LinkStatus::ok(format!("OK {trail}"))
        }
    }
}

fn is_failure(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Protocol-relative links are requested over https
fn absolute_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

fn transport_failure(url: &str, e: &reqwest::Error) -> LinkStatus {
    ::log::debug!("Request to {} failed: {}", url, e);
    let message = if e.is_timeout() {
        "timeout (exceeded time limit)".to_string()
    } else if e.is_redirect() {
        "too many redirects".to_string()
    } else if e.is_connect() {
        "request error: connection failed".to_string()
    } else {
        format!("request error: {e}")
    };
    LinkStatus::broken(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prober(head_timeout_secs: u64) -> HttpProber {
        let config = LinkCheckerConfig {
            head_timeout_secs,
            get_timeout_secs: head_timeout_secs,
            ..LinkCheckerConfig::default()
        };
        HttpProber::new("site-audit-test", &config).unwrap()
    }

    #[tokio::test]
    async fn test_head_ok() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/ok")
            .with_status(200)
            .create_async()
            .await;

        let status = prober(5).probe(&format!("{}/ok", server.url())).await;
        assert_eq!(status, LinkStatus::ok("OK (HEAD 200)".to_string()));
        head.assert_async().await;
    }

    #[tokio::test]
    async fn test_head_and_get_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/gone")
            .with_status(404)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let status = prober(5).probe(&format!("{}/gone", server.url())).await;
        assert!(!status.ok);
        assert!(status.message.contains("HTTP 404"), "{}", status.message);
        assert_eq!(status.message, "HTTP 404 (GET 404 after HEAD 404)");
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_fallback_when_head_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/page")
            .with_status(405)
            .create_async()
            .await;
        server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let status = prober(5).probe(&format!("{}/page", server.url())).await;
        assert_eq!(
            status,
            LinkStatus::ok("OK (GET 200 after HEAD 405)".to_string())
        );
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/new", server.url());
        server
            .mock("HEAD", "/old")
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        server
            .mock("HEAD", "/new")
            .with_status(200)
            .create_async()
            .await;

        let status = prober(5).probe(&format!("{}/old", server.url())).await;
        assert!(status.ok, "{}", status.message);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        // Accepted by the kernel backlog but never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/slow", listener.local_addr().unwrap());

        let status = prober(1).probe(&url).await;
        assert!(!status.ok);
        assert!(status.message.starts_with("timeout"), "{}", status.message);
        drop(listener);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/loop")
            .with_status(301)
            .with_header("location", "/loop")
            .create_async()
            .await;

        let config = LinkCheckerConfig {
            max_redirects: 3,
            ..LinkCheckerConfig::default()
        };
        let prober = HttpProber::new("site-audit-test", &config).unwrap();
        let status = prober.probe(&format!("{}/loop", server.url())).await;
        assert!(!status.ok);
        assert_eq!(status.message, "too many redirects");
    }

    #[tokio::test]
    async fn test_refused_connection_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let status = prober(5).probe(&url).await;
        assert!(!status.ok);
        assert_eq!(status.message, "request error: connection failed");
    }

    #[tokio::test]
    async fn test_cache_avoids_second_request() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/once")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let prober = prober(5);
        let mut cache = LinkCache::new();
        let url = format!("{}/once", server.url());
        let first = prober.check(&url, &mut cache).await;
        let second = prober.check(&format!("{url}#section"), &mut cache).await;

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        head.assert_async().await;
    }

    #[test]
    fn test_protocol_relative_becomes_https() {
        assert_eq!(absolute_url("//cdn.example.com/a.js"), "https://cdn.example.com/a.js");
        assert_eq!(absolute_url("http://x.org/"), "http://x.org/");
    }
}
