// ABOUTME: Configuration options for shelf-scout including Options and the fluent ClientBuilder.
// ABOUTME: Covers per-strategy timeout, browser-like headers, relay endpoint, proxy templates and SSRF policy.

use std::collections::HashMap;
use std::net::ToSocketAddrs;
use std::time::Duration;

use crate::client::Client;

/// Desktop browser user agent sent on direct and relayed requests.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept-Language tuned to the priority platform's locale.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// Accept header for HTML documents.
pub const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Public passthrough proxies, tried in order. `{url}` receives the encoded target.
pub const DEFAULT_PROXIES: &[&str] = &[
    "https://api.allorigins.win/raw?url={url}",
    "https://corsproxy.io/?{url}",
];

/// Configuration options for the shelf-scout client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Upper bound for a single retrieval strategy.
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    pub allow_private_networks: bool,
    /// Absolute URL of the first-party relay route. No relay step when unset.
    pub relay_endpoint: Option<String>,
    /// Proxy URL templates containing `{url}`.
    pub proxies: Vec<String>,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            allow_private_networks: false,
            relay_endpoint: None,
            proxies: DEFAULT_PROXIES.iter().map(|p| p.to_string()).collect(),
            http_client: None,
            headers: HashMap::new(),
        }
    }
}

impl Options {
    /// Headers sent by strategies that talk to the product page itself.
    pub fn page_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers.insert("Accept".to_string(), HTML_ACCEPT.to_string());
        headers.insert("Accept-Language".to_string(), self.accept_language.clone());
        headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
        headers.insert("Cache-Control".to_string(), "max-age=0".to_string());
        for (k, v) in &self.headers {
            headers.insert(k.clone(), v.clone());
        }
        headers
    }

    /// Build the shared HTTP client, or reuse the configured one.
    ///
    /// Redirects are followed, but never into private networks unless
    /// `allow_private_networks` is set.
    pub fn build_http_client(&self) -> reqwest::Client {
        if let Some(client) = &self.http_client {
            return client.clone();
        }

        let allow_private = self.allow_private_networks;
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= 10 {
                return attempt.error("too many redirects");
            }
            if allow_private {
                return attempt.follow();
            }
            let next = attempt.url().clone();
            if let Some(host) = next.host_str() {
                let port = next.port_or_known_default().unwrap_or(80);
                if let Ok(ip) = host.parse::<std::net::IpAddr>() {
                    if crate::resource::is_private_ip(&ip) {
                        return attempt.error("redirect to private IP blocked");
                    }
                } else {
                    // Policy callbacks are sync, so this lookup blocks the runtime
                    // worker for the duration of the DNS query. It only runs for
                    // redirects to named hosts when private networks are refused.
                    match (host, port).to_socket_addrs() {
                        Ok(addrs) => {
                            for sa in addrs {
                                if crate::resource::is_private_ip(&sa.ip()) {
                                    return attempt.error("redirect to private IP blocked");
                                }
                            }
                        }
                        Err(_) => return attempt.error("DNS lookup failed during redirect"),
                    }
                }
            }
            attempt.follow()
        });

        reqwest::Client::builder()
            .redirect(redirect_policy)
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(component = "options", outcome = "fallback", detail = %e, "custom HTTP client failed to build");
                reqwest::Client::new()
            })
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the per-strategy timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set the Accept-Language header for page requests.
    pub fn accept_language(mut self, value: impl Into<String>) -> Self {
        self.opts.accept_language = value.into();
        self
    }

    /// Allow or disallow direct requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Use a first-party relay as the first retrieval strategy.
    pub fn relay_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.opts.relay_endpoint = Some(endpoint.into());
        self
    }

    /// Append a proxy URL template.
    pub fn proxy(mut self, template: impl Into<String>) -> Self {
        self.opts.proxies.push(template.into());
        self
    }

    /// Replace the proxy list. An empty list disables the proxy step.
    pub fn proxies<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.proxies = templates.into_iter().map(Into::into).collect();
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to direct page requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
