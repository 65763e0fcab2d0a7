// ABOUTME: Concrete retrieval strategies: first-party relay, third-party CORS proxy and direct request.
// ABOUTME: Each makes exactly one request and fails on transport errors, non-2xx statuses or blank bodies.

use std::collections::HashMap;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::ScoutError;
use crate::options::Options;
use crate::resource::{fetch, FetchOptions};
use crate::retrieval::RetrievalStrategy;

/// Accept header sent to passthrough proxies.
const PROXY_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml";

/// Percent-encode a URL for use as a query value or path suffix.
pub fn encode_component(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

/// GET `url` and return its decoded body, failing on blank content.
async fn fetch_text(
    http: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<String, ScoutError> {
    let result = fetch(http, url, opts).await?;
    let body = result.text_utf8(None);
    if body.trim().is_empty() {
        return Err(ScoutError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("empty response body")),
        ));
    }
    Ok(body)
}

/// Ask the first-party relay to fetch the page on our behalf.
#[derive(Debug, Clone)]
pub struct RelayStrategy {
    endpoint: String,
}

impl RelayStrategy {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// The relay request URL for a target page.
    pub fn request_url(&self, target: &str) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}url={}", self.endpoint, sep, encode_component(target))
    }
}

impl RetrievalStrategy for RelayStrategy {
    fn name(&self) -> &str {
        "relay"
    }

    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, ScoutError>> {
        async move {
            // The relay is a trusted, configured endpoint and may live on localhost.
            let opts = FetchOptions {
                allow_private_networks: true,
                ..Default::default()
            };
            fetch_text(http, &self.request_url(url), &opts).await
        }
        .boxed()
    }
}

/// Fetch through a public passthrough proxy described by a URL template.
#[derive(Debug, Clone)]
pub struct ProxyStrategy {
    name: String,
    template: String,
}

impl ProxyStrategy {
    /// `template` must contain `{url}`; it is replaced by the encoded target.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let name = url::Url::parse(&template.replace("{url}", ""))
            .ok()
            .and_then(|u| u.host_str().map(|h| format!("proxy:{}", h)))
            .unwrap_or_else(|| "proxy".to_string());
        Self { name, template }
    }

    /// The proxy request URL for a target page.
    pub fn request_url(&self, target: &str) -> String {
        self.template.replace("{url}", &encode_component(target))
    }
}

impl RetrievalStrategy for ProxyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, ScoutError>> {
        async move {
            let mut headers = HashMap::new();
            headers.insert("Accept".to_string(), PROXY_ACCEPT.to_string());
            let opts = FetchOptions {
                headers,
                allow_private_networks: true,
                ..Default::default()
            };
            fetch_text(http, &self.request_url(url), &opts).await
        }
        .boxed()
    }
}

/// Request the page directly with browser-like headers.
#[derive(Debug, Clone)]
pub struct DirectStrategy {
    opts: FetchOptions,
}

impl DirectStrategy {
    pub fn new(headers: HashMap<String, String>, allow_private_networks: bool) -> Self {
        Self {
            opts: FetchOptions {
                headers,
                allow_private_networks,
                accept_any_status: false,
            },
        }
    }

    /// Direct strategy configured from client options.
    pub fn from_options(opts: &Options) -> Self {
        Self::new(opts.page_headers(), opts.allow_private_networks)
    }
}

impl RetrievalStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, ScoutError>> {
        fetch_text(http, url, &self.opts).boxed()
    }
}
