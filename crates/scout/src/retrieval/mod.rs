// ABOUTME: Ordered retrieval chain that obtains a page's HTML from the first strategy that succeeds.
// ABOUTME: Records one attempt per strategy and folds exhaustion into a single RetrievalExhausted error.

//! Retrieval strategy chain.
//!
//! Strategies run sequentially, never in parallel, and each gets exactly one
//! attempt bounded by the chain timeout. Failures are logged and swallowed;
//! only exhaustion of the whole chain reaches the caller.

pub mod strategies;

use std::fmt;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ScoutError;
use crate::options::Options;

pub use strategies::{encode_component, DirectStrategy, ProxyStrategy, RelayStrategy};

/// One way of obtaining a page's HTML.
pub trait RetrievalStrategy: Send + Sync {
    /// Short name used in attempt records and log events.
    fn name(&self) -> &str;

    /// Make a single attempt at fetching `url`.
    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, ScoutError>>;
}

/// How a single strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { bytes: usize },
    Failed { reason: String },
    TimedOut,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success { bytes } => write!(f, "success ({} bytes)", bytes),
            AttemptOutcome::Failed { reason } => write!(f, "failed: {}", reason),
            AttemptOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Diagnostic record of one strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// HTML obtained by the chain plus the attempts that led to it.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub html: String,
    /// Name of the strategy that succeeded.
    pub strategy: String,
    pub attempts: Vec<Attempt>,
}

/// An ordered list of retrieval strategies.
pub struct RetrievalChain {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    timeout: Duration,
}

impl fmt::Debug for RetrievalChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalChain")
            .field("strategies", &self.strategy_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RetrievalChain {
    /// Create an empty chain with the given per-strategy timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            strategies: Vec::new(),
            timeout,
        }
    }

    /// Append a strategy to the end of the chain.
    pub fn with_strategy(mut self, strategy: impl RetrievalStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// The standard chain: relay (when configured), each proxy, then direct.
    pub fn from_options(opts: &Options) -> Self {
        let mut chain = Self::new(opts.timeout);
        if let Some(endpoint) = &opts.relay_endpoint {
            chain = chain.with_strategy(RelayStrategy::new(endpoint.clone()));
        }
        for template in &opts.proxies {
            chain = chain.with_strategy(ProxyStrategy::new(template.clone()));
        }
        chain.with_strategy(DirectStrategy::from_options(opts))
    }

    /// Names of the strategies in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Fetch `url` through the chain, returning the first success.
    pub async fn fetch_html(
        &self,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<Retrieval, ScoutError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let name = strategy.name().to_string();
            let started = Instant::now();
            debug!(component = "retrieval", strategy = %name, url, "trying strategy");

            let outcome = tokio::time::timeout(self.timeout, strategy.fetch(http, url)).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(Ok(html)) => {
                    info!(
                        component = "retrieval",
                        outcome = "success",
                        strategy = %name,
                        bytes = html.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "fetched page"
                    );
                    attempts.push(Attempt {
                        strategy: name.clone(),
                        outcome: AttemptOutcome::Success { bytes: html.len() },
                        elapsed,
                    });
                    return Ok(Retrieval {
                        html,
                        strategy: name,
                        attempts,
                    });
                }
                Ok(Err(err)) => {
                    warn!(component = "retrieval", outcome = "failed", strategy = %name, detail = %err, "strategy failed");
                    attempts.push(Attempt {
                        strategy: name,
                        outcome: AttemptOutcome::Failed {
                            reason: err.to_string(),
                        },
                        elapsed,
                    });
                }
                Err(_) => {
                    warn!(
                        component = "retrieval",
                        outcome = "timed_out",
                        strategy = %name,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "strategy timed out"
                    );
                    attempts.push(Attempt {
                        strategy: name,
                        outcome: AttemptOutcome::TimedOut,
                        elapsed,
                    });
                }
            }
        }

        let summary = attempts
            .iter()
            .map(|a| format!("{}: {}", a.strategy, a.outcome))
            .collect::<Vec<_>>()
            .join("; ");
        warn!(component = "retrieval", outcome = "exhausted", url, detail = %summary, "all strategies failed");

        Err(ScoutError::retrieval_exhausted(
            url,
            "FetchHtml",
            Some(anyhow::anyhow!(
                "{} strategies failed",
                attempts.len()
            )),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test strategy returning a canned result and counting its calls.
    struct Canned {
        name: &'static str,
        result: Result<&'static str, &'static str>,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl Canned {
        fn ok(name: &'static str, body: &'static str) -> Self {
            Self {
                name,
                result: Ok(body),
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn err(name: &'static str, reason: &'static str) -> Self {
            Self {
                name,
                result: Err(reason),
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl RetrievalStrategy for Canned {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch<'a>(
            &'a self,
            _http: &'a reqwest::Client,
            url: &'a str,
        ) -> BoxFuture<'a, Result<String, ScoutError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                match self.result {
                    Ok(body) => Ok(body.to_string()),
                    Err(reason) => Err(ScoutError::fetch(
                        url,
                        "Fetch",
                        Some(anyhow::anyhow!(reason)),
                    )),
                }
            }
            .boxed()
        }
    }

    const TARGET: &str = "https://www.coupang.com/vp/products/1";

    #[tokio::test]
    async fn first_success_wins() {
        let third = Canned::ok("third", "X");
        let fourth = Canned::ok("fourth", "Y");
        let fourth_calls = fourth.calls.clone();

        let chain = RetrievalChain::new(Duration::from_secs(1))
            .with_strategy(Canned::err("first", "connection refused"))
            .with_strategy(Canned::err("second", "HTTP status 404"))
            .with_strategy(third)
            .with_strategy(fourth);

        let retrieval = chain
            .fetch_html(&reqwest::Client::new(), TARGET)
            .await
            .expect("third strategy should win");

        assert_eq!(retrieval.html, "X");
        assert_eq!(retrieval.strategy, "third");
        assert_eq!(fourth_calls.load(Ordering::SeqCst), 0);

        let names: Vec<&str> = retrieval.attempts.iter().map(|a| a.strategy.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(matches!(
            retrieval.attempts[1].outcome,
            AttemptOutcome::Failed { ref reason } if reason.contains("404")
        ));
        assert_eq!(
            retrieval.attempts[2].outcome,
            AttemptOutcome::Success { bytes: 1 }
        );
    }

    #[tokio::test]
    async fn each_strategy_is_tried_once() {
        let a = Canned::err("a", "boom");
        let b = Canned::err("b", "boom");
        let (a_calls, b_calls) = (a.calls.clone(), b.calls.clone());

        let chain = RetrievalChain::new(Duration::from_secs(1))
            .with_strategy(a)
            .with_strategy(b);
        let err = chain
            .fetch_html(&reqwest::Client::new(), TARGET)
            .await
            .expect_err("all strategies fail");

        assert!(err.is_retrieval_exhausted());
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_strategy_times_out_and_chain_moves_on() {
        let mut slow = Canned::ok("slow", "late");
        slow.delay = Some(Duration::from_millis(500));

        let chain = RetrievalChain::new(Duration::from_millis(50))
            .with_strategy(slow)
            .with_strategy(Canned::ok("fast", "on time"));

        let retrieval = chain
            .fetch_html(&reqwest::Client::new(), TARGET)
            .await
            .expect("fast strategy should win");
        assert_eq!(retrieval.html, "on time");
        assert_eq!(retrieval.attempts[0].outcome, AttemptOutcome::TimedOut);
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let chain = RetrievalChain::new(Duration::from_secs(1));
        let err = chain
            .fetch_html(&reqwest::Client::new(), TARGET)
            .await
            .expect_err("nothing to try");
        assert!(err.is_retrieval_exhausted());
    }

    #[tokio::test]
    async fn relay_error_then_proxy_404_then_direct_200() {
        let server = MockServer::start();
        let relay = server.mock(|when, then| {
            when.method(GET).path("/api/fetch-product");
            then.status(500).body("{\"error\":\"boom\"}");
        });
        let proxy = server.mock(|when, then| {
            when.method(GET).path("/proxy");
            then.status(404).body("missing");
        });
        let direct = server.mock(|when, then| {
            when.method(GET).path("/vp/products/1");
            then.status(200).body("X");
        });

        let opts = Options {
            relay_endpoint: Some(server.url("/api/fetch-product")),
            proxies: vec![format!("{}/proxy?target={{url}}", server.base_url())],
            allow_private_networks: true,
            ..Default::default()
        };
        let chain = RetrievalChain::from_options(&opts);
        assert_eq!(
            chain.strategy_names(),
            vec!["relay", "proxy:127.0.0.1", "direct"]
        );

        let retrieval = chain
            .fetch_html(&opts.build_http_client(), &server.url("/vp/products/1"))
            .await
            .expect("direct should win");

        relay.assert();
        proxy.assert();
        direct.assert();
        assert_eq!(retrieval.html, "X");
        assert_eq!(retrieval.strategy, "direct");
    }

    #[test]
    fn default_chain_skips_relay_when_unset() {
        let chain = RetrievalChain::from_options(&Options::default());
        assert_eq!(
            chain.strategy_names(),
            vec!["proxy:api.allorigins.win", "proxy:corsproxy.io", "direct"]
        );
    }
}
