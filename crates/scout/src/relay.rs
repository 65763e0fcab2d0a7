// ABOUTME: First-party relay that fetches priority-platform product pages on behalf of browser clients.
// ABOUTME: Exposes GET/OPTIONS /api/fetch-product with permissive CORS and JSON error bodies.

//! HTTP relay server.
//!
//! `GET /api/fetch-product?url=<encoded product URL>` answers with the raw
//! page HTML, or a JSON `{"error": ...}` body:
//!
//! | case                          | status            |
//! |-------------------------------|-------------------|
//! | `url` missing, blank or repeated | 400            |
//! | not a priority-platform URL   | 400               |
//! | upstream answered non-2xx     | upstream status   |
//! | request could not be made     | 500 (+ `details`) |

use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info, warn};

use crate::options::Options;
use crate::platform::detect_platform;
use crate::resource::{fetch, FetchOptions};

/// Route served by the relay.
pub const FETCH_PRODUCT_PATH: &str = "/api/fetch-product";

const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// Shared state for relay handlers.
#[derive(Debug, Clone)]
pub struct RelayState {
    http: reqwest::Client,
    fetch: FetchOptions,
}

impl RelayState {
    /// Upstream requests use the browser headers and SSRF policy from `opts`.
    pub fn new(opts: &Options) -> Self {
        Self {
            http: opts.build_http_client(),
            fetch: FetchOptions {
                headers: opts.page_headers(),
                allow_private_networks: opts.allow_private_networks,
                accept_any_status: true,
            },
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

/// Build the relay router.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route(FETCH_PRODUCT_PATH, get(fetch_product).options(preflight))
        .with_state(state)
}

/// Bind `addr` and serve the relay until the process stops.
pub async fn serve(addr: SocketAddr, state: RelayState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(component = "relay", addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

fn json_error(status: StatusCode, body: serde_json::Value) -> Response {
    (status, CORS_HEADERS, Json(body)).into_response()
}

async fn fetch_product(
    State(state): State<RelayState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let mut urls = params.iter().filter(|(k, _)| k == "url").map(|(_, v)| v.trim());
    let url = match (urls.next(), urls.next()) {
        (Some(u), None) if !u.is_empty() => u.to_string(),
        _ => {
            return json_error(
                StatusCode::BAD_REQUEST,
                json!({ "error": "URL parameter is required" }),
            )
        }
    };

    if !detect_platform(&url).is_priority() {
        warn!(component = "relay", outcome = "rejected", url = %url, "not a supported platform URL");
        return json_error(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Only Coupang URLs are supported" }),
        );
    }

    info!(component = "relay", url = %url, "fetching product page");
    let result = match fetch(&state.http, &url, &state.fetch).await {
        Ok(result) => result,
        Err(err) => {
            error!(component = "relay", outcome = "failed", url = %url, detail = %err, "upstream request failed");
            let details = err
                .source
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| err.code.to_string());
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch product page", "details": details }),
            );
        }
    };

    if !result.is_success() {
        let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let reason = status.canonical_reason().unwrap_or("Unknown");
        warn!(component = "relay", outcome = "upstream_status", status = result.status, url = %url, "upstream answered with an error");
        return json_error(status, json!({ "error": format!("Failed to fetch: {}", reason) }));
    }

    let html = result.text_utf8(None);
    info!(component = "relay", outcome = "success", bytes = html.len(), "page fetched");
    (
        StatusCode::OK,
        CORS_HEADERS,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response()
}
