// ABOUTME: End-to-end tests for retrieval and extraction against mock HTTP servers.
// ABOUTME: The priority host is pinned to the mock server so platform-specific paths run offline.

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use shelf_scout::{AttemptOutcome, Client, ErrorCode, Platform, RequiredField};

/// A client whose HTTP layer resolves www.coupang.com to the mock server.
fn pinned_client(server: &MockServer, relay: Option<String>, proxies: Vec<String>) -> Client {
    let http = reqwest::Client::builder()
        .resolve("www.coupang.com", *server.address())
        .build()
        .unwrap();
    let mut builder = Client::builder()
        .http_client(http)
        .allow_private_networks(true)
        .proxies(proxies);
    if let Some(endpoint) = relay {
        builder = builder.relay_endpoint(endpoint);
    }
    builder.build()
}

fn product_url(server: &MockServer, path: &str) -> String {
    format!("http://www.coupang.com:{}{}", server.port(), path)
}

#[tokio::test]
async fn first_success_wins_after_earlier_failures() {
    let server = MockServer::start();
    let relay = server.mock(|when, then| {
        when.method(GET).path("/api/fetch-product");
        then.status(500)
            .json_body(serde_json::json!({ "error": "Failed to fetch product page" }));
    });
    let proxy = server.mock(|when, then| {
        when.method(GET).path("/proxy");
        then.status(404);
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/vp/products/1");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(
                r#"<html><head>
                <meta property="og:title" content="Conflicting OG title">
                <script type="application/ld+json">
                {"@graph":[{"@type":"BreadcrumbList"},
                  {"@type":"Product","name":"햇반 210g x 12개","image":{"@type":"ImageObject","url":"https://img.test/rice.jpg"},
                   "offers":[{"@type":"Offer","price":"13,500"}]}]}
                </script></head></html>"#,
            );
    });

    let client = pinned_client(
        &server,
        Some(server.url("/api/fetch-product")),
        vec![server.url("/proxy?u={url}")],
    );
    let url = product_url(&server, "/vp/products/1");
    let report = client.extract_with_report(&url).await.unwrap();
    relay.assert();
    proxy.assert();
    page.assert();

    assert_eq!(report.strategy, "direct");
    assert_eq!(report.platform, Platform::Coupang);
    assert_eq!(report.attempts.len(), 3);
    assert!(matches!(report.attempts[0].outcome, AttemptOutcome::Failed { .. }));
    assert!(matches!(report.attempts[1].outcome, AttemptOutcome::Failed { .. }));
    assert!(matches!(report.attempts[2].outcome, AttemptOutcome::Success { .. }));

    assert_eq!(report.metadata.title.as_deref(), Some("햇반 210g x 12개"));
    assert_eq!(report.metadata.image.as_deref(), Some("https://img.test/rice.jpg"));
    assert_eq!(report.metadata.price.as_deref(), Some("13,500"));

    let quantities: Vec<(f64, &str)> = report
        .quantities
        .iter()
        .map(|q| (q.quantity, q.unit.as_str()))
        .collect();
    assert_eq!(quantities, vec![(210.0, "g"), (12.0, "개")]);
}

#[tokio::test]
async fn generic_fallback_fills_fields_and_dom_price() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/vp/products/2");
        then.status(200).body(
            r#"<html><head>
            <title>생수 2L 6병 - 쿠팡!</title>
            <meta property="og:image" content="/thumbnails/water.jpg">
            <meta name="description" content="시원한 생수">
            </head><body>
            <div class="prod-price">
              <span class="original-price-amount">9,000원</span>
              <span class="sales-price-amount">6,480원</span>
            </div>
            </body></html>"#,
        );
    });

    let client = pinned_client(&server, None, Vec::new());
    let url = product_url(&server, "/vp/products/2");
    let meta = client.extract_product_info(&url).await.unwrap();

    assert_eq!(meta.title.as_deref(), Some("생수 2L 6병 - 쿠팡!"));
    assert_eq!(
        meta.image,
        Some(format!("http://www.coupang.com:{}/thumbnails/water.jpg", server.port()))
    );
    assert_eq!(meta.price.as_deref(), Some("6480"));
    assert_eq!(meta.description.as_deref(), Some("시원한 생수"));
    assert!(meta.validate().is_valid());
}

#[tokio::test]
async fn missing_fields_flow_through_the_draft() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/vp/products/3");
        then.status(200)
            .body("<html><head><title>휴지 30롤</title></head><body></body></html>");
    });

    let client = pinned_client(&server, None, Vec::new());
    let url = product_url(&server, "/vp/products/3?itemId=5&vendorItemId=6&q=tissue");
    let draft = client.prepare_product(&url).await.unwrap();

    assert_eq!(
        draft.original_url,
        product_url(&server, "/vp/products/3?itemId=5&vendorItemId=6")
    );
    assert_eq!(draft.name.as_deref(), Some("휴지 30롤"));
    assert_eq!(draft.thumbnail, None);
    assert_eq!(draft.price, None);
    assert_eq!(draft.quantity, None);
    assert_eq!(draft.missing, vec![RequiredField::Image]);
}

#[tokio::test]
async fn every_strategy_failing_yields_one_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(502);
    });

    let client = pinned_client(
        &server,
        Some(server.url("/api/fetch-product")),
        vec![server.url("/a?u={url}"), server.url("/b?u={url}")],
    );
    let url = product_url(&server, "/vp/products/4");
    let err = client.extract_product_info(&url).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::RetrievalExhausted);
    assert_eq!(err.user_message(), "could not retrieve product information");
}
