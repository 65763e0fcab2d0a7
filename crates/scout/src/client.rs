// ABOUTME: The Client that drives retrieval and extraction for product links.
// ABOUTME: Provides extract_product_info, extract_with_report, extract_html and prepare_product.

use tracing::{debug, info, warn};
use url::Url;

use crate::error::ScoutError;
use crate::extractors::{extract_metadata, Page};
use crate::options::{ClientBuilder, Options};
use crate::platform::{detect_platform, is_valid_product_url, normalize_url};
use crate::quantity::{parse_multiple_quantities, parse_quantity_from_text};
use crate::result::{Extraction, ProductDraft, ProductMetadata};
use crate::retrieval::RetrievalChain;

/// Validate that `url` is an absolute http(s) URL.
fn parse_http_url(url: &str, op: &str) -> Result<Url, ScoutError> {
    if url.trim().is_empty() {
        return Err(ScoutError::invalid_url(url, op, None));
    }
    let parsed = Url::parse(url)
        .map_err(|e| ScoutError::invalid_url(url, op, Some(anyhow::Error::new(e))))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScoutError::invalid_url(
            url,
            op,
            Some(anyhow::anyhow!("unsupported scheme {other}")),
        )),
    }
}

/// Make a relative image URL absolute against the request origin.
fn resolve_image(image: String, base: &Url) -> String {
    if image.starts_with("http") {
        return image;
    }
    let origin = format!("{}/", base.origin().ascii_serialization());
    match Url::parse(&origin).and_then(|o| o.join(&image)) {
        Ok(abs) => abs.to_string(),
        Err(e) => {
            warn!(component = "client", field = "image", outcome = "unresolved", detail = %e, image = %image, "could not resolve image URL");
            image
        }
    }
}

/// Run the extraction pipeline on a page and resolve its image URL.
fn extract_from_html(html: &str, url: &str, base: &Url) -> ProductMetadata {
    let page = Page::parse(url, html);
    let mut meta = extract_metadata(&page);
    meta.image = meta.image.map(|img| resolve_image(img, base));
    meta
}

/// Extracts product metadata from commerce links.
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    chain: RetrievalChain,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.build_http_client();
        let chain = RetrievalChain::from_options(&opts);
        Self {
            opts,
            http_client,
            chain,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn chain(&self) -> &RetrievalChain {
        &self.chain
    }

    /// Fetch a product page and extract its metadata.
    ///
    /// Missing title or image is not an error; check
    /// [`ProductMetadata::validate`] on the result.
    pub async fn extract_product_info(&self, url: &str) -> Result<ProductMetadata, ScoutError> {
        self.extract_with_report(url).await.map(|e| e.metadata)
    }

    /// Like [`Client::extract_product_info`], but also reports which strategy
    /// delivered the page, every attempt made, and the quantities found in
    /// the title.
    pub async fn extract_with_report(&self, url: &str) -> Result<Extraction, ScoutError> {
        let base = parse_http_url(url, "Extract")?;
        let retrieval = self.chain.fetch_html(&self.http_client, url).await?;

        let metadata = extract_from_html(&retrieval.html, url, &base);
        let quantities = metadata
            .title
            .as_deref()
            .map(parse_multiple_quantities)
            .unwrap_or_default();

        info!(
            component = "client",
            outcome = if metadata.is_complete() { "complete" } else { "incomplete" },
            strategy = %retrieval.strategy,
            url,
            "product extracted"
        );

        Ok(Extraction {
            url: url.to_string(),
            platform: detect_platform(url),
            metadata,
            quantities,
            strategy: retrieval.strategy,
            attempts: retrieval.attempts,
        })
    }

    /// Extract metadata from HTML that is already in hand.
    pub fn extract_html(&self, html: &str, url: &str) -> Result<ProductMetadata, ScoutError> {
        let base = parse_http_url(url, "ExtractHtml")?;
        if html.trim().is_empty() {
            return Err(ScoutError::extract(
                url,
                "ExtractHtml",
                Some(anyhow::anyhow!("empty HTML")),
            ));
        }
        Ok(extract_from_html(html, url, &base))
    }

    /// Turn a shared product link into a draft record.
    ///
    /// The link must be a supported product URL. Retrieval failures are
    /// errors; fields extraction could not fill are listed in the draft's
    /// `missing` instead. Callers typically fall back to
    /// [`ProductDraft::manual`] on error.
    pub async fn prepare_product(&self, url: &str) -> Result<ProductDraft, ScoutError> {
        if !is_valid_product_url(url) {
            return Err(ScoutError::unsupported_link(url, "PrepareProduct", None));
        }

        let normalized = normalize_url(url);
        let platform = detect_platform(&normalized);
        debug!(component = "client", url = %normalized, platform = %platform, "preparing product");

        let metadata = self.extract_product_info(&normalized).await?;
        let quantity = metadata.title.as_deref().and_then(parse_quantity_from_text);
        let draft = ProductDraft::from_metadata(normalized, platform, &metadata, quantity.as_ref());

        if !draft.is_complete() {
            let missing: Vec<&str> = draft.missing.iter().map(|f| f.message()).collect();
            warn!(component = "client", outcome = "incomplete", detail = ?missing, "draft needs manual input");
        }
        Ok(draft)
    }
}
