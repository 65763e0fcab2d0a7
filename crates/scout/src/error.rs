// ABOUTME: Error types for shelf-scout including the ErrorCode enum and the ScoutError struct.
// ABOUTME: Provides categorized errors with convenience constructors, boolean helpers and user-facing messages.

use std::fmt;

/// Error codes representing the categories of pipeline failures.
///
/// `Fetch`, `Timeout` and `Ssrf` describe a single retrieval attempt and are
/// folded into `RetrievalExhausted` before they leave the retrieval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    UnsupportedLink,
    Fetch,
    Timeout,
    Ssrf,
    RetrievalExhausted,
    Extract,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::UnsupportedLink => "not a supported product link",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Ssrf => "SSRF blocked",
            ErrorCode::RetrievalExhausted => "retrieval exhausted",
            ErrorCode::Extract => "extraction error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for shelf-scout operations.
#[derive(Debug, thiserror::Error)]
pub struct ScoutError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scout: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScoutError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create an UnsupportedLink error.
    pub fn unsupported_link(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::UnsupportedLink, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create an SSRF error.
    pub fn ssrf(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Ssrf, url, op, source)
    }

    /// Create a RetrievalExhausted error.
    pub fn retrieval_exhausted(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::RetrievalExhausted, url, op, source)
    }

    /// Create an Extract error.
    pub fn extract(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Extract, url, op, source)
    }

    /// The message shown to an end user for this error.
    ///
    /// Link problems get their own message; everything else collapses into
    /// the generic retrieval failure.
    pub fn user_message(&self) -> &'static str {
        match self.code {
            ErrorCode::InvalidUrl | ErrorCode::UnsupportedLink => "not a supported product link",
            _ => "could not retrieve product information",
        }
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is an UnsupportedLink error.
    pub fn is_unsupported_link(&self) -> bool {
        self.code == ErrorCode::UnsupportedLink
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a RetrievalExhausted error.
    pub fn is_retrieval_exhausted(&self) -> bool {
        self.code == ErrorCode::RetrievalExhausted
    }

    /// Returns true if this is an Extract error.
    pub fn is_extract(&self) -> bool {
        self.code == ErrorCode::Extract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_url_code_and_source() {
        let err = ScoutError::fetch(
            "https://www.coupang.com/vp/products/1",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 404")),
        );
        assert_eq!(
            err.to_string(),
            "scout: Fetch https://www.coupang.com/vp/products/1: fetch error: HTTP status 404"
        );
    }

    #[test]
    fn display_without_source() {
        let err = ScoutError::invalid_url("", "ExtractProductInfo", None);
        assert_eq!(err.to_string(), "scout: ExtractProductInfo : invalid URL");
    }

    #[test]
    fn user_message_separates_link_errors_from_retrieval() {
        let link = ScoutError::unsupported_link("https://example.com", "PrepareProduct", None);
        let exhausted = ScoutError::retrieval_exhausted("https://example.com", "FetchHtml", None);
        assert_eq!(link.user_message(), "not a supported product link");
        assert_eq!(
            exhausted.user_message(),
            "could not retrieve product information"
        );
    }

    #[test]
    fn predicates_match_code() {
        let err = ScoutError::timeout("u", "op", None);
        assert!(err.is_timeout());
        assert!(!err.is_fetch());
        assert!(ScoutError::ssrf("u", "op", None).is_ssrf());
        assert!(ScoutError::extract("u", "op", None).is_extract());
    }
}
