// ABOUTME: Error types for the harvest pipeline including the ErrorCode enum and HarvestError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the different ways a pipeline stage can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Status,
    Extract,
    Render,
    Blocked,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Status => "bad HTTP status",
            ErrorCode::Extract => "extraction error",
            ErrorCode::Render => "render error",
            ErrorCode::Blocked => "blocked by anti-bot page",
        };
        write!(f, "{}", s)
    }
}

/// The error type for fallible stage operations.
///
/// It never crosses the public `extract` boundary: the orchestrator turns it into a failed
/// `ExtractionResult` carrying `to_string()` of this value.
#[derive(Debug, thiserror::Error)]
pub struct HarvestError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "harvest: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl HarvestError {
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

    /// Create a Status error for a non-2xx response.
    pub fn status(url: impl Into<String>, op: impl Into<String>, status: u16) -> Self {
        Self::with_code(
            ErrorCode::Status,
            url,
            op,
            Some(anyhow::anyhow!("HTTP status {}", status)),
        )
    }

    /// Create an Extract error.
    pub fn extract(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Extract, url, op, source)
    }

    /// Create a Render error.
    pub fn render(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Render, url, op, source)
    }

    /// Create a Blocked error.
    pub fn blocked(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Blocked, url, op, None)
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Status error.
    pub fn is_status(&self) -> bool {
        self.code == ErrorCode::Status
    }

    /// Returns true if this is an Extract error.
    pub fn is_extract(&self) -> bool {
        self.code == ErrorCode::Extract
    }

    /// Returns true if this is a Render error.
    pub fn is_render(&self) -> bool {
        self.code == ErrorCode::Render
    }

    /// Returns true if this is a Blocked error.
    pub fn is_blocked(&self) -> bool {
        self.code == ErrorCode::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_url_code_and_source() {
        let err = HarvestError::fetch(
            "https://example.com",
            "Fetch",
            Some(anyhow::anyhow!("connection refused")),
        );
        assert_eq!(
            err.to_string(),
            "harvest: Fetch https://example.com: fetch error: connection refused"
        );
    }

    #[test]
    fn display_without_source() {
        let err = HarvestError::blocked("https://example.com", "Render");
        assert_eq!(
            err.to_string(),
            "harvest: Render https://example.com: blocked by anti-bot page"
        );
    }

    #[test]
    fn status_error_carries_code() {
        let err = HarvestError::status("https://example.com/missing", "Fetch", 404);
        assert!(err.is_status());
        assert!(!err.is_fetch());
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[test]
    fn predicates_match_codes() {
        assert!(HarvestError::invalid_url("x", "Parse", None).is_invalid_url());
        assert!(HarvestError::timeout("x", "Fetch", None).is_timeout());
        assert!(HarvestError::extract("x", "Extract", None).is_extract());
        assert!(HarvestError::render("x", "Render", None).is_render());
        assert!(HarvestError::blocked("x", "Render").is_blocked());
    }
}
