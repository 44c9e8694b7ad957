// ABOUTME: Static HTTP fetcher with browser-like headers, size limits, and charset decoding.
// ABOUTME: Maps transport failures onto HarvestError codes (Timeout, Status, Fetch, InvalidUrl).

//! Plain HTTP retrieval.
//!
//! One `reqwest::Client` is built per [`StaticFetcher`] and reused for every request, so the
//! cookie store and connection pool carry across a batch. Bodies are decoded to UTF-8 using the
//! Content-Type charset when present and `chardetng` detection otherwise; many Chinese sites
//! still serve GBK without declaring it.

use std::collections::HashMap;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::HarvestError;

/// Maximum allowed body size (10 MiB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Headers sent with every static request. reqwest adds Accept-Encoding itself
/// because compression is enabled on the client.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("dnt", "1"),
    ("upgrade-insecure-requests", "1"),
];

/// Options for building a [`StaticFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra headers, applied over [`DEFAULT_HEADERS`].
    pub headers: HashMap<String, String>,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            max_redirects: 10,
            max_body_bytes: MAX_CONTENT_LENGTH,
        }
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    /// The URL that was requested.
    pub url: String,
    /// The URL after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body to UTF-8.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

fn default_header_map(opts: &FetchOptions) -> Result<HeaderMap, HarvestError> {
    let mut map = HeaderMap::new();
    let defaults = DEFAULT_HEADERS.iter().map(|(k, v)| (*k, *v));
    let extra = opts.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    for (key, value) in defaults.chain(extra) {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            HarvestError::fetch("", "Configure", Some(anyhow::anyhow!("header {}: {}", key, e)))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            HarvestError::fetch("", "Configure", Some(anyhow::anyhow!("header {}: {}", key, e)))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

impl StaticFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(opts: &FetchOptions) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(&opts.user_agent)
            .default_headers(default_header_map(opts)?)
            .timeout(opts.timeout)
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| HarvestError::fetch("", "Configure", Some(e.into())))?;
        Ok(Self::with_client(client, opts.max_body_bytes))
    }

    /// Wrap an existing client. Its headers and timeouts are used as-is.
    pub fn with_client(client: reqwest::Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `url` and return the raw response body.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, HarvestError> {
        let parsed = url::Url::parse(url).map_err(|e| {
            HarvestError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HarvestError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| transport_error(url, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::status(url, "Fetch", status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(too_large(url));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(url, "failed to read body", e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResult {
            status: status.as_u16(),
            url: url.to_string(),
            final_url,
            content_type,
            body: body.freeze(),
        })
    }

    /// GET `url` and decode the body to UTF-8.
    pub async fn fetch_text(&self, url: &str) -> Result<String, HarvestError> {
        Ok(self.fetch(url).await?.text())
    }
}

fn transport_error(url: &str, what: &str, e: reqwest::Error) -> HarvestError {
    if e.is_timeout() {
        HarvestError::timeout(url, "Fetch", Some(anyhow::anyhow!("{}: {}", what, e)))
    } else {
        HarvestError::fetch(url, "Fetch", Some(anyhow::anyhow!("{}: {}", what, e)))
    }
}

fn too_large(url: &str) -> HarvestError {
    HarvestError::fetch(url, "Fetch", Some(anyhow::anyhow!("content too large")))
}

/// Decode body bytes using the Content-Type charset, or detection when absent or unknown.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|cs| encoding_rs::Encoding::for_label(cs.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract the charset parameter from a Content-Type value.
fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .find_map(|part| {
            part.trim()
                .strip_prefix("charset=")
                .map(|cs| cs.trim_matches('"').trim_matches('\'').to_string())
        })
}
