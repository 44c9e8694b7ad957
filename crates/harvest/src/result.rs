// ABOUTME: ExtractionResult struct, the single value every pipeline tier produces.
// ABOUTME: Constructors enforce the success/error exclusivity and derive word_count from content.

use serde::{Deserialize, Serialize};

/// Maximum number of images reported per result.
pub const MAX_IMAGES: usize = 10;

/// An image found on the page, with its URL resolved against the page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
}

/// The outcome of one extraction attempt.
///
/// Every result the pipeline hands out comes from [`ExtractionResult::success`] or
/// [`ExtractionResult::failure`], so a successful result always has content and no error, and a
/// failed one always has an error. Fields stay public as plain data for callers, like the
/// other result types in this crate; deserialization re-checks the rule and rejects results that
/// break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExtractionResult")]
pub struct ExtractionResult {
    pub success: bool,
    pub title: String,
    pub content: String,
    pub images: Vec<ImageRef>,
    pub url: String,
    pub word_count: usize,
    pub extraction_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wire form of [`ExtractionResult`], validated before it becomes one.
#[derive(Deserialize)]
struct RawExtractionResult {
    success: bool,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    images: Vec<ImageRef>,
    url: String,
    #[serde(default)]
    word_count: usize,
    #[serde(default)]
    extraction_method: String,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawExtractionResult> for ExtractionResult {
    type Error = String;

    fn try_from(raw: RawExtractionResult) -> Result<Self, Self::Error> {
        match (raw.success, raw.error.is_some()) {
            (true, true) => return Err("successful result must not carry an error".to_string()),
            (false, false) => return Err("failed result must carry an error".to_string()),
            (true, false) if raw.content.trim().is_empty() => {
                return Err("successful result must have content".to_string())
            }
            _ => {}
        }
        Ok(Self {
            success: raw.success,
            title: raw.title,
            content: raw.content,
            images: raw.images,
            url: raw.url,
            word_count: raw.word_count,
            extraction_method: raw.extraction_method,
            error: raw.error,
        })
    }
}

impl ExtractionResult {
    /// Build a successful result.
    ///
    /// Empty (or whitespace-only) content cannot be a success; it is turned into a failure
    /// so callers never see `success` without text.
    pub fn success(
        url: impl Into<String>,
        method: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        mut images: Vec<ImageRef>,
    ) -> Self {
        let url = url.into();
        let method = method.into();
        let content = content.into();
        if content.trim().is_empty() {
            return Self::failure(url, method, "no content extracted");
        }
        images.truncate(MAX_IMAGES);
        Self {
            success: true,
            title: title.into(),
            word_count: word_count(&content),
            content,
            images,
            url,
            extraction_method: method,
            error: None,
        }
    }

    /// Build a failed result carrying an error message.
    pub fn failure(
        url: impl Into<String>,
        method: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            title: String::new(),
            content: String::new(),
            images: Vec::new(),
            url: url.into(),
            word_count: 0,
            extraction_method: method.into(),
            error: Some(error.into()),
        }
    }

    /// Returns the error message, or an empty string for successful results.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

/// Count words in a text string using whitespace splitting.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_derives_word_count() {
        let result = ExtractionResult::success(
            "https://example.com/a",
            "requests",
            "Title",
            "one two\nthree",
            vec![],
        );
        assert!(result.success);
        assert_eq!(result.word_count, 3);
        assert!(result.error.is_none());
    }

    #[test]
    fn success_with_empty_content_becomes_failure() {
        let result =
            ExtractionResult::success("https://example.com/a", "requests", "Title", "  \n ", vec![]);
        assert!(!result.success);
        assert_eq!(result.error_message(), "no content extracted");
        assert_eq!(result.word_count, 0);
    }

    #[test]
    fn failure_has_error_and_no_content() {
        let result = ExtractionResult::failure("https://example.com/a", "requests", "boom");
        assert!(!result.success);
        assert_eq!(result.content, "");
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(result.url, "https://example.com/a");
    }

    #[test]
    fn images_are_capped() {
        let images = (0..15)
            .map(|i| ImageRef {
                url: format!("https://example.com/{}.png", i),
                alt: String::new(),
            })
            .collect();
        let result =
            ExtractionResult::success("https://example.com", "requests", "t", "body", images);
        assert_eq!(result.images.len(), MAX_IMAGES);
    }

    #[test]
    fn error_field_is_omitted_from_json_on_success() {
        let result = ExtractionResult::success("https://example.com", "requests", "t", "body", vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["word_count"], 1);
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  a \t b\n\nc  "), 3);
    }

    #[test]
    fn json_round_trip_keeps_valid_results() {
        let ok = ExtractionResult::success("https://example.com", "requests", "t", "body", vec![]);
        let text = serde_json::to_string(&ok).unwrap();
        assert_eq!(serde_json::from_str::<ExtractionResult>(&text).unwrap(), ok);

        let failed = ExtractionResult::failure("https://example.com", "requests", "boom");
        let text = serde_json::to_string(&failed).unwrap();
        assert_eq!(serde_json::from_str::<ExtractionResult>(&text).unwrap(), failed);
    }

    #[test]
    fn deserializing_inconsistent_results_fails() {
        let both = r#"{"success":true,"content":"body","url":"u","error":"boom"}"#;
        assert!(serde_json::from_str::<ExtractionResult>(both).is_err());

        let neither = r#"{"success":false,"url":"u"}"#;
        assert!(serde_json::from_str::<ExtractionResult>(neither).is_err());

        let empty = r#"{"success":true,"content":"  ","url":"u"}"#;
        assert!(serde_json::from_str::<ExtractionResult>(empty).is_err());
    }
}
