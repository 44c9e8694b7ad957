// ABOUTME: Detects verification, captcha and block pages served instead of real content.
// ABOUTME: Checks title vocabulary, the visible text prefix, and captcha/verify markup.

//! Anti-bot page detection.
//!
//! A blocked page is never an error by itself; the orchestrator treats it as a signal to
//! escalate to rendering, and the renderer treats it as a signal to try the next engine.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use scraper::Html;

use crate::dom;
use crate::extractors::compiled::matches_any;

pub const DEFAULT_TITLE_KEYWORDS: &[&str] = &[
    "安全验证",
    "security",
    "captcha",
    "验证码",
    "403",
    "404",
    "访问被拒绝",
    "access denied",
];

pub const DEFAULT_TEXT_KEYWORDS: &[&str] = &[
    "请完成安全验证",
    "点击验证",
    "滑动验证",
    "please complete the security verification",
    "bot detection",
    "cloudflare",
    "请开启javascript",
    "enable javascript",
];

pub const DEFAULT_MARKER_SELECTORS: &[&str] = &[
    r#"[class*="captcha"]"#,
    r#"[id*="captcha"]"#,
    r#"[class*="verify"]"#,
    r#"[id*="verify"]"#,
    ".security-check",
    ".bot-check",
];

static DEFAULT_DETECTOR: Lazy<AntiBotDetector> = Lazy::new(AntiBotDetector::default);

/// Vocabulary and markers used by [`AntiBotDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct AntiBotConfig {
    pub title_keywords: Vec<String>,
    pub text_keywords: Vec<String>,
    pub marker_selectors: Vec<String>,
    /// Only this many leading chars of visible text are scanned.
    pub text_prefix_chars: usize,
}

impl Default for AntiBotConfig {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            title_keywords: owned(DEFAULT_TITLE_KEYWORDS),
            text_keywords: owned(DEFAULT_TEXT_KEYWORDS),
            marker_selectors: owned(DEFAULT_MARKER_SELECTORS),
            text_prefix_chars: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AntiBotDetector {
    config: AntiBotConfig,
    title_matcher: Option<AhoCorasick>,
    text_matcher: Option<AhoCorasick>,
}

impl Default for AntiBotDetector {
    fn default() -> Self {
        Self::new(AntiBotConfig::default())
    }
}

fn keyword_matcher(keywords: &[String]) -> Option<AhoCorasick> {
    if keywords.is_empty() {
        return None;
    }
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(keywords)
        .ok()
}

fn contains_any(matcher: &Option<AhoCorasick>, haystack: &str) -> bool {
    matcher
        .as_ref()
        .is_some_and(|ac| ac.is_match(&haystack.to_lowercase()))
}

impl AntiBotDetector {
    pub fn new(config: AntiBotConfig) -> Self {
        Self {
            title_matcher: keyword_matcher(&config.title_keywords),
            text_matcher: keyword_matcher(&config.text_keywords),
            config,
        }
    }

    pub fn config(&self) -> &AntiBotConfig {
        &self.config
    }

    /// Inspect an already parsed document.
    ///
    /// The title is the first `<title>`; the text prefix is taken from the visible text of
    /// the whole document.
    pub fn inspect_document(&self, doc: &Html) -> bool {
        let title = dom::first_text(doc, &["title"]).unwrap_or_default();
        if contains_any(&self.title_matcher, &title) {
            return true;
        }
        let prefix = dom::visible_text_prefix(doc, self.config.text_prefix_chars);
        if contains_any(&self.text_matcher, &prefix) {
            return true;
        }
        self.config
            .marker_selectors
            .iter()
            .any(|css| matches_any(doc, css))
    }

    /// Decide from raw pieces, as returned by a rendered page snapshot.
    pub fn looks_blocked(&self, page_title: &str, page_text_prefix: &str, markup: &str) -> bool {
        if contains_any(&self.title_matcher, page_title) {
            return true;
        }
        let prefix: String = page_text_prefix
            .chars()
            .take(self.config.text_prefix_chars)
            .collect();
        if contains_any(&self.text_matcher, &prefix) {
            return true;
        }
        if markup.is_empty() {
            return false;
        }
        let doc = Html::parse_document(markup);
        self.config
            .marker_selectors
            .iter()
            .any(|css| matches_any(&doc, css))
    }
}

/// Check raw page pieces with the default vocabulary.
pub fn looks_blocked(page_title: &str, page_text_prefix: &str, markup: &str) -> bool {
    DEFAULT_DETECTOR.looks_blocked(page_title, page_text_prefix, markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captcha_title_is_blocked() {
        assert!(looks_blocked("请完成安全验证", "", ""));
        assert!(looks_blocked("Attention Required! | CAPTCHA", "", ""));
        assert!(looks_blocked("404 Not Found", "", ""));
    }

    #[test]
    fn challenge_text_is_blocked() {
        assert!(looks_blocked(
            "Just a moment...",
            "Checking your browser. Cloudflare Ray ID: 1234",
            ""
        ));
        assert!(looks_blocked("x", "请开启JavaScript并刷新页面", ""));
    }

    #[test]
    fn text_beyond_prefix_is_ignored() {
        let text = format!("{}cloudflare", "a".repeat(1000));
        assert!(!looks_blocked("Article", &text, ""));
    }

    #[test]
    fn verify_markup_is_blocked() {
        let markup = r#"<html><body><div class="geetest-verify-box"></div></body></html>"#;
        assert!(looks_blocked("Article", "ordinary text", markup));
    }

    #[test]
    fn ordinary_page_is_not_blocked() {
        let markup = "<html><head><title>Rust release notes</title></head>\
                      <body><article><p>Version 1.80 ships today.</p></article></body></html>";
        assert!(!looks_blocked("Rust release notes", "Version 1.80 ships today.", markup));
        let doc = Html::parse_document(markup);
        assert!(!AntiBotDetector::default().inspect_document(&doc));
    }

    #[test]
    fn inspect_document_reads_title_and_markers() {
        let doc = Html::parse_document(
            "<html><head><title>Security check</title></head><body><p>hi</p></body></html>",
        );
        assert!(AntiBotDetector::default().inspect_document(&doc));

        let doc = Html::parse_document(
            r#"<html><head><title>Post</title></head><body><div id="captcha-container"></div></body></html>"#,
        );
        assert!(AntiBotDetector::default().inspect_document(&doc));
    }

    #[test]
    fn empty_config_never_blocks() {
        let detector = AntiBotDetector::new(AntiBotConfig {
            title_keywords: vec![],
            text_keywords: vec![],
            marker_selectors: vec![],
            text_prefix_chars: 1000,
        });
        assert!(!detector.looks_blocked("captcha", "cloudflare", "<div class=\"captcha\"></div>"));
    }
}
