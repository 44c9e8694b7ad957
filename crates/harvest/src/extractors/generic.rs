// ABOUTME: Site-agnostic extractor that turns any parsed page into an ExtractionResult.
// ABOUTME: Strips chrome, picks the first substantial content container, cleans lines, collects images.

//! Generic DOM extraction.
//!
//! The container list runs from generic semantic containers through platform class names
//! (Zhihu, CSDN, Juejin, Jianshu, cnblogs, OSChina, SegmentFault, video pages) to loose
//! attribute patterns. The first container whose text exceeds the threshold wins; if none
//! does, the cleaned `<body>` is used.

use scraper::Html;
use url::Url;

use crate::dom;
use crate::error::HarvestError;
use crate::extractors::compiled::select_all;
use crate::noise::NoiseFilter;
use crate::result::{ExtractionResult, ImageRef, MAX_IMAGES};

/// Elements removed before any text is read.
pub const STRIP_SELECTORS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "form", "noscript",
];

/// Content containers in priority order.
pub const CONTENT_SELECTORS: &[&str] = &[
    // generic
    "article",
    "main",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    "#content",
    ".post",
    ".article",
    ".story",
    ".news-content",
    // zhihu
    ".Post-RichTextContainer",
    ".RichText",
    ".ztext",
    ".Post-RichText",
    ".RichContent-inner",
    ".QuestionAnswer-content",
    ".AnswerItem .RichContent",
    // csdn
    ".article_content",
    "#article_content",
    ".blog-content-box",
    ".htmledit_views",
    "#content_views",
    ".article-body",
    ".markdown_views",
    ".blog_content",
    // juejin
    ".markdown-body",
    // jianshu
    ".show-content",
    // cnblogs
    ".postBody",
    ".blogpost-body",
    "#cnblogs_post_body",
    // oschina
    ".article-detail",
    ".blog-detail",
    // segmentfault
    ".article__content",
    // video pages and summaries
    ".video-info",
    ".video-desc",
    ".video-title",
    ".description",
    ".summary",
    ".abstract",
    // attribute patterns
    r#"[class*="content"]"#,
    r#"[class*="article"]"#,
    r#"[class*="text"]"#,
    r#"[id*="content"]"#,
    r#"[class*="markdown"]"#,
    r#"[class*="rich"]"#,
];

/// Removed from `<body>` when no container qualifies.
const BODY_CHROME_SELECTORS: &[&str] = &["nav", "header", "footer", "aside", "advertisement"];

pub const FALLBACK_TITLE: &str = "Untitled";

#[derive(Debug, Clone)]
pub struct GenericExtractor {
    noise: NoiseFilter,
    /// A container qualifies when its text is longer than this (in chars).
    pub container_min_chars: usize,
    /// Below this content length the paragraph fallback runs.
    pub fallback_below_chars: usize,
    /// Paragraph fallback scans at most this many `p`/`div` elements.
    pub fallback_scan_limit: usize,
    /// Paragraph fallback keeps blocks longer than this (in chars).
    pub fallback_min_block_chars: usize,
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self {
            noise: NoiseFilter::default(),
            container_min_chars: 50,
            fallback_below_chars: 100,
            fallback_scan_limit: 50,
            fallback_min_block_chars: 20,
        }
    }
}

impl GenericExtractor {
    pub fn with_noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.noise = noise;
        self
    }

    pub fn noise_filter(&self) -> &NoiseFilter {
        &self.noise
    }

    /// Parse `html` and extract it.
    pub fn extract_html(&self, html: &str, url: &str, method: &str) -> ExtractionResult {
        self.extract(Html::parse_document(html), url, method)
    }

    /// Extract title, cleaned body text and images from a parsed document.
    ///
    /// Never fails with an error; a page with no usable text becomes a failure result.
    pub fn extract(&self, mut doc: Html, url: &str, method: &str) -> ExtractionResult {
        dom::remove_elements(&mut doc, STRIP_SELECTORS);

        let title = dom::first_text(&doc, &["title"]).unwrap_or_else(|| FALLBACK_TITLE.to_string());

        let raw = match self.find_container(&doc) {
            Some(text) => text,
            None => {
                dom::remove_elements(&mut doc, BODY_CHROME_SELECTORS);
                match select_all(&doc, "body").into_iter().next() {
                    Some(body) => dom::element_text(body),
                    None => dom::document_text(&doc),
                }
            }
        };

        let mut content = self.noise.clean_lines(&raw);
        if content.chars().count() < self.fallback_below_chars {
            let fallback = self.paragraph_fallback(&doc);
            if fallback.chars().count() > content.chars().count() {
                content = fallback;
            }
        }

        if content.trim().is_empty() {
            let err = HarvestError::extract(
                url,
                "Extract",
                Some(anyhow::anyhow!("no content extracted")),
            );
            return ExtractionResult::failure(url, method, err.to_string());
        }

        let images = collect_images(&doc, url);
        ExtractionResult::success(url, method, title, content, images)
    }

    fn find_container(&self, doc: &Html) -> Option<String> {
        CONTENT_SELECTORS.iter().find_map(|css| {
            let el = select_all(doc, css).into_iter().next()?;
            let text = dom::element_text(el);
            (text.trim().chars().count() > self.container_min_chars).then_some(text)
        })
    }

    /// Paragraph-level fallback for pages whose containers yielded little.
    fn paragraph_fallback(&self, doc: &Html) -> String {
        select_all(doc, "p, div")
            .into_iter()
            .take(self.fallback_scan_limit)
            .filter_map(|el| {
                let text = dom::normalize_whitespace(&dom::element_lines(el).join(" "));
                let keep = text.chars().count() > self.fallback_min_block_chars
                    && !self.noise.is_noise(&text);
                keep.then_some(text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Up to [`MAX_IMAGES`] images with absolute URLs. Lazy images are read from `data-src`.
pub fn collect_images(doc: &Html, page_url: &str) -> Vec<ImageRef> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    select_all(doc, "img")
        .into_iter()
        .filter_map(|img| {
            let el = img.value();
            let src = el
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.starts_with("data:"))
                .or_else(|| el.attr("data-src").map(str::trim).filter(|s| !s.is_empty()))?;
            let resolved = base.join(src).ok()?;
            Some(ImageRef {
                url: resolved.to_string(),
                alt: el.attr("alt").unwrap_or_default().trim().to_string(),
            })
        })
        .take(MAX_IMAGES)
        .collect()
}
