// ABOUTME: Video-page handler for bilibili.com: title, description, uploader and play stats.
// ABOUTME: Falls back to a one-line pointer at the video when the page exposes none of those fields.

use async_trait::async_trait;
use scraper::Html;

use super::{site_failure, HandlerContext, SiteHandler};
use crate::dom;
use crate::extractors::compiled::select_all;
use crate::noise::NoiseFilter;
use crate::result::ExtractionResult;

const TITLE_SELECTORS: &[&str] = &["h1.video-title", "h1", "title"];
const FALLBACK_TITLE: &str = "Bilibili video";

pub struct BilibiliHandler;

/// Assemble the video summary from the static page.
pub fn parse(html: &str, url: &str, noise: &NoiseFilter) -> ExtractionResult {
    let doc = Html::parse_document(html);
    let title = dom::first_text(&doc, TITLE_SELECTORS).unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let mut sections = Vec::new();
    if let Some(desc) = dom::first_match(&doc, &[".desc-info-text"]) {
        let desc = noise.clean_lines(&dom::element_text(desc));
        if !desc.is_empty() {
            sections.push(format!("Description:\n{}", desc));
        }
    }
    if let Some(up) = dom::first_text(&doc, &[".up-name"]) {
        sections.push(format!("Uploader: {}", up));
    }
    let stats: Vec<String> = select_all(&doc, ".view")
        .into_iter()
        .map(|el| dom::normalize_whitespace(&dom::element_text(el)))
        .filter(|s| !s.is_empty())
        .collect();
    if !stats.is_empty() {
        sections.push(format!("Stats: {}", stats.join(" ")));
    }

    let content = if sections.is_empty() {
        format!("Bilibili video: {}", title)
    } else {
        sections.join("\n\n")
    };
    ExtractionResult::success(url, "bilibili", title, content, vec![])
}

#[async_trait]
impl SiteHandler for BilibiliHandler {
    fn name(&self) -> &'static str {
        "bilibili"
    }

    async fn extract(&self, url: &str, ctx: &HandlerContext<'_>) -> ExtractionResult {
        match ctx.fetcher.fetch_text(url).await {
            Ok(html) => parse(&html, url, ctx.noise),
            Err(err) => site_failure(self.name(), url, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.bilibili.com/video/BV1xx411c7mD";

    #[test]
    fn builds_sections() {
        let html = r#"<html><head><title>fallback - bilibili</title></head><body>
            <h1 class="video-title">Rust 所有权入门</h1>
            <div class="desc-info-text">这期视频讲解所有权与借用。
            点击关注</div>
            <a class="up-name"> 某UP主 </a>
            <span class="view">12.3万</span><span class="view">弹幕 456</span>
            </body></html>"#;
        let result = parse(html, URL, &NoiseFilter::default());
        assert!(result.success);
        assert_eq!(result.title, "Rust 所有权入门");
        assert_eq!(
            result.content,
            "Description:\n这期视频讲解所有权与借用。\n\nUploader: 某UP主\n\nStats: 12.3万 弹幕 456"
        );
        assert_eq!(result.extraction_method, "bilibili");
    }

    #[test]
    fn empty_page_points_at_the_video() {
        let html = "<html><head><title>视频标题</title></head><body></body></html>";
        let result = parse(html, URL, &NoiseFilter::default());
        assert!(result.success);
        assert_eq!(result.content, "Bilibili video: 视频标题");
    }

    #[test]
    fn missing_title_uses_literal() {
        let result = parse("<html><body></body></html>", URL, &NoiseFilter::default());
        assert_eq!(result.title, FALLBACK_TITLE);
    }
}
