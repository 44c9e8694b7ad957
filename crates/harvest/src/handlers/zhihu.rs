// ABOUTME: Social-article handler for zhihu.com. Renders first; static parse is the fallback.
// ABOUTME: Collects every rich-text answer block, skipping containers nested inside one already kept.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{site_failure, ArticleRecipe, BodyMode, HandlerContext, SiteHandler};
use crate::result::ExtractionResult;

pub const RECIPE: ArticleRecipe = ArticleRecipe {
    site: "zhihu",
    title_selectors: &[
        "h1.QuestionHeader-title",
        "h1.Post-Title",
        "h1",
        "title",
    ],
    fallback_title: "Zhihu post",
    body_selectors: &[
        ".Post-RichTextContainer",
        ".RichText",
        ".ztext",
        ".Post-RichText",
        ".RichContent-inner",
        ".AnswerItem .RichContent",
        r#"div[data-za-module="RichText"]"#,
    ],
    body_mode: BodyMode::Collect { min_chars: 50 },
    backup_selectors: &["article", ".Post-Main"],
    collect_images: false,
};

pub struct ZhihuHandler;

#[async_trait]
impl SiteHandler for ZhihuHandler {
    fn name(&self) -> &'static str {
        "zhihu"
    }

    async fn extract(&self, url: &str, ctx: &HandlerContext<'_>) -> ExtractionResult {
        if let Some(renderer) = ctx.renderer {
            let rendered = renderer
                .render_with(url, |snapshot, method| {
                    RECIPE.parse(&snapshot.markup, url, &format!("zhihu-{}", method), ctx.noise)
                })
                .await;
            if rendered.success {
                info!(url, method = %rendered.extraction_method, "zhihu rendered");
                return rendered;
            }
            warn!(url, error = rendered.error_message(), "zhihu render failed, trying static parse");
        }

        match ctx.fetcher.fetch_text(url).await {
            Ok(html) => RECIPE.parse(&html, url, self.name(), ctx.noise),
            Err(err) => site_failure(self.name(), url, err),
        }
    }
}
