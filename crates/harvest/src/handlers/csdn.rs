// ABOUTME: Blog-platform handler for csdn.net: static parse first, rendered re-parse for folded posts.
// ABOUTME: CSDN collapses long articles behind "read more"; the render behavior clicks it open.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{site_failure, ArticleRecipe, BodyMode, HandlerContext, SiteHandler};
use crate::result::ExtractionResult;

pub const RECIPE: ArticleRecipe = ArticleRecipe {
    site: "csdn",
    title_selectors: &[".title-article", "h1.title", ".article-title", "h1", "title"],
    fallback_title: "CSDN article",
    body_selectors: &[
        "#article_content",
        ".article_content",
        ".blog-content-box",
        ".markdown_views",
        ".htmledit_views",
    ],
    body_mode: BodyMode::FirstMatch,
    backup_selectors: &[],
    collect_images: true,
};

/// Static bodies shorter than this (in chars) trigger a rendered attempt.
pub const RENDER_BELOW_CHARS: usize = 100;

pub struct CsdnHandler;

#[async_trait]
impl SiteHandler for CsdnHandler {
    fn name(&self) -> &'static str {
        "csdn"
    }

    async fn extract(&self, url: &str, ctx: &HandlerContext<'_>) -> ExtractionResult {
        let static_result = match ctx.fetcher.fetch_text(url).await {
            Ok(html) => RECIPE.parse(&html, url, self.name(), ctx.noise),
            Err(err) => return site_failure(self.name(), url, err),
        };

        if static_result.success && static_result.content.chars().count() >= RENDER_BELOW_CHARS {
            return static_result;
        }

        if let Some(renderer) = ctx.renderer {
            debug!(url, "csdn static body too short, rendering");
            let rendered = renderer
                .render_with(url, |snapshot, method| {
                    RECIPE.parse(&snapshot.markup, url, &format!("csdn-{}", method), ctx.noise)
                })
                .await;
            if rendered.success {
                info!(url, "csdn body recovered by rendering");
                return rendered;
            }
        }

        static_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseFilter;
    use pretty_assertions::assert_eq;

    #[test]
    fn recipe_prefers_article_title_and_content_box() {
        let html = r#"<html><head><title>博客_CSDN博客</title></head><body>
            <h1 class="title-article">Tokio 调度器解析</h1>
            <div id="article_content"><div class="markdown_views">
              <p>工作窃取调度器的核心思想。</p>
              <pre><code>let rt = tokio::runtime::Runtime::new()?;</code></pre>
            </div></div>
            <div class="recommend-box">推荐阅读</div>
            </body></html>"#;
        let result = RECIPE.parse(
            html,
            "https://blog.csdn.net/u/article/details/1",
            "csdn",
            &NoiseFilter::default(),
        );
        assert!(result.success);
        assert_eq!(result.title, "Tokio 调度器解析");
        assert_eq!(
            result.content,
            "工作窃取调度器的核心思想。\nlet rt = tokio::runtime::Runtime::new()?;"
        );
    }
}
