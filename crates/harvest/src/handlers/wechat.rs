// ABOUTME: Walled-article handler for WeChat official account posts (mp.weixin.qq.com).
// ABOUTME: Reads the rich_media body and lazy data-src images; a missing body is a tagged failure.

use async_trait::async_trait;

use super::{site_failure, ArticleRecipe, BodyMode, HandlerContext, SiteHandler};
use crate::result::ExtractionResult;

pub const RECIPE: ArticleRecipe = ArticleRecipe {
    site: "wechat",
    title_selectors: &["h1.rich_media_title", "#activity-name", "title"],
    fallback_title: "WeChat article",
    body_selectors: &[".rich_media_content", "#js_content"],
    body_mode: BodyMode::FirstMatch,
    backup_selectors: &[],
    collect_images: true,
};

pub struct WechatHandler;

#[async_trait]
impl SiteHandler for WechatHandler {
    fn name(&self) -> &'static str {
        "wechat"
    }

    async fn extract(&self, url: &str, ctx: &HandlerContext<'_>) -> ExtractionResult {
        match ctx.fetcher.fetch_text(url).await {
            Ok(html) => RECIPE.parse(&html, url, self.name(), ctx.noise),
            Err(err) => site_failure(self.name(), url, err),
        }
    }
}
