// ABOUTME: Site handler trait and the domain-keyed registry the orchestrator dispatches through.
// ABOUTME: Also holds ArticleRecipe, the selector-driven parser shared by the article handlers.

//! Site-specific extraction.
//!
//! Handlers are registered under a domain substring and matched against the URL host in
//! registration order. A handler never returns an error: every failure becomes a
//! `success = false` result whose error is prefixed with the handler's name, so the
//! orchestrator can fall through to the generic path.

pub mod bilibili;
pub mod csdn;
pub mod wechat;
pub mod zhihu;

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::dom;
use crate::extractors::compiled::select_all;
use crate::extractors::generic::collect_images;
use crate::noise::NoiseFilter;
use crate::render::Renderer;
use crate::resource::StaticFetcher;
use crate::result::ExtractionResult;

/// Shared services a handler may use. Borrowed from the `Harvester` for one call.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    pub fetcher: &'a StaticFetcher,
    /// `None` when rendering is disabled or no browser runtime is configured.
    pub renderer: Option<&'a Renderer>,
    pub noise: &'a NoiseFilter,
}

#[async_trait]
pub trait SiteHandler: Send + Sync {
    /// Short tag used as the error prefix and default method tag.
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str, ctx: &HandlerContext<'_>) -> ExtractionResult;
}

/// Build a failure tagged with the handler's name.
pub fn site_failure(site: &str, url: &str, err: impl std::fmt::Display) -> ExtractionResult {
    ExtractionResult::failure(url, site, format!("{}: {}", site, err))
}

/// How an article body is assembled from its selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// The first selector that matches anything supplies the body.
    FirstMatch,
    /// Every matched element (across all selectors) with more than this many chars is kept,
    /// joined by blank lines. Elements nested in or around a kept one are skipped.
    Collect { min_chars: usize },
}

/// Selector-driven title and body extraction for one article family.
#[derive(Debug, Clone, Copy)]
pub struct ArticleRecipe {
    pub site: &'static str,
    pub title_selectors: &'static [&'static str],
    pub fallback_title: &'static str,
    pub body_selectors: &'static [&'static str],
    pub body_mode: BodyMode,
    /// Tried when the body selectors find nothing.
    pub backup_selectors: &'static [&'static str],
    pub collect_images: bool,
}

impl ArticleRecipe {
    pub fn title(&self, doc: &Html) -> String {
        dom::first_text(doc, self.title_selectors).unwrap_or_else(|| self.fallback_title.to_string())
    }

    /// Raw body text before noise filtering.
    pub fn body(&self, doc: &Html) -> String {
        let primary = match self.body_mode {
            BodyMode::FirstMatch => dom::first_match(doc, self.body_selectors)
                .map(dom::element_text)
                .unwrap_or_default(),
            BodyMode::Collect { min_chars } => {
                let mut kept: Vec<ElementRef<'_>> = Vec::new();
                let mut parts = Vec::new();
                for css in self.body_selectors {
                    for el in select_all(doc, css) {
                        // skip the same node, or one nested with an already kept node
                        let overlaps = kept.iter().any(|k| {
                            k.id() == el.id()
                                || el.ancestors().any(|a| a.id() == k.id())
                                || k.ancestors().any(|a| a.id() == el.id())
                        });
                        if overlaps {
                            continue;
                        }
                        let text = dom::element_text(el);
                        if text.chars().count() > min_chars {
                            kept.push(el);
                            parts.push(text);
                        }
                    }
                }
                parts.join("\n\n")
            }
        };
        if !primary.trim().is_empty() {
            return primary;
        }
        dom::first_match(doc, self.backup_selectors)
            .map(dom::element_text)
            .unwrap_or_default()
    }

    /// Parse `html` into a result. An empty body is a site-tagged failure.
    pub fn parse(&self, html: &str, url: &str, method: &str, noise: &NoiseFilter) -> ExtractionResult {
        let doc = Html::parse_document(html);
        let content = noise.clean_lines(&self.body(&doc));
        if content.is_empty() {
            debug!(url, site = self.site, "recipe found no article body");
            return ExtractionResult::failure(
                url,
                method,
                format!("{}: no article body found", self.site),
            );
        }
        let images = if self.collect_images {
            collect_images(&doc, url)
        } else {
            Vec::new()
        };
        ExtractionResult::success(url, method, self.title(&doc), content, images)
    }
}

struct Entry {
    pattern: String,
    handler: Box<dyn SiteHandler>,
}

/// Domain-substring keyed strategy map.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<Entry>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the video, social-article, blog-platform and walled-article handlers.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register("bilibili.com", Box::new(bilibili::BilibiliHandler));
        reg.register("zhihu.com", Box::new(zhihu::ZhihuHandler));
        reg.register("csdn.net", Box::new(csdn::CsdnHandler));
        reg.register("mp.weixin.qq.com", Box::new(wechat::WechatHandler));
        reg
    }

    /// Append a handler. Earlier registrations win on overlapping patterns.
    pub fn register(&mut self, pattern: impl Into<String>, handler: Box<dyn SiteHandler>) {
        self.entries.push(Entry {
            pattern: pattern.into().to_lowercase(),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first handler whose pattern is a substring of the URL host.
    pub fn find(&self, url: &str) -> Option<&dyn SiteHandler> {
        let host = url::Url::parse(url).ok()?.host_str()?.to_lowercase();
        self.entries
            .iter()
            .find(|e| host.contains(&e.pattern))
            .map(|e| e.handler.as_ref())
    }

    /// Run the matching handler, or return `None` when no pattern matches.
    pub async fn dispatch(&self, url: &str, ctx: &HandlerContext<'_>) -> Option<ExtractionResult> {
        let handler = self.find(url)?;
        debug!(url, handler = handler.name(), "dispatching to site handler");
        Some(handler.extract(url, ctx).await)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.pattern, e.handler.name())))
            .finish()
    }
}
