// ABOUTME: The Harvester orchestrator: site handlers, static fetch, anti-bot and quality checks, render fallback.
// ABOUTME: Provides extract(), extract_many() and extract_html(); none of them ever return an error.

use std::sync::Arc;

use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::antibot::AntiBotDetector;
use crate::error::HarvestError;
use crate::extractors::generic::GenericExtractor;
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::options::{HarvesterBuilder, Options};
use crate::quality::QualityGate;
use crate::render::{BrowserRuntime, Renderer};
use crate::resource::{FetchOptions, StaticFetcher, MAX_CONTENT_LENGTH};
use crate::result::ExtractionResult;

/// Method tag of the static tier.
pub const STATIC_METHOD: &str = "requests";

/// Structural URL check: a scheme and a host must be present. No network access.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// What the static tier produced for one URL.
struct StaticStage {
    result: ExtractionResult,
    blocked: bool,
}

/// Multi-tier content extractor.
///
/// Owns one HTTP client, the handler registry and, when rendering is available, a
/// [`Renderer`]. Safe to share behind an `Arc`.
pub struct Harvester {
    opts: Options,
    fetcher: StaticFetcher,
    registry: HandlerRegistry,
    renderer: Option<Renderer>,
    detector: AntiBotDetector,
    gate: QualityGate,
    extractor: GenericExtractor,
}

fn default_runtime() -> Option<Arc<dyn BrowserRuntime>> {
    #[cfg(feature = "chromium")]
    {
        Some(Arc::new(crate::render::chromium::ChromiumRuntime::new()))
    }
    #[cfg(not(feature = "chromium"))]
    {
        None
    }
}

impl Harvester {
    pub fn builder() -> HarvesterBuilder {
        HarvesterBuilder::new()
    }

    /// Build with the built-in site handlers.
    pub fn new(opts: Options) -> Result<Self, HarvestError> {
        Self::with_registry(opts, HandlerRegistry::builtin())
    }

    pub fn with_registry(opts: Options, registry: HandlerRegistry) -> Result<Self, HarvestError> {
        let fetcher = match &opts.http_client {
            Some(client) => StaticFetcher::with_client(client.clone(), MAX_CONTENT_LENGTH),
            None => StaticFetcher::new(&FetchOptions {
                timeout: opts.timeout,
                user_agent: opts.user_agent.clone(),
                headers: opts.headers.clone(),
                ..FetchOptions::default()
            })?,
        };

        let detector = AntiBotDetector::new(opts.antibot.clone());
        let gate = QualityGate::new(opts.quality.clone());
        let extractor = GenericExtractor::default().with_noise_filter(opts.noise.clone());

        let runtime = if opts.render {
            opts.runtime.clone().or_else(default_runtime)
        } else {
            None
        };
        let renderer = runtime.map(|runtime| {
            Renderer::new(
                runtime,
                opts.render_options.clone(),
                detector.clone(),
                gate.clone(),
            )
            .with_extractor(extractor.clone())
        });
        if renderer.is_none() {
            debug!(render = opts.render, "headless tier unavailable");
        }

        Ok(Self {
            opts,
            fetcher,
            registry,
            renderer,
            detector,
            gate,
            extractor,
        })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// True when a browser runtime is configured and rendering is enabled.
    pub fn can_render(&self) -> bool {
        self.renderer.is_some()
    }

    fn is_render_first(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return false;
        };
        self.opts
            .render_first_sites
            .iter()
            .any(|pattern| host.contains(pattern.as_str()))
    }

    /// Extract one URL through the tier ladder.
    ///
    /// The returned result always echoes `url`, even after redirects.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        if !is_valid_url(url) {
            warn!(url, "rejecting invalid URL");
            let err = HarvestError::invalid_url(
                url,
                "Extract",
                Some(anyhow::anyhow!("URL needs a scheme and a host")),
            );
            return ExtractionResult::failure(url, STATIC_METHOD, err.to_string());
        }
        let renderer = self.renderer.as_ref();

        if let Some(renderer) = renderer.filter(|_| self.is_render_first(url)) {
            info!(url, "render-first site");
            let rendered = renderer.render(url).await;
            if rendered.success {
                return rendered;
            }
            warn!(url, error = rendered.error_message(), "render-first attempt failed, trying static fetch");
            return match self.static_stage(url).await {
                Ok(stage) => self.finish_static(url, stage),
                Err(err) => {
                    warn!(url, error = %err, "static fetch failed");
                    ExtractionResult::failure(url, STATIC_METHOD, err.to_string())
                }
            };
        }

        let ctx = HandlerContext {
            fetcher: &self.fetcher,
            renderer,
            noise: &self.opts.noise,
        };
        if let Some(result) = self.registry.dispatch(url, &ctx).await {
            if result.success {
                return result;
            }
            warn!(url, handler = %result.extraction_method, error = result.error_message(), "site handler failed, using generic path");
        }

        let stage = match self.static_stage(url).await {
            Ok(stage) => stage,
            Err(err) => {
                warn!(url, error = %err, "static fetch failed");
                if let Some(renderer) = renderer {
                    let rendered = renderer.render(url).await;
                    if rendered.success {
                        return rendered;
                    }
                    warn!(url, error = rendered.error_message(), "render fallback failed");
                }
                return ExtractionResult::failure(url, STATIC_METHOD, err.to_string());
            }
        };

        let Some(renderer) = renderer else {
            return self.finish_static(url, stage);
        };

        if stage.blocked {
            info!(url, "anti-bot page on static fetch, rendering");
            return renderer.render(url).await;
        }
        if stage.result.success
            && self
                .gate
                .is_good_quality(&stage.result.content, &stage.result.title)
        {
            debug!(url, words = stage.result.word_count, "static content passed quality gate");
            return stage.result;
        }

        info!(url, chars = stage.result.content.chars().count(), "static content failed quality gate, rendering");
        let rendered = renderer.render(url).await;
        if !rendered.success && !stage.result.success {
            warn!(url, error = rendered.error_message(), "render fallback failed");
            return stage.result;
        }
        rendered
    }

    /// Extract each URL in order, pausing [`Options::politeness_delay`] between requests.
    pub async fn extract_many<S: AsRef<str>>(&self, urls: &[S]) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.opts.politeness_delay.is_zero() {
                tokio::time::sleep(self.opts.politeness_delay).await;
            }
            let result = self.extract(url.as_ref()).await;
            debug!(url = url.as_ref(), success = result.success, "batch item done");
            results.push(result);
        }
        results
    }

    /// Run the generic extractor and anti-bot check over markup already in hand.
    ///
    /// Nothing is fetched or rendered; `url` is used for image resolution and echoed back.
    pub fn extract_html(&self, html: &str, url: &str) -> ExtractionResult {
        let stage = self.analyze(html, url);
        self.finish_static(url, stage)
    }

    async fn static_stage(&self, url: &str) -> Result<StaticStage, HarvestError> {
        let html = self.fetcher.fetch_text(url).await?;
        Ok(self.analyze(&html, url))
    }

    fn analyze(&self, html: &str, url: &str) -> StaticStage {
        let doc = Html::parse_document(html);
        let blocked = self.detector.inspect_document(&doc);
        let result = self.extractor.extract(doc, url, STATIC_METHOD);
        StaticStage { result, blocked }
    }

    /// The static result when no later tier runs. A blocked page is never a success.
    fn finish_static(&self, url: &str, stage: StaticStage) -> ExtractionResult {
        if stage.blocked {
            let err = HarvestError::blocked(url, "Extract");
            warn!(url, "anti-bot page and no render tier");
            return ExtractionResult::failure(url, STATIC_METHOD, err.to_string());
        }
        stage.result
    }
}
