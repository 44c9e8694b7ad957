// ABOUTME: Headless render fetcher that loops browser engines until one yields clean content.
// ABOUTME: Each attempt is isolated: blocked pages, low quality and errors move on to the next engine.

//! Headless rendering.
//!
//! [`Renderer`] drives a [`BrowserRuntime`] through the configured engine profiles. For each
//! profile it launches a session, opens a stealth-configured page, navigates, runs the site
//! behavior (or a generic settle), snapshots the page and scores the extraction. The first
//! attempt that is not blocked and passes the quality gate wins. When every engine fails the
//! result is a failure listing each engine's reason.

pub mod behavior;
#[cfg(feature = "chromium")]
pub mod chromium;
pub mod runtime;
pub mod stealth;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tracing::{debug, info, warn};

use crate::antibot::AntiBotDetector;
use crate::error::HarvestError;
use crate::extractors::generic::GenericExtractor;
use crate::quality::QualityGate;
use crate::result::ExtractionResult;

pub use behavior::{Pacing, SiteBehavior};
pub use runtime::{
    BlockedResource, BrowserPage, BrowserRuntime, BrowserSession, ContextOptions, EngineProfile,
    HeadlessKind, SessionGuard,
};

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Tried in order until one succeeds.
    pub engines: Vec<EngineProfile>,
    pub context: ContextOptions,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    /// Jitter before navigation and fixed pauses while settling. Off in tests.
    pub human_pacing: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            engines: vec![
                EngineProfile::chromium(),
                EngineProfile::chromium_legacy_headless(),
            ],
            context: ContextOptions::default(),
            navigation_timeout: Duration::from_secs(45),
            selector_timeout: Duration::from_secs(5),
            human_pacing: true,
        }
    }
}

/// What one engine attempt captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    pub markup: String,
    /// `document.body.innerText`.
    pub text: String,
    pub title: String,
}

/// Deterministic per-URL delay of 1000..2000 ms before navigation.
pub fn jitter(url: &str) -> Duration {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    Duration::from_millis(1000 + hasher.finish() % 1000)
}

pub fn method_tag(profile: &EngineProfile) -> String {
    format!("render-{}", profile.name)
}

pub struct Renderer {
    runtime: Arc<dyn BrowserRuntime>,
    options: RenderOptions,
    detector: AntiBotDetector,
    gate: QualityGate,
    extractor: GenericExtractor,
}

impl Renderer {
    pub fn new(
        runtime: Arc<dyn BrowserRuntime>,
        options: RenderOptions,
        detector: AntiBotDetector,
        gate: QualityGate,
    ) -> Self {
        Self {
            runtime,
            options,
            detector,
            gate,
            extractor: GenericExtractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: GenericExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `url` and extract it with the generic extractor.
    pub async fn render(&self, url: &str) -> ExtractionResult {
        self.render_with(url, |snapshot, method| {
            self.extractor
                .extract(Html::parse_document(&snapshot.markup), url, method)
        })
        .await
    }

    /// Run the engine loop with a caller-supplied parser.
    ///
    /// `extract` receives the snapshot and the `render-<engine>` method tag. Its result still
    /// has to pass the quality gate.
    pub async fn render_with<F>(&self, url: &str, extract: F) -> ExtractionResult
    where
        F: Fn(&PageSnapshot, &str) -> ExtractionResult + Send + Sync,
    {
        let mut reasons = Vec::with_capacity(self.options.engines.len());

        for profile in &self.options.engines {
            let method = method_tag(profile);
            let snapshot = match self.capture(profile, url).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(url, engine = %profile.name, error = %err, "render attempt failed");
                    reasons.push(format!("{}: {}", profile.name, err));
                    continue;
                }
            };

            if self
                .detector
                .looks_blocked(&snapshot.title, &snapshot.text, &snapshot.markup)
            {
                warn!(url, engine = %profile.name, "anti-bot page detected");
                reasons.push(format!(
                    "{}: {}",
                    profile.name,
                    HarvestError::blocked(url, "Render")
                ));
                continue;
            }

            let result = extract(&snapshot, &method);
            if !result.success {
                warn!(url, engine = %profile.name, error = result.error_message(), "render extraction failed");
                reasons.push(format!("{}: {}", profile.name, result.error_message()));
                continue;
            }
            if !self.gate.is_good_quality(&result.content, &result.title) {
                info!(url, engine = %profile.name, chars = result.content.chars().count(), "rendered content failed quality gate");
                reasons.push(format!("{}: content failed quality gate", profile.name));
                continue;
            }

            info!(url, engine = %profile.name, words = result.word_count, "render succeeded");
            return result;
        }

        let err = HarvestError::render(
            url,
            "Render",
            Some(anyhow::anyhow!("all engines failed: {}", reasons.join("; "))),
        );
        ExtractionResult::failure(url, "render", err.to_string())
    }

    /// One isolated engine attempt. The session is closed before this returns.
    async fn capture(&self, profile: &EngineProfile, url: &str) -> Result<PageSnapshot, HarvestError> {
        debug!(url, engine = %profile.name, "launching browser");
        let session = self.runtime.launch(profile).await?;
        let guard = SessionGuard::new(session, profile.name.clone());
        let outcome = self.drive(&guard, url).await;
        guard.close().await;
        outcome
    }

    async fn drive(&self, guard: &SessionGuard, url: &str) -> Result<PageSnapshot, HarvestError> {
        let page = guard.new_page(&self.options.context).await?;

        if self.options.human_pacing {
            tokio::time::sleep(jitter(url)).await;
        }
        page.goto(url, self.options.navigation_timeout).await?;

        let pacing = Pacing {
            selector_timeout: self.options.selector_timeout,
            human: self.options.human_pacing,
        };
        behavior::settle(page.as_ref(), url, pacing).await;

        let markup = page.content().await?;
        let text = match page.evaluate(stealth::INNER_TEXT_SCRIPT).await {
            Ok(serde_json::Value::String(text)) => text,
            Ok(_) => String::new(),
            Err(err) => {
                debug!(url, error = %err, "innerText unavailable");
                String::new()
            }
        };
        let title = page.title().await.unwrap_or_default();

        Ok(PageSnapshot {
            markup,
            text,
            title,
        })
    }
}
