// ABOUTME: Configuration options for the harvest pipeline and the HarvesterBuilder fluent API.
// ABOUTME: Every heuristic threshold is reachable from here so callers can retune without forking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::antibot::AntiBotConfig;
use crate::client::Harvester;
use crate::error::HarvestError;
use crate::handlers::{HandlerRegistry, SiteHandler};
use crate::noise::NoiseFilter;
use crate::quality::QualityConfig;
use crate::render::{BrowserRuntime, RenderOptions};
use crate::resource::DEFAULT_USER_AGENT;

/// Domains known to ship empty shells to plain HTTP clients.
pub const DEFAULT_RENDER_FIRST_SITES: &[&str] = &["juejin.cn", "segmentfault.com"];

/// Configuration options for a [`Harvester`].
#[derive(Clone)]
pub struct Options {
    /// Static fetch timeout.
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra static request headers, applied over the built-in browser-like set.
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
    /// Pause between consecutive URLs in [`Harvester::extract_many`].
    pub politeness_delay: Duration,
    /// Allow the headless tier. When off, the static result is final.
    pub render: bool,
    /// Host substrings that go to the headless tier before anything else.
    pub render_first_sites: Vec<String>,
    pub render_options: RenderOptions,
    pub quality: QualityConfig,
    pub antibot: AntiBotConfig,
    pub noise: NoiseFilter,
    /// Browser backend. `None` uses Chromium when the `chromium` feature is on.
    pub runtime: Option<Arc<dyn BrowserRuntime>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            http_client: None,
            politeness_delay: Duration::from_secs(1),
            render: true,
            render_first_sites: DEFAULT_RENDER_FIRST_SITES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            render_options: RenderOptions::default(),
            quality: QualityConfig::default(),
            antibot: AntiBotConfig::default(),
            noise: NoiseFilter::default(),
            runtime: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("http_client", &self.http_client.is_some())
            .field("politeness_delay", &self.politeness_delay)
            .field("render", &self.render)
            .field("render_first_sites", &self.render_first_sites)
            .field("render_options", &self.render_options)
            .field("quality", &self.quality)
            .field("antibot", &self.antibot)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// Builder for constructing Harvester instances with custom configuration.
#[derive(Debug, Default)]
pub struct HarvesterBuilder {
    opts: Options,
    registry: Option<HandlerRegistry>,
}

impl HarvesterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the static fetch timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a header to every static request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a prebuilt HTTP client. Timeout, user agent and headers are then its concern.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    pub fn politeness_delay(mut self, delay: Duration) -> Self {
        self.opts.politeness_delay = delay;
        self
    }

    /// Enable or disable the headless tier.
    pub fn render(mut self, enabled: bool) -> Self {
        self.opts.render = enabled;
        self
    }

    /// Add a render-first host pattern.
    pub fn render_first(mut self, pattern: impl Into<String>) -> Self {
        self.opts.render_first_sites.push(pattern.into().to_lowercase());
        self
    }

    /// Replace the render-first list.
    pub fn render_first_sites(mut self, patterns: Vec<String>) -> Self {
        self.opts.render_first_sites = patterns.into_iter().map(|p| p.to_lowercase()).collect();
        self
    }

    pub fn render_options(mut self, render_options: RenderOptions) -> Self {
        self.opts.render_options = render_options;
        self
    }

    pub fn quality(mut self, quality: QualityConfig) -> Self {
        self.opts.quality = quality;
        self
    }

    pub fn antibot(mut self, antibot: AntiBotConfig) -> Self {
        self.opts.antibot = antibot;
        self
    }

    pub fn noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.opts.noise = noise;
        self
    }

    /// Drive a specific browser backend.
    pub fn runtime(mut self, runtime: Arc<dyn BrowserRuntime>) -> Self {
        self.opts.runtime = Some(runtime);
        self
    }

    /// Replace the site handler registry. The built-in registry is used otherwise.
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register an extra site handler after the current ones.
    pub fn handler(mut self, pattern: impl Into<String>, handler: Box<dyn SiteHandler>) -> Self {
        self.registry
            .get_or_insert_with(HandlerRegistry::builtin)
            .register(pattern, handler);
        self
    }

    /// Build the Harvester. Fails only when the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Harvester, HarvestError> {
        let registry = self.registry.unwrap_or_else(HandlerRegistry::builtin);
        Harvester::with_registry(self.opts, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_pipeline_constants() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.politeness_delay, Duration::from_secs(1));
        assert!(opts.render);
        assert_eq!(opts.render_first_sites, vec!["juejin.cn", "segmentfault.com"]);
        assert!(opts.runtime.is_none());
    }

    #[test]
    fn builder_lowercases_render_first_patterns() {
        let builder = HarvesterBuilder::new()
            .render_first("Example.COM")
            .politeness_delay(Duration::ZERO)
            .header("X-Test", "1");
        assert_eq!(builder.opts.render_first_sites.last().map(String::as_str), Some("example.com"));
        assert_eq!(builder.opts.politeness_delay, Duration::ZERO);
        assert_eq!(builder.opts.headers.get("X-Test").map(String::as_str), Some("1"));
    }

    #[test]
    fn debug_hides_runtime_internals() {
        let text = format!("{:?}", Options::default());
        assert!(text.contains("runtime: false"));
    }
}
