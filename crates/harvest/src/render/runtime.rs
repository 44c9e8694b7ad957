// ABOUTME: Capability traits over a headless browser plus the per-attempt SessionGuard.
// ABOUTME: The renderer only talks to these traits; backends and test fakes implement them.

//! Browser capability traits.
//!
//! A [`BrowserRuntime`] launches one [`BrowserSession`] per engine attempt. The session opens
//! pages configured by [`ContextOptions`]. Every session is owned by a [`SessionGuard`] so it
//! is closed on every exit path, including cancellation of the surrounding future.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::HarvestError;
use crate::render::stealth;

/// Which headless implementation a profile asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessKind {
    /// Chromium's current headless mode, closest to a headed browser.
    New,
    /// The older headless shell, with a different fingerprint.
    Legacy,
}

/// One entry of the engine loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProfile {
    /// Used in logs and in the `render-<name>` method tag.
    pub name: String,
    pub headless: HeadlessKind,
    /// Browser binary; `None` lets the backend find one.
    pub executable: Option<PathBuf>,
    /// Appended after the stealth launch flags.
    pub extra_args: Vec<String>,
}

impl EngineProfile {
    pub fn chromium() -> Self {
        Self {
            name: "chromium".to_string(),
            headless: HeadlessKind::New,
            executable: None,
            extra_args: Vec::new(),
        }
    }

    pub fn chromium_legacy_headless() -> Self {
        Self {
            name: "chromium-legacy-headless".to_string(),
            headless: HeadlessKind::Legacy,
            executable: None,
            extra_args: Vec::new(),
        }
    }

    /// Stealth flags followed by this profile's extra arguments.
    pub fn launch_args(&self) -> Vec<String> {
        stealth::LAUNCH_ARGS
            .iter()
            .map(|a| a.to_string())
            .chain(self.extra_args.iter().cloned())
            .collect()
    }
}

/// Resource classes aborted at the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedResource {
    Image,
    Stylesheet,
    Font,
    Media,
}

/// Per-page browsing context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub locale: String,
    pub timezone: String,
    pub javascript_enabled: bool,
    pub extra_headers: Vec<(String, String)>,
    pub blocked_resources: Vec<BlockedResource>,
    /// Runs before any page script on every new document.
    pub init_script: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            user_agent: crate::resource::DEFAULT_USER_AGENT.to_string(),
            viewport: (1920, 1080),
            locale: "zh-CN".to_string(),
            timezone: "Asia/Shanghai".to_string(),
            javascript_enabled: true,
            extra_headers: stealth::CONTEXT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            blocked_resources: vec![
                BlockedResource::Image,
                BlockedResource::Stylesheet,
                BlockedResource::Font,
                BlockedResource::Media,
            ],
            init_script: stealth::STEALTH_SCRIPT.to_string(),
        }
    }
}

/// Launches browser sessions.
#[async_trait]
pub trait BrowserRuntime: Send + Sync {
    async fn launch(&self, profile: &EngineProfile) -> Result<Box<dyn BrowserSession>, HarvestError>;
}

/// A running browser process.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn new_page(&self, ctx: &ContextOptions) -> Result<Box<dyn BrowserPage>, HarvestError>;

    /// Shut the browser down. Must be safe to call on an already broken session.
    async fn close(&self) -> Result<(), HarvestError>;
}

/// A single tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait for DOMContentLoaded, failing after `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), HarvestError>;

    /// Returns false if nothing matched `css` within `timeout`.
    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> Result<bool, HarvestError>;

    /// Click the first match of `css`. Returns false if nothing matched.
    async fn click(&self, css: &str) -> Result<bool, HarvestError>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, HarvestError>;

    /// Current serialized markup.
    async fn content(&self) -> Result<String, HarvestError>;

    async fn title(&self) -> Result<String, HarvestError>;
}

/// Owns a session for the length of one engine attempt.
///
/// Call [`SessionGuard::close`] at the end of the attempt. If the guard is dropped while still
/// holding the session (the attempt future was cancelled), the close is spawned on the tokio
/// runtime that created the guard.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    handle: Option<tokio::runtime::Handle>,
    engine: String,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>, engine: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            handle: tokio::runtime::Handle::try_current().ok(),
            engine: engine.into(),
        }
    }

    pub async fn new_page(&self, ctx: &ContextOptions) -> Result<Box<dyn BrowserPage>, HarvestError> {
        match &self.session {
            Some(session) => session.new_page(ctx).await,
            None => Err(HarvestError::render(
                "",
                "NewPage",
                Some(anyhow::anyhow!("session already closed")),
            )),
        }
    }

    /// Close the session now. Close errors are logged, never returned.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = session.close().await {
                warn!(engine = %self.engine, error = %err, "browser close failed");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let engine = std::mem::take(&mut self.engine);
        match &self.handle {
            Some(handle) => {
                debug!(engine = %engine, "session dropped before close, closing in background");
                handle.spawn(async move {
                    if let Err(err) = session.close().await {
                        warn!(engine = %engine, error = %err, "background browser close failed");
                    }
                });
            }
            None => warn!(engine = %engine, "session dropped outside a tokio runtime, not closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_profiles_differ_in_headless_kind() {
        let a = EngineProfile::chromium();
        let b = EngineProfile::chromium_legacy_headless();
        assert_eq!(a.headless, HeadlessKind::New);
        assert_eq!(b.headless, HeadlessKind::Legacy);
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn launch_args_start_with_stealth_flags() {
        let mut profile = EngineProfile::chromium();
        profile.extra_args.push("--lang=zh-CN".to_string());
        let args = profile.launch_args();
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=zh-CN"));
    }

    #[test]
    fn default_context_is_a_chinese_desktop_browser() {
        let ctx = ContextOptions::default();
        assert_eq!(ctx.viewport, (1920, 1080));
        assert_eq!(ctx.locale, "zh-CN");
        assert_eq!(ctx.timezone, "Asia/Shanghai");
        assert!(ctx.javascript_enabled);
        assert!(ctx.init_script.contains("webdriver"));
        assert!(ctx
            .extra_headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("sec-ch-ua")));
    }
}
