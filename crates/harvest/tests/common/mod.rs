// ABOUTME: Shared fixtures for integration tests: a scripted fake BrowserRuntime and page builders.
// ABOUTME: The fake counts launches and open sessions so tests can assert every session is closed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use digests_harvest::render::stealth::INNER_TEXT_SCRIPT;
use digests_harvest::render::{
    BrowserPage, BrowserRuntime, BrowserSession, ContextOptions, EngineProfile, RenderOptions,
};
use digests_harvest::HarvestError;

/// What one engine does when launched.
#[derive(Debug, Clone)]
pub enum Script {
    LaunchFails,
    GotoFails,
    /// Navigation never completes.
    Hang,
    Page {
        markup: String,
        text: String,
        title: String,
    },
}

impl Script {
    pub fn page(title: &str, body: &str) -> Self {
        Script::Page {
            markup: article_html(title, body),
            text: body.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub open: AtomicUsize,
    pub gotos: AtomicUsize,
}

/// Fake runtime. Engines not in `scripts` use `fallback`.
pub struct FakeRuntime {
    scripts: HashMap<String, Script>,
    fallback: Script,
    pub counters: Arc<Counters>,
}

impl FakeRuntime {
    pub fn new(fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            scripts: HashMap::new(),
            fallback,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn with_engines(scripts: &[(&str, Script)], fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .iter()
                .map(|(name, script)| (name.to_string(), script.clone()))
                .collect(),
            fallback,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    pub fn gotos(&self) -> usize {
        self.counters.gotos.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserRuntime for FakeRuntime {
    async fn launch(&self, profile: &EngineProfile) -> Result<Box<dyn BrowserSession>, HarvestError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&profile.name)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        if let Script::LaunchFails = script {
            return Err(HarvestError::render(
                "",
                "Launch",
                Some(anyhow::anyhow!("no browser binary")),
            ));
        }
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script,
            counters: self.counters.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct FakeSession {
    script: Script,
    counters: Arc<Counters>,
    closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&self, _ctx: &ContextOptions) -> Result<Box<dyn BrowserPage>, HarvestError> {
        Ok(Box::new(FakePage {
            script: self.script.clone(),
            counters: self.counters.clone(),
        }))
    }

    async fn close(&self) -> Result<(), HarvestError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.counters.open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct FakePage {
    script: Script,
    counters: Arc<Counters>,
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), HarvestError> {
        self.counters.gotos.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::GotoFails => Err(HarvestError::timeout(
                url,
                "Navigate",
                Some(anyhow::anyhow!("navigation exceeded {:?}", timeout)),
            )),
            Script::Hang => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn wait_for_selector(&self, _css: &str, _timeout: Duration) -> Result<bool, HarvestError> {
        Ok(matches!(self.script, Script::Page { .. }))
    }

    async fn click(&self, _css: &str) -> Result<bool, HarvestError> {
        Ok(false)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, HarvestError> {
        match &self.script {
            Script::Page { text, .. } if script == INNER_TEXT_SCRIPT => {
                Ok(serde_json::Value::String(text.clone()))
            }
            _ => Ok(serde_json::Value::Null),
        }
    }

    async fn content(&self) -> Result<String, HarvestError> {
        match &self.script {
            Script::Page { markup, .. } => Ok(markup.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn title(&self) -> Result<String, HarvestError> {
        match &self.script {
            Script::Page { title, .. } => Ok(title.clone()),
            _ => Ok(String::new()),
        }
    }
}

/// Render options with pacing disabled.
pub fn fast_render_options() -> RenderOptions {
    RenderOptions {
        human_pacing: false,
        ..RenderOptions::default()
    }
}

pub fn article_html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><article><p>{}</p></article></body></html>",
        title, body
    )
}

/// A body that passes the default quality gate.
pub const GOOD_BODY: &str = "Ownership and borrowing let Rust programs manage memory safely \
without a garbage collector, and the compiler checks every reference before the program runs.";

/// Forty characters: extracted fine, rejected by the quality gate.
pub const THIN_BODY: &str = "Loading the interactive page, wait a bit";
