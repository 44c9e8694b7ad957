// ABOUTME: chromiumoxide-backed BrowserRuntime that drives Chromium over the DevTools protocol.
// ABOUTME: Applies the stealth context per page and aborts heavy resources through Fetch interception.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetScriptExecutionDisabledParams,
    SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, Headers, ResourceType, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, EventDomContentEventFired, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::HarvestError;
use crate::render::runtime::{
    BlockedResource, BrowserPage, BrowserRuntime, BrowserSession, ContextOptions, EngineProfile,
    HeadlessKind,
};

const SELECTOR_POLL: Duration = Duration::from_millis(250);

fn render_err(op: &str, err: impl std::fmt::Display) -> HarvestError {
    HarvestError::render("", op, Some(anyhow::anyhow!("{}", err)))
}

/// Launches a local Chromium per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRuntime;

impl ChromiumRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserRuntime for ChromiumRuntime {
    async fn launch(&self, profile: &EngineProfile) -> Result<Box<dyn BrowserSession>, HarvestError> {
        let mut builder = BrowserConfig::builder().viewport(None::<Viewport>).args(profile.launch_args());
        if profile.headless == HeadlessKind::New {
            builder = builder.new_headless_mode();
        }
        if let Some(path) = &profile.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|e| render_err("Launch", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| render_err("Launch", e))?;

        let engine = profile.name.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(engine = %engine, error = %err, "devtools handler event error");
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }
}

struct ChromiumSession {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

fn resource_type(kind: BlockedResource) -> ResourceType {
    match kind {
        BlockedResource::Image => ResourceType::Image,
        BlockedResource::Stylesheet => ResourceType::Stylesheet,
        BlockedResource::Font => ResourceType::Font,
        BlockedResource::Media => ResourceType::Media,
    }
}

/// Fail every paused request. Only the blocked resource types are paused.
async fn block_resources(page: &Page, kinds: &[BlockedResource]) -> Result<Option<JoinHandle<()>>, HarvestError> {
    if kinds.is_empty() {
        return Ok(None);
    }
    let patterns = kinds
        .iter()
        .map(|k| {
            RequestPattern::builder()
                .url_pattern("*")
                .resource_type(resource_type(*k))
                .build()
        })
        .collect::<Vec<_>>();

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| render_err("BlockResources", e))?;
    page.execute(EnableParams::builder().patterns(patterns).build())
        .await
        .map_err(|e| render_err("BlockResources", e))?;

    let page = page.clone();
    Ok(Some(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(err) = page.execute(fail).await {
                debug!(error = %err, "failed to abort blocked request");
            }
        }
    })))
}

async fn apply_context(page: &Page, ctx: &ContextOptions) -> Result<(), HarvestError> {
    let mut ua = SetUserAgentOverrideParams::new(ctx.user_agent.clone());
    ua.accept_language = Some(ctx.locale.clone());
    page.execute(ua).await.map_err(|e| render_err("Context", e))?;

    let headers: serde_json::Map<String, serde_json::Value> = ctx
        .extra_headers
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    page.execute(SetExtraHttpHeadersParams::new(Headers::new(
        serde_json::Value::Object(headers),
    )))
    .await
    .map_err(|e| render_err("Context", e))?;

    let (width, height) = ctx.viewport;
    page.execute(SetDeviceMetricsOverrideParams::new(
        width as i64,
        height as i64,
        1.0,
        false,
    ))
    .await
    .map_err(|e| render_err("Context", e))?;

    if let Err(err) = page
        .execute(SetTimezoneOverrideParams::new(ctx.timezone.clone()))
        .await
    {
        debug!(error = %err, "timezone override rejected");
    }
    if let Err(err) = page
        .execute(SetLocaleOverrideParams {
            locale: Some(ctx.locale.clone()),
        })
        .await
    {
        debug!(error = %err, "locale override rejected");
    }
    if !ctx.javascript_enabled {
        page.execute(SetScriptExecutionDisabledParams::new(true))
            .await
            .map_err(|e| render_err("Context", e))?;
    }

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        ctx.init_script.clone(),
    ))
    .await
    .map_err(|e| render_err("Context", e))?;
    Ok(())
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(&self, ctx: &ContextOptions) -> Result<Box<dyn BrowserPage>, HarvestError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| render_err("NewPage", e))?
        };
        apply_context(&page, ctx).await?;
        let blocker = block_resources(&page, &ctx.blocked_resources).await?;
        Ok(Box::new(ChromiumPage {
            page,
            blocker,
        }))
    }

    async fn close(&self) -> Result<(), HarvestError> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await.map_err(|e| render_err("Close", e));
        if let Err(err) = browser.wait().await {
            warn!(error = %err, "browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed.map(|_| ())
    }
}

struct ChromiumPage {
    page: Page,
    blocker: Option<JoinHandle<()>>,
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        if let Some(task) = self.blocker.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), HarvestError> {
        let mut dom_ready = self
            .page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| HarvestError::render(url, "Navigate", Some(anyhow::anyhow!("{}", e))))?;

        // Page.navigate returns once the document commits; subresources are not awaited.
        let navigate = async {
            let response = self
                .page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| HarvestError::render(url, "Navigate", Some(anyhow::anyhow!("{}", e))))?;
            if let Some(text) = response.result.error_text.as_deref() {
                return Err(HarvestError::render(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!("{}", text)),
                ));
            }
            dom_ready.next().await;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigate).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HarvestError::timeout(
                url,
                "Navigate",
                Some(anyhow::anyhow!("DOMContentLoaded not reached within {:?}", timeout)),
            )),
        }
    }

    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> Result<bool, HarvestError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(css).await.is_ok() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn click(&self, css: &str) -> Result<bool, HarvestError> {
        let Ok(element) = self.page.find_element(css).await else {
            return Ok(false);
        };
        element.click().await.map_err(|e| render_err("Click", e))?;
        Ok(true)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, HarvestError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| render_err("Evaluate", e))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String, HarvestError> {
        self.page.content().await.map_err(|e| render_err("Content", e))
    }

    async fn title(&self) -> Result<String, HarvestError> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| render_err("Title", e))?;
        Ok(title.unwrap_or_default())
    }
}
