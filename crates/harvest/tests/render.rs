// ABOUTME: Integration tests for the headless engine loop against a scripted fake browser.
// ABOUTME: Covers engine fallthrough, anti-bot and quality rejection, and session cleanup on every path.

mod common;

use std::time::Duration;

use common::{fast_render_options, FakeRuntime, Script, GOOD_BODY, THIN_BODY};
use digests_harvest::render::Renderer;
use digests_harvest::{AntiBotDetector, QualityGate};
use pretty_assertions::assert_eq;

const URL: &str = "https://spa.example/post/1";

fn renderer(runtime: std::sync::Arc<FakeRuntime>) -> Renderer {
    Renderer::new(
        runtime,
        fast_render_options(),
        AntiBotDetector::default(),
        QualityGate::default(),
    )
}

#[tokio::test]
async fn first_engine_success_stops_the_loop() {
    let runtime = FakeRuntime::new(Script::page("Ownership", GOOD_BODY));
    let result = renderer(runtime.clone()).render(URL).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.extraction_method, "render-chromium");
    assert_eq!(result.title, "Ownership");
    assert_eq!(result.url, URL);
    assert_eq!(runtime.launches(), 1);
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn launch_failure_moves_to_next_engine() {
    let runtime = FakeRuntime::with_engines(
        &[("chromium", Script::LaunchFails)],
        Script::page("Ownership", GOOD_BODY),
    );
    let result = renderer(runtime.clone()).render(URL).await;

    assert!(result.success);
    assert_eq!(result.extraction_method, "render-chromium-legacy-headless");
    assert_eq!(runtime.launches(), 2);
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn blocked_page_moves_to_next_engine() {
    let runtime = FakeRuntime::with_engines(
        &[("chromium", Script::page("请完成安全验证", GOOD_BODY))],
        Script::page("Ownership", GOOD_BODY),
    );
    let result = renderer(runtime.clone()).render(URL).await;

    assert!(result.success);
    assert_eq!(result.extraction_method, "render-chromium-legacy-headless");
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn exhausted_engines_report_every_reason() {
    let runtime = FakeRuntime::with_engines(
        &[("chromium", Script::GotoFails)],
        Script::page("Thin", THIN_BODY),
    );
    let result = renderer(runtime.clone()).render(URL).await;

    assert!(!result.success);
    assert_eq!(result.url, URL);
    assert_eq!(result.extraction_method, "render");
    let error = result.error_message();
    assert!(error.contains("all engines failed"), "{}", error);
    assert!(error.contains("chromium: "), "{}", error);
    assert!(error.contains("timeout"), "{}", error);
    assert!(
        error.contains("chromium-legacy-headless: content failed quality gate"),
        "{}",
        error
    );
    assert_eq!(runtime.launches(), 2);
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn empty_page_counts_as_extraction_failure() {
    let runtime = FakeRuntime::new(Script::Page {
        markup: "<html><body></body></html>".to_string(),
        text: String::new(),
        title: String::new(),
    });
    let result = renderer(runtime.clone()).render(URL).await;

    assert!(!result.success);
    assert!(result.error_message().contains("no content extracted"));
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn custom_parser_output_is_still_quality_gated() {
    let runtime = FakeRuntime::new(Script::page("Ownership", GOOD_BODY));
    let r = renderer(runtime.clone());

    let short = r
        .render_with(URL, |_, method| {
            digests_harvest::ExtractionResult::success(URL, method, "t", "tiny", vec![])
        })
        .await;
    assert!(!short.success);

    let custom = r
        .render_with(URL, |snapshot, method| {
            digests_harvest::ExtractionResult::success(
                URL,
                format!("custom-{}", method),
                snapshot.title.clone(),
                snapshot.text.clone(),
                vec![],
            )
        })
        .await;
    assert!(custom.success);
    assert_eq!(custom.extraction_method, "custom-render-chromium");
    assert_eq!(custom.content, GOOD_BODY);
    assert_eq!(runtime.open_sessions(), 0);
}

#[tokio::test]
async fn cancelled_render_still_closes_the_session() {
    let runtime = FakeRuntime::new(Script::Hang);
    let r = renderer(runtime.clone());

    let outcome = tokio::time::timeout(Duration::from_millis(50), r.render(URL)).await;
    assert!(outcome.is_err());
    assert_eq!(runtime.launches(), 1);

    // the guard spawns the close when the attempt future is dropped
    for _ in 0..20 {
        if runtime.open_sessions() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(runtime.open_sessions(), 0);
}
