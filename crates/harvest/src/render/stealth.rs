// ABOUTME: Launch flags, request headers and the init script that make headless Chromium look ordinary.
// ABOUTME: Also holds the small page scripts the renderer evaluates (innerText, scrolling).

/// Flags passed to every browser launch.
pub const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-infobars",
    "--disable-features=VizDisplayCompositor",
    "--no-first-run",
    "--window-size=1920,1080",
];

/// Headers a real Chrome 120 on Windows sends on a top-level navigation.
pub const CONTEXT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    (
        "Sec-Ch-Ua",
        r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#,
    ),
    ("Sec-Ch-Ua-Mobile", "?0"),
    ("Sec-Ch-Ua-Platform", r#""Windows""#),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Hides the usual automation tells before any page script runs.
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['zh-CN', 'zh', 'en'] });
window.chrome = { runtime: {} };
"#;

/// Visible text of the rendered page.
pub const INNER_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// Scroll to `fraction` of the full document height.
pub fn scroll_to_fraction_script(fraction: f64) -> String {
    format!(
        "window.scrollTo(0, Math.max(document.body.scrollHeight, document.documentElement.scrollHeight) * {})",
        fraction
    )
}
