// ABOUTME: Per-site post-navigation behavior (selector waits, read-more clicks, scrolling, pauses).
// ABOUTME: Sites without an entry get a generic settle sequence that triggers lazy loading.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::render::runtime::BrowserPage;
use crate::render::stealth::scroll_to_fraction_script;

/// What to do on a known site after navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteBehavior {
    /// Matched as a substring of the lowercase host.
    pub domain: &'static str,
    /// Waited for up to the selector timeout; a miss is not an error.
    pub wait_for: &'static str,
    /// "Read more" style expander, clicked if present.
    pub click: Option<&'static str>,
    pub scroll_fraction: Option<f64>,
    pub pause: Duration,
}

pub const SITE_BEHAVIORS: &[SiteBehavior] = &[
    SiteBehavior {
        domain: "zhihu.com",
        wait_for: ".RichText, .ztext, .Post-RichTextContainer",
        click: None,
        scroll_fraction: Some(1.0 / 3.0),
        pause: Duration::from_secs(2),
    },
    SiteBehavior {
        domain: "csdn.net",
        wait_for: ".article_content, #content_views, .markdown_views",
        click: Some(".btn-readmore, .read-more-btn"),
        scroll_fraction: None,
        pause: Duration::from_secs(1),
    },
    SiteBehavior {
        domain: "juejin.cn",
        wait_for: ".markdown-body, .article-content",
        click: None,
        scroll_fraction: None,
        pause: Duration::from_secs(1),
    },
    SiteBehavior {
        domain: "segmentfault.com",
        wait_for: ".article__content, .article-content",
        click: None,
        scroll_fraction: Some(0.5),
        pause: Duration::from_secs(1),
    },
];

/// Main-content containers waited for after every settle.
const MAIN_CONTENT_SELECTOR: &str = "article, main, .content, .post-content, .article-content";

/// Timing knobs for [`settle`].
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub selector_timeout: Duration,
    /// When false every fixed pause is skipped.
    pub human: bool,
}

/// Looks up the behavior entry for `url`'s host.
pub fn behavior_for(url: &str) -> Option<&'static SiteBehavior> {
    let host = Url::parse(url).ok()?.host_str()?.to_lowercase();
    SITE_BEHAVIORS.iter().find(|b| host.contains(b.domain))
}

async fn pause(pacing: Pacing, d: Duration) {
    if pacing.human {
        tokio::time::sleep(d).await;
    }
}

async fn scroll(page: &dyn BrowserPage, fraction: f64) {
    if let Err(err) = page.evaluate(&scroll_to_fraction_script(fraction)).await {
        debug!(error = %err, fraction, "scroll failed");
    }
}

/// Let the page finish loading after navigation. Nothing in here fails the attempt.
pub async fn settle(page: &dyn BrowserPage, url: &str, pacing: Pacing) {
    match behavior_for(url) {
        Some(site) => {
            match page.wait_for_selector(site.wait_for, pacing.selector_timeout).await {
                Ok(true) => {}
                Ok(false) => debug!(url, selector = site.wait_for, "site selector did not appear"),
                Err(err) => debug!(url, error = %err, "site selector wait failed"),
            }
            if let Some(css) = site.click {
                match page.click(css).await {
                    Ok(true) => debug!(url, selector = css, "expanded collapsed content"),
                    Ok(false) => {}
                    Err(err) => debug!(url, error = %err, "expand click failed"),
                }
            }
            if let Some(fraction) = site.scroll_fraction {
                scroll(page, fraction).await;
            }
            pause(pacing, site.pause).await;
        }
        None => {
            pause(pacing, Duration::from_secs(2)).await;
            scroll(page, 0.5).await;
            pause(pacing, Duration::from_secs(1)).await;
            scroll(page, 0.0).await;
            pause(pacing, Duration::from_secs(1)).await;
        }
    }

    if let Ok(false) | Err(_) = page
        .wait_for_selector(MAIN_CONTENT_SELECTOR, pacing.selector_timeout)
        .await
    {
        debug!(url, "no main content container appeared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_matches_host_substring() {
        let zhihu = behavior_for("https://zhuanlan.zhihu.com/p/123").unwrap();
        assert_eq!(zhihu.domain, "zhihu.com");
        let csdn = behavior_for("https://blog.csdn.net/user/article/details/1").unwrap();
        assert!(csdn.click.is_some());
        assert!(behavior_for("https://example.com/zhihu.com").is_none());
        assert!(behavior_for("not a url").is_none());
    }

    #[test]
    fn every_site_waits_on_a_selector() {
        for site in SITE_BEHAVIORS {
            assert!(!site.wait_for.is_empty());
        }
    }
}
