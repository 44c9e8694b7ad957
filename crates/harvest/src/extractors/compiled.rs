// ABOUTME: Process-wide cache of parsed scraper selectors keyed by their CSS text.
// ABOUTME: Invalid selectors are cached as None so they are parsed at most once.

//! Selector caching for the extraction hot paths.
//!
//! Every tier walks the same selector lists (title candidates, content containers, anti-bot
//! markers) for every page. Parsing a selector costs more than matching it against a small
//! document, so parsed selectors are shared behind a read-mostly lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

type Cache = HashMap<String, Option<Arc<Selector>>>;

static SELECTOR_CACHE: Lazy<RwLock<Cache>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the parsed selector for `css`, or `None` if it does not parse.
pub fn get_or_compile(css: &str) -> Option<Arc<Selector>> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok().map(Arc::new);
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    cache
        .entry(css.to_string())
        .or_insert(compiled)
        .clone()
}

/// Top-level elements still attached to the document root.
///
/// `Html::select` walks the whole node arena, including subtrees detached by
/// [`crate::dom::remove_elements`]; selecting from these roots only visits live nodes.
fn attached_roots(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.tree.root().children().filter_map(ElementRef::wrap)
}

/// First element in `doc` matching `css`. Invalid selectors match nothing.
pub fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = get_or_compile(css)?;
    let selector: &Selector = &selector;
    attached_roots(doc).find_map(|root| root.select(selector).next())
}

/// All elements in `doc` matching `css`, in document order.
pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    let Some(selector) = get_or_compile(css) else {
        return Vec::new();
    };
    let selector: &Selector = &selector;
    attached_roots(doc)
        .flat_map(move |root| root.select(selector))
        .collect()
}

/// Returns true if any element in `doc` matches `css`.
pub fn matches_any(doc: &Html, css: &str) -> bool {
    select_first(doc, css).is_some()
}
