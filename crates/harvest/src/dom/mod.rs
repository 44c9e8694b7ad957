// ABOUTME: DOM traversal and mutation helpers shared by the extractors and site handlers.
// ABOUTME: Linearizes scraper trees into text lines, removes subtrees, and reads first-match fields.

//! DOM utilities over `scraper::Html`.
//!
//! Text is linearized one text node per line, trimmed, with empty nodes dropped. Text inside
//! `script`, `style`, `noscript` and `template` never counts as visible.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};

use crate::extractors::compiled::select_all;

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_invisible(node: NodeRef<'_, Node>) -> bool {
    node.ancestors().any(|a| match a.value() {
        Node::Element(el) => INVISIBLE_TAGS.contains(&el.name()),
        _ => false,
    })
}

fn push_lines<'a>(root: NodeRef<'a, Node>, out: &mut Vec<&'a str>) {
    for node in root.descendants() {
        if let Node::Text(text) = node.value() {
            let trimmed = text.trim();
            if !trimmed.is_empty() && !is_invisible(node) {
                out.push(trimmed);
            }
        }
    }
}

/// Visible text nodes under `el`, trimmed, one per entry.
pub fn element_lines(el: ElementRef<'_>) -> Vec<&str> {
    let mut out = Vec::new();
    push_lines(*el, &mut out);
    out
}

/// Visible text under `el` joined one node per line.
pub fn element_text(el: ElementRef<'_>) -> String {
    element_lines(el).join("\n")
}

/// Visible text of the whole document joined one node per line.
pub fn document_text(doc: &Html) -> String {
    let mut out = Vec::new();
    push_lines(doc.tree.root(), &mut out);
    out.join("\n")
}

/// The first `max_chars` characters of the document's visible text.
pub fn visible_text_prefix(doc: &Html, max_chars: usize) -> String {
    document_text(doc).chars().take(max_chars).collect()
}

/// Detach every element matching any selector in `selectors`.
///
/// Returns how many subtrees were removed. Nested matches inside an already
/// removed subtree are skipped.
pub fn remove_elements(doc: &mut Html, selectors: &[&str]) -> usize {
    let ids: Vec<_> = selectors
        .iter()
        .flat_map(|css| select_all(doc, css))
        .map(|el| el.id())
        .collect();
    let root = doc.tree.root().id();
    let mut removed = 0;
    for id in ids {
        let attached = doc
            .tree
            .get(id)
            .is_some_and(|node| node.ancestors().any(|a| a.id() == root));
        if !attached {
            continue;
        }
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
            removed += 1;
        }
    }
    removed
}

/// Text of the first element, across `selectors` in order, whose whitespace-normalized
/// text is non-empty.
pub fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        select_all(doc, css).into_iter().find_map(|el| {
            let text = normalize_whitespace(&element_lines(el).join(" "));
            (!text.is_empty()).then_some(text)
        })
    })
}

/// The first element across `selectors` in order that matches at all.
pub fn first_match<'a>(doc: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|css| select_all(doc, css).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><title> Hello  World </title>
        <style>body { color: red }</style></head>
        <body><nav>Home</nav><article><p>First line</p>
        <script>var x = 1;</script><p>  Second line </p></article>
        <footer>Copyright</footer></body></html>"#;

    #[test]
    fn element_text_skips_scripts_and_styles() {
        let doc = Html::parse_document(PAGE);
        let article = select_all(&doc, "article").remove(0);
        assert_eq!(element_text(article), "First line\nSecond line");
    }

    #[test]
    fn remove_elements_detaches_subtrees() {
        let mut doc = Html::parse_document(PAGE);
        let removed = remove_elements(&mut doc, &["nav", "footer", "script"]);
        assert_eq!(removed, 3);
        let text = document_text(&doc);
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
        assert!(text.contains("First line"));
    }

    #[test]
    fn first_text_normalizes_and_skips_empty_matches() {
        let doc = Html::parse_document(
            r#"<html><head><title> Hello  World </title></head><body><h1> </h1></body></html>"#,
        );
        assert_eq!(
            first_text(&doc, &["h1", "title"]),
            Some("Hello World".to_string())
        );
        assert_eq!(first_text(&doc, &["h2"]), None);
    }

    #[test]
    fn visible_prefix_is_char_bounded() {
        let doc = Html::parse_document("<html><body><p>验证页面内容</p></body></html>");
        assert_eq!(visible_text_prefix(&doc, 2), "验证");
    }

    #[test]
    fn nested_matches_count_once() {
        let mut doc = Html::parse_document(
            "<html><body><aside><aside>inner</aside></aside><p>kept</p></body></html>",
        );
        assert_eq!(remove_elements(&mut doc, &["aside"]), 1);
        assert_eq!(document_text(&doc), "kept");
    }
}
