// ABOUTME: Quality gate that decides whether an extracted text is good enough to return.
// ABOUTME: Length floor, blocked-page vocabulary, script-ratio and repetition heuristics.

//! Content quality scoring.
//!
//! The gate is the only oracle the orchestrator and the renderer consult when deciding
//! whether to escalate. Its constants were tuned on Chinese and English article sites and
//! are exposed through [`QualityConfig`] rather than hard-coded.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;

/// Default vocabulary of block pages and error pages.
pub const DEFAULT_BLOCKED_KEYWORDS: &[&str] = &[
    "安全验证",
    "验证码",
    "机器人",
    "captcha",
    "security check",
    "403",
    "404",
    "页面不存在",
    "访问受限",
    "请稍后再试",
    "系统繁忙",
    "网络错误",
    "服务器错误",
    "暂时无法访问",
];

static DEFAULT_GATE: Lazy<QualityGate> = Lazy::new(QualityGate::default);

/// Tunable thresholds for [`QualityGate`].
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    /// Content shorter than this (in chars) is rejected outright.
    pub min_chars: usize,
    /// Case-insensitive substrings that mark a block or error page.
    pub blocked_keywords: Vec<String>,
    /// Below this CJK fraction the Latin check applies.
    pub cjk_ratio_floor: f64,
    /// Latin-letter fraction needed to accept non-CJK content.
    pub latin_ratio_floor: f64,
    /// The script check only runs on content longer than this (in chars).
    pub script_check_min_chars: usize,
    /// The repetition check only runs with more lines than this.
    pub repetition_min_lines: usize,
    /// Minimum ratio of distinct lines to total lines.
    pub distinct_ratio_floor: f64,
    /// Lines must be longer than this (in chars) to count as distinct.
    pub distinct_line_min_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_chars: 50,
            blocked_keywords: DEFAULT_BLOCKED_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            cjk_ratio_floor: 0.10,
            latin_ratio_floor: 0.30,
            script_check_min_chars: 100,
            repetition_min_lines: 10,
            distinct_ratio_floor: 0.5,
            distinct_line_min_chars: 5,
        }
    }
}

/// Compiled quality gate.
#[derive(Debug, Clone)]
pub struct QualityGate {
    config: QualityConfig,
    keywords: Option<AhoCorasick>,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

impl QualityGate {
    /// Compile a gate from a config.
    ///
    /// An empty or unbuildable keyword list disables the vocabulary check.
    pub fn new(config: QualityConfig) -> Self {
        let keywords = if config.blocked_keywords.is_empty() {
            None
        } else {
            AhoCorasickBuilder::new()
                .ascii_case_insensitive(true)
                .build(&config.blocked_keywords)
                .ok()
        };
        Self { config, keywords }
    }

    /// Returns the config this gate was built from.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Returns true only if every check passes.
    ///
    /// `title` is accepted for parity with callers that score (content, title) pairs;
    /// the current checks only look at the content.
    pub fn is_good_quality(&self, content: &str, _title: &str) -> bool {
        let total_chars = content.chars().count();
        if total_chars < self.config.min_chars {
            return false;
        }

        if self.contains_blocked_keyword(content) {
            return false;
        }

        if !self.passes_script_check(content, total_chars) {
            return false;
        }

        self.passes_repetition_check(content)
    }

    fn contains_blocked_keyword(&self, content: &str) -> bool {
        match &self.keywords {
            Some(ac) => ac.is_match(&content.to_lowercase()),
            None => false,
        }
    }

    /// Rejects text that is neither clearly CJK nor clearly Latin (garbled or error pages).
    fn passes_script_check(&self, content: &str, total_chars: usize) -> bool {
        if total_chars <= self.config.script_check_min_chars {
            return true;
        }
        let cjk = content.chars().filter(|c| is_cjk(*c)).count();
        let cjk_ratio = cjk as f64 / total_chars as f64;
        if cjk_ratio >= self.config.cjk_ratio_floor {
            return true;
        }
        let latin = content.chars().filter(|c| c.is_ascii_alphabetic()).count();
        let latin_ratio = latin as f64 / total_chars as f64;
        latin_ratio >= self.config.latin_ratio_floor
    }

    /// Rejects boilerplate-dominated pages where most lines repeat.
    fn passes_repetition_check(&self, content: &str) -> bool {
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() <= self.config.repetition_min_lines {
            return true;
        }
        let distinct: HashSet<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| l.chars().count() > self.config.distinct_line_min_chars)
            .collect();
        let ratio = distinct.len() as f64 / lines.len() as f64;
        ratio >= self.config.distinct_ratio_floor
    }
}

/// CJK Unified Ideographs in the common range.
pub(crate) fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Score content with the default gate.
pub fn is_good_quality(content: &str, title: &str) -> bool {
    DEFAULT_GATE.is_good_quality(content, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english_paragraph() -> String {
        "The river rose steadily through the night, and by morning the lower town was under water. \
         Volunteers moved sandbags along the embankment while the council opened two schools as shelters."
            .to_string()
    }

    #[test]
    fn rejects_short_content() {
        assert!(!is_good_quality("short", "t"));
        assert!(!is_good_quality(&"a".repeat(49), "t"));
    }

    #[test]
    fn accepts_content_just_over_the_floor() {
        assert!(is_good_quality(&"a".repeat(51), "t"));
    }

    #[test]
    fn rejects_captcha_vocabulary() {
        let content = format!("{}请输入验证码后继续访问本页面", "正文内容".repeat(20));
        assert!(!is_good_quality(&content, "x"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let content = format!("{} Please solve the CAPTCHA to continue.", english_paragraph());
        assert!(!is_good_quality(&content, "x"));
    }

    #[test]
    fn accepts_mostly_cjk_text() {
        // 66 of 110 chars are CJK
        let content = format!("{}{}", "中".repeat(66), "a b ".repeat(11));
        assert!(content.chars().count() > 100);
        assert!(is_good_quality(&content, "t"));
    }

    #[test]
    fn accepts_plain_english() {
        assert!(is_good_quality(&english_paragraph(), "t"));
    }

    #[test]
    fn rejects_text_that_is_neither_cjk_nor_latin() {
        let content = "— … — … 1 2 3 4 5 6 7 8 9 ".repeat(10);
        assert!(content.chars().count() > 100);
        assert!(!is_good_quality(&content, "t"));
    }

    #[test]
    fn rejects_repeated_lines() {
        let mut lines = vec!["Subscribe to our newsletter today"; 19];
        lines.push("A single genuinely different sentence of body text.");
        let content = lines.join("\n");
        assert!(!is_good_quality(&content, "t"));
    }

    #[test]
    fn accepts_distinct_lines() {
        let content = (0..20)
            .map(|i| format!("Paragraph number {} talks about something else entirely.", i))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(is_good_quality(&content, "t"));
    }

    #[test]
    fn thresholds_are_configurable() {
        let gate = QualityGate::new(QualityConfig {
            min_chars: 10,
            blocked_keywords: vec![],
            ..Default::default()
        });
        assert!(gate.is_good_quality("error 404 here, sure", "t"));
        assert!(!is_good_quality("error 404 here, sure", "t"));
    }
}
