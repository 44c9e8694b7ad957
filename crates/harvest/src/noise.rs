// ABOUTME: Line-level boilerplate classifier used by every extraction path.
// ABOUTME: Provides is_noise() over the built-in rules and NoiseFilter for extended rule sets.

//! Noise filtering for scraped text lines.
//!
//! Scraped pages produce a lot of short chrome lines: navigation labels, login prompts,
//! counters, copyright footers, "read more" links. Each rule below is a regex over a single
//! trimmed line; any match classifies the line as noise.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines starting with call-to-action words.
static CALL_TO_ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(点击|查看|更多|广告|推荐|click\b|view more|see more|read more|advertisement|sponsored)")
        .unwrap()
});

/// Purely numeric lines (view counters, pagination).
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// One to three characters with no CJK ideograph.
static SHORT_NON_CJK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\x{4e00}-\x{9fa5}]{1,3}$").unwrap());

/// Navigation and account vocabulary.
static NAVIGATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)登录|注册|首页|导航|菜单|^(sign in|log in|login|sign up|register|home|menu|navigation|skip to content)$")
        .unwrap()
});

/// Copyright and ICP registration footers.
static COPYRIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)copyright|©|版权|备案|all rights reserved").unwrap());

static DEFAULT_FILTER: Lazy<NoiseFilter> = Lazy::new(NoiseFilter::default);

/// Minimum length (in chars) a line needs to survive [`NoiseFilter::clean_lines`].
const MIN_LINE_CHARS: usize = 4;

/// An ordered set of noise rules.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    rules: Vec<Regex>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            rules: vec![
                CALL_TO_ACTION_RE.clone(),
                NUMERIC_RE.clone(),
                SHORT_NON_CJK_RE.clone(),
                NAVIGATION_RE.clone(),
                COPYRIGHT_RE.clone(),
            ],
        }
    }
}

impl NoiseFilter {
    /// Append a rule; it is checked after the existing ones.
    pub fn with_rule(mut self, rule: Regex) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the number of rules in this filter.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the filter has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if the trimmed line matches any rule.
    pub fn is_noise(&self, line: &str) -> bool {
        let line = line.trim();
        self.rules.iter().any(|rule| rule.is_match(line))
    }

    /// Trim every line, drop empty, too-short and noise lines, and rejoin with newlines.
    pub fn clean_lines(&self, text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|line| line.chars().count() >= MIN_LINE_CHARS && !self.is_noise(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Classify a line against the built-in rules.
pub fn is_noise(line: &str) -> bool {
    DEFAULT_FILTER.is_noise(line)
}

/// Clean a block of text with the built-in rules.
pub fn clean_lines(text: &str) -> String {
    DEFAULT_FILTER.clean_lines(text)
}
