//! Relevance scoring for candidate containers.
//!
//! A score rewards semantic tags, content-like class names and prose-sized
//! text, and is scaled down by the share of text that sits inside links.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

/// Weights and caps used by [`calculate_score`].
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Added when the id or a class looks like content
    pub positive_weight: f64,
    /// Added when the id or a class looks like page chrome
    pub negative_weight: f64,
    /// Cap on the points earned by text length
    pub max_char_density_score: f64,
    /// Cap on the points earned by commas
    pub max_comma_density_score: f64,
    /// Text characters needed for one length point
    pub chars_per_point: usize,
    /// Text length above which an element counts as prose for the link penalty
    pub content_rich_chars: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
            content_rich_chars: 500,
        }
    }
}

/// Breakdown of one element's score.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub tag_name: String,
    pub base_score: f64,
    pub class_weight: f64,
    pub content_density: f64,
    /// Share of the text inside `<a>` elements, 0.0 to 1.0
    pub link_density: f64,
    pub final_score: f64,
}

/// Score contributed by the tag alone.
///
/// - ARTICLE, MAIN: +10
/// - SECTION: +8
/// - DIV: +5
/// - TD, BLOCKQUOTE: +3
/// - FORM, lists and list items: -3
/// - headings, TH, HEADER, FOOTER, NAV, ASIDE: -5
pub fn base_tag_score(element: &Element<'_>) -> f64 {
    match element.tag_name().as_str() {
        "article" | "main" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

static POSITIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|tweet)")
        .expect("valid regex")
});

static NEGATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|cookie|disqus|extra|foot|header|menu|newsletter|related|remark|rss|share|shoutbox|sidebar|social|sponsor|ad-break|agegate|pagination|pager|popup|promo)",
    )
    .expect("valid regex")
});

/// Bonus or penalty from the id and class names.
///
/// The id is checked before the individual class names. The first match
/// wins, and a positive match wins over a negative one on the same value.
pub fn class_id_weight(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let classes = element.attr("class").into_iter().flat_map(str::split_whitespace);
    let values = element.attr("id").into_iter().chain(classes);

    for value in values {
        if POSITIVE_RE.is_match(value) {
            return config.positive_weight;
        }
        if NEGATIVE_RE.is_match(value) {
            return config.negative_weight;
        }
    }

    0.0
}

/// Points for text length and comma count, each capped.
pub fn content_density_score(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let text = element.text();
    let char_score = ((text.trim().chars().count() / config.chars_per_point) as f64).min(config.max_char_density_score);
    let comma_count = text.matches(',').count();
    let comma_score = (comma_count as f64).min(config.max_comma_density_score);

    char_score + comma_score
}

/// Characters of link text divided by characters of text.
pub fn link_density(element: &Element<'_>) -> f64 {
    let total = element.text().chars().count();
    if total == 0 {
        return 0.0;
    }

    let in_links: usize = element.select("a").unwrap_or_default().iter().map(|a| a.text().chars().count()).sum();

    (in_links as f64 / total as f64).min(1.0)
}

/// Scores one candidate element.
///
/// `(base + class weight + density - code penalty) * (1 - link density)`.
///
/// The link penalty is halved for elements with a positive class/id, for
/// prose-sized text, and for `<article>`/`<main>`, which hold inline links as
/// a matter of course.
pub fn calculate_score(element: &Element<'_>, config: &ScoreConfig) -> ScoreResult {
    let tag_name = element.tag_name();
    let text = element.text();

    let base_score = base_tag_score(element);
    let class_weight = class_id_weight(element, config);
    let content_density = content_density_score(element, config);
    let ld = link_density(element);
    let code_penalty = if tag_name == "pre" && looks_like_code(&text) { -10.0 } else { 0.0 };

    let is_semantic = matches!(tag_name.as_str(), "article" | "main");
    let is_content_rich = text.trim().chars().count() > config.content_rich_chars;
    let relieved = class_weight > 0.0 || is_content_rich || is_semantic;

    let link_penalty = if relieved { 1.0 - (ld * 0.5) } else { 1.0 - ld };
    let final_score = (base_score + class_weight + content_density + code_penalty) * link_penalty;

    ScoreResult { tag_name, base_score, class_weight, content_density, link_density: ld, final_score }
}

/// Symbol-heavy text with few commas and spaces reads as source code.
fn looks_like_code(text: &str) -> bool {
    let len = text.len();
    if len <= 50 {
        return false;
    }

    let comma_ratio = text.matches(',').count() as f64 / len as f64;
    let space_ratio = text.matches(' ').count() as f64 / len as f64;
    let special_ratio = text.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count() as f64 / len as f64;

    special_ratio > 0.15 && comma_ratio < 0.01 && space_ratio < 0.15
}
