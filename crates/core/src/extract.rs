//! Main-content selection.
//!
//! Candidate containers are scored on their own merits, then each candidate
//! lends half its score to its parent and a third to its grandparent. Scores
//! live in a map keyed by node id for the duration of one extraction; the
//! tree itself is never touched.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::parse::{Document, Element, NodeId};
use crate::postprocess::{PostProcessConfig, postprocess_html};
use crate::scoring::{ScoreConfig, ScoreResult, calculate_score, link_density};
use crate::{Result, Web2mdError};

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum score the top candidate must reach
    pub min_score_threshold: f64,
    /// Number of top candidates checked for a shared ancestor
    pub max_top_candidates: usize,
    /// Minimum character threshold for content; non-semantic candidates
    /// need a tenth of it
    pub char_threshold: usize,
    /// Maximum elements to consider (0 = unlimited)
    pub max_elements: usize,
    /// Sibling score threshold (multiplier of top score)
    pub sibling_threshold: f64,
    /// Scoring weights
    pub score: ScoreConfig,
    /// Post-processing configuration
    pub postprocess: PostProcessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 5.0,
            max_top_candidates: 5,
            char_threshold: 500,
            max_elements: 0,
            sibling_threshold: 0.2,
            score: ScoreConfig::default(),
            postprocess: PostProcessConfig::default(),
        }
    }
}

/// A candidate element with its score
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// The element itself
    pub element: Element<'a>,
    /// The calculated score result, including propagated score
    pub score_result: ScoreResult,
}

impl<'a> Candidate<'a> {
    fn new(element: Element<'a>, score_result: ScoreResult) -> Self {
        Self { element, score_result }
    }

    /// Get the final score of this candidate
    pub fn score(&self) -> f64 {
        self.score_result.final_score
    }
}

/// The result of content extraction
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Cleaned HTML of the selected subtree and included siblings
    pub content: String,
    /// The top candidate score
    pub top_score: f64,
    /// Number of elements extracted
    pub element_count: usize,
}

/// Tags that are considered potential content containers
const CANDIDATE_SELECTOR: &str = "div, article, section, main, p, td, pre, blockquote";

/// Candidates exempt from the minimum text length
const SEMANTIC_TAGS: &[&str] = &["article", "section", "main"];

/// Top candidates that must share an ancestor before it replaces the top candidate
const MIN_COMMON_CANDIDATES: usize = 3;

/// Scored elements of one document, in document order.
struct ScoreBoard<'a> {
    candidates: Vec<Candidate<'a>>,
    index: HashMap<NodeId, usize>,
}

impl<'a> ScoreBoard<'a> {
    fn get(&self, id: NodeId) -> Option<&Candidate<'a>> {
        self.index.get(&id).map(|&i| &self.candidates[i])
    }

    fn score_of(&self, element: &Element<'a>, config: &ScoreConfig) -> f64 {
        self.get(element.id()).map(Candidate::score).unwrap_or_else(|| calculate_score(element, config).final_score)
    }
}

/// Identify all candidate elements from the document, in document order
fn identify_candidates<'a>(doc: &'a Document, config: &ExtractConfig) -> Vec<Candidate<'a>> {
    let max_elements = if config.max_elements == 0 { usize::MAX } else { config.max_elements };
    let min_chars = config.char_threshold / 10;

    doc.select(CANDIDATE_SELECTOR)
        .unwrap_or_default()
        .into_iter()
        .take(max_elements)
        .filter(|element| {
            SEMANTIC_TAGS.contains(&element.tag_name().as_str()) || element.text().trim().chars().count() >= min_chars
        })
        .map(|element| {
            let score_result = calculate_score(&element, &config.score);
            Candidate::new(element, score_result)
        })
        .collect()
}

/// Propagate scores from candidates to their ancestors
///
/// Parents receive half of each candidate's own score and grandparents a
/// third. Ancestors that were not candidates enter the board with their own
/// score first. `<html>` never receives a score.
fn propagate_scores<'a>(candidates: Vec<Candidate<'a>>, score_config: &ScoreConfig) -> ScoreBoard<'a> {
    let own: Vec<(Element<'a>, f64)> = candidates.iter().map(|c| (c.element.clone(), c.score())).collect();
    let index = candidates.iter().enumerate().map(|(i, c)| (c.element.id(), i)).collect();
    let mut board = ScoreBoard { candidates, index };

    for (element, score) in own {
        let parent = element.parent();
        let grandparent = parent.as_ref().and_then(Element::parent);

        for (ancestor, divisor) in [(parent, 2.0), (grandparent, 3.0)] {
            let Some(ancestor) = ancestor else { continue };
            if ancestor.tag_name() == "html" {
                continue;
            }

            let i = match board.index.get(&ancestor.id()) {
                Some(&i) => i,
                None => {
                    let score_result = calculate_score(&ancestor, score_config);
                    board.index.insert(ancestor.id(), board.candidates.len());
                    board.candidates.push(Candidate::new(ancestor, score_result));
                    board.candidates.len() - 1
                }
            };
            board.candidates[i].score_result.final_score += score / divisor;
        }
    }

    board
}

/// Rank candidates by score, then tag priority, then text length.
///
/// The sort is stable, so full ties keep document order.
fn rank<'b, 'a>(board: &'b ScoreBoard<'a>) -> Vec<&'b Candidate<'a>> {
    let mut ranked: Vec<&Candidate<'a>> = board.candidates.iter().collect();
    ranked.sort_by(|a, b| compare_candidates(b, a));
    ranked
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.score()
        .partial_cmp(&b.score())
        .unwrap_or(Ordering::Equal)
        .then_with(|| candidate_priority(&a.element.tag_name()).cmp(&candidate_priority(&b.element.tag_name())))
        .then_with(|| a.element.text().chars().count().cmp(&b.element.text().chars().count()))
}

fn candidate_priority(tag_name: &str) -> u8 {
    match tag_name {
        "article" | "main" | "section" => 3,
        "div" => 2,
        _ => 1,
    }
}

fn is_descendant(element: &Element<'_>, ancestor: NodeId) -> bool {
    let mut current = element.parent();
    while let Some(node) = current {
        if node.id() == ancestor {
            return true;
        }
        current = node.parent();
    }
    false
}

/// An ancestor of the top candidate that holds several other strong
/// candidates, when the content is split across sibling containers.
fn common_ancestor<'a>(
    top: &Candidate<'a>, ranked: &[&Candidate<'a>], config: &ExtractConfig,
) -> Option<Element<'a>> {
    let top_id = top.element.id();
    let alternatives: Vec<&Candidate<'a>> = ranked
        .iter()
        .skip(1)
        .take(config.max_top_candidates.saturating_sub(1))
        .filter(|c| c.score() >= top.score() * 0.75 && !is_descendant(&c.element, top_id))
        .copied()
        .collect();

    if alternatives.len() < MIN_COMMON_CANDIDATES {
        return None;
    }

    let mut current = top.element.parent();
    while let Some(node) = current {
        if matches!(node.tag_name().as_str(), "body" | "html") {
            break;
        }
        let contained = alternatives.iter().filter(|c| is_descendant(&c.element, node.id())).count();
        if contained >= MIN_COMMON_CANDIDATES {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Select the parts of the top candidate's parent that belong to the content
///
/// Returns the top candidate and qualifying siblings in document order.
/// A sibling qualifies when any of these hold:
/// - its score is >= top_score * sibling_threshold
/// - it is a P with link_density < 0.25 and more than 80 chars of text
/// - it is a HEADER with at least 10 chars of text
fn select_with_siblings<'a>(
    top: &Element<'a>, top_score: f64, board: &ScoreBoard<'a>, config: &ExtractConfig,
) -> Vec<Element<'a>> {
    let Some(parent) = top.parent() else {
        return vec![top.clone()];
    };
    let threshold = (top_score * config.sibling_threshold).max(0.0);

    parent
        .child_elements()
        .filter(|sibling| {
            if sibling.id() == top.id() {
                return true;
            }

            if board.get(sibling.id()).is_some_and(|c| c.score() >= threshold) {
                return true;
            }

            let text_length = sibling.text().trim().chars().count();
            match sibling.tag_name().as_str() {
                "p" => text_length > 80 && link_density(sibling) < 0.25,
                "header" => text_length >= 10,
                _ => false,
            }
        })
        .collect()
}

/// Markup of one selected element.
///
/// Fragment parsing discards a `<body>` tag, which would leave its children
/// at the top level where nested-chrome pruning does not reach them, so the
/// body's content is kept inside a `<div>` instead.
fn content_markup(element: &Element<'_>) -> String {
    match element.tag_name().as_str() {
        "body" => format!("<div>{}</div>", element.inner_html()),
        _ => element.outer_html(),
    }
}

/// Extract the main content from a document
///
/// 1. Identify candidate elements
/// 2. Propagate scores to ancestors
/// 3. Select the top candidate, or a shared ancestor of the top candidates
/// 4. Include relevant siblings
/// 5. Post-process the extracted content
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    let candidates = identify_candidates(doc, config);
    tracing::debug!(candidates = candidates.len(), "identified candidates");

    let board = propagate_scores(candidates, &config.score);
    let ranked = rank(&board);

    let Some(&top) = ranked.first() else {
        return Err(Web2mdError::NoContent);
    };

    if top.score() < config.min_score_threshold {
        tracing::debug!(tag = %top.element.tag_name(), score = top.score(), "top candidate below threshold");
        return Err(Web2mdError::NotReadable { score: top.score(), threshold: config.min_score_threshold });
    }

    let (selected, top_score) = match common_ancestor(top, &ranked, config) {
        Some(ancestor) => {
            let score = board.score_of(&ancestor, &config.score).max(top.score());
            (ancestor, score)
        }
        None => (top.element.clone(), top.score()),
    };
    tracing::debug!(tag = %selected.tag_name(), score = top_score, "selected top candidate");

    let elements = select_with_siblings(&selected, top_score, &board, config);
    tracing::debug!(siblings = elements.len() - 1, "included siblings");

    let html = elements.iter().map(content_markup).collect::<Vec<_>>().join("\n");
    let content = postprocess_html(&html, &config.postprocess);

    Ok(ExtractedContent { content, top_score, element_count: elements.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_PARAGRAPH: &str = "This is a long paragraph with plenty of content, commas, and sentences. \
        It keeps going for a while so that the content density scoring recognises it as prose, \
        which is what an article body looks like to the scorer.";

    #[test]
    fn test_extract_config_default() {
        let config = ExtractConfig::default();
        assert_eq!(config.min_score_threshold, 5.0);
        assert_eq!(config.max_top_candidates, 5);
        assert_eq!(config.char_threshold, 500);
        assert_eq!(config.max_elements, 0);
        assert_eq!(config.sibling_threshold, 0.2);
    }

    #[test]
    fn test_identify_candidates_skips_short_non_semantic() {
        let html = format!(
            r#"<html><body><div>Tiny</div><section></section><article><p>{LONG_PARAGRAPH}</p></article></body></html>"#
        );
        let doc = Document::parse(&html).unwrap();
        let candidates = identify_candidates(&doc, &ExtractConfig::default());
        let tags: Vec<String> = candidates.iter().map(|c| c.element.tag_name()).collect();

        assert_eq!(tags, vec!["section", "article", "p"]);
    }

    #[test]
    fn test_identify_candidates_respects_max_elements() {
        let html = format!("<html><body><p>{LONG_PARAGRAPH}</p><p>{LONG_PARAGRAPH}</p><p>{LONG_PARAGRAPH}</p></body></html>");
        let doc = Document::parse(&html).unwrap();
        let config = ExtractConfig { max_elements: 2, ..Default::default() };

        assert_eq!(identify_candidates(&doc, &config).len(), 2);
    }

    #[test]
    fn test_score_propagation() {
        let html = format!(r#"<html><body><div id="outer"><div id="inner"><p>{LONG_PARAGRAPH}</p></div></div></body></html>"#);
        let doc = Document::parse(&html).unwrap();
        let config = ExtractConfig::default();

        let candidates = identify_candidates(&doc, &config);
        let p_score = candidates.iter().find(|c| c.element.tag_name() == "p").unwrap().score();
        let inner_own = candidates.iter().find(|c| c.element.attr("id") == Some("inner")).unwrap().score();
        let outer_own = candidates.iter().find(|c| c.element.attr("id") == Some("outer")).unwrap().score();

        let board = propagate_scores(candidates, &config.score);
        let inner = board.get(doc.select("#inner").unwrap()[0].id()).unwrap().score();
        let outer = board.get(doc.select("#outer").unwrap()[0].id()).unwrap().score();

        assert!((inner - (inner_own + p_score / 2.0)).abs() < 1e-9);
        assert!((outer - (outer_own + inner_own / 2.0 + p_score / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_html_never_scored() {
        let html = format!("<html><body><p>{LONG_PARAGRAPH}</p></body></html>");
        let doc = Document::parse(&html).unwrap();
        let config = ExtractConfig::default();

        let board = propagate_scores(identify_candidates(&doc, &config), &config.score);
        assert!(board.candidates.iter().all(|c| c.element.tag_name() != "html"));
        assert!(board.candidates.iter().any(|c| c.element.tag_name() == "body"));
    }

    #[test]
    fn test_minimal_article_selected() {
        let doc = Document::parse(r#"<article><h1>Title</h1><p>Body <a href="https://x">link</a>.</p></article>"#).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        assert!(extracted.content.starts_with("<article>"));
        assert!(extracted.content.contains("<h1>Title</h1>"));
        assert!(extracted.content.contains(r#"<a href="https://x">link</a>"#));
        assert_eq!(extracted.element_count, 1);
    }

    #[test]
    fn test_article_beats_sidebar() {
        let html = format!(
            r#"<html><body>
                <div class="widget"><p>Short widget text</p></div>
                <article class="main-content"><h1>Main Article Title</h1><p>{LONG_PARAGRAPH}</p><p>{LONG_PARAGRAPH}</p></article>
            </body></html>"#
        );
        let doc = Document::parse(&html).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        assert!(extracted.content.contains("Main Article Title"));
        assert!(!extracted.content.contains("Short widget text"));
        assert!(extracted.top_score >= 5.0);
    }

    #[test]
    fn test_not_readable_error() {
        let html = r##"
            <html><body>
                <div>
                    <a href="/one">Link number one</a>
                    <a href="/two">Link number two</a>
                    <a href="/three">Link number three</a>
                    <a href="/four">Link number four</a>
                </div>
            </body></html>
        "##;
        let doc = Document::parse(html).unwrap();
        let result = extract_content(&doc, &ExtractConfig::default());

        match result {
            Err(Web2mdError::NotReadable { score, threshold }) => assert!(score < threshold),
            other => panic!("expected NotReadable, got {other:?}"),
        }
    }

    #[test]
    fn test_body_level_navigation_dropped() {
        let paragraphs = format!("<p>{LONG_PARAGRAPH}</p>").repeat(8);
        let html = format!(
            r#"<html><body><nav><a href="/a">Home page link</a> <a href="/b">About the company</a> <a href="/c">Contact us today</a></nav><h1>Title</h1>{paragraphs}</body></html>"#
        );
        let doc = Document::parse(&html).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        assert!(!extracted.content.contains("Home page link"));
        assert!(!extracted.content.contains("<nav>"));
        assert!(extracted.content.contains("<h1>Title</h1>"));
        assert!(extracted.content.contains("recognises it as prose"));
    }

    #[test]
    fn test_empty_document_error() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let result = extract_content(&doc, &ExtractConfig::default());
        assert!(matches!(result, Err(Web2mdError::NoContent)));
    }

    #[test]
    fn test_siblings_included_in_document_order() {
        let html = format!(
            r#"<html><body><div id="wrap">
                <header><h1>Sibling Header Title</h1></header>
                <div class="post"><p>{LONG_PARAGRAPH}</p><p>{LONG_PARAGRAPH}</p></div>
                <p>{LONG_PARAGRAPH} Trailing paragraph.</p>
                <p><a href="/x">A paragraph that is entirely a link and therefore has far too high a link density to keep</a></p>
            </div></body></html>"#
        );
        let doc = Document::parse(&html).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        let header = extracted.content.find("Sibling Header Title").unwrap();
        let trailing = extracted.content.find("Trailing paragraph").unwrap();
        assert!(header < trailing);
        assert!(!extracted.content.contains("entirely a link"));
        assert_eq!(extracted.element_count, 3);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = format!(
            "<html><body><div><p>{LONG_PARAGRAPH}</p></div><div><p>{LONG_PARAGRAPH}</p></div></body></html>"
        );
        let doc = Document::parse(&html).unwrap();
        let first = extract_content(&doc, &ExtractConfig::default()).unwrap();
        let second = extract_content(&doc, &ExtractConfig::default()).unwrap();

        assert_eq!(first.content, second.content);
        assert_eq!(first.top_score, second.top_score);
    }
}
