//! Cleanup of the extracted content before it is rendered.
//!
//! The selected HTML is parsed as a fragment and written back out node by
//! node. Nodes that fail a filter are skipped while writing, so the output
//! is always well-formed regardless of how the source nested its tags.
//! Comments, including conditional comments, are never written.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Configuration for HTML post-processing cleanup
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Whether to remove empty nodes
    pub remove_empty_nodes: bool,
    /// Whether to remove nested containers with high link density
    pub remove_high_link_density: bool,
    /// Maximum link density threshold (0.0 to 1.0)
    pub max_link_density: f64,
    /// Whether to unwrap DIVs whose only content is another DIV
    pub clean_nested_divs: bool,
    /// Whether to strip all images
    pub strip_images: bool,
    /// Whether to keep class attributes (default: false)
    pub keep_classes: bool,
    /// Custom strip patterns (class/ID regex)
    pub strip_patterns: Option<String>,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            remove_empty_nodes: true,
            remove_high_link_density: true,
            max_link_density: 0.5,
            clean_nested_divs: true,
            strip_images: false,
            keep_classes: false,
            strip_patterns: None,
        }
    }
}

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));

const VOID_TAGS: &[&str] =
    &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

/// Containers dropped when they hold no text and no media.
const EMPTY_PRUNABLE: &[&str] = &[
    "div", "p", "span", "section", "article", "aside", "nav", "header", "footer", "li", "ul", "ol", "figure",
    "blockquote", "strong", "em", "b", "i",
];

/// Containers dropped when nested inside the content with mostly link text.
const LINK_PRUNABLE: &[&str] = &["div", "section", "aside", "nav", "header", "footer", "ul", "ol"];

/// Elements that count as content even without text.
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "iframe", "embed", "object", "table", "hr"];

struct Cleaner<'c> {
    config: &'c PostProcessConfig,
    strip_re: Option<Regex>,
    out: String,
}

/// Post-process extracted HTML by cleaning up remaining unwanted content
pub fn postprocess_html(html: &str, config: &PostProcessConfig) -> String {
    let strip_re = config.strip_patterns.as_deref().and_then(|pattern| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "ignoring invalid strip pattern");
            None
        }
    });

    let fragment = Html::parse_fragment(html);
    let mut cleaner = Cleaner { config, strip_re, out: String::with_capacity(html.len()) };

    for child in fragment.root_element().children() {
        cleaner.write_node(child, 0);
    }

    cleaner.out
}

impl Cleaner<'_> {
    fn write_node(&mut self, node: NodeRef<'_, Node>, depth: usize) {
        match node.value() {
            Node::Text(text) => escape_into(&mut self.out, text, false),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    self.write_element(element, depth);
                }
            }
            _ => {}
        }
    }

    fn write_element(&mut self, element: ElementRef<'_>, depth: usize) {
        if self.should_drop(element, depth) {
            return;
        }

        let name = element.value().name();

        if self.config.clean_nested_divs && name == "div" && let Some(inner) = sole_div_child(element) {
            self.write_element(inner, depth);
            return;
        }

        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in element.value().attrs() {
            if attr == "style" || (attr == "class" && !self.config.keep_classes) {
                continue;
            }
            self.out.push(' ');
            self.out.push_str(attr);
            self.out.push_str("=\"");
            escape_into(&mut self.out, value, true);
            self.out.push('"');
        }
        self.out.push('>');

        if VOID_TAGS.contains(&name) {
            return;
        }

        for child in element.children() {
            self.write_node(child, depth + 1);
        }

        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn should_drop(&self, element: ElementRef<'_>, depth: usize) -> bool {
        let name = element.value().name();

        if self.config.strip_images && matches!(name, "img" | "picture") {
            return true;
        }

        if let Some(re) = &self.strip_re {
            let el = element.value();
            if el.attr("class").is_some_and(|c| re.is_match(c)) || el.attr("id").is_some_and(|id| re.is_match(id)) {
                return true;
            }
        }

        if self.config.remove_empty_nodes && EMPTY_PRUNABLE.contains(&name) && is_empty(element) {
            return true;
        }

        depth > 0
            && self.config.remove_high_link_density
            && LINK_PRUNABLE.contains(&name)
            && link_density(element) > self.config.max_link_density
    }
}

/// A DIV with no text of its own and exactly one element child, itself a DIV.
fn sole_div_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut inner = None;
    for child in element.children() {
        match child.value() {
            Node::Text(text) if !text.trim().is_empty() => return None,
            Node::Element(_) => {
                if inner.is_some() {
                    return None;
                }
                inner = ElementRef::wrap(child);
            }
            _ => {}
        }
    }
    inner.filter(|el| el.value().name() == "div")
}

fn is_empty(element: ElementRef<'_>) -> bool {
    element.text().all(|t| t.trim().is_empty())
        && !element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| MEDIA_TAGS.contains(&el.value().name()))
}

fn link_density(element: ElementRef<'_>) -> f64 {
    let text_length: usize = element.text().map(|t| t.chars().count()).sum();
    if text_length == 0 {
        return 0.0;
    }

    let link_length: usize = element
        .select(&LINK_SELECTOR)
        .flat_map(|link| link.text())
        .map(|t| t.chars().count())
        .sum();

    link_length as f64 / text_length as f64
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
