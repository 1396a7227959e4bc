//! Article metadata gathered from the page around the content.
//!
//! Every field is looked up through a chain of sources, most structured
//! first: JSON-LD, then Open Graph/Twitter/Dublin Core `<meta>` tags, then
//! the markup itself. Metadata is read from the page as fetched, before
//! preprocessing strips the `<script>` blocks that carry JSON-LD.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::Document;

/// Words per minute used for reading time estimates
pub const WORDS_PER_MINUTE: f64 = 200.0;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[\w'-]+\b").expect("valid regex"));

/// Represents all extracted metadata from a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub language: Option<String>,
    pub word_count: Option<usize>,
    pub reading_time_minutes: Option<f64>,
}

impl Metadata {
    /// Replaces the word count and reading time with figures for `text`.
    pub fn with_text_stats(mut self, text: &str) -> Self {
        let words = count_words(text);
        self.word_count = Some(words);
        self.reading_time_minutes = Some(reading_time(words));
        self
    }
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. JSON-LD `headline`
    /// 2. `og:title`, `twitter:title`, `title`, `DC.title` meta tags
    /// 3. `<title>` element
    /// 4. First `<h1>` element
    pub fn extract_title(&self) -> Option<String> {
        self.json_ld_string(&["headline"])
            .or_else(|| self.meta_content(&["og:title", "twitter:title", "title", "DC.title"]))
            .or_else(|| self.title())
            .or_else(|| self.first_text("h1", usize::MAX))
    }

    /// Extract author with priority fallback:
    /// 1. JSON-LD `author` (string, object or array)
    /// 2. `author`, `article:author`, `DC.creator` meta tags
    /// 3. `rel="author"` or `itemprop="author"` element text
    /// 4. Short text of an element whose class mentions an author or byline
    pub fn extract_author(&self) -> Option<String> {
        self.json_ld_objects()
            .iter()
            .find_map(|obj| obj.get("author").and_then(author_name))
            .or_else(|| self.meta_content(&["author", "article:author", "DC.creator"]))
            .or_else(|| self.first_text(r#"[rel="author"]"#, usize::MAX))
            .or_else(|| self.first_text(r#"[itemprop="author"]"#, usize::MAX))
            .or_else(|| self.first_text(r#"[class*="byline"], [class*="author"]"#, 100))
    }

    /// Extract date with priority fallback:
    /// 1. JSON-LD `datePublished`
    /// 2. `article:published_time` meta tag
    /// 3. `<time datetime="">` element
    /// 4. `date`, `DC.date` meta tags
    pub fn extract_date(&self) -> Option<String> {
        self.json_ld_string(&["datePublished"])
            .or_else(|| self.meta_content(&["article:published_time"]))
            .or_else(|| {
                self.select("time[datetime]")
                    .ok()?
                    .first()
                    .and_then(|el| el.attr("datetime"))
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
            })
            .or_else(|| self.meta_content(&["date", "DC.date"]))
    }

    /// Extract excerpt with priority fallback:
    /// 1. JSON-LD `description`
    /// 2. `og:description`, `description` meta tags
    /// 3. First paragraph longer than 50 characters, cut at 300
    pub fn extract_excerpt(&self) -> Option<String> {
        self.json_ld_string(&["description"])
            .or_else(|| self.meta_content(&["og:description", "description"]))
            .or_else(|| {
                let paragraphs = self.select("p").ok()?;
                paragraphs.iter().take(5).find_map(|p| {
                    let text = p.text();
                    let text = text.trim();
                    match text.chars().count() {
                        0..=50 => None,
                        301.. => Some(format!("{}...", text.chars().take(300).collect::<String>())),
                        _ => Some(text.to_string()),
                    }
                })
            })
    }

    /// Extract site name with priority fallback:
    /// 1. JSON-LD `publisher.name`
    /// 2. `og:site_name` meta tag
    /// 3. Domain of the base URL
    pub fn extract_site_name(&self) -> Option<String> {
        self.json_ld_objects()
            .iter()
            .find_map(|obj| obj.get("publisher")?.get("name")?.as_str().map(str::to_string))
            .or_else(|| self.meta_content(&["og:site_name"]))
            .or_else(|| self.base_url()?.domain().map(str::to_string))
    }

    /// Extract all metadata at once
    ///
    /// Word count and reading time describe the whole page here. The
    /// extractor replaces them with figures for the extracted content.
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            title: self.extract_title(),
            author: self.extract_author(),
            date: self.extract_date(),
            excerpt: self.extract_excerpt(),
            site_name: self.extract_site_name(),
            language: self.language(),
            word_count: None,
            reading_time_minutes: None,
        }
        .with_text_stats(&self.text_content())
    }

    /// Content of the first `<meta>` whose `name` or `property` is one of `keys`, in key order.
    fn meta_content(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            let selector = format!(r#"meta[name="{key}"], meta[property="{key}"]"#);
            self.select(&selector)
                .ok()?
                .iter()
                .filter_map(|el| el.attr("content"))
                .map(str::trim)
                .find(|content| !content.is_empty())
                .map(str::to_string)
        })
    }

    /// Trimmed text of the first matching element with text shorter than `max_len` chars.
    fn first_text(&self, selector: &str, max_len: usize) -> Option<String> {
        self.select(selector).ok()?.iter().take(3).find_map(|el| {
            let text = el.text();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty() && text.chars().count() < max_len).then_some(text)
        })
    }

    /// Every JSON object found in `application/ld+json` scripts, with
    /// top-level arrays and `@graph` lists flattened.
    fn json_ld_objects(&self) -> Vec<Value> {
        let Ok(scripts) = self.select(r#"script[type="application/ld+json"]"#) else {
            return Vec::new();
        };

        let mut objects = Vec::new();
        for script in scripts {
            let Ok(value) = serde_json::from_str::<Value>(script.text().trim()) else {
                continue;
            };
            flatten_json_ld(value, &mut objects);
        }
        objects
    }

    fn json_ld_string(&self, keys: &[&str]) -> Option<String> {
        let objects = self.json_ld_objects();
        keys.iter().find_map(|key| {
            objects
                .iter()
                .filter_map(|obj| obj.get(*key)?.as_str())
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
    }
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_json_ld(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// Author name from a JSON-LD `author` value: a string, an object with a
/// `name`, or an array of either (first wins).
fn author_name(author: &Value) -> Option<String> {
    match author {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Object(obj) => obj.get("name").and_then(author_name),
        Value::Array(items) => items.iter().find_map(author_name),
        _ => None,
    }
}

/// Count words in text, treating apostrophes and hyphens as part of a word
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Reading time in minutes for a word count
pub fn reading_time(words: usize) -> f64 {
    words as f64 / WORDS_PER_MINUTE
}
