//! The extracted article: content, metadata and derived metrics.

use scraper::Html;

use crate::Result;
use crate::markdown::{MarkdownConfig, convert_to_markdown};
use crate::metadata::{Metadata, count_words, reading_time};

/// The complete result of extracting one page.
#[derive(Debug, Clone)]
pub struct Article {
    /// Extracted readable content as clean HTML.
    pub content: String,

    /// Plain text of the content, whitespace collapsed.
    pub text_content: String,

    /// Page metadata. Word count and reading time describe the content.
    pub metadata: Metadata,

    /// Length of the plain text in characters.
    pub length: usize,

    /// Word count of content.
    pub word_count: usize,

    /// Estimated reading time in minutes.
    pub reading_time: f64,

    /// Score of the selected content.
    pub score: f64,

    /// Source URL if known.
    pub source_url: Option<String>,
}

impl Article {
    /// Creates a new Article, deriving text, length, word count and reading time from `content`.
    pub fn new(content: String, metadata: Metadata, score: f64, source_url: Option<String>) -> Self {
        let text_content = html_to_text(&content);
        let length = text_content.chars().count();
        let word_count = count_words(&text_content);
        let reading_time = reading_time(word_count);
        let metadata = metadata.with_text_stats(&text_content);

        Self { content, text_content, metadata, length, word_count, reading_time, score, source_url }
    }

    /// Title from metadata, if any.
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    /// Renders the content as bare Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        self.to_markdown_with_config(&MarkdownConfig::default())
    }

    /// Renders the content as Markdown with header/frontmatter as configured.
    pub fn to_markdown_with_config(&self, config: &MarkdownConfig) -> Result<String> {
        convert_to_markdown(&self.content, &self.metadata, self.source_url.as_deref(), config)
    }
}

fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
