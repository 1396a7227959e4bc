//! Page-to-Markdown extraction API.
//!
//! The entry point is [`extract`], or [`Extractor`] when the defaults need
//! changing. Each call runs the whole pipeline: fetch, decode, preprocess,
//! parse, select the main content, clean it and render Markdown. Nothing is
//! cached between calls, so the same response always yields the same output.
//!
//! # Example
//!
//! ```no_run
//! use web2md_core::{Extractor, ExtractorConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let markdown = web2md_core::extract("https://example.com/article").await?;
//! println!("{markdown}");
//!
//! let config = ExtractorConfig::builder().min_score(10.0).header(true).build();
//! let article = Extractor::with_config(config).extract_article("https://example.com/article").await?;
//! println!("{:?}", article.title());
//! # Ok(())
//! # }
//! ```

use url::Url;

use crate::article::Article;
use crate::extract::{ExtractConfig, extract_content};
use crate::fetch::{FetchConfig, RawPage, fetch_url};
use crate::markdown::MarkdownConfig;
use crate::parse::Document;
use crate::postprocess::PostProcessConfig;
use crate::preprocess::PreprocessConfig;
use crate::{Result, Web2mdError};

/// Configuration for an [`Extractor`].
///
/// # Example
///
/// ```rust
/// use web2md_core::ExtractorConfig;
///
/// let config = ExtractorConfig::builder()
///     .min_score(10.0)
///     .char_threshold(300)
///     .preserve_images(false)
///     .timeout(10)
///     .build();
/// assert_eq!(config.fetch.timeout, 10);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Minimum score the selected content must reach (default: 5.0).
    pub min_score: f64,

    /// Minimum character count for content; non-semantic candidates need a
    /// tenth of it (default: 500).
    pub char_threshold: usize,

    /// Number of top candidates checked for a shared ancestor (default: 5).
    pub nb_top_candidates: usize,

    /// Maximum candidate elements to score (0 = unlimited, default: 0).
    pub max_elems_to_parse: usize,

    /// Whether to remove unlikely candidates before scoring (default: true).
    pub remove_unlikely: bool,

    /// Whether to preserve class attributes in the content HTML (default: false).
    pub keep_classes: bool,

    /// Whether to keep images (default: true).
    pub preserve_images: bool,

    /// HTTP settings.
    pub fetch: FetchConfig,

    /// Markdown decoration settings.
    pub markdown: MarkdownConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_score: 5.0,
            char_threshold: 500,
            nb_top_candidates: 5,
            max_elems_to_parse: 0,
            remove_unlikely: true,
            keep_classes: false,
            preserve_images: true,
            fetch: FetchConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Creates a new builder for ExtractorConfig.
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }

    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            min_score_threshold: self.min_score,
            max_top_candidates: self.nb_top_candidates,
            char_threshold: self.char_threshold,
            max_elements: self.max_elems_to_parse,
            postprocess: PostProcessConfig {
                strip_images: !self.preserve_images,
                keep_classes: self.keep_classes,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig { remove_unlikely: self.remove_unlikely, ..Default::default() }
    }

    fn markdown_config(&self) -> MarkdownConfig {
        MarkdownConfig { strip_images: self.markdown.strip_images || !self.preserve_images, ..self.markdown.clone() }
    }
}

/// Builder for ExtractorConfig.
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractorConfig::default() }
    }

    /// Sets the minimum score threshold.
    pub fn min_score(mut self, value: f64) -> Self {
        self.config.min_score = value;
        self
    }

    /// Sets the character threshold.
    pub fn char_threshold(mut self, value: usize) -> Self {
        self.config.char_threshold = value;
        self
    }

    /// Sets the number of top candidates.
    pub fn nb_top_candidates(mut self, value: usize) -> Self {
        self.config.nb_top_candidates = value;
        self
    }

    /// Sets the maximum elements to score.
    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.config.max_elems_to_parse = value;
        self
    }

    /// Sets whether to remove unlikely candidates.
    pub fn remove_unlikely(mut self, value: bool) -> Self {
        self.config.remove_unlikely = value;
        self
    }

    /// Sets whether to preserve class attributes in the content HTML.
    pub fn keep_classes(mut self, value: bool) -> Self {
        self.config.keep_classes = value;
        self
    }

    /// Sets whether to keep images.
    pub fn preserve_images(mut self, value: bool) -> Self {
        self.config.preserve_images = value;
        self
    }

    /// Replaces the HTTP settings.
    pub fn fetch(mut self, value: FetchConfig) -> Self {
        self.config.fetch = value;
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets whether to prepend the title/byline/source header.
    pub fn header(mut self, value: bool) -> Self {
        self.config.markdown.header = value;
        self
    }

    /// Sets whether to prepend TOML frontmatter.
    pub fn frontmatter(mut self, value: bool) -> Self {
        self.config.markdown.frontmatter = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl Default for ExtractorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns web pages into Markdown.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Creates an extractor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with a custom configuration.
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Fetches `url` and renders its main content as Markdown.
    ///
    /// # Errors
    ///
    /// A [`Web2mdError`] of kind Fetch, Parse or ContentNotFound. See
    /// [`Web2mdError::kind`].
    pub async fn extract(&self, url: &str) -> Result<String> {
        let article = self.extract_article(url).await?;
        self.render(&article)
    }

    /// Fetches `url` and extracts its main content without rendering it.
    pub async fn extract_article(&self, url: &str) -> Result<Article> {
        let page = fetch_url(url, &self.config.fetch).await?;
        self.article_from_raw(page)
    }

    /// Runs the pipeline after the fetch step on bytes from any source.
    pub fn extract_raw(&self, page: RawPage) -> Result<String> {
        let article = self.article_from_raw(page)?;
        self.render(&article)
    }

    /// Extracts the main content of already-decoded HTML and renders it.
    ///
    /// `url`, when given, resolves relative links and fills the source link.
    ///
    /// # Errors
    ///
    /// [`Web2mdError::InvalidUrl`] if `url` does not parse, otherwise the
    /// same errors as [`Extractor::extract`] minus the fetch failures.
    pub fn extract_html(&self, html: &str, url: Option<&str>) -> Result<String> {
        let base_url =
            url.map(|u| Url::parse(u).map_err(|e| Web2mdError::InvalidUrl(format!("{u}: {e}")))).transpose()?;
        let article = self.article_from_html(html, base_url)?;
        self.render(&article)
    }

    /// Decodes a raw page and extracts its main content.
    pub fn article_from_raw(&self, page: RawPage) -> Result<Article> {
        let base_url = page.url.clone();
        let html = page.decode()?;
        self.article_from_html(&html, base_url)
    }

    /// Extracts the main content and metadata of decoded HTML.
    pub fn article_from_html(&self, html: &str, base_url: Option<Url>) -> Result<Article> {
        let metadata = Document::parse(html)?.with_base_url(base_url.clone()).extract_metadata();

        let doc = Document::parse_with_preprocessing(html, base_url, &self.config.preprocess_config())?;
        let extracted = extract_content(&doc, &self.config.extract_config())?;
        tracing::debug!(
            score = extracted.top_score,
            elements = extracted.element_count,
            bytes = extracted.content.len(),
            "extracted content"
        );

        let source_url = doc.base_url().map(Url::to_string);
        Ok(Article::new(extracted.content, metadata, extracted.top_score, source_url))
    }

    /// Renders an article with this extractor's Markdown settings.
    pub fn render(&self, article: &Article) -> Result<String> {
        article.to_markdown_with_config(&self.config.markdown_config())
    }
}

/// Fetches `url` and returns its main content as Markdown, with defaults.
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), web2md_core::Web2mdError> {
/// let markdown = web2md_core::extract("https://example.com/article").await?;
/// assert!(!markdown.is_empty());
/// # Ok(())
/// # }
/// ```
pub async fn extract(url: &str) -> Result<String> {
    Extractor::new().extract(url).await
}
