//! Turn a web page into Markdown.
//!
//! [`extract`] fetches a URL, isolates the article content (dropping
//! navigation, ads and other page chrome) and renders it as Markdown.
//! [`Extractor`] exposes the same pipeline with configuration, and for HTML
//! that did not come from the network.
//!
//! A failed extraction is always one of three kinds, see [`ErrorKind`]: the
//! page could not be fetched, the bytes are not markup, or no content met
//! the relevance threshold. There is no partial output.

pub mod article;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod extractor;
pub mod fetch;
pub mod markdown;
pub mod metadata;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod scoring;

pub use article::Article;
pub use encoding::decode_markup;
pub use error::{ErrorKind, Result, Web2mdError};
#[doc(hidden)]
pub use extract::ExtractConfig;
pub use extract::{ExtractedContent, extract_content};
pub use extractor::{Extractor, ExtractorConfig, ExtractorConfigBuilder, extract};
pub use fetch::{FetchConfig, RawPage, fetch_file, fetch_stdin, fetch_url};
pub use markdown::{MarkdownConfig, convert_to_markdown, slugify};
pub use metadata::Metadata;
pub use parse::{Document, Element};
#[doc(hidden)]
pub use postprocess::PostProcessConfig;
pub use postprocess::postprocess_html;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
#[doc(hidden)]
pub use scoring::{ScoreConfig, ScoreResult, calculate_score, link_density};
