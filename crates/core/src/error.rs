//! Error types for web2md operations.
//!
//! Every failure of the pipeline is a [`Web2mdError`]. Each variant belongs to
//! exactly one [`ErrorKind`]: the page could not be fetched, the bytes are not
//! markup, or no article content was found. Callers that only care about the
//! category (the CLI maps it to an exit code) use [`Web2mdError::kind`].
//!
//! # Example
//!
//! ```rust
//! use web2md_core::{ErrorKind, Web2mdError};
//!
//! let err = Web2mdError::NotReadable { score: 2.5, threshold: 5.0 };
//! assert_eq!(err.kind(), ErrorKind::ContentNotFound);
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for fetching, parsing, extraction and rendering.
#[derive(Error, Debug)]
pub enum Web2mdError {
    /// HTTP request errors from reqwest.
    ///
    /// Connection refused, DNS failures, TLS errors, redirect loops.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status} returned for {url}")]
    HttpStatus { status: u16, url: String },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or does not use http/https.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The response bytes are not markup (images, archives, PDFs, plain binary).
    #[error("Content is not HTML: {0}")]
    NotMarkup(String),

    /// HTML parsing errors, mostly invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The HTML-to-Markdown converter failed.
    #[error("Failed to render Markdown: {0}")]
    Markdown(String),

    /// Content is not readable (score below threshold).
    ///
    /// The best candidate exists but scores too low to be an article. This is
    /// what navigation pages, search results and link hubs usually produce.
    #[error("Content is not readable (score {score:.1} below threshold {threshold:.1})")]
    NotReadable { score: f64, threshold: f64 },

    /// No content could be extracted from the document.
    ///
    /// Returned when there are no candidates at all, or when the selected
    /// content renders to empty Markdown.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad failure category of a [`Web2mdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The resource could not be retrieved.
    Fetch,
    /// The retrieved bytes could not be interpreted as markup.
    Parse,
    /// No subtree met the relevance threshold.
    ContentNotFound,
    /// Local I/O failed.
    Io,
}

impl ErrorKind {
    /// Process exit code used by the CLI for this category.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Io => 1,
            ErrorKind::Fetch => 3,
            ErrorKind::Parse => 4,
            ErrorKind::ContentNotFound => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Fetch => "fetch error",
            ErrorKind::Parse => "parse error",
            ErrorKind::ContentNotFound => "content not found",
            ErrorKind::Io => "i/o error",
        };
        f.write_str(label)
    }
}

impl Web2mdError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Web2mdError::HttpError(_)
            | Web2mdError::Timeout { .. }
            | Web2mdError::HttpStatus { .. }
            | Web2mdError::InvalidUrl(_)
            | Web2mdError::FileNotFound(_) => ErrorKind::Fetch,
            Web2mdError::NotMarkup(_) | Web2mdError::HtmlParseError(_) | Web2mdError::Markdown(_) => ErrorKind::Parse,
            Web2mdError::NotReadable { .. } | Web2mdError::NoContent => ErrorKind::ContentNotFound,
            Web2mdError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for Web2mdError.
pub type Result<T> = std::result::Result<T, Web2mdError>;
