//! Markdown rendering of extracted content.

use std::sync::LazyLock;

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use regex::Regex;

use crate::metadata::Metadata;
use crate::{Result, Web2mdError};

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static TRAILING_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid regex"));

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Prepend a `# title` heading, byline and `[Original](url)` link
    pub header: bool,
    /// Prepend TOML frontmatter with metadata
    pub frontmatter: bool,
    /// Strip images from output
    pub strip_images: bool,
}

/// Convert extracted HTML to Markdown, decorated as configured
///
/// # Errors
///
/// [`Web2mdError::Markdown`] if the converter fails, and
/// [`Web2mdError::NoContent`] if the content renders to nothing.
pub fn convert_to_markdown(
    html: &str, metadata: &Metadata, source_url: Option<&str>, config: &MarkdownConfig,
) -> Result<String> {
    let html = if config.strip_images { strip_images(html) } else { html.to_string() };
    let mut body = html_to_markdown(&html)?;

    if body.is_empty() {
        return Err(Web2mdError::NoContent);
    }

    let mut output = String::new();

    if config.frontmatter {
        output.push_str(&generate_frontmatter(metadata, source_url));
        output.push('\n');
    }

    if config.header {
        if let Some(title) = &metadata.title {
            body = strip_leading_title(&body, title);
        }
        output.push_str(&generate_header(metadata, source_url));
    }

    output.push_str(&body);
    output.push('\n');

    tracing::debug!(bytes = output.len(), "rendered markdown");
    Ok(output)
}

/// Convert an HTML fragment to trimmed Markdown
///
/// ATX headings, `-` bullets and fenced code blocks. Runs of blank lines are
/// collapsed to one and trailing spaces are dropped.
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "iframe", "form", "button"])
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .build();

    let markdown = converter.convert(html).map_err(|e| Web2mdError::Markdown(e.to_string()))?;
    let markdown = TRAILING_SPACE_RE.replace_all(&markdown, "");
    let markdown = BLANK_LINES_RE.replace_all(&markdown, "\n\n");

    Ok(markdown.trim().to_string())
}

/// Title heading, byline and source link, followed by a blank line
fn generate_header(metadata: &Metadata, source_url: Option<&str>) -> String {
    let mut header = String::new();

    if let Some(title) = &metadata.title {
        header.push_str(&format!("# {}\n\n", title));
    }

    let mut byline = false;
    if let Some(author) = &metadata.author {
        header.push_str(&format!("Author: {}\n", author));
        byline = true;
    }
    if let Some(date) = &metadata.date {
        header.push_str(&format!("Publish Date: {}\n", date));
        byline = true;
    }
    if byline {
        header.push('\n');
    }

    if let Some(url) = source_url {
        header.push_str(&format!("[Original]({})\n\n", url));
    }

    header
}

/// Drops a first line that repeats the header's `# title`
fn strip_leading_title(body: &str, title: &str) -> String {
    let heading = format!("# {}", title.trim());
    match body.split_once('\n') {
        Some((first, rest)) if first.trim() == heading => rest.trim_start().to_string(),
        None if body.trim() == heading => String::new(),
        _ => body.to_string(),
    }
}

/// Generate TOML frontmatter from metadata
fn generate_frontmatter(metadata: &Metadata, source_url: Option<&str>) -> String {
    let mut frontmatter = String::from("+++");

    let strings = [
        ("title", metadata.title.as_deref()),
        ("author", metadata.author.as_deref()),
        ("date", metadata.date.as_deref()),
        ("site", metadata.site_name.as_deref()),
        ("language", metadata.language.as_deref()),
        ("source", source_url),
    ];
    for (key, value) in strings {
        if let Some(value) = value {
            frontmatter.push_str(&format!("\n{} = {}", key, toml_escape_string(value)));
        }
    }

    if let Some(word_count) = metadata.word_count {
        frontmatter.push_str(&format!("\nword_count = {}", word_count));
    }

    if let Some(reading_time) = metadata.reading_time_minutes {
        frontmatter.push_str(&format!("\nreading_time_minutes = {}", reading_time.ceil() as u64));
    }

    frontmatter.push_str("\n+++\n");
    frontmatter
}

/// Quote a string as a TOML basic string
fn toml_escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    escaped.push('"');
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

fn strip_images(html: &str) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![element!("img, picture", |el| {
            el.remove();
            Ok(())
        })],
        ..RewriteStrSettings::new()
    };

    rewrite_str(html, settings).unwrap_or_else(|_| html.to_string())
}

/// Filename-safe form of a title
///
/// Lowercase, spaces become `-`, anything outside `[a-z0-9-]` is dropped
/// and runs of `-` collapse. An empty result becomes `article`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { "article".to_string() } else { slug.to_string() }
}
