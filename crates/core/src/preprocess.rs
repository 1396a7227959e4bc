//! Cleanup passes run on raw HTML before it is parsed into a [`Document`].
//!
//! The passes are streaming rewrites over the markup. A pass that fails to
//! rewrite (lol_html rejects some pathological input) leaves the HTML as it
//! was; preprocessing only ever improves extraction, it never blocks it.
//!
//! [`Document`]: crate::Document

use std::sync::LazyLock;

use lol_html::{RewriteStrSettings, element, rewrite_str};
use regex::Regex;
use url::Url;

/// Class/id fragments that mark page chrome rather than article content.
pub(crate) static UNLIKELY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|consent|cookie|disqus|extra|foot|header|menu|modal|newsletter|related|remark|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|subscribe|ad-break|agegate|pagination|pager|popup)",
    )
    .expect("valid regex")
});

/// Class/id fragments that mark article content.
pub(crate) static POSITIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|tweet)")
        .expect("valid regex")
});

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static HIDDEN_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid regex"));

/// Tags that never hold readable text.
const NON_CONTENT_TAGS: &str = "script, style, noscript, iframe, svg, canvas, template, object, embed";

/// Tags exempt from the unlikely-candidate pass.
const ALWAYS_KEEP: &[&str] = &["html", "body", "article", "main", "a"];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Remove script, style, noscript, iframe, svg, canvas and similar tags
    pub remove_non_content: bool,
    /// Remove HTML comments
    pub remove_comments: bool,
    /// Remove elements whose class/id marks them as page chrome
    pub remove_unlikely: bool,
    /// Remove elements hidden with inline styles or the `hidden` attribute
    pub remove_hidden: bool,
    /// Base URL for converting relative URLs to absolute
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_non_content: true, remove_comments: true, remove_unlikely: true, remove_hidden: true, base_url: None }
    }
}

/// Preprocess HTML by removing unwanted elements and resolving links.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = if config.remove_comments { remove_comments(html) } else { html.to_string() };

    if config.remove_non_content {
        processed = remove_non_content_tags(&processed);
    }

    if config.remove_unlikely {
        processed = remove_unlikely_candidates(&processed);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if let Some(base_url) = &config.base_url {
        processed = convert_relative_urls(&processed, base_url);
    }

    processed
}

/// Returns `true` if a class or id value names page chrome and nothing that
/// looks like content.
pub(crate) fn is_unlikely(value: &str) -> bool {
    UNLIKELY_RE.is_match(value) && !POSITIVE_RE.is_match(value)
}

fn remove_comments(html: &str) -> String {
    COMMENT_RE.replace_all(html, "").into_owned()
}

fn remove_non_content_tags(html: &str) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![element!(NON_CONTENT_TAGS, |el| {
            el.remove();
            Ok(())
        })],
        ..RewriteStrSettings::new()
    };

    rewrite_str(html, settings).unwrap_or_else(|_| html.to_string())
}

fn remove_unlikely_candidates(html: &str) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![element!("*", |el| {
            if ALWAYS_KEEP.contains(&el.tag_name().as_str()) {
                return Ok(());
            }

            let id_unlikely = el.get_attribute("id").is_some_and(|id| is_unlikely(&id));
            let class_unlikely = el.get_attribute("class").is_some_and(|class| is_unlikely(&class));

            if id_unlikely || class_unlikely {
                el.remove();
            }
            Ok(())
        })],
        ..RewriteStrSettings::new()
    };

    rewrite_str(html, settings).unwrap_or_else(|_| html.to_string())
}

fn remove_hidden_elements(html: &str) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![element!("*", |el| {
            let hidden_style = el.get_attribute("style").is_some_and(|style| HIDDEN_STYLE_RE.is_match(&style));
            let aria_hidden = el.get_attribute("aria-hidden").is_some_and(|v| v.eq_ignore_ascii_case("true"));

            if hidden_style || aria_hidden || el.has_attribute("hidden") {
                el.remove();
            }
            Ok(())
        })],
        ..RewriteStrSettings::new()
    };

    rewrite_str(html, settings).unwrap_or_else(|_| html.to_string())
}

/// Resolves a relative reference against `base_url`.
///
/// Absolute values are left exactly as written; joining them would
/// normalize `https://x` into `https://x/`.
fn resolve(base_url: &Url, value: &str) -> Option<Url> {
    if Url::parse(value).is_ok() {
        return None;
    }
    base_url.join(value).ok()
}

/// Convert relative `href` and `src` URLs to absolute URLs.
pub fn convert_relative_urls(html: &str, base_url: &Url) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![
            element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href")
                    && !href.starts_with('#')
                    && let Some(absolute) = resolve(base_url, &href)
                {
                    el.set_attribute("href", absolute.as_str())?;
                }
                Ok(())
            }),
            element!("img[src]", |el| {
                if let Some(src) = el.get_attribute("src")
                    && let Some(absolute) = resolve(base_url, &src)
                {
                    el.set_attribute("src", absolute.as_str())?;
                }
                Ok(())
            }),
        ],
        ..RewriteStrSettings::new()
    };

    rewrite_str(html, settings).unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_non_content_tags() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <canvas id="chart"></canvas>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = remove_non_content_tags(html);
        assert!(!result.contains("alert"));
        assert!(!result.contains("color:red"));
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("example.com"));
        assert!(!result.contains("rect"));
        assert!(!result.contains("chart"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_absolute_urls_left_untouched() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = r#"<p><a href="https://x">x</a> <a href="mailto:a@b.c">mail</a> <img src="https://cdn.example.com/a.png"></p>"#;

        let result = convert_relative_urls(html, &base);
        assert!(result.contains(r#"href="https://x""#));
        assert!(result.contains(r#"href="mailto:a@b.c""#));
        assert!(result.contains(r#"src="https://cdn.example.com/a.png""#));
    }

    #[test]
    fn test_relative_urls_resolved() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = r##"<p><a href="../about">About</a> <a href="#top">Top</a> <img src="img/a.png"></p>"##;

        let result = convert_relative_urls(html, &base);
        assert!(result.contains(r#"href="https://example.com/about""#));
        assert!(result.contains(r##"href="#top""##));
        assert!(result.contains(r#"src="https://example.com/blog/img/a.png""#));
    }

    #[test]
    fn test_remove_comments_multiline() {
        let html = "<body><!-- one\n two --><p>Visible content</p><!--[if IE]><p>IE</p><![endif]--></body>";

        let result = remove_comments(html);
        assert!(!result.contains("<!--"));
        assert!(!result.contains("IE"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_remove_unlikely_candidates() {
        let html = r#"
            <html>
                <body class="home">
                    <div id="sidebar">Sidebar content</div>
                    <div id="main-content">Main content</div>
                    <div class="banner-ad">Ad</div>
                    <div class="cookie-consent">We use cookies</div>
                    <div class="article">Article content</div>
                    <article class="comment-thread">Kept because articles are exempt</article>
                </body>
            </html>
        "#;

        let result = remove_unlikely_candidates(html);
        assert!(!result.contains("Sidebar content"));
        assert!(!result.contains("banner-ad"));
        assert!(!result.contains("We use cookies"));
        assert!(result.contains("Main content"));
        assert!(result.contains("Article content"));
        assert!(result.contains("Kept because articles are exempt"));
    }

    #[test]
    fn test_positive_pattern_protects_element() {
        assert!(is_unlikely("sidebar"));
        assert!(!is_unlikely("post-footer-content"));
        assert!(!is_unlikely("wrapper"));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <div style="display: none">Invisible</div>
            <div style="visibility:hidden">Also invisible</div>
            <div hidden>Hidden attribute</div>
            <span aria-hidden="true">icon</span>
            <p style="color: red">Visible</p>
        "#;

        let result = remove_hidden_elements(html);
        assert!(!result.contains("Invisible"));
        assert!(!result.contains("Also invisible"));
        assert!(!result.contains("Hidden attribute"));
        assert!(!result.contains("icon"));
        assert!(result.contains("Visible"));
    }

    #[test]
    fn test_convert_relative_urls() {
        let base = Url::parse("https://example.com/blog/post.html").unwrap();
        let html = r##"<a href="/about">About</a><a href="#top">Top</a><img src="img/photo.jpg">"##;

        let result = convert_relative_urls(html, &base);
        assert!(result.contains(r#"href="https://example.com/about""#));
        assert!(result.contains(r##"href="#top""##));
        assert!(result.contains(r#"src="https://example.com/blog/img/photo.jpg""#));
    }

    #[test]
    fn test_preprocess_full_pipeline() {
        let html = r#"<body><script>x()</script><nav class="menu">Menu</nav><article><p>Story</p></article></body>"#;
        let config = PreprocessConfig::default();
        let result = preprocess_html(html, &config);

        assert!(!result.contains("x()"));
        assert!(!result.contains("Menu"));
        assert!(result.contains("Story"));
    }

    #[test]
    fn test_preprocess_config_default() {
        let config = PreprocessConfig::default();
        assert!(config.remove_non_content);
        assert!(config.remove_comments);
        assert!(config.remove_unlikely);
        assert!(config.remove_hidden);
        assert!(config.base_url.is_none());
    }
}
