//! HTML parsing and DOM navigation.
//!
//! [`Document`] is the structured content tree of the pipeline: a tolerant
//! HTML5 parse of the decoded page. Malformed markup never fails to parse;
//! the tree builder repairs it the way browsers do.
//!
//! # Example
//!
//! ```rust
//! use web2md_core::Document;
//!
//! let doc = Document::parse("<html><head><title>Hi</title></head><body><p class=\"x\">One</p></body></html>").unwrap();
//! assert_eq!(doc.title(), Some("Hi".to_string()));
//! assert_eq!(doc.select("p.x").unwrap().len(), 1);
//! ```

use scraper::{ElementRef, Html, Selector};
use url::Url;

pub use ego_tree::NodeId;

use crate::preprocess::{self, PreprocessConfig};
use crate::{Result, Web2mdError};

/// A parsed HTML document.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML after running the preprocessing passes.
    ///
    /// `config.base_url` is replaced by `base_url` so that relative links are
    /// resolved against the page the HTML came from.
    pub fn parse_with_preprocessing(html: &str, base_url: Option<Url>, config: &PreprocessConfig) -> Result<Self> {
        let config = PreprocessConfig { base_url: base_url.clone(), ..config.clone() };

        let cleaned = preprocess::preprocess_html(html, &config);
        let html = Html::parse_document(&cleaned);

        Ok(Self { html, base_url })
    }

    /// Sets the base URL used for link resolution and the site name fallback.
    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Gets the base URL used for link resolution.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`Web2mdError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Looks up an element by its tree node id.
    pub fn element(&'_ self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(Element::new)
    }

    /// Gets the text of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Gets the `lang` attribute of the root element.
    pub fn language(&self) -> Option<String> {
        self.html.root_element().value().attr("lang").map(|lang| lang.trim().to_string()).filter(|l| !l.is_empty())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Web2mdError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A single element of a [`Document`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Identity of this element within its document.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the parent element, if the parent is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Iterates over element children, skipping text and comment nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::new)
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }
}
