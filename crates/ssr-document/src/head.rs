//! Head content for the document shell.

use serde_json::Value;
use ssr_core::{DocumentMeta, RawHeadAttrs};

use crate::escape::{escape_attr, escape_html};

/// Kind of head element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadTagKind {
    /// `<meta>`
    Meta,
    /// `<link>`
    Link,
}

impl HeadTagKind {
    fn element(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Link => "link",
        }
    }
}

/// A normalized void head element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTag {
    /// Element kind.
    pub kind: HeadTagKind,
    /// Attributes in key order.
    pub attrs: Vec<(String, String)>,
}

impl HeadTag {
    /// Normalize raw per-route attributes.
    ///
    /// Only non-empty string values under valid attribute names survive.
    /// Returns `None` when nothing survives.
    pub fn from_raw(kind: HeadTagKind, raw: &RawHeadAttrs) -> Option<Self> {
        let attrs: Vec<(String, String)> = raw
            .iter()
            .filter(|(key, _)| is_attr_name(key))
            .filter_map(|(key, value)| match value {
                Value::String(s) if !s.is_empty() => Some((key.clone(), s.clone())),
                _ => None,
            })
            .collect();

        (!attrs.is_empty()).then_some(Self { kind, attrs })
    }

    /// Render as HTML with escaped attribute values.
    pub fn render(&self) -> String {
        let mut html = format!("<{}", self.kind.element());
        for (key, value) in &self.attrs {
            html.push_str(&format!(r#" {}="{}""#, escape_attr(key), escape_attr(value)));
        }
        html.push('>');
        html
    }
}

/// A non-empty name that cannot break out of the attribute list.
fn is_attr_name(key: &str) -> bool {
    !key.is_empty()
        && !key.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '=' | '/' | '"' | '\'' | '<' | '>')
        })
}

/// Normalize every meta and link definition of a route.
pub fn normalize_head_tags(meta: &DocumentMeta) -> Vec<HeadTag> {
    let metas = meta
        .meta
        .iter()
        .filter_map(|raw| HeadTag::from_raw(HeadTagKind::Meta, raw));
    let links = meta
        .links
        .iter()
        .filter_map(|raw| HeadTag::from_raw(HeadTagKind::Link, raw));
    metas.chain(links).collect()
}

/// Head content for the shell.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Route meta and link tags.
    pub tags: Vec<HeadTag>,
    /// Stylesheet hrefs.
    pub stylesheets: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: HeadTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a stylesheet link.
    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheets.push(href.into());
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::new();

        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }

        for tag in &self.tags {
            html.push_str(&tag.render());
            html.push('\n');
        }

        for href in &self.stylesheets {
            html.push_str(&format!(
                r#"<link rel="stylesheet" href="{}">"#,
                escape_attr(href)
            ));
            html.push('\n');
        }

        html
    }
}
