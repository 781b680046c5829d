//! Final HTML document composition.

use ssr_core::{DocumentMeta, DocumentSettings};

use crate::assets::{join_base_path, resolve_href, stylesheet_for_script};
use crate::escape::{escape_attr, escape_json_for_script};
use crate::head::{normalize_head_tags, HeadContent};

/// Title used when neither the route nor the app provides one.
pub const DEFAULT_TITLE: &str = "App";

/// Composes the HTML document around rendered markup.
///
/// Asset paths are resolved once at construction.
#[derive(Debug, Clone)]
pub struct DocumentComposer {
    settings: DocumentSettings,
    app_name: Option<String>,
    script: String,
    stylesheets: Vec<String>,
}

impl DocumentComposer {
    /// Create a composer from document settings and the app name.
    pub fn new(settings: DocumentSettings, app_name: Option<String>) -> Self {
        let script = join_base_path(&settings.base_path, &settings.script);

        let mut stylesheets = vec![stylesheet_for_script(&script)];
        stylesheets.extend(
            settings
                .stylesheets
                .iter()
                .filter(|href| !href.trim().is_empty())
                .map(|href| resolve_href(&settings.base_path, href)),
        );

        Self {
            settings,
            app_name: app_name.filter(|name| !name.is_empty()),
            script,
            stylesheets,
        }
    }

    /// Resolved script bundle path.
    pub fn script_path(&self) -> &str {
        &self.script
    }

    /// Resolved stylesheet paths, derived one first.
    pub fn stylesheet_paths(&self) -> &[String] {
        &self.stylesheets
    }

    /// Document settings.
    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    /// Title for a route: route override, then app name, then the default.
    pub fn title<'a>(&'a self, meta: Option<&'a DocumentMeta>) -> &'a str {
        meta.and_then(|m| m.title.as_deref())
            .filter(|title| !title.is_empty())
            .or(self.app_name.as_deref())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Head content for a route.
    pub fn head(&self, meta: Option<&DocumentMeta>) -> HeadContent {
        HeadContent {
            title: Some(self.title(meta).to_string()),
            tags: meta.map(normalize_head_tags).unwrap_or_default(),
            stylesheets: self.stylesheets.clone(),
        }
    }

    /// Render everything up to and including the root element's opening tag.
    pub fn render_opening(&self, meta: Option<&DocumentMeta>) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str(&format!(
            "<html lang=\"{}\">\n<head>\n",
            escape_attr(&self.settings.lang)
        ));
        html.push_str(&self.head(meta).render());
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<div id=\"{}\">",
            escape_attr(&self.settings.root_id)
        ));

        html
    }

    /// Render the root element's closing tag, the state script and the bundle.
    pub fn render_closing(&self, serialized_state: &str, serialized_query_cache: &str) -> String {
        let mut html = String::new();

        html.push_str("</div>\n<script>");
        html.push_str(&global_assignment(
            &self.settings.state_global,
            serialized_state,
        ));
        html.push_str(&global_assignment(
            &self.settings.query_state_global,
            serialized_query_cache,
        ));
        html.push_str("</script>\n");
        html.push_str(&format!(
            "<script src=\"{}\"></script>\n",
            escape_attr(&self.script)
        ));
        html.push_str("</body>\n</html>\n");

        html
    }

    /// Compose the full document.
    ///
    /// `markup` is inserted verbatim. The serialized blobs must be JSON.
    pub fn compose(
        &self,
        markup: &str,
        serialized_state: &str,
        serialized_query_cache: &str,
        meta: Option<&DocumentMeta>,
    ) -> String {
        let mut html = self.render_opening(meta);
        html.push_str(markup);
        html.push_str(&self.render_closing(serialized_state, serialized_query_cache));
        html
    }
}

fn global_assignment(name: &str, json: &str) -> String {
    let json = if json.trim().is_empty() { "null" } else { json };
    let name = serde_json::Value::from(name).to_string();
    format!(
        "window[{}]={};",
        escape_json_for_script(&name),
        escape_json_for_script(json)
    )
}
