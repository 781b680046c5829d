//! HTML document composition for server-rendered routes.
//!
//! This crate provides:
//! - `DocumentComposer` - Wraps rendered markup in the HTML shell
//! - `HeadContent` / `HeadTag` - Normalized head elements
//! - Escaping helpers for text, attributes and inline JSON
//! - Asset path helpers for the script bundle and stylesheets
//!
//! # Example
//!
//! ```ignore
//! use ssr_core::DocumentSettings;
//! use ssr_document::DocumentComposer;
//!
//! let composer = DocumentComposer::new(DocumentSettings::default(), Some("Workspace".into()));
//! let html = composer.compose("<p>hi</p>", r#"{"user":1}"#, "{}", route.document_meta());
//! ```

mod assets;
mod composer;
mod escape;
mod head;

pub use assets::*;
pub use composer::*;
pub use escape::*;
pub use head::*;
