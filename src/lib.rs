//! Declarative schema-driven extraction from HTML and JSON documents.
//!
//! A schema is a nested mapping describing, field by field, how to locate
//! and transform pieces of a document; [`Engine::parse`] walks it
//! depth-first and produces an output value isomorphic to the schema:
//! - locators are CSS selectors (markup) or dotted cascade paths (JSON)
//! - `_index` narrows candidate nodes (single pick or slice)
//! - `_attr` / `_joiner` / `_striped` shape the extracted value
//! - `_attr_refine` / `_locator_extract` dispatch named user transforms
//!   from a [`Registry`]

pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod schema;

pub use document::{DocNode, Document};
pub use engine::{Engine, Options, Registry, Resolved};
pub use error::ParseError;
