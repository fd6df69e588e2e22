//! The extraction engine: recursive descent over a schema tree.
//!
//! For each schema field the engine resolves the field's locator against
//! the current scope node, narrows the candidates, and either extracts a
//! value (leaves) or recurses with the resolved node(s) as the new scope
//! (branches). The output mapping mirrors the schema's shape and key order.

mod extract;
mod refine;
mod resolver;

pub use refine::{
    absolutize_url, digits, keep_allowed_chars, last_non_empty_line, metric_number,
    metric_number_int, sanitize_name, HookFn, RefineFn, Registry,
};
pub use resolver::Resolved;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::document::{DocNode, Document};
use crate::error::ParseError;
use crate::schema;

/// Engine-wide mode flags.
#[derive(Clone, Debug)]
pub struct Options {
    /// Fail fast on any error instead of logging and degrading. Intended
    /// for validation runs against fixed sample documents; in strict mode
    /// a branch locator matching nothing is also an error.
    pub strict: bool,
    /// When non-empty (and `strict` is set), only these top-level fields
    /// are processed, which is useful for partial test runs.
    pub allowed_keys: Vec<String>,
    /// Fallback for `_index` when a field omits it. `Some(0)` suits markup
    /// schemas ("first match"); JSON schemas usually want `None` ("all").
    pub default_index: Option<i64>,
    /// Path separator for JSON cascade locators.
    pub cascade_sep: char,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            strict: false,
            allowed_keys: Vec::new(),
            default_index: Some(0),
            cascade_sep: '.',
        }
    }
}

/// A reusable extraction engine: a refinement registry plus mode flags.
/// Holds no per-document state; `parse` builds and returns a fresh output
/// value each call, so one engine can serve many documents.
#[derive(Debug)]
pub struct Engine {
    pub(crate) registry: Registry,
    pub(crate) options: Options,
}

impl Engine {
    pub fn new(registry: Registry) -> Engine {
        Engine::with_options(registry, Options::default())
    }

    pub fn with_options(registry: Registry, options: Options) -> Engine {
        Engine { registry, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run the schema against a document, producing a nested mapping.
    ///
    /// Top-level fields must be mappings; reserved words, plain values, and
    /// (in strict mode) fields outside the allow-list are skipped with a
    /// diagnostic. In lenient mode every failure below this point degrades
    /// to "nothing found" for its field and the siblings carry on.
    pub fn parse(&self, doc: &Document, schema: &Value) -> Result<Value, ParseError> {
        let Some(fields) = schema.as_object() else {
            return Err(ParseError::Config("schema root must be a mapping".into()));
        };

        let root = doc.root();
        let mut out = Map::new();
        for (key, config) in fields {
            // double-underscore sections are schema metadata, not fields
            if key.starts_with("__") {
                continue;
            }
            if schema::is_reserved(key) {
                warn!(key, "reserved word used as a top-level field, skipping");
                continue;
            }
            if !config.is_object() {
                warn!(key, "plain value at top level, nest it under a branch; skipping");
                continue;
            }
            if self.options.strict
                && !self.options.allowed_keys.is_empty()
                && !self.options.allowed_keys.iter().any(|k| k == key)
            {
                debug!(key, "outside allow-list, skipping");
                continue;
            }
            self.parse_field(key, config, root, &mut out)?;
        }
        Ok(Value::Object(out))
    }

    /// One (key, schema node, scope node) step: leaves extract a value,
    /// branches resolve and recurse per resolved node.
    fn parse_field(
        &self,
        key: &str,
        config: &Value,
        scope: DocNode<'_>,
        out: &mut Map<String, Value>,
    ) -> Result<(), ParseError> {
        if schema::is_leaf(config) {
            let value = self.leaf_value(key, config, scope)?;
            out.insert(key.to_string(), value);
            return Ok(());
        }

        match resolver::resolve_nodes(self, key, config, scope)? {
            Resolved::None => {
                if self.options.strict {
                    return Err(ParseError::NoNodes(format!(
                        "branch `{key}` matched no nodes"
                    )));
                }
                debug!(key, "branch matched no nodes, omitting");
            }
            Resolved::One(node) => {
                let sub = self.parse_children(config, node)?;
                out.insert(key.to_string(), Value::Object(sub));
            }
            Resolved::Many(nodes) => {
                let mut items = Vec::with_capacity(nodes.len());
                for node in nodes {
                    items.push(Value::Object(self.parse_children(config, node)?));
                }
                out.insert(key.to_string(), Value::Array(items));
            }
        }
        Ok(())
    }

    fn parse_children(
        &self,
        config: &Value,
        scope: DocNode<'_>,
    ) -> Result<Map<String, Value>, ParseError> {
        let mut sub = Map::new();
        for (child_key, child_config) in schema::child_fields(config) {
            self.parse_field(child_key, child_config, scope, &mut sub)?;
        }
        Ok(sub)
    }

    /// Leaves always produce a value: `""` when nothing is found, a
    /// sequence when the locator resolves to a node list.
    fn leaf_value(
        &self,
        key: &str,
        config: &Value,
        scope: DocNode<'_>,
    ) -> Result<Value, ParseError> {
        match resolver::resolve_nodes(self, key, config, scope)? {
            Resolved::None => {
                debug!(key, "leaf found nothing, emitting empty string");
                Ok(Value::String(String::new()))
            }
            Resolved::One(node) => extract::extract_value(self, key, config, node),
            Resolved::Many(nodes) => nodes
                .into_iter()
                .map(|node| extract::extract_value(self, key, config, node))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}
