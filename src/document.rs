//! Document adapter over the two supported document shapes.
//!
//! A [`Document`] owns the parsed input (an HTML tree via scraper, or a JSON
//! value); a [`DocNode`] is a borrowed position inside it, the scope against
//! which schema locators resolve. Markup locators are CSS selectors; JSON
//! locators are flat keys or dotted cascade paths.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::ParseError;

/// A parsed input document.
pub enum Document {
    Html(Html),
    Json(Value),
}

impl Document {
    /// Parse raw HTML. scraper always builds a tree, so this cannot fail.
    pub fn html(raw: &str) -> Document {
        Document::Html(Html::parse_document(raw))
    }

    /// Parse a JSON document. The root must be an object or an array;
    /// falsy entries of a root array are dropped at load.
    pub fn json(raw: &str) -> Result<Document, ParseError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ParseError::Document(format!("invalid JSON document: {e}")))?;
        match value {
            Value::Object(_) => Ok(Document::Json(value)),
            Value::Array(items) => Ok(Document::Json(Value::Array(
                items.into_iter().filter(|v| !is_falsy(v)).collect(),
            ))),
            other => Err(ParseError::Document(format!(
                "JSON document root must be an object or array, got {other}"
            ))),
        }
    }

    /// The root scope node.
    pub fn root(&self) -> DocNode<'_> {
        match self {
            Document::Html(html) => DocNode::Html(html.root_element()),
            Document::Json(value) => DocNode::Json(value),
        }
    }
}

/// A position in a document: a markup element or a borrowed JSON value.
#[derive(Clone, Copy, Debug)]
pub enum DocNode<'a> {
    Html(ElementRef<'a>),
    Json(&'a Value),
}

impl<'a> DocNode<'a> {
    /// Select candidate nodes under this one. Markup: all elements matching
    /// the CSS selector, in document order. JSON: cascade lookup of the
    /// locator; a matched array expands into its elements, anything else is
    /// a single candidate.
    pub fn select(&self, locator: &str, cascade_sep: char) -> Result<Vec<DocNode<'a>>, ParseError> {
        match self {
            DocNode::Html(el) => {
                let selector = Selector::parse(locator).map_err(|e| {
                    ParseError::Document(format!("invalid selector `{locator}`: {e}"))
                })?;
                Ok(el.select(&selector).map(DocNode::Html).collect())
            }
            DocNode::Json(value) => Ok(match cascade_get(value, locator, cascade_sep) {
                Some(Value::Array(items)) => items.iter().map(DocNode::Json).collect(),
                Some(found) => vec![DocNode::Json(found)],
                None => Vec::new(),
            }),
        }
    }

    /// Attribute lookup: markup attribute value, or JSON object entry.
    pub fn attr(&self, name: &str) -> Option<Value> {
        match self {
            DocNode::Html(el) => el.value().attr(name).map(|v| Value::String(v.to_string())),
            DocNode::Json(value) => value.get(name).cloned(),
        }
    }

    /// Full text content: concatenated text runs for markup, the string
    /// itself (or compact rendering) for JSON.
    pub fn text(&self) -> String {
        match self {
            DocNode::Html(el) => el.text().collect(),
            DocNode::Json(value) => match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Text runs joined by a separator; with `strip`, each run is trimmed
    /// and empty runs are dropped. Markup only; JSON falls back to `text`.
    pub fn joined_text(&self, joiner: &str, strip: bool) -> String {
        match self {
            DocNode::Html(el) => {
                if strip {
                    el.text()
                        .map(str::trim)
                        .filter(|run| !run.is_empty())
                        .collect::<Vec<_>>()
                        .join(joiner)
                } else {
                    el.text().collect::<Vec<_>>().join(joiner)
                }
            }
            DocNode::Json(_) => self.text(),
        }
    }

    /// Whether the node can hold children (markup elements always can;
    /// JSON scalars cannot).
    pub fn is_container(&self) -> bool {
        match self {
            DocNode::Html(_) => true,
            DocNode::Json(value) => value.is_object() || value.is_array(),
        }
    }

    /// The raw JSON value at this position, if this is a JSON node.
    pub fn json_value(&self) -> Option<&'a Value> {
        match self {
            DocNode::Json(value) => Some(value),
            DocNode::Html(_) => None,
        }
    }

    pub(crate) fn is_falsy(&self) -> bool {
        match self {
            DocNode::Html(_) => false,
            DocNode::Json(value) => is_falsy(value),
        }
    }
}

/// JSON truthiness in the schema's sense: null, false, zero, and empty
/// strings/containers all count as "nothing found".
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Cascade lookup: direct key first, then split the locator on the
/// separator and descend head by head, testing whether the remaining tail
/// resolves directly under each step. Lets a flat dotted locator reach
/// through nesting even when intermediate keys contain the separator
/// literally.
pub(crate) fn cascade_get<'a>(root: &'a Value, locator: &str, sep: char) -> Option<&'a Value> {
    if let Some(found) = root.get(locator) {
        return Some(found);
    }
    if !locator.contains(sep) {
        return None;
    }

    let segments: Vec<&str> = locator.split(sep).collect();
    let sep_str = sep.to_string();
    let mut container = root;
    for (i, head) in segments.iter().enumerate() {
        container = container.get(head)?;
        let tail = segments[i + 1..].join(&sep_str);
        if let Some(found) = container.get(&tail) {
            return Some(found);
        }
    }
    None
}
