//! Attribute/text extraction: turns a resolved node into an output value.
//!
//! Markup nodes yield text (optionally joined/stripped) or attribute
//! values; JSON nodes yield their raw value with the original type
//! preserved. A list-valued `_attr` is the only shape that produces a
//! mapping instead of a scalar.

use serde_json::{Map, Value};
use tracing::warn;

use crate::document::DocNode;
use crate::error::ParseError;
use crate::schema;

use super::{refine, Engine};

/// How `_striped` post-processes text.
#[derive(Clone, Debug, PartialEq, Eq)]
enum StripMode {
    Off,
    /// `_striped: true`: trim leading/trailing whitespace.
    Trim,
    /// `_striped: "<chars>"`: delete every occurrence of each character.
    Chars(String),
}

impl StripMode {
    fn from_config(config: &Value) -> StripMode {
        match config.get(schema::STRIPED) {
            Some(Value::Bool(true)) => StripMode::Trim,
            Some(Value::String(chars)) if !chars.is_empty() => StripMode::Chars(chars.clone()),
            _ => StripMode::Off,
        }
    }

    fn apply(&self, text: String) -> String {
        match self {
            StripMode::Off => text,
            StripMode::Trim => text.trim().to_string(),
            StripMode::Chars(set) => text.chars().filter(|c| !set.contains(*c)).collect(),
        }
    }
}

pub(crate) fn extract_value(
    engine: &Engine,
    key: &str,
    config: &Value,
    node: DocNode<'_>,
) -> Result<Value, ParseError> {
    if node.is_falsy() {
        return Ok(Value::String(String::new()));
    }
    match node {
        DocNode::Json(value) => extract_json(engine, key, config, value),
        DocNode::Html(_) => extract_markup(engine, key, config, node),
    }
}

fn extract_markup(
    engine: &Engine,
    key: &str,
    config: &Value,
    node: DocNode<'_>,
) -> Result<Value, ParseError> {
    let Some(map) = config.as_object() else {
        // `null` or a plain locator string: full text content
        return Ok(Value::String(node.text()));
    };

    let attr_spec = map.get(schema::ATTR).filter(|v| !crate::document::is_falsy(v));
    let strip = StripMode::from_config(config);

    let raw = if let Some(attrs) = attr_spec {
        markup_attr(engine, key, &node, attrs)?
    } else if let Some(joiner) = map.get(schema::JOINER).and_then(Value::as_str).filter(|j| !j.is_empty()) {
        Value::String(node.joined_text(joiner, strip != StripMode::Off))
    } else {
        Value::String(strip.apply(node.text()))
    };

    refine::apply_refine(&engine.registry, engine.options.strict, key, config, attr_spec, raw)
}

fn markup_attr(
    engine: &Engine,
    key: &str,
    node: &DocNode<'_>,
    attrs: &Value,
) -> Result<Value, ParseError> {
    match attrs {
        // missing markup attributes read as empty strings
        Value::String(name) => Ok(node.attr(name).unwrap_or_else(|| Value::String(String::new()))),
        Value::Array(names) => {
            let mut out = Map::with_capacity(names.len());
            for name in names {
                let Some(name) = name.as_str() else {
                    return attr_shape_error(engine, key, attrs);
                };
                out.insert(
                    name.to_string(),
                    node.attr(name).unwrap_or_else(|| Value::String(String::new())),
                );
            }
            Ok(Value::Object(out))
        }
        other => attr_shape_error(engine, key, other),
    }
}

fn attr_shape_error(engine: &Engine, key: &str, attrs: &Value) -> Result<Value, ParseError> {
    if engine.options.strict {
        return Err(ParseError::Config(format!(
            "{key}: _attr must be a string or a list of strings, got {attrs}"
        )));
    }
    warn!(key, %attrs, "bad _attr shape, emitting empty string");
    Ok(Value::String(String::new()))
}

fn extract_json(
    engine: &Engine,
    key: &str,
    config: &Value,
    value: &Value,
) -> Result<Value, ParseError> {
    let Some(map) = config.as_object() else {
        // scalar and container values pass through with their type intact
        return Ok(value.clone());
    };

    let attr_spec = map.get(schema::ATTR).filter(|v| !crate::document::is_falsy(v));

    let raw = if let Some(attrs) = attr_spec {
        json_attr(engine, key, value, attrs)?
    } else {
        let strip = StripMode::from_config(config);
        match value {
            Value::String(s) => Value::String(strip.apply(s.clone())),
            other => other.clone(),
        }
    };

    refine::apply_refine(&engine.registry, engine.options.strict, key, config, attr_spec, raw)
}

fn json_attr(
    engine: &Engine,
    key: &str,
    value: &Value,
    attrs: &Value,
) -> Result<Value, ParseError> {
    match attrs {
        // a missing JSON entry keeps dict-lookup semantics: null
        Value::String(name) => Ok(value.get(name).cloned().unwrap_or(Value::Null)),
        Value::Array(names) => {
            let mut out = Map::with_capacity(names.len());
            for name in names {
                let Some(name) = name.as_str() else {
                    return attr_shape_error(engine, key, attrs);
                };
                out.insert(
                    name.to_string(),
                    value.get(name).cloned().unwrap_or_else(|| Value::String(String::new())),
                );
            }
            Ok(Value::Object(out))
        }
        other => attr_shape_error(engine, key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::engine::{Options, Registry};
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(Registry::new())
    }

    fn first<'a>(doc: &'a Document, selector: &str) -> DocNode<'a> {
        doc.root().select(selector, '.').unwrap()[0]
    }

    #[test]
    fn test_text_extraction_null_config() {
        let doc = Document::html("<h1>Hello</h1>");
        let out = extract_value(&engine(), "title", &Value::Null, first(&doc, "h1")).unwrap();
        assert_eq!(out, json!("Hello"));
    }

    #[test]
    fn test_striped_true_trims() {
        let doc = Document::html("<p>  padded  </p>");
        let config = json!({"_striped": true});
        let out = extract_value(&engine(), "t", &config, first(&doc, "p")).unwrap();
        assert_eq!(out, json!("padded"));
    }

    #[test]
    fn test_striped_string_deletes_chars() {
        let doc = Document::html("<p>1,234 views</p>");
        let config = json!({"_striped": ", views"});
        let out = extract_value(&engine(), "count", &config, first(&doc, "p")).unwrap();
        assert_eq!(out, json!("1234"));
    }

    #[test]
    fn test_single_attr() {
        let doc = Document::html(r#"<a href="/x">link</a>"#);
        let config = json!({"_attr": "href"});
        let out = extract_value(&engine(), "url", &config, first(&doc, "a")).unwrap();
        assert_eq!(out, json!("/x"));
    }

    #[test]
    fn test_missing_markup_attr_is_empty_string() {
        let doc = Document::html("<a>link</a>");
        let config = json!({"_attr": "href"});
        let out = extract_value(&engine(), "url", &config, first(&doc, "a")).unwrap();
        assert_eq!(out, json!(""));
    }

    #[test]
    fn test_attr_list_yields_mapping() {
        let doc = Document::html(r#"<img src="a.png" alt="logo">"#);
        let config = json!({"_attr": ["src", "alt", "title"]});
        let out = extract_value(&engine(), "image", &config, first(&doc, "img")).unwrap();
        assert_eq!(out, json!({"src": "a.png", "alt": "logo", "title": ""}));
    }

    #[test]
    fn test_joiner_with_strip() {
        let doc = Document::html("<div> a <span> b </span> c </div>");
        let config = json!({"_joiner": "|", "_striped": true});
        let out = extract_value(&engine(), "t", &config, first(&doc, "div")).unwrap();
        assert_eq!(out, json!("a|b|c"));
    }

    #[test]
    fn test_json_preserves_type() {
        let value = json!(42);
        let out = extract_value(&engine(), "n", &Value::Null, DocNode::Json(&value)).unwrap();
        assert_eq!(out, json!(42));
    }

    #[test]
    fn test_json_attr_miss_is_null() {
        let value = json!({"present": 1});
        let config = json!({"_attr": "absent"});
        let out = extract_value(&engine(), "k", &config, DocNode::Json(&value)).unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_json_attr_list_keeps_value_types() {
        let value = json!({"id": 7, "name": "x"});
        let config = json!({"_attr": ["id", "name", "absent"]});
        let out = extract_value(&engine(), "k", &config, DocNode::Json(&value)).unwrap();
        assert_eq!(out, json!({"id": 7, "name": "x", "absent": ""}));
    }

    #[test]
    fn test_falsy_node_is_empty_string() {
        let value = Value::Null;
        let out = extract_value(&engine(), "k", &Value::Null, DocNode::Json(&value)).unwrap();
        assert_eq!(out, json!(""));
    }

    #[test]
    fn test_bad_attr_shape_strict() {
        let strict = Engine::with_options(
            Registry::new(),
            Options {
                strict: true,
                ..Options::default()
            },
        );
        let doc = Document::html("<a>x</a>");
        let config = json!({"_attr": 5});
        assert!(matches!(
            extract_value(&strict, "k", &config, first(&doc, "a")),
            Err(ParseError::Config(_))
        ));
    }
}
