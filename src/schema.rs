//! Schema model: reserved control keys, leaf/branch classification, loading.
//!
//! A schema is a nested mapping (held as `serde_json::Value`). Each field is
//! either `null` ("use the enclosing scope node"), a plain locator string, or
//! a mapping of `_`-prefixed control keys and/or child fields.

use std::path::Path;

use serde_json::Value;

use crate::error::ParseError;

/// Control keys are recognized by this prefix and never treated as child fields.
pub const RESERVED_PREFIX: char = '_';

pub const LOCATOR: &str = "_locator";
pub const LOCATOR_EXTRACT: &str = "_locator_extract";
pub const INDEX: &str = "_index";
pub const ATTR: &str = "_attr";
pub const ATTR_REFINE: &str = "_attr_refine";
pub const JOINER: &str = "_joiner";
pub const STRIPED: &str = "_striped";

/// The full reserved-word set. A top-level field with one of these names is
/// skipped with a diagnostic, never parsed as data.
pub const RESERVED_KEYS: [&str; 7] = [
    LOCATOR,
    LOCATOR_EXTRACT,
    INDEX,
    ATTR,
    ATTR_REFINE,
    JOINER,
    STRIPED,
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Child fields of a schema node: mapping keys that do not carry the
/// reserved prefix, in schema order.
pub fn child_fields(config: &Value) -> Vec<(&str, &Value)> {
    match config.as_object() {
        Some(map) => map
            .iter()
            .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
            .map(|(k, v)| (k.as_str(), v))
            .collect(),
        None => Vec::new(),
    }
}

/// A node is a leaf iff it has no child fields: `null`, a locator string,
/// or a mapping whose keys are all reserved.
pub fn is_leaf(config: &Value) -> bool {
    child_fields(config).is_empty()
}

/// Load a schema from YAML text.
pub fn from_yaml_str(raw: &str) -> Result<Value, ParseError> {
    Ok(serde_yaml::from_str(raw)?)
}

/// Load a schema from a YAML file.
pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Value, ParseError> {
    let raw = std::fs::read_to_string(path)?;
    from_yaml_str(&raw)
}

/// Load a schema from JSON text.
pub fn from_json_str(raw: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(raw)?)
}

/// Overlay a customization mapping onto a base schema, one level deep:
/// when both sides hold a mapping under the same top-level key the entries
/// are merged (overlay wins per entry), otherwise the overlay value replaces
/// the base value.
pub fn overlay(base: &mut Value, custom: Value) {
    let (Some(base_map), Some(custom_map)) = (base.as_object_mut(), custom.as_object()) else {
        if custom.is_object() {
            *base = custom;
        }
        return;
    };

    for (key, val) in custom_map {
        match (base_map.get_mut(key), val.as_object()) {
            (Some(Value::Object(existing)), Some(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                base_map.insert(key.clone(), val.clone());
            }
        }
    }
}
