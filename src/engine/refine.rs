//! Refinement registry and name-based dispatch.
//!
//! Refinement functions are user-supplied transforms applied to extracted
//! raw values; extraction hooks transform candidate node lists before
//! indexing. Both are resolved by name against an explicit [`Registry`]
//! owned by the concrete extractor; no runtime reflection.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::document::{is_falsy, DocNode};
use crate::error::ParseError;
use crate::schema;

/// A named post-processing transform for extracted values.
pub type RefineFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// A named transform over raw candidate node lists, applied before indexing.
pub type HookFn = Box<dyn for<'n> Fn(Vec<DocNode<'n>>) -> Vec<DocNode<'n>> + Send + Sync>;

/// Name → function registry, populated by the schema's owner at
/// construction time. Lookups are pure and stateless.
#[derive(Default)]
pub struct Registry {
    refiners: HashMap<String, RefineFn>,
    hooks: HashMap<String, HookFn>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn add_refiner<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.refiners.insert(name.into(), Box::new(f));
    }

    pub fn add_hook<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: for<'n> Fn(Vec<DocNode<'n>>) -> Vec<DocNode<'n>> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Box::new(f));
    }

    pub fn refiner(&self, name: &str) -> Option<&RefineFn> {
        self.refiners.get(name)
    }

    pub fn hook(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("refiners", &self.refiners.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Drop every character outside `[A-Za-z0-9_]` so derived names are always
/// legal function identifiers.
pub fn sanitize_name(raw: &str) -> String {
    keep_allowed_chars(raw, "_")
}

fn derived_refine_name(field_key: &str, suffix: Option<&str>) -> String {
    let name = match suffix {
        Some(suffix) => format!("refine_{field_key}_{suffix}"),
        None => format!("refine_{field_key}"),
    };
    sanitize_name(&name)
}

fn derived_hook_name(field_key: &str) -> String {
    sanitize_name(&format!("extract_{field_key}"))
}

/// Apply `_attr_refine` to an extracted raw value. A mapping built by a
/// list-valued `_attr` is refined entry by entry; any other value, a whole
/// JSON object included, goes through a single function. Missing functions
/// are fatal in strict mode, logged passthrough otherwise.
pub(crate) fn apply_refine(
    registry: &Registry,
    strict: bool,
    field_key: &str,
    config: &Value,
    attr_spec: Option<&Value>,
    raw: Value,
) -> Result<Value, ParseError> {
    let Some(spec) = config.get(schema::ATTR_REFINE) else {
        return Ok(raw);
    };
    if is_falsy(spec) {
        return Ok(raw);
    }

    // only an attribute mapping is refined entry by entry; a raw value
    // that happens to be an object still goes through one function
    let from_attr_list = matches!(attr_spec, Some(Value::Array(_)));
    match raw {
        Value::Object(entries) if from_attr_list => {
            let explicit = match spec {
                Value::String(name) => Some(name.clone()),
                Value::Bool(true) => None,
                other => return config_fallback(strict, field_key, other, Value::Object(entries)),
            };
            let mut refined = Map::with_capacity(entries.len());
            for (entry_key, entry_val) in entries {
                let name = match &explicit {
                    Some(name) => name.clone(),
                    None => derived_refine_name(field_key, Some(&entry_key)),
                };
                let val = run_refiner(registry, strict, &name, entry_val)?;
                refined.insert(entry_key, val);
            }
            Ok(Value::Object(refined))
        }
        whole => {
            let name = match spec {
                Value::String(explicit) => explicit.clone(),
                Value::Bool(true) => {
                    let suffix = attr_spec.and_then(Value::as_str);
                    derived_refine_name(field_key, suffix)
                }
                other => return config_fallback(strict, field_key, other, whole),
            };
            run_refiner(registry, strict, &name, whole)
        }
    }
}

fn config_fallback(
    strict: bool,
    field_key: &str,
    spec: &Value,
    raw: Value,
) -> Result<Value, ParseError> {
    if strict {
        return Err(ParseError::Config(format!(
            "{field_key}: _attr_refine must be a string or `true`, got {spec}"
        )));
    }
    warn!(field_key, %spec, "unrecognized _attr_refine value, passing raw value through");
    Ok(raw)
}

fn run_refiner(
    registry: &Registry,
    strict: bool,
    name: &str,
    raw: Value,
) -> Result<Value, ParseError> {
    match registry.refiner(name) {
        Some(f) => Ok(f(raw)),
        None if strict => Err(ParseError::RefinementNotFound(name.to_string())),
        None => {
            warn!(name, "refinement function missing from registry, passing raw value through");
            Ok(raw)
        }
    }
}

/// Apply `_locator_extract` to a raw candidate set. The hook name follows
/// the refinement naming rules with the `extract_` prefix; `true`
/// auto-derives `extract_<field>`.
pub(crate) fn apply_hook<'n>(
    registry: &Registry,
    strict: bool,
    field_key: &str,
    spec: &Value,
    candidates: Vec<DocNode<'n>>,
) -> Result<Vec<DocNode<'n>>, ParseError> {
    if is_falsy(spec) {
        return Ok(candidates);
    }
    let name = match spec {
        Value::String(explicit) => explicit.clone(),
        Value::Bool(true) => derived_hook_name(field_key),
        other => {
            if strict {
                return Err(ParseError::Config(format!(
                    "{field_key}: _locator_extract must be a string or `true`, got {other}"
                )));
            }
            warn!(field_key, "unrecognized _locator_extract value, leaving candidates unfiltered");
            return Ok(candidates);
        }
    };
    match registry.hook(&name) {
        Some(hook) => Ok(hook(candidates)),
        None if strict => Err(ParseError::RefinementNotFound(name)),
        None => {
            warn!(name, "extraction hook missing from registry, leaving candidates unfiltered");
            Ok(candidates)
        }
    }
}

/* Built-in transforms for registries. Counterparts of the stock enrichment
helpers that ship with the engine: link absolutization, numeric filtering,
"1.2k"-style metric numbers. */

/// Keep ASCII letters, digits, and any characters in `custom`.
pub fn keep_allowed_chars(src: &str, custom: &str) -> String {
    src.chars()
        .filter(|c| c.is_ascii_alphanumeric() || custom.contains(*c))
        .collect()
}

/// Keep only decimal digits plus any extra characters (e.g. "." for floats).
pub fn digits(src: &str, extra: &str) -> String {
    src.chars()
        .filter(|c| c.is_ascii_digit() || extra.contains(*c))
        .collect()
}

/// Parse display counts like "1.2k" into numbers (k multiplies by 1000).
/// Unparseable input yields 0.
pub fn metric_number(src: &str) -> f64 {
    let lowered = src.to_lowercase();
    let unit = if lowered.contains('k') { 1000.0 } else { 1.0 };
    let filtered = digits(&lowered, ".");
    match filtered.parse::<f64>() {
        Ok(n) => n * unit,
        Err(_) => 0.0,
    }
}

pub fn metric_number_int(src: &str) -> i64 {
    metric_number(src) as i64
}

/// Resolve a possibly-relative link against a base URL. Absolute links are
/// returned unchanged; anything unresolvable comes back as-is.
pub fn absolutize_url(base: &str, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Split on `sep` and return the last non-blank segment, trimmed.
pub fn last_non_empty_line(info: &str, sep: char) -> String {
    info.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or("")
        .to_string()
}
