//! Locator resolution and candidate filtering.
//!
//! Resolves a schema node's locator against the current scope node into
//! zero, one, or many candidate nodes, applies the optional extraction
//! hook, then narrows the set with `_index` (integer, slice, or `null`
//! for "all").

use serde_json::Value;
use tracing::warn;

use crate::document::DocNode;
use crate::error::ParseError;
use crate::schema;

use super::{refine, Engine};

/// Outcome of resolving a schema node against a scope node.
#[derive(Clone, Debug)]
pub enum Resolved<'a> {
    /// Nothing matched; the field is omitted (branches) or emitted as `""` (leaves).
    None,
    One(DocNode<'a>),
    Many(Vec<DocNode<'a>>),
}

/// Index selection parsed from `_index` (or the engine default).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndexSpec {
    All,
    At(i64),
    /// Half-open slice; `None` end means "to the end". Built from the first
    /// and last elements of the `_index` list; intermediate values are
    /// ignored, a long-standing quirk schemas rely on.
    Slice(i64, Option<i64>),
}

/// A candidate set plus whether it came from a genuine node list (a markup
/// match set or a JSON array) as opposed to a single JSON value. Keeping
/// everything decides whether the result is a list or that single node.
pub(crate) struct Candidates<'a> {
    nodes: Vec<DocNode<'a>>,
    listwise: bool,
}

pub(crate) fn resolve_nodes<'a>(
    engine: &Engine,
    key: &str,
    config: &Value,
    scope: DocNode<'a>,
) -> Result<Resolved<'a>, ParseError> {
    let strict = engine.options.strict;
    let sep = engine.options.cascade_sep;

    let resolved = match config {
        // `null`: identity, the scope node itself
        Value::Null => Resolved::One(scope),

        Value::String(locator) if locator.is_empty() => {
            empty_locator(strict, key)?;
            Resolved::One(scope)
        }

        // plain locator string: cardinality 1, first match or none
        Value::String(locator) => {
            let candidates = select(strict, key, scope, locator, sep)?;
            match candidates.nodes.into_iter().next() {
                Some(node) => Resolved::One(node),
                None => Resolved::None,
            }
        }

        Value::Object(map) => match map.get(schema::LOCATOR) {
            None | Some(Value::Null) => Resolved::One(scope),
            Some(Value::String(locator)) if locator.is_empty() => {
                empty_locator(strict, key)?;
                Resolved::One(scope)
            }
            Some(Value::String(locator)) => {
                let mut candidates = select(strict, key, scope, locator, sep)?;
                if let Some(hook_spec) = map.get(schema::LOCATOR_EXTRACT) {
                    candidates.nodes = refine::apply_hook(
                        &engine.registry,
                        strict,
                        key,
                        hook_spec,
                        candidates.nodes,
                    )?;
                }
                if candidates.nodes.is_empty() {
                    Resolved::None
                } else {
                    filter_candidates(engine, key, candidates, map.get(schema::INDEX))?
                }
            }
            Some(other) => {
                if strict {
                    return Err(ParseError::Config(format!(
                        "{key}: _locator must be a string or null, got {other}"
                    )));
                }
                warn!(key, %other, "_locator is not a string, skipping field");
                Resolved::None
            }
        },

        other => {
            if strict {
                return Err(ParseError::Config(format!(
                    "{key}: unsupported schema node {other}"
                )));
            }
            warn!(key, %other, "unsupported schema node, skipping field");
            Resolved::None
        }
    };

    Ok(normalize(resolved))
}

fn empty_locator(strict: bool, key: &str) -> Result<(), ParseError> {
    if strict {
        return Err(ParseError::Config(format!(
            "{key}: empty locator; use `~` or drop the key to target the scope node"
        )));
    }
    warn!(key, "empty locator, using the scope node itself");
    Ok(())
}

fn select<'a>(
    strict: bool,
    key: &str,
    scope: DocNode<'a>,
    locator: &str,
    sep: char,
) -> Result<Candidates<'a>, ParseError> {
    match scope {
        DocNode::Html(_) => match scope.select(locator, sep) {
            Ok(nodes) => Ok(Candidates {
                nodes,
                listwise: true,
            }),
            Err(e) if strict => Err(e),
            Err(e) => {
                warn!(key, locator, error = %e, "selector failed, treating as no match");
                Ok(Candidates {
                    nodes: Vec::new(),
                    listwise: true,
                })
            }
        },
        // a matched JSON array is a node list, anything else a single value
        DocNode::Json(value) => Ok(match crate::document::cascade_get(value, locator, sep) {
            Some(Value::Array(items)) => Candidates {
                nodes: items.iter().map(DocNode::Json).collect(),
                listwise: true,
            },
            Some(found) => Candidates {
                nodes: vec![DocNode::Json(found)],
                listwise: false,
            },
            None => Candidates {
                nodes: Vec::new(),
                listwise: true,
            },
        }),
    }
}

/// A single JSON array node counts as a node list; empty or falsy results
/// count as nothing found.
fn normalize(resolved: Resolved<'_>) -> Resolved<'_> {
    match resolved {
        Resolved::One(node) => match node.json_value() {
            Some(Value::Array(items)) if items.is_empty() => Resolved::None,
            Some(Value::Array(items)) => Resolved::Many(items.iter().map(DocNode::Json).collect()),
            _ if node.is_falsy() => Resolved::None,
            _ => Resolved::One(node),
        },
        Resolved::Many(nodes) if nodes.is_empty() => Resolved::None,
        other => other,
    }
}

/// Apply `_index` to a candidate set. `null` keeps everything; an integer
/// picks one (clamped high, end-relative when negative); a list slices.
pub(crate) fn filter_candidates<'a>(
    engine: &Engine,
    key: &str,
    candidates: Candidates<'a>,
    index_value: Option<&Value>,
) -> Result<Resolved<'a>, ParseError> {
    let Candidates { nodes, listwise } = candidates;
    let spec = match index_value {
        None => match engine.options.default_index {
            None => IndexSpec::All,
            Some(i) => IndexSpec::At(i),
        },
        Some(value) => match parse_index(value) {
            Ok(spec) => spec,
            Err(e) if engine.options.strict => return Err(e),
            Err(e) => {
                warn!(key, error = %e, "bad _index, leaving candidates unfiltered");
                return Ok(as_resolved(nodes, listwise));
            }
        },
    };

    match spec {
        IndexSpec::All => Ok(as_resolved(nodes, listwise)),
        IndexSpec::At(i) => {
            if nodes.is_empty() {
                return Ok(Resolved::None);
            }
            let len = nodes.len() as i64;
            let at = if i < 0 { len + i } else { i.min(len - 1) };
            if at < 0 {
                if engine.options.strict {
                    return Err(ParseError::Config(format!(
                        "{key}: index {i} out of range for {len} candidates"
                    )));
                }
                warn!(key, index = i, len, "index out of range, treating as no match");
                return Ok(Resolved::None);
            }
            Ok(Resolved::One(nodes[at as usize]))
        }
        IndexSpec::Slice(start, end) => {
            // a single non-list JSON value cannot be sliced
            if !listwise && !nodes.is_empty() {
                if engine.options.strict {
                    return Err(ParseError::Config(format!(
                        "{key}: slice _index over a single non-list value"
                    )));
                }
                warn!(key, "slice _index over a single non-list value, treating as no match");
                return Ok(Resolved::None);
            }
            let range = slice_range(nodes.len(), start, end);
            Ok(Resolved::Many(nodes[range].to_vec()))
        }
    }
}

fn as_resolved(nodes: Vec<DocNode<'_>>, listwise: bool) -> Resolved<'_> {
    match (listwise, nodes.len()) {
        (false, 1) => Resolved::One(nodes[0]),
        _ => Resolved::Many(nodes),
    }
}

fn parse_index(value: &Value) -> Result<IndexSpec, ParseError> {
    match value {
        Value::Null => Ok(IndexSpec::All),
        Value::Number(n) => n
            .as_i64()
            .map(IndexSpec::At)
            .ok_or_else(|| ParseError::Config(format!("_index must be an integer, got {n}"))),
        Value::Array(bounds) => {
            let as_int = |v: &Value| {
                v.as_i64()
                    .ok_or_else(|| ParseError::Config(format!("_index bound must be an integer, got {v}")))
            };
            match (bounds.first(), bounds.last()) {
                (None, _) => Err(ParseError::Config("_index list is empty".into())),
                (Some(a), Some(b)) if bounds.len() >= 2 => {
                    Ok(IndexSpec::Slice(as_int(a)?, Some(as_int(b)?)))
                }
                (Some(a), _) => Ok(IndexSpec::Slice(as_int(a)?, None)),
            }
        }
        other => Err(ParseError::Config(format!(
            "_index must be null, an integer, or a list, got {other}"
        ))),
    }
}

/// Python-style slice bounds: negatives are end-relative, out-of-range
/// values clamp, inverted ranges are empty.
fn slice_range(len: usize, start: i64, end: Option<i64>) -> std::ops::Range<usize> {
    let len = len as i64;
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len) as usize
    };
    let lo = clamp(start);
    let hi = end.map_or(len as usize, clamp);
    lo..hi.max(lo)
}
