//! End-to-end extraction over JSON documents.

use pretty_assertions::assert_eq;
use serde_json::json;
use skimmer::{Document, Engine, Options, ParseError, Registry};

const COMPANY: &str = r#"
{
    "name": "Acme",
    "details": {
        "size": "500人",
        "industry": "software,hardware"
    },
    "features": {
        "/job_category.values": ["dev", "ops"]
    },
    "a": {"b": {"c": 5}}
}
"#;

const LISTINGS: &str = r#"
[
    {"title": "Engineer", "salary": 90000, "tags": ["remote", "senior"]},
    null,
    {"title": "Designer", "salary": 80000, "tags": ["hybrid"]}
]
"#;

fn json_options(strict: bool) -> Options {
    Options {
        strict,
        // JSON schemas address values directly, no first-match default
        default_index: None,
        ..Options::default()
    }
}

#[test]
fn test_dict_root_with_refinements() {
    let mut registry = Registry::new();
    registry.add_refiner("refine_size", |raw| {
        json!(raw.as_str().unwrap_or("").replace('人', ""))
    });
    registry.add_refiner("refine_industry", |raw| {
        json!(raw
            .as_str()
            .unwrap_or("")
            .split(',')
            .collect::<Vec<_>>())
    });

    let doc = Document::json(COMPANY).unwrap();
    let schema = json!({
        "company": {
            "name": "name",
            "size": {"_locator": "details.size", "_attr_refine": true},
            "industry": {"_locator": "details.industry", "_attr_refine": true}
        }
    });
    let out = Engine::with_options(registry, json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(
        out,
        json!({"company": {
            "name": "Acme",
            "size": "500",
            "industry": ["software", "hardware"]
        }})
    );
}

#[test]
fn test_named_refinement_gets_whole_object() {
    let mut registry = Registry::new();
    registry.add_refiner("entry_count", |raw| {
        json!(raw.as_object().map(|m| m.len()).unwrap_or(0))
    });

    let doc = Document::json(COMPANY).unwrap();
    // the locator resolves to an object; without a list-valued _attr the
    // named function receives it in one call, not entry by entry
    let schema = json!({
        "company": {
            "detail_count": {"_locator": "details", "_attr_refine": "entry_count"}
        }
    });
    let out = Engine::with_options(registry, json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(out, json!({"company": {"detail_count": 2}}));
}

#[test]
fn test_cascade_reaches_nested_value() {
    let doc = Document::json(COMPANY).unwrap();
    let schema = json!({"probe": {"deep": {"_locator": "a.b.c"}}});
    let out = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    // number survives with its type, no key literally equals "a.b.c"
    assert_eq!(out, json!({"probe": {"deep": 5}}));
}

#[test]
fn test_cascade_key_with_literal_separator() {
    let doc = Document::json(COMPANY).unwrap();
    let schema = json!({
        "jobs": {
            "categories": {"_locator": "features./job_category.values"}
        }
    });
    let out = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(out, json!({"jobs": {"categories": ["dev", "ops"]}}));
}

#[test]
fn test_list_root_iterates_entries() {
    let doc = Document::json(LISTINGS).unwrap();
    // no _locator: the branch scopes to the root array, one mapping per entry;
    // the null entry was dropped at load
    let schema = json!({
        "listings": {
            "title": "title",
            "salary": "salary"
        }
    });
    let out = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(
        out,
        json!({"listings": [
            {"title": "Engineer", "salary": 90000},
            {"title": "Designer", "salary": 80000}
        ]})
    );
}

#[test]
fn test_array_value_leaf_extracts_per_element() {
    let doc = Document::json(LISTINGS).unwrap();
    let schema = json!({
        "listings": {
            "tags": {"_locator": "tags"}
        }
    });
    let out = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(
        out,
        json!({"listings": [
            {"tags": ["remote", "senior"]},
            {"tags": ["hybrid"]}
        ]})
    );
}

#[test]
fn test_index_slices_array_candidates() {
    let doc = Document::json(r#"{"nums": [10, 20, 30, 40]}"#).unwrap();
    let schema = json!({
        "slice": {"tail": {"_locator": "nums", "_index": [1]}},
        "pick": {"last": {"_locator": "nums", "_index": -1}},
        "clamped": {"over": {"_locator": "nums", "_index": 99}}
    });
    let out = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(out["slice"]["tail"], json!([20, 30, 40]));
    assert_eq!(out["pick"]["last"], json!(40));
    assert_eq!(out["clamped"]["over"], json!(40));
}

#[test]
fn test_empty_locator_strict_vs_lenient() {
    let doc = Document::json(COMPANY).unwrap();
    let schema = json!({"company": {"name": {"_locator": ""}}});

    let err = Engine::with_options(Registry::new(), json_options(true))
        .parse(&doc, &schema)
        .unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));

    // lenient: the scope node itself is used, the whole object comes back
    let out = Engine::with_options(Registry::new(), json_options(false))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(out["company"]["name"]["name"], json!("Acme"));
}

#[test]
fn test_missing_key_lenient_leaf_is_empty_string() {
    let doc = Document::json(COMPANY).unwrap();
    let schema = json!({"company": {"ceo": "leadership.ceo"}});
    let out = Engine::with_options(Registry::new(), json_options(false))
        .parse(&doc, &schema)
        .unwrap();
    assert_eq!(out, json!({"company": {"ceo": ""}}));
}

#[test]
fn test_engine_reuse_without_cross_talk() {
    let engine = Engine::with_options(Registry::new(), json_options(true));
    let schema = json!({"company": {"name": "name"}});

    let first = engine
        .parse(&Document::json(COMPANY).unwrap(), &schema)
        .unwrap();
    let other = engine
        .parse(&Document::json(r#"{"name": "Globex"}"#).unwrap(), &schema)
        .unwrap();
    let again = engine
        .parse(&Document::json(COMPANY).unwrap(), &schema)
        .unwrap();

    assert_eq!(first["company"]["name"], json!("Acme"));
    assert_eq!(other["company"]["name"], json!("Globex"));
    assert_eq!(first, again);
}
