//! Terminal sinks: render an extracted output value for downstream use.

use serde_json::Value;

use crate::error::ParseError;

/// Render the output value as pretty-printed JSON.
pub fn to_json_pretty(value: &Value) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render the output value as YAML.
pub fn to_yaml(value: &Value) -> Result<String, ParseError> {
    Ok(serde_yaml::to_string(value)?)
}
