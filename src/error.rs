//! Error types for schema-driven extraction.

use thiserror::Error;

/// Errors raised while loading schemas/documents or running an extraction.
///
/// In lenient mode (the default) the engine logs these at the point of
/// occurrence and degrades instead of returning them; in strict mode any
/// of them aborts the whole extraction.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed schema: empty locator, unrecognized index shape, and so on.
    #[error("invalid schema config: {0}")]
    Config(String),

    /// A named refinement or extraction-hook function is absent from the registry.
    #[error("refinement function not found in registry: {0}")]
    RefinementNotFound(String),

    /// The document adapter could not resolve a selector or load the document.
    #[error("document error: {0}")]
    Document(String),

    /// A branch locator matched zero nodes (strict mode only).
    #[error("no nodes matched: {0}")]
    NoNodes(String),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
