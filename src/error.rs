use thiserror::Error;

/// Errors raised while building the exhibition scene from its XML description.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{tag}> tag is missing")]
    MissingTag { tag: &'static str },
    #[error("invalid <{tag}> value {value:?}: {reason}")]
    InvalidValue {
        tag: &'static str,
        value: String,
        reason: String,
    },
    #[error("unknown shape {0:?}")]
    UnknownShape(String),
}

/// Errors raised while reading the artwork catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read artwork catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid artwork catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading error.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] figment::Error);
