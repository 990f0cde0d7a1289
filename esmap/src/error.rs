//! Error types for document mapping and query rewriting

/// Errors raised when a document path cannot be read, written or removed
#[derive(Debug, thiserror::Error)]
pub enum EsMapError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Cannot descend into scalar at: {0}")]
    NotAContainer(String),

    #[error("Index {index} out of bounds at: {path}")]
    IndexOutOfBounds { path: String, index: usize },

    #[error("Expected an array at: {0}")]
    NotAnArray(String),

    #[error("Invalid ordering: {0}")]
    InvalidOrdering(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl EsMapError {
    /// Short machine-readable kind, used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::PathNotFound(_) => "path_not_found",
            Self::NotAContainer(_) => "not_a_container",
            Self::IndexOutOfBounds { .. } => "index_out_of_bounds",
            Self::NotAnArray(_) => "not_an_array",
            Self::InvalidOrdering(_) => "invalid_ordering",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}

impl From<toml::de::Error> for EsMapError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for EsMapError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config(e.to_string())
    }
}
