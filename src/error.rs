use thiserror::Error;

/// Failure to turn a dotted identifier into a loaded entity.
///
/// These are the only failures the engine surfaces to its caller; anything that
/// goes wrong below the resolved entry point is contained and degrades the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No module or package named '{0}'")]
    PackageNotFound(String),

    #[error("'{path}' has no attribute '{attribute}'")]
    AttributeNotFound { path: String, attribute: String },

    #[error("Failed to load '{path}': {detail}")]
    LoadFailed { path: String, detail: String },

    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

/// Main error type for pydocs operations
#[derive(Error, Debug)]
pub enum PydocsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Runtime backend unavailable: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, PydocsError>;
