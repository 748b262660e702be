//! Error types for the view runtime.

use horizon_facet_core::{BindingError, SurfaceError};

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving views.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Building a view failed.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A programmatic write failed.
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// A controller was used out of order.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// The rendering surface rejected an operation.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl From<ConfigurationError> for Error {
    fn from(err: ConfigurationError) -> Self {
        Self::Build(BuildError::Configuration(err))
    }
}

/// A malformed configuration node.
///
/// These are developer-facing and abort construction of the offending subtree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// A control kind that the runtime does not know.
    #[error("Unknown control kind '{kind}'")]
    UnknownKind { kind: String },

    /// A node description that could not be interpreted.
    #[error("Malformed configuration node: {message}")]
    Malformed { message: String },

    /// Row height must be positive and finite.
    #[error("Invalid row height {value}: must be positive and finite")]
    InvalidRowHeight { value: f32 },

    /// Viewport height must be non-negative and finite.
    #[error("Invalid viewport height {value}: must be non-negative and finite")]
    InvalidViewportHeight { value: f32 },

    /// A table was declared without columns.
    #[error("Table '{table}' declares no columns")]
    MissingColumns { table: String },

    /// A validation pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl ConfigurationError {
    /// Create an unknown-kind error.
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Create a malformed-node error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create an invalid-pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}

/// Errors raised while realizing a configuration node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The node itself is malformed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The surface rejected a node operation.
    #[error("Surface rejected node: {0}")]
    Surface(#[from] SurfaceError),
}

/// Controller misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Only the topmost popover may be dismissed.
    #[error("Popover is not the topmost popover")]
    NotTopmost,

    /// The controller has already been dismissed.
    #[error("Controller has already been dismissed")]
    Dismissed,
}
