//! Error types for Horizon Facet core systems.

use crate::path::DataPath;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, FacetError>;

/// The main error type for core operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacetError {
    /// A write through the Path Resolver failed.
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// A rendering-surface operation failed.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Errors raised when writing through a data key.
///
/// Reads never fail: an unresolvable read is simply `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// The write targeted a missing or null context.
    #[error("cannot write '{key}': binding context is undefined")]
    UndefinedContext {
        /// The key that was being written.
        key: String,
    },

    /// A path segment tried to descend through a scalar value.
    #[error("cannot write '{key}': '{segment}' is not a mapping or sequence")]
    NotAContainer {
        /// The key that was being written.
        key: String,
        /// The segment that hit the scalar.
        segment: String,
    },

    /// A subscript lay too far past the end of its sequence to pad.
    #[error("cannot write '{key}': index {index} is too far past the end of the sequence")]
    IndexOutOfRange {
        /// The key that was being written.
        key: String,
        /// The offending subscript.
        index: usize,
    },
}

impl BindingError {
    /// Create an undefined-context error for a key.
    pub fn undefined_context(key: impl ToString) -> Self {
        Self::UndefinedContext {
            key: key.to_string(),
        }
    }

    /// Create a not-a-container error.
    pub fn not_a_container(key: impl ToString, segment: impl Into<String>) -> Self {
        Self::NotAContainer {
            key: key.to_string(),
            segment: segment.into(),
        }
    }

    /// Create an index-out-of-range error.
    pub fn index_out_of_range(key: impl ToString, index: usize) -> Self {
        Self::IndexOutOfRange {
            key: key.to_string(),
            index,
        }
    }

    /// Re-label the error with the absolute path it was raised for.
    pub(crate) fn at(self, path: &DataPath) -> Self {
        match self {
            Self::UndefinedContext { .. } => Self::undefined_context(path),
            Self::NotAContainer { segment, .. } => Self::not_a_container(path, segment),
            Self::IndexOutOfRange { index, .. } => Self::index_out_of_range(path, index),
        }
    }
}

/// Rendering-surface errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The node id is unknown or the node was destroyed.
    #[error("Invalid or destroyed surface node")]
    UnknownNode,

    /// Attempted to append a node under itself or one of its descendants.
    #[error("Cannot append a node under itself or a descendant")]
    CircularParentage,
}
