//! Component error types

use conflux_config::{ComponentId, Kind};
use thiserror::Error;

/// Boxed error returned by component creation and lifecycle hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Component result type
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Factory registry and component errors
#[derive(Error, Debug)]
pub enum ComponentError {
    /// A factory for this type is already registered
    #[error("Duplicate {kind} factory '{component_type}'")]
    DuplicateType {
        kind: Kind,
        component_type: String,
    },

    /// No factory for this type
    #[error("{kind} factory '{component_type}' not found")]
    NotFound {
        kind: Kind,
        component_type: String,
    },

    /// Settings do not belong to the factory they were handed to
    #[error("{kind} '{id}' settings do not match factory: expected {expected}, got {found}")]
    TypeMismatch {
        kind: Kind,
        id: ComponentId,
        expected: String,
        found: String,
    },

    /// The factory's creation function failed
    #[error("Failed to create {kind} '{id}': {source}")]
    Create {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: BoxError,
    },

    /// Start or shutdown of a running component failed
    #[error("{stage} failed: {source}")]
    Lifecycle {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    /// Operation aborted by its cancellation token
    #[error("Creation of {kind} '{id}' canceled")]
    Canceled { kind: Kind, id: ComponentId },
}

impl ComponentError {
    /// Create a new start failure
    pub fn start_failed(source: impl Into<BoxError>) -> Self {
        Self::Lifecycle {
            stage: "start",
            source: source.into(),
        }
    }

    /// Create a new shutdown failure
    pub fn shutdown_failed(source: impl Into<BoxError>) -> Self {
        Self::Lifecycle {
            stage: "shutdown",
            source: source.into(),
        }
    }
}
