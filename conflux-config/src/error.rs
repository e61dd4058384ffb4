//! Configuration error types

use crate::id::{ComponentId, Kind};
use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Raw configuration could not be retrieved from a source
    #[error("Failed to retrieve config from '{location}': {reason}")]
    Source { location: String, reason: String },

    /// Provider settings are unusable
    #[error("Invalid provider settings: {0}")]
    InvalidSettings(String),

    /// Top-level key that is neither a component section nor `service`
    #[error("Unknown top-level section '{0}'")]
    UnknownSection(String),

    /// A section has the wrong shape
    #[error("Invalid '{section}' section: {reason}")]
    InvalidSection { section: String, reason: String },

    /// A declared component key is not a valid id
    #[error("Invalid {kind} id '{id}': {reason}")]
    InvalidComponentId {
        kind: Kind,
        id: String,
        reason: String,
    },

    /// No factory is registered for the id's type
    #[error("Unknown {kind} type '{}' for '{id}'", .id.component_type())]
    UnknownComponentType { kind: Kind, id: ComponentId },

    /// A component section could not be decoded into its settings
    #[error("Error reading {kind} configuration for '{id}': {source}")]
    Unmarshal {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: DecodeError,
    },

    /// Referential or semantic validation failed
    #[error("Invalid {kind} configuration for '{id}': {source}")]
    Validation {
        kind: Kind,
        id: ComponentId,
        #[source]
        source: ValidationError,
    },

    /// Operation attempted after the provider was shut down
    #[error("Configuration provider is shut down")]
    Closed,

    /// Operation aborted by its cancellation token
    #[error("Configuration operation canceled")]
    Canceled,

    /// One or more sources failed to close
    #[error("Failed to shut down config sources: {}", join_errors(.0))]
    Shutdown(Vec<ConfigError>),

    /// Error raised by a caller-supplied collaborator
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    /// Create a new source error
    pub fn source_error(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Source {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Id of the component this error is about, if any.
    ///
    /// For reference errors this is the referenced id, not the pipeline or
    /// `service` that holds the reference.
    pub fn component_id(&self) -> Option<&ComponentId> {
        match self {
            Self::UnknownComponentType { id, .. } | Self::Unmarshal { id, .. } => Some(id),
            Self::Validation { id, source, .. } => source.component_id().or(Some(id)),
            _ => None,
        }
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures while decoding one component section
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Section is not a key/value map
    #[error("expected a map, got {found}")]
    NotAMap { found: &'static str },

    /// Key paths not recognised by either the common or the component
    /// settings; nested keys are dotted (`protocol.endpont`)
    #[error("has invalid keys: {}", .keys.join(", "))]
    UnknownKeys { keys: Vec<String> },

    /// A key declared by both the common settings and the component settings
    #[error("key '{key}' is declared by both the common and the component settings")]
    KeyCollision { key: String },

    /// Value has the wrong shape for its field
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

/// Referential and semantic validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Reference to a component that was not configured
    #[error("references {kind} '{id}' which is not configured")]
    MissingReference { kind: Kind, id: ComponentId },

    /// Same component listed twice in one list
    #[error("references {kind} '{id}' multiple times")]
    DuplicateReference { kind: Kind, id: ComponentId },

    /// Pipeline id type is not a known data type
    #[error("unknown pipeline data type '{data_type}', expected one of: {}", .expected.join(", "))]
    UnknownDataType {
        data_type: String,
        expected: Vec<&'static str>,
    },

    /// Pipeline is missing a mandatory component category
    #[error("must have at least one {0}")]
    Empty(Kind),

    /// Semantic validation defined by the settings themselves
    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    /// Id of the referenced component, for reference errors
    pub fn component_id(&self) -> Option<&ComponentId> {
        match self {
            Self::MissingReference { id, .. } | Self::DuplicateReference { id, .. } => Some(id),
            _ => None,
        }
    }
}
