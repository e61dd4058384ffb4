//! Typed component configuration for Conflux
//!
//! This crate holds the data model shared by the factory registry and the
//! configuration provider:
//! - [`ComponentId`] and [`Kind`] identifying configured component instances
//! - common [`Settings`] composed with component-specific fields in
//!   [`ComponentSettings`]
//! - the resolved [`Config`] graph and its validation
//! - raw configuration sources and environment expansion

pub mod config;
pub mod error;
pub mod expand;
pub mod id;
pub mod raw;
pub mod settings;
pub mod sources;
pub mod validation;

// Re-export main types
pub use config::{Config, Pipeline, Service};
pub use error::{ConfigError, ConfigResult, DecodeError, ValidationError};
pub use id::{ComponentId, Kind};
pub use raw::RawMap;
pub use settings::{AnySettings, ComponentSettings, Settings, SpecificSettings};
pub use sources::{ConfigSource, FileSource, StaticSource};
pub use validation::{validate_config, SERVICE_ID};
