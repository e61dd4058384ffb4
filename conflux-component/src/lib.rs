//! Component factories and lifecycle for Conflux
//!
//! Each component type advertises itself through a [`Factory`]: a default
//! configuration constructor and a creation function. Factories are collected
//! once at startup into a [`FactoryRegistry`], which the configuration
//! provider consults to decode and later instantiate configured components.

pub mod component;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod registry;

// Re-export main types
pub use component::{Component, Host, NopHost};
pub use error::{BoxError, ComponentError, ComponentResult};
pub use factory::{BuildInfo, CreateSettings, Factory};
pub use lifecycle::Lifecycle;
pub use registry::FactoryRegistry;
