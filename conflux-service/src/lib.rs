//! Configuration provider for Conflux
//!
//! [`ConfigProvider`] pulls raw configuration from one or more sources,
//! decodes every declared component over a fresh default from its factory in
//! the [`conflux_component::FactoryRegistry`], validates the result and hands
//! back a typed [`conflux_config::Config`]. The decode step is pluggable
//! through [`Unmarshaler`].

pub mod logging;
pub mod provider;
pub mod settings;
pub mod unmarshaler;

// Re-export main types
pub use logging::init_simple_tracing;
pub use provider::{ConfigProvider, ProviderState, SERVICE_SECTION};
pub use settings::{ProviderSettings, ENV_PREFIX};
pub use unmarshaler::{DefaultUnmarshaler, UnknownKeys, Unmarshaler};
