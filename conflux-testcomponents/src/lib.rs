//! Example component factories for Conflux tests
//!
//! The components here carry realistic settings shapes (strings, optional
//! maps and lists, nested blocks, semantic validation) but do no work; their
//! start and shutdown delegate to [`conflux_component::Lifecycle`].

pub mod example_components;
pub mod example_extension;
pub mod nop;

pub use example_components::{
    example_exporter_factory, example_processor_factory, example_receiver_factory,
    ExampleExporterConfig, ExampleProcessorConfig, ExampleReceiverConfig, Protocol,
    EXAMPLE_EXPORTER_TYPE, EXAMPLE_PROCESSOR_TYPE, EXAMPLE_RECEIVER_TYPE,
};
pub use example_extension::{
    example_extension_factory, ExampleExtension, ExampleExtensionConfig, DEFAULT_EXTRA,
    EXAMPLE_EXTENSION_TYPE,
};
pub use nop::nop_factories;
