//! Registry preloaded with every example factory

use conflux_component::{ComponentResult, FactoryRegistry};

use crate::example_components::{
    example_exporter_factory, example_processor_factory, example_receiver_factory,
};
use crate::example_extension::example_extension_factory;

/// Registry holding the example extension, receiver, processor and exporter
pub fn nop_factories() -> ComponentResult<FactoryRegistry> {
    FactoryRegistry::from_factories([
        example_extension_factory(),
        example_receiver_factory(),
        example_processor_factory(),
        example_exporter_factory(),
    ])
}
