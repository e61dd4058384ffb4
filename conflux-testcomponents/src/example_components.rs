//! Example receiver, processor and exporter used to build pipelines in tests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use conflux_component::{Component, Factory, Lifecycle};
use conflux_config::SpecificSettings;

pub const EXAMPLE_RECEIVER_TYPE: &str = "examplereceiver";
pub const EXAMPLE_PROCESSOR_TYPE: &str = "exampleprocessor";
pub const EXAMPLE_EXPORTER_TYPE: &str = "exampleexporter";

/// Nested settings block, decoded as a sub-map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub endpoint: String,
    pub max_message_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleReceiverConfig {
    pub protocol: Protocol,
    pub headers: BTreeMap<String, String>,
}

impl Default for ExampleReceiverConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol {
                endpoint: "localhost:4317".to_string(),
                max_message_size: 4 * 1024 * 1024,
            },
            headers: BTreeMap::new(),
        }
    }
}

impl SpecificSettings for ExampleReceiverConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleProcessorConfig {
    pub attributes: Vec<String>,
}

impl SpecificSettings for ExampleProcessorConfig {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleExporterConfig {
    pub endpoint: String,
    pub compression: Option<String>,
}

impl Default for ExampleExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:4318".to_string(),
            compression: None,
        }
    }
}

impl SpecificSettings for ExampleExporterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must be specified".to_string());
        }
        Ok(())
    }
}

fn nop_component() -> Box<dyn Component> {
    Box::new(Lifecycle::nop())
}

pub fn example_receiver_factory() -> Factory {
    Factory::receiver(
        EXAMPLE_RECEIVER_TYPE,
        ExampleReceiverConfig::default,
        |_set, _settings| Ok(nop_component()),
    )
}

pub fn example_processor_factory() -> Factory {
    Factory::processor(
        EXAMPLE_PROCESSOR_TYPE,
        ExampleProcessorConfig::default,
        |_set, _settings| Ok(nop_component()),
    )
}

pub fn example_exporter_factory() -> Factory {
    Factory::exporter(
        EXAMPLE_EXPORTER_TYPE,
        ExampleExporterConfig::default,
        |_set, _settings| Ok(nop_component()),
    )
}
