//! Example extension with string, map and list settings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use conflux_component::{Component, ComponentResult, Factory, Host, Lifecycle};
use conflux_config::{ComponentSettings, SpecificSettings};

/// Type of the example extension
pub const EXAMPLE_EXTENSION_TYPE: &str = "exampleextension";

/// Default value of [`ExampleExtensionConfig::extra`]
pub const DEFAULT_EXTRA: &str = "extra string setting";

/// Settings of the example extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleExtensionConfig {
    pub extra: String,
    pub extra_map: Option<BTreeMap<String, String>>,
    pub extra_list: Option<Vec<String>>,
}

impl Default for ExampleExtensionConfig {
    fn default() -> Self {
        Self {
            extra: DEFAULT_EXTRA.to_string(),
            extra_map: None,
            extra_list: None,
        }
    }
}

impl SpecificSettings for ExampleExtensionConfig {}

/// Extension that keeps its resolved settings and does nothing else
#[derive(Debug)]
pub struct ExampleExtension {
    pub settings: ComponentSettings<ExampleExtensionConfig>,
    lifecycle: Lifecycle,
}

impl ExampleExtension {
    pub fn new(settings: ComponentSettings<ExampleExtensionConfig>) -> Self {
        Self {
            settings,
            lifecycle: Lifecycle::nop(),
        }
    }
}

#[async_trait]
impl Component for ExampleExtension {
    async fn start(&mut self, cancel: &CancellationToken, host: &dyn Host) -> ComponentResult<()> {
        tracing::debug!(id = %self.settings.id(), "Example extension started");
        self.lifecycle.start(cancel, host).await
    }

    async fn shutdown(&mut self, cancel: &CancellationToken) -> ComponentResult<()> {
        self.lifecycle.shutdown(cancel).await
    }
}

/// Factory for [`ExampleExtension`]
pub fn example_extension_factory() -> Factory {
    Factory::extension(
        EXAMPLE_EXTENSION_TYPE,
        ExampleExtensionConfig::default,
        |_set, settings| Ok(Box::new(ExampleExtension::new(settings.clone())) as Box<dyn Component>),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_component::{CreateSettings, NopHost};
    use conflux_config::Kind;

    #[tokio::test]
    async fn test_example_extension_lifecycle() {
        let factory = example_extension_factory();
        let settings = factory.create_default_config();
        let typed = settings.downcast_ref::<ExampleExtensionConfig>().unwrap();
        assert_eq!(typed.extra, DEFAULT_EXTRA);
        assert!(typed.extra_map.is_none());

        let mut extension = factory
            .create(
                &CreateSettings::new(Kind::Extension, settings.id().clone()),
                settings.as_ref(),
            )
            .unwrap();
        let cancel = CancellationToken::new();
        extension.start(&cancel, &NopHost).await.unwrap();
        extension.shutdown(&cancel).await.unwrap();
    }
}
