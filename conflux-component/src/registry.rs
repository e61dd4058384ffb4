//! Factory registry mapping component types to their factories

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use conflux_config::{AnySettings, Kind};
use tokio_util::sync::CancellationToken;

use crate::component::Component;
use crate::error::{ComponentError, ComponentResult};
use crate::factory::{CreateSettings, Factory};

/// Registry of component factories, keyed by category and type.
///
/// Built once at startup and read-only afterwards; share it behind an `Arc`
/// for concurrent lookups.
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    factories: HashMap<Kind, BTreeMap<String, Arc<Factory>>>,
}

impl FactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from factories, failing on the first duplicate type
    pub fn from_factories(factories: impl IntoIterator<Item = Factory>) -> ComponentResult<Self> {
        let mut registry = Self::new();
        for factory in factories {
            registry.register(factory)?;
        }
        Ok(registry)
    }

    /// Register a factory. A type already registered for the same category
    /// is rejected and the existing factory stays in place.
    pub fn register(&mut self, factory: Factory) -> ComponentResult<()> {
        let kind = factory.kind();
        let types = self.factories.entry(kind).or_default();

        if types.contains_key(factory.component_type()) {
            return Err(ComponentError::DuplicateType {
                kind,
                component_type: factory.component_type().to_string(),
            });
        }

        tracing::debug!(
            target: "factory_registry",
            kind = %kind,
            component_type = %factory.component_type(),
            "Factory registered"
        );

        types.insert(factory.component_type().to_string(), Arc::new(factory));
        Ok(())
    }

    /// Look up the factory for a component type
    pub fn lookup(&self, kind: Kind, component_type: &str) -> ComponentResult<Arc<Factory>> {
        self.factories
            .get(&kind)
            .and_then(|types| types.get(component_type))
            .cloned()
            .ok_or_else(|| ComponentError::NotFound {
                kind,
                component_type: component_type.to_string(),
            })
    }

    /// A newly allocated default configuration for a component type
    pub fn create_default_config(
        &self,
        kind: Kind,
        component_type: &str,
    ) -> ComponentResult<Box<dyn AnySettings>> {
        Ok(self.lookup(kind, component_type)?.create_default_config())
    }

    /// Create a component of type `component_type` from resolved settings.
    ///
    /// The settings must declare the same type, and must have been produced
    /// from the factory's default configuration.
    pub fn create_component(
        &self,
        cancel: &CancellationToken,
        component_type: &str,
        set: &CreateSettings,
        settings: &dyn AnySettings,
    ) -> ComponentResult<Box<dyn Component>> {
        let kind = set.kind;
        if cancel.is_cancelled() {
            return Err(ComponentError::Canceled {
                kind,
                id: settings.id().clone(),
            });
        }

        let factory = self.lookup(kind, component_type)?;
        if settings.id().component_type() != factory.component_type() {
            return Err(ComponentError::TypeMismatch {
                kind,
                id: settings.id().clone(),
                expected: factory.component_type().to_string(),
                found: settings.id().component_type().to_string(),
            });
        }

        let _entered = set.span.enter();
        let component = factory.create(set, settings)?;
        tracing::debug!(
            target: "factory_registry",
            kind = %kind,
            id = %settings.id(),
            "Component created"
        );
        Ok(component)
    }

    /// Registered types of a category, in lexical order
    pub fn types(&self, kind: Kind) -> Vec<&str> {
        self.factories
            .get(&kind)
            .map(|types| types.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Total number of registered factories
    pub fn len(&self) -> usize {
        self.factories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use conflux_config::{ComponentId, ComponentSettings, SpecificSettings};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        label: String,
    }

    impl SpecificSettings for TestConfig {}

    fn test_factory(kind: Kind, component_type: &str, label: &'static str) -> Factory {
        Factory::new(
            kind,
            component_type,
            move || TestConfig {
                label: label.to_string(),
            },
            |_set, _settings| Ok(Box::new(Lifecycle::nop()) as Box<dyn Component>),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FactoryRegistry::new();
        registry
            .register(test_factory(Kind::Receiver, "otlp", "first"))
            .unwrap();

        let factory = registry.lookup(Kind::Receiver, "otlp").unwrap();
        assert_eq!(factory.component_type(), "otlp");

        let err = registry.lookup(Kind::Exporter, "otlp").unwrap_err();
        assert!(matches!(err, ComponentError::NotFound { kind: Kind::Exporter, .. }));
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = FactoryRegistry::new();
        registry
            .register(test_factory(Kind::Receiver, "otlp", "first"))
            .unwrap();

        let err = registry
            .register(test_factory(Kind::Receiver, "otlp", "second"))
            .unwrap_err();
        assert!(matches!(err, ComponentError::DuplicateType { .. }));

        let default = registry.create_default_config(Kind::Receiver, "otlp").unwrap();
        assert_eq!(default.downcast_ref::<TestConfig>().unwrap().label, "first");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_type_in_different_categories() {
        let registry = FactoryRegistry::from_factories([
            test_factory(Kind::Receiver, "otlp", "receiver"),
            test_factory(Kind::Exporter, "otlp", "exporter"),
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.types(Kind::Receiver), vec!["otlp"]);
    }

    #[test]
    fn test_default_configs_are_independent() {
        let registry =
            FactoryRegistry::from_factories([test_factory(Kind::Extension, "health", "default")])
                .unwrap();

        let mut first = registry.create_default_config(Kind::Extension, "health").unwrap();
        let second = registry.create_default_config(Kind::Extension, "health").unwrap();
        first.settings_mut().enabled = false;

        assert!(second.settings().enabled);
        assert!(!first.settings().enabled);
    }

    #[test]
    fn test_create_component_checks_declared_type() {
        let registry = FactoryRegistry::from_factories([
            test_factory(Kind::Exporter, "debug", "a"),
            test_factory(Kind::Exporter, "otlp", "b"),
        ])
        .unwrap();
        let cancel = CancellationToken::new();

        let id = ComponentId::with_name("debug", "verbose");
        let settings = ComponentSettings::new(
            id.clone(),
            TestConfig {
                label: "x".to_string(),
            },
        );
        let set = CreateSettings::new(Kind::Exporter, id);

        assert!(registry
            .create_component(&cancel, "debug", &set, &settings)
            .is_ok());

        let err = registry
            .create_component(&cancel, "otlp", &set, &settings)
            .err()
            .unwrap();
        assert!(matches!(err, ComponentError::TypeMismatch { .. }));
    }

    #[test]
    fn test_create_component_honours_cancellation() {
        let registry =
            FactoryRegistry::from_factories([test_factory(Kind::Exporter, "debug", "a")]).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let id = ComponentId::new("debug");
        let settings = ComponentSettings::new(
            id.clone(),
            TestConfig {
                label: "x".to_string(),
            },
        );
        let err = registry
            .create_component(&cancel, "debug", &CreateSettings::new(Kind::Exporter, id), &settings)
            .err()
            .unwrap();
        assert!(matches!(err, ComponentError::Canceled { .. }));
    }
}
