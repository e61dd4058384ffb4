//! Common settings and their composition with component-specific fields
//!
//! Every configured component is represented by a [`ComponentSettings<T>`]:
//! the common [`Settings`] shared by all components plus the component's own
//! fields `T`. Both parts are decoded from one flat key namespace, so a key
//! may belong to exactly one of them.
//!
//! The registry and provider work with the type-erased [`AnySettings`], which
//! is implemented for every `ComponentSettings<T>`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::id::ComponentId;
use crate::raw::RawMap;

/// Settings shared by every component, whatever its category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    id: ComponentId,
    /// Whether the component takes part in the running configuration
    pub enabled: bool,
}

/// Decodable part of [`Settings`]; the id comes from the section key
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommonFields {
    enabled: bool,
}

impl Settings {
    /// Keys owned by the common settings in a component section
    pub const KEYS: &'static [&'static str] = &["enabled"];

    /// Create common settings for a component id
    pub fn new(id: ComponentId) -> Self {
        Self { id, enabled: true }
    }

    /// Id of the component these settings belong to
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Replace the id, used when a default object is bound to a declared id
    pub fn set_id(&mut self, id: ComponentId) {
        self.id = id;
    }

    /// Apply explicitly configured common keys over the current values
    pub fn apply(&mut self, fields: RawMap) -> Result<(), serde_json::Error> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut current = serde_json::to_value(CommonFields {
            enabled: self.enabled,
        })?;
        crate::raw::overlay_defaults(&mut current, Value::Object(fields));

        let decoded: CommonFields = serde_json::from_value(current)?;
        self.enabled = decoded.enabled;
        Ok(())
    }
}

/// Component-specific configuration fields.
///
/// Implementors must serialize to a map whose keys are exactly the keys the
/// component accepts; the default value's serialized form is the base the
/// configured section is merged over.
pub trait SpecificSettings:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Semantic validation, run after every section has been decoded
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Typed settings of one component: common settings plus specific fields
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSettings<T> {
    pub settings: Settings,
    pub specific: T,
}

impl<T: SpecificSettings> ComponentSettings<T> {
    pub fn new(id: ComponentId, specific: T) -> Self {
        Self {
            settings: Settings::new(id),
            specific,
        }
    }

    pub fn id(&self) -> &ComponentId {
        self.settings.id()
    }
}

impl<T> Deref for ComponentSettings<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.specific
    }
}

impl<T> DerefMut for ComponentSettings<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.specific
    }
}

/// Type-erased view of a [`ComponentSettings<T>`]
pub trait AnySettings: Any + fmt::Debug + Send + Sync {
    /// Common settings
    fn settings(&self) -> &Settings;

    /// Mutable common settings
    fn settings_mut(&mut self) -> &mut Settings;

    /// Serialized form of the specific fields
    fn specific_value(&self) -> Result<Value, serde_json::Error>;

    /// Build a new settings object of the same concrete type from common
    /// settings and a serialized form of the specific fields
    fn with_specific_value(
        &self,
        settings: Settings,
        value: Value,
    ) -> Result<Box<dyn AnySettings>, serde_json::Error>;

    /// Semantic validation of the specific fields
    fn validate(&self) -> Result<(), String>;

    fn clone_box(&self) -> Box<dyn AnySettings>;

    fn as_any(&self) -> &dyn Any;

    /// Rust type name of the specific fields
    fn type_name(&self) -> &'static str;
}

impl<T: SpecificSettings> AnySettings for ComponentSettings<T> {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn specific_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.specific)
    }

    fn with_specific_value(
        &self,
        settings: Settings,
        value: Value,
    ) -> Result<Box<dyn AnySettings>, serde_json::Error> {
        let specific: T = serde_json::from_value(value)?;
        Ok(Box::new(ComponentSettings { settings, specific }))
    }

    fn validate(&self) -> Result<(), String> {
        self.specific.validate()
    }

    fn clone_box(&self) -> Box<dyn AnySettings> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<'a> dyn AnySettings + 'a {
    /// Id of the component these settings belong to
    pub fn id(&self) -> &ComponentId {
        self.settings().id()
    }

    /// Downcast to the typed settings of a known component
    pub fn downcast_ref<T: SpecificSettings>(&self) -> Option<&ComponentSettings<T>> {
        self.as_any().downcast_ref::<ComponentSettings<T>>()
    }
}

impl Clone for Box<dyn AnySettings> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestFields {
        endpoint: String,
    }

    impl SpecificSettings for TestFields {
        fn validate(&self) -> Result<(), String> {
            if self.endpoint.is_empty() {
                return Err("endpoint cannot be empty".to_string());
            }
            Ok(())
        }
    }

    fn test_settings() -> ComponentSettings<TestFields> {
        ComponentSettings::new(
            ComponentId::new("test"),
            TestFields {
                endpoint: "localhost:4317".to_string(),
            },
        )
    }

    #[test]
    fn test_common_settings_apply() {
        let mut settings = Settings::new(ComponentId::new("test"));
        assert!(settings.enabled);

        let mut fields = RawMap::new();
        fields.insert("enabled".to_string(), json!(false));
        settings.apply(fields).unwrap();
        assert!(!settings.enabled);

        let mut unset = RawMap::new();
        unset.insert("enabled".to_string(), Value::Null);
        settings.apply(unset).unwrap();
        assert!(!settings.enabled);

        let mut invalid = RawMap::new();
        invalid.insert("enabled".to_string(), json!("sometimes"));
        assert!(settings.apply(invalid).is_err());
    }

    #[test]
    fn test_erased_round_trip_keeps_concrete_type() {
        let erased: Box<dyn AnySettings> = Box::new(test_settings());
        assert_eq!(erased.id(), &ComponentId::new("test"));

        let rebuilt = erased
            .with_specific_value(
                Settings::new(ComponentId::with_name("test", "b")),
                json!({"endpoint": "remote:4317"}),
            )
            .unwrap();

        let typed = rebuilt.downcast_ref::<TestFields>().unwrap();
        assert_eq!(typed.endpoint, "remote:4317");
        assert_eq!(typed.id().to_string(), "test/b");
    }

    #[test]
    fn test_validation_delegates_to_specific_fields() {
        let mut settings = test_settings();
        assert!(AnySettings::validate(&settings).is_ok());

        settings.endpoint.clear();
        let erased: Box<dyn AnySettings> = Box::new(settings);
        assert_eq!(erased.validate().unwrap_err(), "endpoint cannot be empty");
    }

    #[test]
    fn test_downcast_to_wrong_type_fails() {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        struct Other {}
        impl SpecificSettings for Other {}

        let erased: Box<dyn AnySettings> = Box::new(test_settings());
        assert!(erased.downcast_ref::<Other>().is_none());
    }
}
