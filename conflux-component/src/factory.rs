//! Component factories

use std::fmt;

use conflux_config::{AnySettings, ComponentId, ComponentSettings, Kind, SpecificSettings};

use crate::component::Component;
use crate::error::{BoxError, ComponentError, ComponentResult};

/// Build metadata handed to every created component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub command: String,
    pub description: String,
    pub version: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            command: "conflux".to_string(),
            description: "Conflux component host".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Settings for one component creation call
#[derive(Debug, Clone)]
pub struct CreateSettings {
    pub kind: Kind,
    pub id: ComponentId,
    /// Span the component should log under
    pub span: tracing::Span,
    pub build_info: BuildInfo,
}

impl CreateSettings {
    pub fn new(kind: Kind, id: ComponentId) -> Self {
        let span = tracing::info_span!("component", kind = %kind, id = %id);
        Self {
            kind,
            id,
            span,
            build_info: BuildInfo::default(),
        }
    }

    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = build_info;
        self
    }
}

type DefaultConfigFn = Box<dyn Fn() -> Box<dyn AnySettings> + Send + Sync>;
type CreateFn =
    Box<dyn Fn(&CreateSettings, &dyn AnySettings) -> ComponentResult<Box<dyn Component>> + Send + Sync>;

/// Default-config constructor and creation function for one component type.
///
/// The default-config constructor must build a new value on every call; the
/// provider mutates the returned object while decoding.
pub struct Factory {
    kind: Kind,
    component_type: String,
    default_config: DefaultConfigFn,
    create: CreateFn,
}

impl Factory {
    /// Create a factory for component type `component_type` of category `kind`
    pub fn new<T, D, C>(kind: Kind, component_type: impl Into<String>, default_config: D, create: C) -> Self
    where
        T: SpecificSettings,
        D: Fn() -> T + Send + Sync + 'static,
        C: Fn(&CreateSettings, &ComponentSettings<T>) -> Result<Box<dyn Component>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        let component_type = component_type.into();
        let make_default = default_config;
        let make_component = create;

        let default_id = ComponentId::new(component_type.clone());
        let default_config: DefaultConfigFn = Box::new(move || {
            Box::new(ComponentSettings::new(default_id.clone(), make_default())) as Box<dyn AnySettings>
        });

        let create: CreateFn = Box::new(
            move |set: &CreateSettings,
                  settings: &dyn AnySettings|
                  -> ComponentResult<Box<dyn Component>> {
                let typed = settings
                    .downcast_ref::<T>()
                    .ok_or_else(|| ComponentError::TypeMismatch {
                        kind,
                        id: settings.id().clone(),
                        expected: std::any::type_name::<T>().to_string(),
                        found: settings.type_name().to_string(),
                    })?;

                make_component(set, typed).map_err(|source| ComponentError::Create {
                    kind,
                    id: typed.id().clone(),
                    source,
                })
            },
        );

        Self {
            kind,
            component_type,
            default_config,
            create,
        }
    }

    /// Create an extension factory
    pub fn extension<T, D, C>(component_type: impl Into<String>, default_config: D, create: C) -> Self
    where
        T: SpecificSettings,
        D: Fn() -> T + Send + Sync + 'static,
        C: Fn(&CreateSettings, &ComponentSettings<T>) -> Result<Box<dyn Component>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Kind::Extension, component_type, default_config, create)
    }

    /// Create a receiver factory
    pub fn receiver<T, D, C>(component_type: impl Into<String>, default_config: D, create: C) -> Self
    where
        T: SpecificSettings,
        D: Fn() -> T + Send + Sync + 'static,
        C: Fn(&CreateSettings, &ComponentSettings<T>) -> Result<Box<dyn Component>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Kind::Receiver, component_type, default_config, create)
    }

    /// Create a processor factory
    pub fn processor<T, D, C>(component_type: impl Into<String>, default_config: D, create: C) -> Self
    where
        T: SpecificSettings,
        D: Fn() -> T + Send + Sync + 'static,
        C: Fn(&CreateSettings, &ComponentSettings<T>) -> Result<Box<dyn Component>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Kind::Processor, component_type, default_config, create)
    }

    /// Create an exporter factory
    pub fn exporter<T, D, C>(component_type: impl Into<String>, default_config: D, create: C) -> Self
    where
        T: SpecificSettings,
        D: Fn() -> T + Send + Sync + 'static,
        C: Fn(&CreateSettings, &ComponentSettings<T>) -> Result<Box<dyn Component>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Kind::Exporter, component_type, default_config, create)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// A newly allocated default configuration, with the unnamed id of this type
    pub fn create_default_config(&self) -> Box<dyn AnySettings> {
        (self.default_config)()
    }

    /// Create a component from settings produced by this factory's default config
    pub fn create(
        &self,
        set: &CreateSettings,
        settings: &dyn AnySettings,
    ) -> ComponentResult<Box<dyn Component>> {
        (self.create)(set, settings)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("kind", &self.kind)
            .field("component_type", &self.component_type)
            .finish_non_exhaustive()
    }
}
