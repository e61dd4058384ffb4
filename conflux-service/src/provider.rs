//! Configuration provider: raw sources in, validated typed [`Config`] out

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::select_all;
use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use conflux_component::{ComponentError, FactoryRegistry};
use conflux_config::config::Components;
use conflux_config::expand::expand_env;
use conflux_config::raw::{merge_maps, value_kind};
use conflux_config::{
    validate_config, AnySettings, ComponentId, Config, ConfigError, ConfigResult, ConfigSource,
    DecodeError, Kind, RawMap, Service,
};

use crate::settings::ProviderSettings;
use crate::unmarshaler::Unmarshaler;

/// Top-level section holding extension activation and pipelines
pub const SERVICE_SECTION: &str = "service";

/// Lifecycle state of a [`ConfigProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// No configuration resolved yet
    Created,
    /// At least one `get` succeeded
    Resolved,
    /// Terminal; every further `get` fails with [`ConfigError::Closed`]
    ShutDown,
}

/// Resolves raw configuration from its sources into a typed [`Config`]
/// using the factories of a [`FactoryRegistry`].
///
/// `get` can be called any number of times until `shutdown`. Shutdown is
/// terminal and idempotent.
pub struct ConfigProvider {
    sources: Vec<Arc<dyn ConfigSource>>,
    unmarshaler: Arc<dyn Unmarshaler>,
    expand_env: bool,
    state: RwLock<ProviderState>,
    /// Cancelled when shutdown starts, aborting in-flight resolutions
    closing: CancellationToken,
    watches: Vec<SourceWatch>,
}

/// Change notifications of one watchable source and the last generation
/// a caller has been told about
struct SourceWatch {
    changes: watch::Receiver<u64>,
    seen: AtomicU64,
}

impl SourceWatch {
    fn new(changes: watch::Receiver<u64>) -> Self {
        let seen = *changes.borrow();
        Self {
            changes,
            seen: AtomicU64::new(seen),
        }
    }

    fn mark_seen(&self) {
        self.seen.store(*self.changes.borrow(), Ordering::SeqCst);
    }
}

/// Resolve once the generation differs from `seen`, including when it already does
async fn changed_since(
    mut changes: watch::Receiver<u64>,
    seen: u64,
) -> Result<u64, watch::error::RecvError> {
    loop {
        let generation = *changes.borrow_and_update();
        if generation != seen {
            return Ok(generation);
        }
        changes.changed().await?;
    }
}

impl ConfigProvider {
    /// Create a provider; at least one source is required
    pub fn new(settings: ProviderSettings) -> ConfigResult<Self> {
        if settings.sources.is_empty() {
            return Err(ConfigError::InvalidSettings(
                "at least one configuration source is required".to_string(),
            ));
        }

        let watches = settings
            .sources
            .iter()
            .filter_map(|source| source.watch())
            .map(SourceWatch::new)
            .collect();

        Ok(Self {
            watches,
            sources: settings.sources,
            unmarshaler: settings.unmarshaler,
            expand_env: settings.expand_env,
            state: RwLock::new(ProviderState::Created),
            closing: CancellationToken::new(),
        })
    }

    pub async fn state(&self) -> ProviderState {
        *self.state.read().await
    }

    /// Retrieve, decode and validate the configuration.
    ///
    /// Components are processed category by category in [`Kind::COMPONENTS`]
    /// order and by id within a category, so the first error reported is
    /// always the same for the same input. Nothing partial is returned on
    /// failure.
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        registry: &FactoryRegistry,
    ) -> ConfigResult<Config> {
        self.ensure_open().await?;

        // Changes from here on are reported by the next wait_for_change
        for watch in &self.watches {
            watch.mark_seen();
        }

        let mut raw = self.retrieve(cancel).await?;
        if self.expand_env {
            expand_env(&mut raw);
        }

        let config = self.resolve(cancel, registry, raw)?;

        let mut state = self.state.write().await;
        if *state == ProviderState::ShutDown {
            return Err(ConfigError::Closed);
        }
        if cancel.is_cancelled() {
            return Err(ConfigError::Canceled);
        }
        *state = ProviderState::Resolved;

        info!(
            target: "config_provider",
            components = config.len(),
            pipelines = config.service.pipelines.len(),
            "Configuration resolved"
        );
        Ok(config)
    }

    /// Release every resource held by the sources.
    ///
    /// Every source is closed even when some fail; failures are returned
    /// together as [`ConfigError::Shutdown`]. Calling this again is a no-op.
    pub async fn shutdown(&self, cancel: &CancellationToken) -> ConfigResult<()> {
        {
            let mut state = self.state.write().await;
            if *state == ProviderState::ShutDown {
                debug!(target: "config_provider", "Provider already shut down");
                return Ok(());
            }
            *state = ProviderState::ShutDown;
        }
        self.closing.cancel();

        let mut errors = Vec::new();
        for source in &self.sources {
            let closed = tokio::select! {
                biased;
                result = source.close() => result,
                _ = cancel.cancelled() => Err(ConfigError::Canceled),
            };
            if let Err(e) = closed {
                warn!(
                    target: "config_provider",
                    location = source.location(),
                    error = %e,
                    "Failed to close config source"
                );
                errors.push(e);
            }
        }

        if errors.is_empty() {
            info!(target: "config_provider", "Configuration provider shut down");
            Ok(())
        } else {
            Err(ConfigError::Shutdown(errors))
        }
    }

    /// Wait until any watched source reports a change.
    ///
    /// A change made since the last [`Self::get`] (or the last return of this
    /// method) is reported immediately. The provider does not reload by
    /// itself; call [`Self::get`] again once this returns.
    pub async fn wait_for_change(&self, cancel: &CancellationToken) -> ConfigResult<()> {
        self.ensure_open().await?;

        if self.watches.is_empty() {
            return Err(ConfigError::InvalidSettings(
                "no configuration source supports watching".to_string(),
            ));
        }

        let changed = select_all(self.watches.iter().map(|watch| {
            Box::pin(changed_since(
                watch.changes.clone(),
                watch.seen.load(Ordering::SeqCst),
            ))
        }));
        tokio::select! {
            biased;
            _ = self.closing.cancelled() => Err(ConfigError::Closed),
            _ = cancel.cancelled() => Err(ConfigError::Canceled),
            (result, index, _) = changed => {
                let generation = result.map_err(|_| ConfigError::Closed)?;
                self.watches[index].seen.store(generation, Ordering::SeqCst);
                debug!(target: "config_provider", generation, "Configuration change observed");
                Ok(())
            }
        }
    }

    async fn ensure_open(&self) -> ConfigResult<()> {
        if *self.state.read().await == ProviderState::ShutDown {
            return Err(ConfigError::Closed);
        }
        Ok(())
    }

    fn check_interrupted(&self, cancel: &CancellationToken) -> ConfigResult<()> {
        if self.closing.is_cancelled() {
            return Err(ConfigError::Closed);
        }
        if cancel.is_cancelled() {
            return Err(ConfigError::Canceled);
        }
        Ok(())
    }

    /// Raw maps of every source merged in order
    async fn retrieve(&self, cancel: &CancellationToken) -> ConfigResult<RawMap> {
        let mut merged = RawMap::new();
        for source in &self.sources {
            let raw = tokio::select! {
                biased;
                _ = self.closing.cancelled() => return Err(ConfigError::Closed),
                _ = cancel.cancelled() => return Err(ConfigError::Canceled),
                raw = source.retrieve() => raw?,
            };
            debug!(
                target: "config_provider",
                location = source.location(),
                sections = raw.len(),
                "Retrieved raw configuration"
            );
            merge_maps(&mut merged, raw);
        }
        Ok(merged)
    }

    fn resolve(
        &self,
        cancel: &CancellationToken,
        registry: &FactoryRegistry,
        mut raw: RawMap,
    ) -> ConfigResult<Config> {
        let service = raw.remove(SERVICE_SECTION);
        if let Some(section) = raw.keys().find(|key| Kind::from_section(key).is_none()) {
            return Err(ConfigError::UnknownSection(section.clone()));
        }

        let mut config = Config::default();
        for kind in Kind::COMPONENTS {
            let Some(section) = raw.remove(kind.section()) else {
                continue;
            };

            let mut resolved = Components::new();
            for (id, value) in declared_components(kind, section)? {
                self.check_interrupted(cancel)?;
                let settings = self.resolve_component(registry, kind, &id, value)?;
                resolved.insert(id, settings);
            }

            if let Some(components) = config.components_mut(kind) {
                *components = resolved;
            }
        }

        config.service = decode_service(service)?;
        self.check_interrupted(cancel)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn resolve_component(
        &self,
        registry: &FactoryRegistry,
        kind: Kind,
        id: &ComponentId,
        value: Value,
    ) -> ConfigResult<Box<dyn AnySettings>> {
        let mut default = registry
            .create_default_config(kind, id.component_type())
            .map_err(|e| match e {
                ComponentError::NotFound { .. } => ConfigError::UnknownComponentType {
                    kind,
                    id: id.clone(),
                },
                other => ConfigError::other(other.to_string()),
            })?;
        default.settings_mut().set_id(id.clone());

        let section = match value {
            Value::Null => RawMap::new(),
            Value::Object(section) => section,
            other => {
                return Err(ConfigError::Unmarshal {
                    kind,
                    id: id.clone(),
                    source: DecodeError::NotAMap {
                        found: value_kind(&other),
                    },
                })
            }
        };

        debug!(target: "config_provider", kind = %kind, id = %id, "Decoding component settings");
        self.unmarshaler.unmarshal(kind, &section, default)
    }
}

/// Declared ids of one category section, in id order
fn declared_components(
    kind: Kind,
    section: Value,
) -> ConfigResult<BTreeMap<ComponentId, Value>> {
    let entries = match section {
        Value::Null => RawMap::new(),
        Value::Object(entries) => entries,
        other => {
            return Err(ConfigError::InvalidSection {
                section: kind.section().to_string(),
                reason: format!("expected a map, got {}", value_kind(&other)),
            })
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let id = ComponentId::parse(&key).map_err(|reason| ConfigError::InvalidComponentId {
                kind,
                id: key.clone(),
                reason,
            })?;
            Ok((id, value))
        })
        .collect()
}

fn decode_service(section: Option<Value>) -> ConfigResult<Service> {
    match section {
        None | Some(Value::Null) => Ok(Service::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| ConfigError::InvalidSection {
            section: SERVICE_SECTION.to_string(),
            reason: e.to_string(),
        }),
    }
}
