//! Provider settings and environment variable handling

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use conflux_config::{ConfigError, ConfigResult, ConfigSource, FileSource};

use crate::unmarshaler::{DefaultUnmarshaler, UnknownKeys, Unmarshaler};

/// Default prefix of the environment variables read by [`ProviderSettings::from_env`]
pub const ENV_PREFIX: &str = "CONFLUX";

/// Everything a [`crate::ConfigProvider`] is built from
#[derive(Clone)]
pub struct ProviderSettings {
    /// Sources in merge order; later sources override earlier ones
    pub sources: Vec<Arc<dyn ConfigSource>>,
    pub unmarshaler: Arc<dyn Unmarshaler>,
    /// Expand `${VAR}` references in string values before decoding
    pub expand_env: bool,
}

impl ProviderSettings {
    /// Settings with no sources, the strict default unmarshaler and env expansion on
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            unmarshaler: Arc::new(DefaultUnmarshaler::strict()),
            expand_env: true,
        }
    }

    /// Settings reading YAML files at `locations`, optionally watching them
    pub fn from_locations<P: AsRef<Path>>(
        locations: impl IntoIterator<Item = P>,
        watch: bool,
    ) -> ConfigResult<Self> {
        let mut settings = Self::new();
        for location in locations {
            let source = if watch {
                FileSource::watching(location)?
            } else {
                FileSource::new(location)
            };
            settings.sources.push(Arc::new(source));
        }
        Ok(settings)
    }

    /// Settings from `CONFLUX_*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Settings from environment variables with a custom prefix:
    /// - `<PREFIX>_CONFIG`: comma-separated file locations (required)
    /// - `<PREFIX>_CONFIG_WATCH`: watch the files for changes
    /// - `<PREFIX>_EXPAND_ENV`: expand env references in values
    /// - `<PREFIX>_UNKNOWN_KEYS`: `reject` or `ignore`
    pub fn from_env_with_prefix(prefix: &str) -> ConfigResult<Self> {
        let env = EnvReader { prefix };

        let locations = env.get("CONFIG").ok_or_else(|| {
            ConfigError::InvalidSettings(format!("{}_CONFIG is not set", prefix))
        })?;
        let locations: Vec<&str> = locations
            .split(',')
            .map(str::trim)
            .filter(|location| !location.is_empty())
            .collect();
        if locations.is_empty() {
            return Err(ConfigError::InvalidSettings(format!(
                "{}_CONFIG lists no locations",
                prefix
            )));
        }

        let watch = env.parse_or("CONFIG_WATCH", false)?;
        let mut settings = Self::from_locations(locations, watch)?;
        settings.expand_env = env.parse_or("EXPAND_ENV", true)?;
        let unknown_keys: UnknownKeys = env.parse_or("UNKNOWN_KEYS", UnknownKeys::Reject)?;
        settings.unmarshaler = Arc::new(DefaultUnmarshaler::new(unknown_keys));

        Ok(settings)
    }

    /// Append a source; it overrides every source added before it
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn with_unmarshaler(mut self, unmarshaler: impl Unmarshaler + 'static) -> Self {
        self.unmarshaler = Arc::new(unmarshaler);
        self
    }

    pub fn with_expand_env(mut self, expand_env: bool) -> Self {
        self.expand_env = expand_env;
        self
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locations: Vec<&str> = self.sources.iter().map(|source| source.location()).collect();
        f.debug_struct("ProviderSettings")
            .field("sources", &locations)
            .field("expand_env", &self.expand_env)
            .finish_non_exhaustive()
    }
}

struct EnvReader<'a> {
    prefix: &'a str,
}

impl EnvReader<'_> {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn parse_or<T>(&self, name: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            Some(value) => value.trim().parse().map_err(|e| {
                ConfigError::InvalidSettings(format!("Invalid {}_{}: {}", self.prefix, name, e))
            }),
            None => Ok(default),
        }
    }
}
