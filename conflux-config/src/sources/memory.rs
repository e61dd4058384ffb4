//! In-memory source

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

use super::ConfigSource;
use crate::error::{ConfigError, ConfigResult};
use crate::raw::{value_kind, RawMap};

/// Serves a fixed raw map. Retrieval fails once the source is closed.
#[derive(Debug)]
pub struct StaticSource {
    location: String,
    raw: RawMap,
    closed: AtomicBool,
}

impl StaticSource {
    pub fn new(raw: RawMap) -> Self {
        Self {
            location: "memory".to_string(),
            raw,
            closed: AtomicBool::new(false),
        }
    }

    /// Build from a JSON value whose top level must be a map
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(raw) => Ok(Self::new(raw)),
            other => Err(ConfigError::source_error(
                "memory",
                format!("top level must be a map, got {}", value_kind(&other)),
            )),
        }
    }

    /// Build from YAML text
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::source_error("memory", e))?;
        match value {
            Value::Null => Ok(Self::new(RawMap::new())),
            value => Self::from_value(value),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for StaticSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn retrieve(&self) -> ConfigResult<RawMap> {
        if self.is_closed() {
            return Err(ConfigError::source_error(&self.location, "source is closed"));
        }
        Ok(self.raw.clone())
    }

    async fn close(&self) -> ConfigResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
