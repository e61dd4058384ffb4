//! Decoding raw component sections into typed settings

use serde_json::Value;

use conflux_config::raw::overlay_defaults;
use conflux_config::{AnySettings, ConfigError, ConfigResult, DecodeError, Kind, RawMap, Settings};

/// Strategy decoding one raw component section over a default settings object.
///
/// `default` is a fresh object from the component's factory, already bound to
/// the declared id. Errors are returned to the caller of
/// [`crate::ConfigProvider::get`] unchanged.
pub trait Unmarshaler: Send + Sync {
    fn unmarshal(
        &self,
        kind: Kind,
        section: &RawMap,
        default: Box<dyn AnySettings>,
    ) -> ConfigResult<Box<dyn AnySettings>>;
}

impl<F> Unmarshaler for F
where
    F: Fn(Kind, &RawMap, Box<dyn AnySettings>) -> ConfigResult<Box<dyn AnySettings>> + Send + Sync,
{
    fn unmarshal(
        &self,
        kind: Kind,
        section: &RawMap,
        default: Box<dyn AnySettings>,
    ) -> ConfigResult<Box<dyn AnySettings>> {
        self(kind, section, default)
    }
}

/// Policy for keys neither the common nor the component settings declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Fail the decode
    #[default]
    Reject,
    /// Log a warning and drop them
    Ignore,
}

impl std::str::FromStr for UnknownKeys {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" | "strict" => Ok(Self::Reject),
            "ignore" | "lenient" => Ok(Self::Ignore),
            other => Err(format!("unknown key policy '{}', expected reject or ignore", other)),
        }
    }
}

/// Decodes a section over the serialized default, field by field.
///
/// Common keys ([`Settings::KEYS`]) and the component's own keys share the
/// section's namespace. Maps are merged recursively into the defaults, so
/// fields the section leaves out or sets to `null` keep their default values.
///
/// Unknown keys are detected at every depth: a configured key path that the
/// decoded settings do not carry is reported by its full path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUnmarshaler {
    unknown_keys: UnknownKeys,
}

impl DefaultUnmarshaler {
    pub fn new(unknown_keys: UnknownKeys) -> Self {
        Self { unknown_keys }
    }

    /// Reject unknown keys
    pub fn strict() -> Self {
        Self::new(UnknownKeys::Reject)
    }

    /// Ignore unknown keys
    pub fn lenient() -> Self {
        Self::new(UnknownKeys::Ignore)
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    fn decode(
        &self,
        kind: Kind,
        section: &RawMap,
        default: &dyn AnySettings,
    ) -> Result<Box<dyn AnySettings>, DecodeError> {
        let mut specific = default.specific_value()?;
        let specific_keys: Vec<String> = match &specific {
            Value::Object(fields) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        };

        if let Some(key) = Settings::KEYS
            .iter()
            .find(|key| specific_keys.iter().any(|own| own.as_str() == **key))
        {
            return Err(DecodeError::KeyCollision {
                key: key.to_string(),
            });
        }

        let mut common = RawMap::new();
        let mut overlay = RawMap::new();
        let mut unknown = Vec::new();
        for (key, value) in section {
            if Settings::KEYS.contains(&key.as_str()) {
                common.insert(key.clone(), value.clone());
            } else if specific_keys.contains(key) {
                overlay.insert(key.clone(), value.clone());
            } else {
                unknown.push(key.clone());
            }
        }

        if !unknown.is_empty() && self.unknown_keys == UnknownKeys::Reject {
            unknown.sort();
            return Err(DecodeError::UnknownKeys { keys: unknown });
        }

        let mut settings = default.settings().clone();
        settings.apply(common)?;

        let overlay = Value::Object(overlay);
        if overlay.as_object().is_some_and(|fields| !fields.is_empty()) {
            overlay_defaults(&mut specific, overlay.clone());
        }
        let decoded = default.with_specific_value(settings, specific)?;

        // serde drops nested fields it does not know; whatever the decoded
        // value no longer carries was never consumed.
        let consumed = decoded.specific_value()?;
        unconsumed_paths("", &overlay, &consumed, &mut unknown);

        if !unknown.is_empty() {
            unknown.sort();
            match self.unknown_keys {
                UnknownKeys::Reject => return Err(DecodeError::UnknownKeys { keys: unknown }),
                UnknownKeys::Ignore => tracing::warn!(
                    target: "config_provider",
                    kind = %kind,
                    id = %default.id(),
                    keys = %unknown.join(", "),
                    "Ignoring unknown configuration keys"
                ),
            }
        }

        Ok(decoded)
    }
}

/// Collect the key paths of `configured` that `decoded` lacks, dotted for
/// nested maps and indexed for lists (`protocol.endpont`, `routes[1].nmae`).
/// `null` values are unset and never reported.
fn unconsumed_paths(prefix: &str, configured: &Value, decoded: &Value, paths: &mut Vec<String>) {
    match (configured, decoded) {
        (Value::Object(configured), Value::Object(decoded)) => {
            for (key, value) in configured {
                if value.is_null() {
                    continue;
                }
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                match decoded.get(key) {
                    Some(field) => unconsumed_paths(&path, value, field, paths),
                    None => paths.push(path),
                }
            }
        }
        (Value::Array(configured), Value::Array(decoded)) => {
            for (index, (value, field)) in configured.iter().zip(decoded).enumerate() {
                unconsumed_paths(&format!("{}[{}]", prefix, index), value, field, paths);
            }
        }
        _ => {}
    }
}

impl Unmarshaler for DefaultUnmarshaler {
    fn unmarshal(
        &self,
        kind: Kind,
        section: &RawMap,
        default: Box<dyn AnySettings>,
    ) -> ConfigResult<Box<dyn AnySettings>> {
        self.decode(kind, section, default.as_ref())
            .map_err(|source| ConfigError::Unmarshal {
                kind,
                id: default.id().clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_config::{ComponentId, ComponentSettings, SpecificSettings};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tls {
        insecure: bool,
        ca_file: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ClientConfig {
        endpoint: String,
        headers: BTreeMap<String, String>,
        tls: Tls,
    }

    impl SpecificSettings for ClientConfig {}

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Colliding {
        enabled: String,
    }

    impl SpecificSettings for Colliding {}

    fn default_client() -> Box<dyn AnySettings> {
        let mut headers = BTreeMap::new();
        headers.insert("x-team".to_string(), "core".to_string());
        Box::new(ComponentSettings::new(
            ComponentId::with_name("client", "a"),
            ClientConfig {
                endpoint: "localhost:4317".to_string(),
                headers,
                tls: Tls {
                    insecure: false,
                    ca_file: None,
                },
            },
        ))
    }

    fn section(value: Value) -> RawMap {
        match value {
            Value::Object(map) => map,
            other => panic!("not a map: {other}"),
        }
    }

    #[test]
    fn test_nested_fields_merge_over_defaults() {
        let raw = section(json!({
            "enabled": false,
            "headers": {"x-region": "eu"},
            "tls": {"ca_file": "/etc/ca.pem"}
        }));

        let decoded = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .unwrap();

        assert!(!decoded.settings().enabled);
        assert_eq!(decoded.id().to_string(), "client/a");
        let typed = decoded.downcast_ref::<ClientConfig>().unwrap();
        assert_eq!(typed.endpoint, "localhost:4317");
        assert_eq!(typed.headers.len(), 2);
        assert!(!typed.tls.insecure);
        assert_eq!(typed.tls.ca_file.as_deref(), Some("/etc/ca.pem"));
    }

    #[test]
    fn test_strict_rejects_unknown_keys() {
        let raw = section(json!({"endpoint": "remote:4317", "bogus": 1, "another": true}));

        let err = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .err()
            .unwrap();

        match err {
            ConfigError::Unmarshal {
                kind,
                id,
                source: DecodeError::UnknownKeys { keys },
            } => {
                assert_eq!(kind, Kind::Exporter);
                assert_eq!(id.to_string(), "client/a");
                assert_eq!(keys, vec!["another".to_string(), "bogus".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_rejects_nested_unknown_keys() {
        let raw = section(json!({
            "headers": {"x-region": "eu"},
            "tls": {"insecure": true, "ca_fiel": "/etc/ca.pem"}
        }));

        let err = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .err()
            .unwrap();
        match err {
            ConfigError::Unmarshal {
                source: DecodeError::UnknownKeys { keys },
                ..
            } => assert_eq!(keys, vec!["tls.ca_fiel".to_string()]),
            other => panic!("unexpected error: {other}"),
        }

        let decoded = DefaultUnmarshaler::lenient()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .unwrap();
        let typed = decoded.downcast_ref::<ClientConfig>().unwrap();
        assert!(typed.tls.insecure);
        assert_eq!(typed.tls.ca_file, None);
        assert_eq!(typed.headers.get("x-region").map(String::as_str), Some("eu"));
    }

    #[test]
    fn test_null_values_keep_defaults() {
        let raw = section(json!({"enabled": null, "endpoint": null, "headers": null, "tls": null}));

        let decoded = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .unwrap();

        assert!(decoded.settings().enabled);
        let typed = decoded.downcast_ref::<ClientConfig>().unwrap();
        assert_eq!(typed.endpoint, "localhost:4317");
        assert_eq!(typed.headers.get("x-team").map(String::as_str), Some("core"));
        assert!(!typed.tls.insecure);
    }

    #[test]
    fn test_lenient_ignores_unknown_keys() {
        let raw = section(json!({"endpoint": "remote:4317", "bogus": 1}));

        let decoded = DefaultUnmarshaler::lenient()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .unwrap();
        let typed = decoded.downcast_ref::<ClientConfig>().unwrap();
        assert_eq!(typed.endpoint, "remote:4317");
    }

    #[test]
    fn test_key_collision_is_reported() {
        let default: Box<dyn AnySettings> = Box::new(ComponentSettings::new(
            ComponentId::new("colliding"),
            Colliding {
                enabled: "yes".to_string(),
            },
        ));

        let err = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Receiver, &RawMap::new(), default)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::Unmarshal {
                source: DecodeError::KeyCollision { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_value_shape_fails() {
        let raw = section(json!({"headers": ["not", "a", "map"]}));
        let err = DefaultUnmarshaler::strict()
            .unmarshal(Kind::Exporter, &raw, default_client())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::Unmarshal {
                source: DecodeError::Serde(_),
                ..
            }
        ));
    }

    #[test]
    fn test_closure_unmarshaler() {
        let failing = |_kind: Kind, _section: &RawMap, _default: Box<dyn AnySettings>| {
            Err::<Box<dyn AnySettings>, _>(ConfigError::other("unmarshal_err"))
        };
        let err = failing
            .unmarshal(Kind::Extension, &RawMap::new(), default_client())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "unmarshal_err");
    }

    #[test]
    fn test_unknown_key_policy_from_str() {
        assert_eq!("reject".parse::<UnknownKeys>().unwrap(), UnknownKeys::Reject);
        assert_eq!("Ignore".parse::<UnknownKeys>().unwrap(), UnknownKeys::Ignore);
        assert!("sometimes".parse::<UnknownKeys>().is_err());
    }
}
