//! Untyped hierarchical configuration as produced by sources

use serde_json::Value;

/// Raw configuration: a nested key/value map
pub type RawMap = serde_json::Map<String, Value>;

/// Merge `overlay` into `base`. Maps merge key by key, recursively; any
/// other value in `overlay` replaces the one in `base`.
pub fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(overlay) if base.is_object() => {
            if let Value::Object(base) = base {
                merge_maps(base, overlay);
            }
        }
        overlay => *base = overlay,
    }
}

/// Merge `overlay` into `base` key by key
pub fn merge_maps(base: &mut RawMap, overlay: RawMap) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Overlay configured values onto serialized defaults.
///
/// Like [`merge_value`], except that a `null` in `overlay` leaves the default
/// in place, at any depth. A YAML key with no value therefore means "unset".
pub fn overlay_defaults(defaults: &mut Value, overlay: Value) {
    match overlay {
        Value::Null => {}
        Value::Object(overlay) if defaults.is_object() => {
            if let Value::Object(defaults) = defaults {
                for (key, value) in overlay {
                    match defaults.get_mut(&key) {
                        Some(existing) => overlay_defaults(existing, value),
                        None if value.is_null() => {}
                        None => {
                            defaults.insert(key, value);
                        }
                    }
                }
            }
        }
        overlay => *defaults = overlay,
    }
}

/// Human readable name of a value's shape, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
