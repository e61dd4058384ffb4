//! Environment variable expansion in raw configuration values

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::raw::RawMap;

static ENV_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env reference pattern is valid")
});

/// Expand `${VAR}` and `$VAR` in every string value of `raw`, recursively.
/// `$$` yields a literal `$`; unset variables expand to an empty string.
/// Keys are left untouched.
pub fn expand_env(raw: &mut RawMap) {
    expand_map(raw, &|name: &str| std::env::var(name).ok());
}

fn expand_map(map: &mut RawMap, lookup: &dyn Fn(&str) -> Option<String>) {
    for value in map.values_mut() {
        expand_value(value, lookup);
    }
}

fn expand_value(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::String(text) => {
            if text.contains('$') {
                *text = expand_str(text, lookup);
            }
        }
        Value::Array(items) => {
            for item in items {
                expand_value(item, lookup);
            }
        }
        Value::Object(map) => expand_map(map, lookup),
        _ => {}
    }
}

fn expand_str(text: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    ENV_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| {
            match caps.get(1).or_else(|| caps.get(2)) {
                Some(name) => lookup(name.as_str()).unwrap_or_default(),
                None => "$".to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOST" => Some("collector.local".to_string()),
            "PORT" => Some("4317".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_both_forms() {
        assert_eq!(expand_str("${HOST}:$PORT", &lookup), "collector.local:4317");
    }

    #[test]
    fn test_escape_and_unset() {
        assert_eq!(expand_str("cost: $$5", &lookup), "cost: $5");
        assert_eq!(expand_str("[${MISSING}]", &lookup), "[]");
        assert_eq!(expand_str("no references", &lookup), "no references");
    }

    #[test]
    fn test_expand_nested_values_only() {
        let mut raw = json!({
            "exporters": {
                "$HOST": {"endpoint": "${HOST}:${PORT}", "headers": ["$PORT"], "retries": 3}
            }
        })
        .as_object()
        .cloned()
        .unwrap();

        expand_map(&mut raw, &lookup);

        assert_eq!(
            Value::Object(raw),
            json!({
                "exporters": {
                    "$HOST": {"endpoint": "collector.local:4317", "headers": ["4317"], "retries": 3}
                }
            })
        );
    }

    #[test]
    fn test_expand_env_reads_process_environment() {
        temp_env::with_var("CONFLUX_TEST_ENDPOINT", Some("example.com:55680"), || {
            let mut raw = json!({"receivers": {"otlp": {"endpoint": "$CONFLUX_TEST_ENDPOINT"}}})
                .as_object()
                .cloned()
                .unwrap();
            expand_env(&mut raw);
            assert_eq!(raw["receivers"]["otlp"]["endpoint"], "example.com:55680");
        });
    }
}
