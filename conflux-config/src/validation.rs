//! Structural and semantic validation of a resolved configuration

use std::collections::HashSet;

use crate::config::{Config, Pipeline};
use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::id::{ComponentId, Kind};

/// Pipeline data types a pipeline id may carry
pub const DATA_TYPES: [&str; 3] = ["traces", "metrics", "logs"];

/// Owner id of reference errors raised by `service.extensions`
pub const SERVICE_ID: &str = "service";

/// Validate a complete configuration.
///
/// Referential integrity is checked first (service extensions, then pipelines
/// in id order), then every component's own validation in category and id
/// order. The first failure is returned.
///
/// The error's `id` is the owner of the failing check: `service` for
/// extension references, the pipeline id for pipeline checks, the component
/// id for semantic validation. [`ConfigError::component_id`] resolves to the
/// referenced id for reference errors.
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    check_references(config, Kind::Extension, &config.service.extensions).map_err(|source| {
        ConfigError::Validation {
            kind: Kind::Extension,
            id: ComponentId::new(SERVICE_ID),
            source,
        }
    })?;

    for (id, pipeline) in &config.service.pipelines {
        validate_pipeline(config, id, pipeline)?;
    }

    for kind in Kind::COMPONENTS {
        let Some(components) = config.components(kind) else {
            continue;
        };
        for (id, settings) in components {
            settings.validate().map_err(|reason| ConfigError::Validation {
                kind,
                id: id.clone(),
                source: ValidationError::Invalid(reason),
            })?;
        }
    }

    Ok(())
}

fn validate_pipeline(config: &Config, id: &ComponentId, pipeline: &Pipeline) -> ConfigResult<()> {
    let pipeline_error = |source| ConfigError::Validation {
        kind: Kind::Pipeline,
        id: id.clone(),
        source,
    };

    if !DATA_TYPES.contains(&id.component_type()) {
        return Err(pipeline_error(ValidationError::UnknownDataType {
            data_type: id.component_type().to_string(),
            expected: DATA_TYPES.to_vec(),
        }));
    }

    if pipeline.receivers.is_empty() {
        return Err(pipeline_error(ValidationError::Empty(Kind::Receiver)));
    }

    if pipeline.exporters.is_empty() {
        return Err(pipeline_error(ValidationError::Empty(Kind::Exporter)));
    }

    for (kind, ids) in pipeline.references() {
        check_references(config, kind, ids).map_err(pipeline_error)?;
    }

    Ok(())
}

/// Check that every id in `ids` is a configured component of `kind`, listed once
fn check_references(
    config: &Config,
    kind: Kind,
    ids: &[ComponentId],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !config.contains(kind, id) {
            return Err(ValidationError::MissingReference {
                kind,
                id: id.clone(),
            });
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateReference {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ComponentSettings, SpecificSettings};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Batch {
        size: u32,
    }

    impl SpecificSettings for Batch {
        fn validate(&self) -> Result<(), String> {
            if self.size == 0 {
                return Err("size must be greater than 0".to_string());
            }
            Ok(())
        }
    }

    fn insert(config: &mut Config, kind: Kind, id: &str, size: u32) {
        let id = ComponentId::parse(id).unwrap();
        config
            .components_mut(kind)
            .unwrap()
            .insert(id.clone(), Box::new(ComponentSettings::new(id, Batch { size })));
    }

    fn valid_config() -> Config {
        let mut config = Config::default();
        insert(&mut config, Kind::Extension, "health", 1);
        insert(&mut config, Kind::Receiver, "otlp", 1);
        insert(&mut config, Kind::Processor, "batch", 1);
        insert(&mut config, Kind::Exporter, "debug", 1);
        config.service.extensions = vec![ComponentId::new("health")];
        config.service.pipelines.insert(
            ComponentId::new("traces"),
            Pipeline {
                receivers: vec![ComponentId::new("otlp")],
                processors: vec![ComponentId::new("batch")],
                exporters: vec![ComponentId::new("debug")],
            },
        );
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_missing_pipeline_reference() {
        let mut config = valid_config();
        config
            .service
            .pipelines
            .get_mut(&ComponentId::new("traces"))
            .unwrap()
            .exporters
            .push(ComponentId::with_name("otlp", "missing"));

        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.component_id(), Some(&ComponentId::with_name("otlp", "missing")));
        match err {
            ConfigError::Validation { kind, id, source } => {
                assert_eq!(kind, Kind::Pipeline);
                assert_eq!(id, ComponentId::new("traces"));
                assert_eq!(
                    source,
                    ValidationError::MissingReference {
                        kind: Kind::Exporter,
                        id: ComponentId::with_name("otlp", "missing"),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_service_extension() {
        let mut config = valid_config();
        config.service.extensions.push(ComponentId::new("zpages"));
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.component_id(), Some(&ComponentId::new("zpages")));
        assert_eq!(
            err.to_string(),
            "Invalid extension configuration for 'service': references extension 'zpages' which is not configured"
        );
    }

    #[test]
    fn test_duplicate_reference() {
        let mut config = valid_config();
        config
            .service
            .pipelines
            .get_mut(&ComponentId::new("traces"))
            .unwrap()
            .processors
            .push(ComponentId::new("batch"));

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation {
                source: ValidationError::DuplicateReference { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_pipeline_data_type_and_required_parts() {
        let mut config = valid_config();
        config
            .service
            .pipelines
            .insert(ComponentId::new("profiles"), Pipeline::default());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation {
                source: ValidationError::UnknownDataType { .. },
                ..
            }
        ));

        let mut config = valid_config();
        config.service.pipelines.insert(
            ComponentId::new("logs"),
            Pipeline {
                receivers: vec![ComponentId::new("otlp")],
                ..Pipeline::default()
            },
        );
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation {
                source: ValidationError::Empty(Kind::Exporter),
                ..
            }
        ));
    }

    #[test]
    fn test_semantic_validation_runs_after_references() {
        let mut config = valid_config();
        insert(&mut config, Kind::Receiver, "otlp", 0);

        match validate_config(&config).unwrap_err() {
            ConfigError::Validation { kind, id, source } => {
                assert_eq!(kind, Kind::Receiver);
                assert_eq!(id, ComponentId::new("otlp"));
                assert_eq!(source, ValidationError::Invalid("size must be greater than 0".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
