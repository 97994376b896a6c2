//! Serializable dog configuration
//!
//! Phase specifications mirror the code forms:
//! - `null` or absent: phase disabled
//! - a string: the template, logged at `Info`
//! - a sequence of: an integer level, a string template,
//!   `{extra: <provider>}` and `{computed: <provider>}` entries
//!
//! Providers are looked up by name in a [`ProviderRegistry`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{global_providers, ProviderRegistry, SharedAttributes};
use crate::error::{DogError, DogResult};
use crate::guard::{Dog, DogBuilder};
use crate::logging::Level;
use crate::spec::{PhaseSpec, SpecPart};

fn default_true() -> bool {
    true
}

/// Configuration of one dog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogConfig {
    #[serde(default)]
    pub enter: Option<Value>,

    #[serde(default)]
    pub exit: Option<Value>,

    #[serde(default)]
    pub error: Option<Value>,

    /// Provider names attached to every phase
    #[serde(default)]
    pub extras: Option<Value>,

    /// Logger name; the wrapped function's module when absent
    #[serde(default)]
    pub logger: Option<String>,

    #[serde(default = "default_true")]
    pub propagate_errors: bool,

    #[serde(default)]
    pub exc_info: bool,

    #[serde(default)]
    pub default_ret: Value,
}

impl Default for DogConfig {
    fn default() -> Self {
        Self {
            enter: None,
            exit: None,
            error: None,
            extras: None,
            logger: None,
            propagate_errors: true,
            exc_info: false,
            default_ret: Value::Null,
        }
    }
}

impl DogConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> DogResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> DogResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// A builder with everything but the catch filter configured
    pub fn into_builder(self, registry: &ProviderRegistry) -> DogResult<DogBuilder> {
        let extras = extras_from_value(self.extras.as_ref(), registry)?;
        let mut builder = Dog::builder()
            .enter(spec_from_value(self.enter.as_ref(), registry)?)
            .exit(spec_from_value(self.exit.as_ref(), registry)?)
            .error(spec_from_value(self.error.as_ref(), registry)?)
            .extras(extras)
            .propagate(self.propagate_errors)
            .exc_info(self.exc_info)
            .default_ret(self.default_ret);
        if let Some(name) = self.logger {
            builder = builder.logger_name(name);
        }
        Ok(builder)
    }

    /// Build a dog, resolving providers in `registry`
    pub fn build_with(self, registry: &ProviderRegistry) -> DogResult<Dog> {
        self.into_builder(registry)?.build()
    }

    /// Build a dog, resolving providers in the process-wide registry
    pub fn build(self) -> DogResult<Dog> {
        self.build_with(global_providers())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Convert a dynamically typed phase specification
pub fn spec_from_value(value: Option<&Value>, registry: &ProviderRegistry) -> DogResult<PhaseSpec> {
    match value {
        None | Some(Value::Null) => Ok(PhaseSpec::Disabled),
        Some(Value::String(template)) => Ok(PhaseSpec::Template(template.clone())),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| part_from_value(item, registry))
            .collect::<DogResult<Vec<_>>>()
            .map(PhaseSpec::Sequence),
        Some(other) => Err(DogError::UnsupportedSpecType(type_name(other).to_string())),
    }
}

fn part_from_value(value: &Value, registry: &ProviderRegistry) -> DogResult<SpecPart> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(level) => Ok(SpecPart::Level(Level::from_value(level))),
            None => Err(DogError::UnsupportedSpecType(type_name(value).to_string())),
        },
        Value::String(template) => Ok(SpecPart::Template(template.clone())),
        Value::Object(map) if map.len() == 1 => {
            let (role, name) = map
                .iter()
                .next()
                .ok_or_else(|| DogError::UnsupportedSpecType("mapping".to_string()))?;
            let Some(name) = name.as_str() else {
                return Err(DogError::UnsupportedSpecType(format!(
                    "{role} reference to {}",
                    type_name(name)
                )));
            };
            match role.as_str() {
                "extra" => Ok(SpecPart::Extra(registry.resolve(name)?)),
                "computed" => Ok(SpecPart::Computed(registry.resolve(name)?)),
                other => Err(DogError::UnsupportedSpecType(format!("{other:?} mapping"))),
            }
        }
        other => Err(DogError::UnsupportedSpecType(type_name(other).to_string())),
    }
}

/// Convert the cross-phase extras: a sequence of provider names
pub fn extras_from_value(
    value: Option<&Value>,
    registry: &ProviderRegistry,
) -> DogResult<Vec<SharedAttributes>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(DogError::ExtrasNotSequence(type_name(other).to_string())),
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(name) => registry.resolve(name),
            other => Err(DogError::ExtrasNotSequence(format!(
                "sequence containing {}",
                type_name(other)
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::binding::{CallArgs, Signature};
    use crate::error::ErrorClass;
    use crate::logging::{register_logger, MemoryLogger};
    use std::sync::Arc;

    fn registry() -> ProviderRegistry {
        let registry = ProviderRegistry::new();
        registry.register(AttributeSet::new("user").with_attribute("user", |_| "alice"));
        registry.register(
            AttributeSet::new("math")
                .requires(["bar"])
                .with_attribute("square", |ctx| {
                    let bar = ctx.get("bar").and_then(Value::as_i64).unwrap_or_default();
                    bar * bar
                }),
        );
        registry
    }

    #[test]
    fn test_yaml_config_builds_dog() {
        let config = DogConfig::from_yaml_str(
            r#"
enter: "calling with {bar}"
exit:
  - 10
  - "{bar} squared is {>square}"
  - computed: math
  - extra: user
error: ~
extras: [user]
logger: config_tests::yaml
"#,
        )
        .unwrap();
        assert!(config.propagate_errors);

        let logger = Arc::new(MemoryLogger::new("config_tests::yaml"));
        register_logger(logger.clone());

        let dog = config.build_with(&registry()).unwrap();
        assert_eq!(dog.exit().level(), Level::Debug);
        let guarded = dog
            .wrap(Signature::new("tests", "foo").arg("bar"), |_: &CallArgs| {
                Ok::<_, std::io::Error>(())
            })
            .unwrap();
        guarded.call(&CallArgs::new().arg(3)).unwrap();

        let records = logger.records();
        assert_eq!(logger.messages(), ["calling with 3", "3 squared is 9"]);
        assert_eq!(records[1].extra.as_ref().unwrap()["user"], "alice");
    }

    #[test]
    fn test_json_config() {
        let config = DogConfig::from_json_str(
            r#"{"error": "failed: {@err.message}", "propagate_errors": false, "default_ret": 0, "exc_info": true}"#,
        )
        .unwrap();
        let dog = config.build_with(&registry()).unwrap();
        assert!(!dog.propagates());
        assert!(dog.to_string().contains("default_ret=0"));
    }

    #[test]
    fn test_unsupported_spec_types() {
        let registry = registry();
        for value in [serde_json::json!(true), serde_json::json!(3), serde_json::json!({"a": 1})] {
            let err = spec_from_value(Some(&value), &registry).unwrap_err();
            assert!(matches!(err, DogError::UnsupportedSpecType(_)));
            assert_eq!(err.class(), ErrorClass::Type);
        }

        let err = spec_from_value(Some(&serde_json::json!(["hi", 1.5])), &registry).unwrap_err();
        assert!(matches!(err, DogError::UnsupportedSpecType(name) if name == "float"));

        let err = spec_from_value(Some(&serde_json::json!(["hi", {"other": "user"}])), &registry)
            .unwrap_err();
        assert!(matches!(err, DogError::UnsupportedSpecType(_)));
    }

    #[test]
    fn test_custom_level_and_unknown_provider() {
        let registry = registry();
        let config =
            DogConfig::from_yaml_str("enter: [15, \"hi {bar}\"]\nlogger: config_tests::custom_level\n")
                .unwrap();
        let logger =
            Arc::new(MemoryLogger::new("config_tests::custom_level").with_level(Level::Debug));
        register_logger(logger.clone());

        let dog = config.build_with(&registry).unwrap();
        assert_eq!(dog.enter().level().value(), 15);
        let guarded = dog
            .wrap(Signature::new("tests", "foo").arg("bar"), |_: &CallArgs| {
                Ok::<_, std::io::Error>(())
            })
            .unwrap();
        guarded.call(&CallArgs::new().arg(1)).unwrap();
        let records = logger.records();
        assert_eq!(records[0].message, "hi 1");
        assert_eq!(records[0].level, Level::Custom(15));

        assert!(matches!(
            spec_from_value(Some(&serde_json::json!(["hi", {"extra": "ghost"}])), &registry),
            Err(DogError::UnknownProvider(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_extras_must_be_sequence() {
        let registry = registry();
        let err = extras_from_value(Some(&serde_json::json!("user")), &registry).unwrap_err();
        assert!(matches!(err, DogError::ExtrasNotSequence(_)));
        assert_eq!(err.class(), ErrorClass::Type);

        assert!(matches!(
            extras_from_value(Some(&serde_json::json!([1])), &registry),
            Err(DogError::ExtrasNotSequence(_))
        ));
        assert_eq!(extras_from_value(Some(&serde_json::json!(["user", "math"])), &registry).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_sequence_rejected_on_build() {
        let config = DogConfig {
            enter: Some(serde_json::json!([])),
            ..Default::default()
        };
        assert!(matches!(
            config.build_with(&registry()),
            Err(DogError::EmptySpecification)
        ));
    }
}
