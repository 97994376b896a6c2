//! Per-event arg-name values

use std::error::Error;
use std::panic::Location;

use once_cell::unsync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};

use crate::binding::{CallArgs, Signature};
use crate::format::ArgMap;
use crate::logging::Logger;
use crate::names::{Phase, SpecialName};
use crate::spec::PhaseConfig;
use crate::traceback::Traceback;

/// Call arguments bound to the signature on first use
///
/// Arguments that do not fit the signature bind to nothing: the call still
/// runs and templates naming regular arguments fail to render.
pub(crate) struct LazyBinding<'a> {
    signature: &'a Signature,
    args: &'a CallArgs,
    bound: OnceCell<Option<ArgMap>>,
}

impl<'a> LazyBinding<'a> {
    pub fn new(signature: &'a Signature, args: &'a CallArgs) -> Self {
        Self {
            signature,
            args,
            bound: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&ArgMap> {
        self.bound
            .get_or_init(|| match self.signature.bind(self.args) {
                Ok(bound) => Some(bound),
                Err(err) => {
                    tracing::warn!(
                        function = %self.signature.qualname,
                        error = %err,
                        "call arguments do not fit the signature"
                    );
                    None
                }
            })
            .as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.get().is_some()
    }
}

/// What is known about a call when one of its phases logs
pub(crate) struct EventValues<'a, R, E> {
    pub binding: Option<&'a LazyBinding<'a>>,
    pub elapsed: Option<f64>,
    pub ret: Option<&'a R>,
    pub err: Option<&'a E>,
    pub traceback: Option<&'a Traceback>,
}

impl<R, E> EventValues<'_, R, E> {
    pub fn new() -> Self {
        Self {
            binding: None,
            elapsed: None,
            ret: None,
            err: None,
            traceback: None,
        }
    }
}

/// Facts about the guarded function that don't change between calls
pub(crate) struct Site<'a> {
    pub signature: &'a Signature,
    pub location: &'static Location<'static>,
    pub logger: &'a dyn Logger,
    pub default_ret: &'a Value,
}

/// Build the basic arg-names of one event: the regular arguments and the
/// special names the phase references
pub(crate) fn basic_args<R, E>(config: &PhaseConfig, site: &Site<'_>, values: &EventValues<'_, R, E>) -> ArgMap
where
    R: Serialize,
    E: Error + 'static,
{
    let names = config.names();
    let mut args = ArgMap::new();

    let bound = match values.binding {
        Some(binding) if config.needs_regular() => binding.get(),
        _ => None,
    };
    if let Some(bound) = bound {
        for name in &names.regular {
            if let Some(value) = bound.get(name) {
                args.insert(name.clone(), value.clone());
            }
        }
    }

    for special in names.special_names() {
        let value = match special {
            SpecialName::Pathname => json!(site.location.file()),
            SpecialName::Line => json!(site.location.line()),
            SpecialName::Logger => json!({ "name": site.logger.name() }),
            SpecialName::Func => func_value(site.signature),
            SpecialName::Time => json!(values.elapsed.unwrap_or_default()),
            SpecialName::Ret if config.phase() == Phase::Error => site.default_ret.clone(),
            SpecialName::Ret => values.ret.map(ret_value).unwrap_or(Value::Null),
            SpecialName::Err => values.err.map(err_value).unwrap_or(Value::Null),
            SpecialName::Traceback => values
                .traceback
                .map(Traceback::to_value)
                .unwrap_or_else(|| json!([])),
        };
        args.insert(special.as_str().to_string(), value);
    }
    args
}

pub(crate) fn func_value(signature: &Signature) -> Value {
    json!({
        "name": signature.name,
        "module": signature.module,
        "qualname": signature.qualname,
    })
}

fn ret_value<R: Serialize>(ret: &R) -> Value {
    serde_json::to_value(ret).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "return value is not representable as JSON");
        Value::Null
    })
}

fn err_value<E: Error + 'static>(err: &E) -> Value {
    json!({
        "type": short_type_name::<E>(),
        "message": err.to_string(),
    })
}

/// Type name with every path shortened to its last segment
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut short = String::with_capacity(full.len());
    let mut path = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            short.push_str(last_segment(&path));
            path.clear();
            short.push(c);
        }
    }
    short.push_str(last_segment(&path));
    short
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::spec::PhaseSpec;

    #[derive(Debug, thiserror::Error)]
    #[error("kaboom")]
    struct Kaboom;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Kaboom>(), "Kaboom");
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec<String>");
        assert_eq!(
            short_type_name::<Box<dyn Error + Send + Sync>>(),
            "Box<dyn Error + Send + Sync>"
        );
    }

    #[test]
    fn test_basic_args_only_builds_referenced_names() {
        let config = PhaseConfig::new(
            Phase::Error,
            PhaseSpec::from("{bar} {@func.name} {@err.type} {@time} {@ret}"),
            &[],
        )
        .unwrap();
        let signature = Signature::new("tests", "foo").arg("bar").arg("baz");
        let call_args = CallArgs::new().arg(1).arg(2);
        let binding = LazyBinding::new(&signature, &call_args);
        let default_ret = json!("fallback");
        let site = Site {
            signature: &signature,
            location: Location::caller(),
            logger: &NoOpLogger,
            default_ret: &default_ret,
        };
        let mut values = EventValues::<(), Kaboom>::new();
        values.binding = Some(&binding);
        values.elapsed = Some(0.5);
        values.err = Some(&Kaboom);

        let args = basic_args(&config, &site, &values);
        assert_eq!(
            Value::Object(args),
            json!({
                "bar": 1,
                "@func": {"name": "foo", "module": "tests", "qualname": "foo"},
                "@err": {"type": "Kaboom", "message": "kaboom"},
                "@time": 0.5,
                "@ret": "fallback",
            })
        );
        assert!(binding.is_bound());
    }

    #[test]
    fn test_binding_only_when_regular_names_are_used() {
        let config = PhaseConfig::new(Phase::Enter, PhaseSpec::from("{@func.name}"), &[]).unwrap();
        let signature = Signature::new("tests", "foo").arg("bar");
        let call_args = CallArgs::new();
        let binding = LazyBinding::new(&signature, &call_args);
        let default_ret = Value::Null;
        let site = Site {
            signature: &signature,
            location: Location::caller(),
            logger: &NoOpLogger,
            default_ret: &default_ret,
        };
        let mut values = EventValues::<(), Kaboom>::new();
        values.binding = Some(&binding);

        let args = basic_args(&config, &site, &values);
        assert_eq!(args.len(), 1);
        assert!(!binding.is_bound());
    }

    #[test]
    fn test_unfit_arguments_leave_regular_names_out() {
        let config = PhaseConfig::new(Phase::Enter, PhaseSpec::from("{bar} {@line}"), &[]).unwrap();
        let signature = Signature::new("tests", "foo").arg("bar");
        let call_args = CallArgs::new().kwarg("nope", 1);
        let binding = LazyBinding::new(&signature, &call_args);
        let default_ret = Value::Null;
        let site = Site {
            signature: &signature,
            location: Location::caller(),
            logger: &NoOpLogger,
            default_ret: &default_ret,
        };
        let mut values = EventValues::<(), Kaboom>::new();
        values.binding = Some(&binding);

        let args = basic_args(&config, &site, &values);
        assert!(binding.is_bound());
        assert_eq!(binding.get(), None);
        assert!(!args.contains_key("bar"));
        assert!(args.contains_key("@line"));
    }
}
