//! Function signatures and call-argument binding
//!
//! A guarded function declares its parameters through a [`Signature`]. At call
//! time the positional and keyword arguments in [`CallArgs`] are bound to the
//! parameter names, defaults filled in, and the catch-all parameters collected,
//! giving the regular arg-names a template can reference.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BindError;

/// How a parameter can be passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOrKeyword,
    KeywordOnly,
}

/// A named parameter of a guarded function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Value>,
    pub kind: ParamKind,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ParamKind::PositionalOrKeyword,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
            kind: ParamKind::PositionalOrKeyword,
        }
    }

    pub fn keyword_only(mut self) -> Self {
        self.kind = ParamKind::KeywordOnly;
        self
    }
}

/// Declared shape of a guarded function
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub module: String,
    pub name: String,
    pub qualname: String,
    pub params: Vec<Parameter>,
    pub var_positional: Option<String>,
    pub var_keyword: Option<String>,
}

impl Signature {
    /// A signature for `module::name` without any parameters
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module: module.into(),
            qualname: name.clone(),
            name,
            params: Vec::new(),
            var_positional: None,
            var_keyword: None,
        }
    }

    /// Qualified name, e.g. `Type.method`
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = qualname.into();
        self
    }

    /// Add a required positional-or-keyword parameter
    pub fn arg(self, name: impl Into<String>) -> Self {
        self.param(Parameter::required(name))
    }

    /// Add a positional-or-keyword parameter with a default value
    pub fn arg_with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.param(Parameter::with_default(name, default))
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Collect surplus positional arguments under `name`
    pub fn var_positional(mut self, name: impl Into<String>) -> Self {
        self.var_positional = Some(name.into());
        self
    }

    /// Collect surplus keyword arguments under `name`
    pub fn var_keyword(mut self, name: impl Into<String>) -> Self {
        self.var_keyword = Some(name.into());
        self
    }

    /// Every name a binding can produce, catch-alls included
    pub fn arg_names(&self) -> BTreeSet<String> {
        self.params
            .iter()
            .map(|p| p.name.clone())
            .chain(self.var_positional.clone())
            .chain(self.var_keyword.clone())
            .collect()
    }

    fn positional_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::PositionalOrKeyword)
            .count()
    }

    /// Bind call arguments to parameter names
    pub fn bind(&self, args: &CallArgs) -> Result<Map<String, Value>, BindError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        let mut surplus_positional = Vec::new();
        let mut surplus_keyword = Map::new();

        let positional_slots: Vec<usize> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == ParamKind::PositionalOrKeyword)
            .map(|(i, _)| i)
            .collect();

        for (n, value) in args.positional.iter().enumerate() {
            match positional_slots.get(n) {
                Some(&slot) => slots[slot] = Some(value.clone()),
                None if self.var_positional.is_some() => surplus_positional.push(value.clone()),
                None => {
                    return Err(BindError::TooManyPositional {
                        function: self.name.clone(),
                        expected: self.positional_count(),
                        given: args.positional.len(),
                    })
                }
            }
        }

        for (name, value) in &args.keyword {
            match self.params.iter().position(|p| &p.name == name) {
                Some(slot) if slots[slot].is_some() => {
                    return Err(BindError::MultipleValues {
                        function: self.name.clone(),
                        name: name.clone(),
                    })
                }
                Some(slot) => slots[slot] = Some(value.clone()),
                None if self.var_keyword.is_some() => {
                    if surplus_keyword.insert(name.clone(), value.clone()).is_some() {
                        return Err(BindError::MultipleValues {
                            function: self.name.clone(),
                            name: name.clone(),
                        });
                    }
                }
                None => {
                    return Err(BindError::UnexpectedKeyword {
                        function: self.name.clone(),
                        name: name.clone(),
                    })
                }
            }
        }

        let mut bound = Map::new();
        let mut missing = Vec::new();
        for (param, slot) in self.params.iter().zip(slots) {
            match slot.or_else(|| param.default.clone()) {
                Some(value) => {
                    bound.insert(param.name.clone(), value);
                }
                None => missing.push(param.name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(BindError::MissingArguments {
                function: self.name.clone(),
                names: missing,
            });
        }

        if let Some(name) = &self.var_positional {
            bound.insert(name.clone(), Value::Array(surplus_positional));
        }
        if let Some(name) = &self.var_keyword {
            bound.insert(name.clone(), Value::Object(surplus_keyword));
        }
        Ok(bound)
    }
}

/// Arguments of a single call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments only
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Serialize) -> Self {
        self.positional.push(to_value(value));
        self
    }

    /// Append a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.keyword.push((name.into(), to_value(value)));
        self
    }

    /// Positional argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword argument named `name`
    pub fn get_keyword(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

fn to_value(value: impl Serialize) -> Value {
    // Serializing into a Value only fails for maps with non-string keys
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo() -> Signature {
        Signature::new("tests", "foo")
            .arg("bar")
            .arg_with_default("baz", 7)
    }

    #[test]
    fn test_bind_positional_and_defaults() {
        let bound = foo().bind(&CallArgs::new().arg("cake")).unwrap();
        assert_eq!(Value::Object(bound), json!({"bar": "cake", "baz": 7}));
    }

    #[test]
    fn test_bind_keyword() {
        let bound = foo()
            .bind(&CallArgs::new().kwarg("baz", "lie").kwarg("bar", "cake"))
            .unwrap();
        assert_eq!(bound["bar"], json!("cake"));
        assert_eq!(bound["baz"], json!("lie"));
    }

    #[test]
    fn test_bind_catch_alls() {
        let sig = foo().var_positional("args").var_keyword("kwargs");
        let bound = sig
            .bind(&CallArgs::positional([1, 2, 3, 4]).kwarg("x", true))
            .unwrap();
        assert_eq!(
            Value::Object(bound),
            json!({"bar": 1, "baz": 2, "args": [3, 4], "kwargs": {"x": true}})
        );

        let bound = sig.bind(&CallArgs::new().arg(1)).unwrap();
        assert_eq!(bound["args"], json!([]));
        assert_eq!(bound["kwargs"], json!({}));
    }

    #[test]
    fn test_bind_keyword_only() {
        let sig = Signature::new("tests", "foo")
            .arg("bar")
            .param(Parameter::required("flag").keyword_only());
        assert_eq!(
            sig.bind(&CallArgs::positional([1, 2])),
            Err(BindError::TooManyPositional {
                function: "foo".into(),
                expected: 1,
                given: 2
            })
        );
        assert!(sig.bind(&CallArgs::new().arg(1).kwarg("flag", false)).is_ok());
    }

    #[test]
    fn test_bind_errors() {
        let sig = foo();
        assert_eq!(
            sig.bind(&CallArgs::new().arg(1).kwarg("bar", 2)),
            Err(BindError::MultipleValues {
                function: "foo".into(),
                name: "bar".into()
            })
        );
        assert_eq!(
            sig.bind(&CallArgs::new().arg(1).kwarg("nope", 2)),
            Err(BindError::UnexpectedKeyword {
                function: "foo".into(),
                name: "nope".into()
            })
        );

        let sig = Signature::new("tests", "foo").arg("a").arg("b");
        assert_eq!(
            sig.bind(&CallArgs::new()),
            Err(BindError::MissingArguments {
                function: "foo".into(),
                names: vec!["a".into(), "b".into()]
            })
        );
    }

    #[test]
    fn test_arg_names_include_catch_alls() {
        let names = foo().var_positional("args").var_keyword("kwargs").arg_names();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            ["args", "bar", "baz", "kwargs"]
        );
    }
}
