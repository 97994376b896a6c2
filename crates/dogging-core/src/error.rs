//! Error types for guard configuration and argument binding

use thiserror::Error;

use crate::names::Phase;

/// Broad category of a configuration error
///
/// Mirrors the two kinds of decoration-time failures: a value that is of the
/// wrong kind altogether (`Type`), and a value of the right kind whose content
/// is invalid (`Value`). `Config` covers loading configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Type,
    Value,
    Config,
}

/// Errors raised while building a dog or wrapping a function
#[derive(Error, Debug)]
pub enum DogError {
    /// The template is not a well-formed format string
    #[error("invalid format string {template:?}: {message}")]
    FormatSyntax { template: String, message: String },

    /// The template references a field by position instead of by name
    #[error("unnamed or positional arg-names in format specification {template:?}")]
    PositionalField { template: String },

    /// Special arg-names that the phase can not provide
    #[error("unsupported special arg-names for {phase:?} logging phase: {}", .names.join(", "))]
    UnsupportedSpecialNames { phase: Phase, names: Vec<String> },

    /// Two configuration options contradict each other
    #[error("conflicting configuration: {0}")]
    ConflictingConfiguration(String),

    /// Computed arg-names starting with the reserved marker
    #[error("computed arg-names should not begin with an underscore: {}", .names.join(", "))]
    ReservedComputedName { phase: Phase, names: Vec<String> },

    /// Computed arg-names that no attached provider supplies
    #[error("not all computed arg-names of the {phase:?} phase are supplied: {}", .names.join(", "))]
    UnknownComputedNames { phase: Phase, names: Vec<String> },

    /// An element of a sequence specification has an unsupported type
    #[error("unsupported type for sequence specification: {0}")]
    UnsupportedSpecType(String),

    /// A sequence specification without a template
    #[error("must specify a format string in a sequence specification")]
    MissingTemplate,

    /// An empty sequence specification
    #[error("sequence specification is empty")]
    EmptySpecification,

    /// A sequence specification with a level or template given twice
    #[error("sequence specification has more than one {0}")]
    DuplicateSpecPart(&'static str),

    /// Cross-phase extras given as something other than a sequence
    #[error("extras argument must be a sequence, got {0}")]
    ExtrasNotSequence(String),

    /// A provider name that is not registered
    #[error("no provider registered under {0:?}")]
    UnknownProvider(String),

    /// Regular arg-names that the wrapped function does not declare
    #[error(
        "function {function} does not have these arguments, which were referenced in the dog: {}",
        .names.iter().map(|n| format!("{n:?}")).collect::<Vec<_>>().join(", ")
    )]
    UnknownArguments { function: String, names: Vec<String> },

    /// The configured default return value can not stand in for the function's return type
    #[error("default return value does not fit the return type of {function}: {message}")]
    DefaultReturnType { function: String, message: String },

    /// IO error while reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DogError {
    /// Create a format syntax error
    pub fn format_syntax(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormatSyntax {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a positional field error
    pub fn positional_field(template: impl Into<String>) -> Self {
        Self::PositionalField {
            template: template.into(),
        }
    }

    /// Create an unknown-arguments error with the names sorted
    pub fn unknown_arguments(
        function: impl Into<String>,
        names: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        Self::UnknownArguments {
            function: function.into(),
            names,
        }
    }

    /// Which tier of configuration error this is
    pub fn class(&self) -> ErrorClass {
        match self {
            DogError::UnsupportedSpecType(_)
            | DogError::ExtrasNotSequence(_)
            | DogError::UnknownArguments { .. }
            | DogError::DefaultReturnType { .. } => ErrorClass::Type,
            DogError::Io(_) | DogError::Yaml(_) | DogError::Json(_) => ErrorClass::Config,
            _ => ErrorClass::Value,
        }
    }
}

pub type DogResult<T> = Result<T, DogError>;

/// Errors raised while binding call arguments to a signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("{function}() takes at most {expected} positional arguments ({given} given)")]
    TooManyPositional {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("{function}() got multiple values for argument {name:?}")]
    MultipleValues { function: String, name: String },

    #[error("{function}() got an unexpected keyword argument {name:?}")]
    UnexpectedKeyword { function: String, name: String },

    #[error("{function}() missing required arguments: {}", .names.join(", "))]
    MissingArguments { function: String, names: Vec<String> },
}
