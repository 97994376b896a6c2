//! Arg-name classification
//!
//! Every root name referenced by a template or requested by a provider falls
//! into exactly one of three classes, decided by its first character:
//! - `@name`: special, filled from the call context
//! - `>name`: computed, filled by a computed-role provider
//! - anything else: regular, a parameter of the wrapped function

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DogError, DogResult};

/// Prefix of special arg-names
pub const SPECIAL_PREFIX: char = '@';

/// Prefix of computed arg-names
pub const COMPUTED_PREFIX: char = '>';

/// Marker for names that are private to a provider
pub const PRIVATE_MARKER: char = '_';

/// A point in a call's lifecycle that can emit a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Enter,
    Exit,
    Error,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Enter, Phase::Exit, Phase::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Enter => "enter",
            Phase::Exit => "exit",
            Phase::Error => "error",
        }
    }

    /// Special names this phase can provide
    pub fn supported_special_names(&self) -> &'static [SpecialName] {
        use SpecialName::*;
        match self {
            Phase::Enter => &[Pathname, Line, Logger, Func],
            Phase::Exit => &[Pathname, Line, Logger, Func, Time, Ret],
            // `@ret` here is the default return value
            Phase::Error => &[Pathname, Line, Logger, Func, Time, Ret, Err, Traceback],
        }
    }

    pub fn supports(&self, name: SpecialName) -> bool {
        self.supported_special_names().contains(&name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reserved call-context names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialName {
    Pathname,
    Line,
    Logger,
    Func,
    Time,
    Ret,
    Err,
    Traceback,
}

impl SpecialName {
    pub const ALL: [SpecialName; 8] = [
        SpecialName::Pathname,
        SpecialName::Line,
        SpecialName::Logger,
        SpecialName::Func,
        SpecialName::Time,
        SpecialName::Ret,
        SpecialName::Err,
        SpecialName::Traceback,
    ];

    /// The name as written in templates, prefix included
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialName::Pathname => "@pathname",
            SpecialName::Line => "@line",
            SpecialName::Logger => "@logger",
            SpecialName::Func => "@func",
            SpecialName::Time => "@time",
            SpecialName::Ret => "@ret",
            SpecialName::Err => "@err",
            SpecialName::Traceback => "@traceback",
        }
    }

    pub fn parse(name: &str) -> Option<SpecialName> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for SpecialName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of a single arg-name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass {
    Special,
    Computed,
    Regular,
}

pub fn name_class(name: &str) -> NameClass {
    if name.starts_with(SPECIAL_PREFIX) {
        NameClass::Special
    } else if name.starts_with(COMPUTED_PREFIX) {
        NameClass::Computed
    } else {
        NameClass::Regular
    }
}

/// A disjoint partition of arg-names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedNames {
    pub special: BTreeSet<String>,
    pub computed: BTreeSet<String>,
    pub regular: BTreeSet<String>,
}

impl ClassifiedNames {
    pub fn is_empty(&self) -> bool {
        self.special.is_empty() && self.computed.is_empty() && self.regular.is_empty()
    }

    pub fn needs_special(&self, name: SpecialName) -> bool {
        self.special.contains(name.as_str())
    }

    /// Parsed special names; unknown ones are skipped
    pub fn special_names(&self) -> BTreeSet<SpecialName> {
        self.special
            .iter()
            .filter_map(|n| SpecialName::parse(n))
            .collect()
    }
}

/// Partition `names` by prefix; repeats collapse
pub fn classify<I, S>(names: I) -> ClassifiedNames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut classified = ClassifiedNames::default();
    for name in names {
        let name = name.as_ref();
        let bucket = match name_class(name) {
            NameClass::Special => &mut classified.special,
            NameClass::Computed => &mut classified.computed,
            NameClass::Regular => &mut classified.regular,
        };
        bucket.insert(name.to_string());
    }
    classified
}

/// Fail if any of `names` is not a special name the phase supports
///
/// Every offending name is reported, including names that are not special
/// names at all (e.g. `@linen`).
pub fn check_special_support<'a, I>(phase: Phase, names: I) -> DogResult<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let unsupported: Vec<String> = names
        .into_iter()
        .filter(|name| !SpecialName::parse(name).is_some_and(|s| phase.supports(s)))
        .cloned()
        .collect();

    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(DogError::UnsupportedSpecialNames {
            phase,
            names: unsupported,
        })
    }
}
