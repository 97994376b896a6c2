//! Phase specifications
//!
//! A phase is specified as disabled, a bare template, or a short sequence
//! mixing one level, one template, and any number of extra or computed
//! providers. Resolution turns the specification into an immutable
//! [`PhaseConfig`] holding the parsed template, the provider chains and the
//! classified arg-names the phase needs at call time.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::attributes::{DynamicAttributes, ProviderChain, SharedAttributes};
use crate::error::{DogError, DogResult};
use crate::format::{parse_template, ParsedTemplate};
use crate::logging::Level;
use crate::names::{
    check_special_support, classify, ClassifiedNames, Phase, SpecialName, COMPUTED_PREFIX,
    PRIVATE_MARKER,
};

/// One element of a sequence specification
#[derive(Clone)]
pub enum SpecPart {
    Level(Level),
    Template(String),
    Extra(SharedAttributes),
    Computed(SharedAttributes),
}

impl SpecPart {
    pub fn extra(provider: impl DynamicAttributes + 'static) -> Self {
        SpecPart::Extra(Arc::new(provider))
    }

    pub fn computed(provider: impl DynamicAttributes + 'static) -> Self {
        SpecPart::Computed(Arc::new(provider))
    }

    fn kind(&self) -> &'static str {
        match self {
            SpecPart::Level(_) => "level",
            SpecPart::Template(_) => "template",
            SpecPart::Extra(_) => "extra",
            SpecPart::Computed(_) => "computed",
        }
    }
}

impl std::fmt::Debug for SpecPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecPart::Level(level) => f.debug_tuple("Level").field(level).finish(),
            SpecPart::Template(template) => f.debug_tuple("Template").field(template).finish(),
            SpecPart::Extra(p) => f.debug_tuple("Extra").field(&p.name()).finish(),
            SpecPart::Computed(p) => f.debug_tuple("Computed").field(&p.name()).finish(),
        }
    }
}

impl From<Level> for SpecPart {
    fn from(level: Level) -> Self {
        SpecPart::Level(level)
    }
}

impl From<&str> for SpecPart {
    fn from(template: &str) -> Self {
        SpecPart::Template(template.to_string())
    }
}

impl From<String> for SpecPart {
    fn from(template: String) -> Self {
        SpecPart::Template(template)
    }
}

/// User-facing specification of one phase
#[derive(Debug, Clone, Default)]
pub enum PhaseSpec {
    #[default]
    Disabled,
    Template(String),
    Sequence(Vec<SpecPart>),
}

impl From<&str> for PhaseSpec {
    fn from(template: &str) -> Self {
        PhaseSpec::Template(template.to_string())
    }
}

impl From<String> for PhaseSpec {
    fn from(template: String) -> Self {
        PhaseSpec::Template(template)
    }
}

impl From<Vec<SpecPart>> for PhaseSpec {
    fn from(parts: Vec<SpecPart>) -> Self {
        PhaseSpec::Sequence(parts)
    }
}

impl<T: Into<PhaseSpec>> From<Option<T>> for PhaseSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(PhaseSpec::Disabled, Into::into)
    }
}

/// A specification reduced to its parts, before parsing
#[derive(Clone, Default)]
pub struct ResolvedSpec {
    pub level: Level,
    pub template: Option<String>,
    pub extras: Vec<SharedAttributes>,
    pub computed: Vec<SharedAttributes>,
}

impl PhaseSpec {
    /// Split the specification into level, template and providers
    pub fn resolve(self) -> DogResult<ResolvedSpec> {
        match self {
            PhaseSpec::Disabled => Ok(ResolvedSpec::default()),
            PhaseSpec::Template(template) => Ok(ResolvedSpec {
                template: Some(template),
                ..Default::default()
            }),
            PhaseSpec::Sequence(parts) => resolve_sequence(parts),
        }
    }
}

fn resolve_sequence(parts: Vec<SpecPart>) -> DogResult<ResolvedSpec> {
    if parts.is_empty() {
        return Err(DogError::EmptySpecification);
    }

    let mut level = None;
    let mut resolved = ResolvedSpec::default();
    for part in parts {
        let kind = part.kind();
        match part {
            SpecPart::Level(l) => {
                if level.replace(l).is_some() {
                    return Err(DogError::DuplicateSpecPart(kind));
                }
            }
            SpecPart::Template(t) => {
                if resolved.template.replace(t).is_some() {
                    return Err(DogError::DuplicateSpecPart(kind));
                }
            }
            SpecPart::Extra(p) => resolved.extras.push(p),
            SpecPart::Computed(p) => resolved.computed.push(p),
        }
    }

    if resolved.template.is_none() {
        return Err(DogError::MissingTemplate);
    }
    resolved.level = level.unwrap_or_default();
    Ok(resolved)
}

/// Provider attribute behind a computed arg-name
fn attribute_name(name: &str) -> &str {
    name.strip_prefix(COMPUTED_PREFIX).unwrap_or(name)
}

/// Fully resolved configuration of one phase
#[derive(Debug, Clone)]
pub struct PhaseConfig {
    phase: Phase,
    level: Level,
    template: Option<ParsedTemplate>,
    extras: Option<ProviderChain>,
    computed: Option<ProviderChain>,
    names: ClassifiedNames,
    computed_fields: BTreeSet<String>,
}

impl PhaseConfig {
    /// Resolve and parse a phase specification
    ///
    /// `shared_extras` go before the phase's own extras, so the phase's
    /// providers win on name clashes. Special and computed names are not
    /// validated here; see [`PhaseConfig::validate_special`] and
    /// [`PhaseConfig::validate_computed`].
    pub fn new(phase: Phase, spec: PhaseSpec, shared_extras: &[SharedAttributes]) -> DogResult<Self> {
        let resolved = spec.resolve()?;
        let Some(source) = resolved.template else {
            return Ok(Self::disabled(phase));
        };
        let template = parse_template(&source)?;

        let extras: Vec<SharedAttributes> = shared_extras
            .iter()
            .cloned()
            .chain(resolved.extras)
            .collect();
        let extras = (!extras.is_empty()).then(|| ProviderChain::new(extras));
        let computed =
            (!resolved.computed.is_empty()).then(|| ProviderChain::new(resolved.computed));

        let template_names = template.field_names();
        let computed_fields = classify(&template_names).computed;

        let mut all_names = template_names;
        for chain in extras.iter().chain(computed.iter()) {
            all_names.extend(chain.required_arg_names());
        }

        Ok(Self {
            phase,
            level: resolved.level,
            template: Some(template),
            extras,
            computed,
            names: classify(&all_names),
            computed_fields,
        })
    }

    pub fn disabled(phase: Phase) -> Self {
        Self {
            phase,
            level: Level::default(),
            template: None,
            extras: None,
            computed: None,
            names: ClassifiedNames::default(),
            computed_fields: BTreeSet::new(),
        }
    }

    /// Fail on special names the phase can not provide
    pub fn validate_special(&self, propagate: bool) -> DogResult<()> {
        check_special_support(self.phase, self.names.special.iter())?;
        if self.phase == Phase::Error && propagate && self.needs(SpecialName::Ret) {
            return Err(DogError::ConflictingConfiguration(
                "can not use @ret in the error message when errors propagate".to_string(),
            ));
        }
        Ok(())
    }

    /// Fail on computed names that are reserved or not supplied
    pub fn validate_computed(&self) -> DogResult<()> {
        let computed = &self.names.computed;

        let reserved: Vec<String> = computed
            .iter()
            .filter(|name| attribute_name(name).starts_with(PRIVATE_MARKER))
            .cloned()
            .collect();
        if !reserved.is_empty() {
            return Err(DogError::ReservedComputedName {
                phase: self.phase,
                names: reserved,
            });
        }

        let unknown: Vec<String> = computed
            .iter()
            .filter(|name| {
                !self
                    .computed
                    .as_ref()
                    .is_some_and(|chain| chain.supplies(attribute_name(name)))
            })
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DogError::UnknownComputedNames {
                phase: self.phase,
                names: unknown,
            });
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_enabled(&self) -> bool {
        self.template.is_some()
    }

    pub fn template(&self) -> Option<&ParsedTemplate> {
        self.template.as_ref()
    }

    pub fn extras(&self) -> Option<&ProviderChain> {
        self.extras.as_ref()
    }

    pub fn computed(&self) -> Option<&ProviderChain> {
        self.computed.as_ref()
    }

    /// Every arg-name the phase needs, template and providers together
    pub fn names(&self) -> &ClassifiedNames {
        &self.names
    }

    /// The `>names` the template itself references
    pub fn computed_fields(&self) -> &BTreeSet<String> {
        &self.computed_fields
    }

    pub fn needs(&self, name: SpecialName) -> bool {
        self.names.needs_special(name)
    }

    pub fn needs_regular(&self) -> bool {
        !self.names.regular.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::error::ErrorClass;

    fn computer() -> SpecPart {
        SpecPart::computed(
            AttributeSet::new("computer")
                .requires(["bar"])
                .with_attribute("sum", |_| 3)
                .with_attribute("_hidden", |_| 0),
        )
    }

    #[test]
    fn test_resolve_forms() {
        let resolved = PhaseSpec::from("hello").resolve().unwrap();
        assert_eq!(resolved.level, Level::Info);
        assert_eq!(resolved.template.as_deref(), Some("hello"));

        let resolved = PhaseSpec::from(None::<&str>).resolve().unwrap();
        assert!(resolved.template.is_none());

        let resolved = PhaseSpec::from(vec![SpecPart::from("hi"), Level::Error.into()])
            .resolve()
            .unwrap();
        assert_eq!(resolved.level, Level::Error);
        assert_eq!(resolved.template.as_deref(), Some("hi"));
    }

    #[test]
    fn test_resolve_sequence_errors() {
        assert!(matches!(
            PhaseSpec::Sequence(vec![]).resolve(),
            Err(DogError::EmptySpecification)
        ));
        assert!(matches!(
            PhaseSpec::Sequence(vec![Level::Debug.into()]).resolve(),
            Err(DogError::MissingTemplate)
        ));
        assert!(matches!(
            PhaseSpec::Sequence(vec!["a".into(), "b".into()]).resolve(),
            Err(DogError::DuplicateSpecPart("template"))
        ));
        assert!(matches!(
            PhaseSpec::Sequence(vec![Level::Debug.into(), "a".into(), Level::Info.into()]).resolve(),
            Err(DogError::DuplicateSpecPart("level"))
        ));
        assert_eq!(DogError::MissingTemplate.class(), ErrorClass::Value);
    }

    #[test]
    fn test_phase_config_classifies_template_and_provider_names() {
        let config = PhaseConfig::new(
            Phase::Exit,
            vec![SpecPart::from("{baz} {@ret} {>sum}"), computer()].into(),
            &[],
        )
        .unwrap();

        assert!(config.is_enabled());
        assert_eq!(config.names().regular.iter().collect::<Vec<_>>(), ["bar", "baz"]);
        assert!(config.needs(SpecialName::Ret));
        assert_eq!(config.computed_fields().iter().collect::<Vec<_>>(), [">sum"]);
        assert!(config.validate_special(true).is_ok());
        assert!(config.validate_computed().is_ok());
    }

    #[test]
    fn test_disabled_phase_has_no_names() {
        let extra: SharedAttributes = Arc::new(AttributeSet::new("x").requires(["nope"]));
        let config = PhaseConfig::new(Phase::Enter, PhaseSpec::Disabled, &[extra]).unwrap();
        assert!(!config.is_enabled());
        assert!(config.names().is_empty());
        assert!(config.extras().is_none());
    }

    #[test]
    fn test_validate_special() {
        let config = PhaseConfig::new(Phase::Enter, "{@ret} {@time}".into(), &[]).unwrap();
        assert!(matches!(
            config.validate_special(true),
            Err(DogError::UnsupportedSpecialNames { names, .. }) if names == ["@ret", "@time"]
        ));

        let config = PhaseConfig::new(Phase::Error, "{@ret}".into(), &[]).unwrap();
        assert!(matches!(
            config.validate_special(true),
            Err(DogError::ConflictingConfiguration(_))
        ));
        assert!(config.validate_special(false).is_ok());
    }

    #[test]
    fn test_validate_computed() {
        let config = PhaseConfig::new(Phase::Enter, "{>sum}".into(), &[]).unwrap();
        assert!(matches!(
            config.validate_computed(),
            Err(DogError::UnknownComputedNames { names, .. }) if names == [">sum"]
        ));

        let config =
            PhaseConfig::new(Phase::Enter, vec!["{>_hidden}".into(), computer()].into(), &[])
                .unwrap();
        assert!(matches!(
            config.validate_computed(),
            Err(DogError::ReservedComputedName { .. })
        ));

        let config =
            PhaseConfig::new(Phase::Enter, vec!["{>sum} {>nope}".into(), computer()].into(), &[])
                .unwrap();
        assert!(matches!(
            config.validate_computed(),
            Err(DogError::UnknownComputedNames { names, .. }) if names == [">nope"]
        ));
    }

    #[test]
    fn test_shared_extras_come_first() {
        let shared: SharedAttributes =
            Arc::new(AttributeSet::new("shared").with_attribute("who", |_| "shared"));
        let config = PhaseConfig::new(
            Phase::Enter,
            vec![
                "hi".into(),
                SpecPart::extra(AttributeSet::new("own").with_attribute("who", |_| "own")),
            ]
            .into(),
            &[shared],
        )
        .unwrap();
        let names: Vec<&str> = config
            .extras()
            .unwrap()
            .providers()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, ["shared", "own"]);
    }
}
