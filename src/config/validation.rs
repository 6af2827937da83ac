//! Cluster profile validation.

use std::collections::HashMap;

use crate::compliance::{ElementDescriptor, FeatureDescriptor};
use crate::conformance::{ABBREVIATIONS, Conformance, DESCRIBED};

use super::profile::ClusterProfile;

/// Number of bits in the featureMap attribute.
const FEATURE_MAP_BITS: u8 = 32;

/// A validation warning detected during profile loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The profile file the warning refers to.
    pub source: String,
    /// The feature code or element name that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for profile validators.
///
/// Implementations check a profile for problems that do not stop it from
/// loading but will make conformance checks misleading:
/// - Names that shadow grammar keywords
/// - Duplicate codes, names or bits
/// - Expressions that do not parse
pub trait ConfigValidator {
    /// Validate and return any warnings found; `source` names the profile.
    fn validate(&self, source: &str) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator (e.g., "features").
    fn name(&self) -> &'static str;
}

fn is_keyword(name: &str) -> bool {
    name == DESCRIBED || ABBREVIATIONS.contains(&name)
}

fn check_expression(source: &str, item: &str, expression: &str, warnings: &mut Vec<ValidationWarning>) {
    if expression.trim().is_empty() {
        return;
    }
    if let Err(e) = Conformance::parse(expression) {
        warnings.push(ValidationWarning::new(
            source,
            item,
            format!("conformance '{expression}' does not parse: {e}"),
        ));
    }
}

/// Validator for feature declarations.
#[derive(Debug)]
pub struct FeatureValidator<'a> {
    features: &'a [FeatureDescriptor],
}

impl<'a> FeatureValidator<'a> {
    /// Create a validator over `features`.
    #[must_use]
    pub const fn new(features: &'a [FeatureDescriptor]) -> Self {
        Self { features }
    }
}

impl ConfigValidator for FeatureValidator<'_> {
    fn validate(&self, source: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut codes: HashMap<&str, usize> = HashMap::new();
        let mut bits: HashMap<u8, &str> = HashMap::new();

        for feature in self.features {
            *codes.entry(feature.code.as_str()).or_default() += 1;

            if feature.bit >= FEATURE_MAP_BITS {
                warnings.push(ValidationWarning::new(
                    source,
                    &feature.code,
                    format!("bit {} is outside the 32-bit featureMap", feature.bit),
                ));
            }

            if let Some(other) = bits.insert(feature.bit, &feature.code)
                && other != feature.code
            {
                warnings.push(ValidationWarning::new(
                    source,
                    &feature.code,
                    format!("bit {} is also used by feature {other}", feature.bit),
                ));
            }

            if is_keyword(&feature.code) {
                warnings.push(ValidationWarning::new(
                    source,
                    &feature.code,
                    "feature code is a reserved conformance keyword",
                ));
            }

            check_expression(source, &feature.code, &feature.conformance, &mut warnings);
        }

        let mut duplicates: Vec<&str> = codes
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(code, _)| code)
            .collect();
        duplicates.sort_unstable();
        for code in duplicates {
            warnings.push(ValidationWarning::new(
                source,
                code,
                "feature code is declared more than once",
            ));
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "features"
    }
}

/// Validator for attribute, command and event declarations.
#[derive(Debug)]
pub struct ElementValidator<'a> {
    elements: &'a [ElementDescriptor],
    features: &'a [FeatureDescriptor],
}

impl<'a> ElementValidator<'a> {
    /// Create a validator over `elements`; `features` are checked for name clashes.
    #[must_use]
    pub const fn new(elements: &'a [ElementDescriptor], features: &'a [FeatureDescriptor]) -> Self {
        Self { elements, features }
    }
}

impl ConfigValidator for ElementValidator<'_> {
    fn validate(&self, source: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for element in self.elements {
            let count = seen.entry(element.name.as_str()).or_default();
            *count += 1;
            if *count == 2 {
                warnings.push(ValidationWarning::new(
                    source,
                    &element.name,
                    "element name is declared more than once; operand state is ambiguous",
                ));
            }

            if is_keyword(&element.name) {
                warnings.push(ValidationWarning::new(
                    source,
                    &element.name,
                    format!("{} name is a reserved conformance keyword", element.kind),
                ));
            }

            if self.features.iter().any(|f| f.code == element.name) {
                warnings.push(ValidationWarning::new(
                    source,
                    &element.name,
                    format!("{} name shadows a feature code", element.kind),
                ));
            }

            check_expression(source, &element.name, &element.conformance, &mut warnings);
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "elements"
    }
}

/// Validate a profile and return collected warnings.
#[must_use]
pub fn validate_all(profile: &ClusterProfile) -> Vec<ValidationWarning> {
    let scope = profile.scope();
    let source = profile.path().display().to_string();
    let validators: Vec<Box<dyn ConfigValidator>> = vec![
        Box::new(FeatureValidator::new(&scope.features)),
        Box::new(ElementValidator::new(&scope.elements, &scope.features)),
    ];

    let mut all_warnings = Vec::new();
    for validator in validators {
        let warnings = validator.validate(&source);
        tracing::debug!(validator = validator.name(), count = warnings.len(), "validated profile");
        all_warnings.extend(warnings);
    }

    all_warnings
}
