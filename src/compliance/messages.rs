//! Warning templates.
//!
//! The notification store retracts stale warnings by substring match against
//! prefixes built here, so every fragment is a named constant and every
//! message is assembled by exactly one function.
use super::{ElementDescriptor, ElementKind, FeatureDescriptor};
use crate::conformance::{ElementStateMap, OperandKind, is_reserved_operand, lexer};

/// Leading text of every compliance warning.
pub const COMPLIANCE_PREFIX: &str = "⚠ Check Feature Compliance on endpoint: ";
/// Suffix naming the feature's bit.
pub const FEATURE_BIT_SUFFIX: &str = "in featureMap attribute";

/// Refusal: the feature depends on operands with no recorded state.
pub const UNKNOWN_OPERANDS: &str =
    " cannot be enabled as its conformance depends on non device type features ";
/// Closes [`UNKNOWN_OPERANDS`].
pub const UNKNOWN_OPERANDS_END: &str = " with unknown values";
/// Refusal: the feature's own conformance mentions `desc`.
pub const FEATURE_TOO_COMPLEX: &str = " cannot be enabled as its conformance is too complex to parse";
/// Refusal: dependent elements mention `desc`.
pub const ELEMENTS_TOO_COMPLEX_START: &str = " cannot be enabled as ";
/// Closes [`ELEMENTS_TOO_COMPLEX_START`].
pub const ELEMENTS_TOO_COMPLEX_END: &str =
    " depend on the feature and their conformance are too complex to parse";
/// Refusal: dependent features would have to change too.
pub const DEPENDENT_FEATURES: &str = " until dependent features are updated: ";

/// Status: enabled but not supported.
pub const SHOULD_BE_DISABLED: &str = " should be disabled, as it is not supported";
/// Status: enabled but provisional.
pub const STILL_PROVISIONAL: &str = " is enabled, but it is still provisional";
/// Status: disabled but mandatory.
pub const SHOULD_BE_ENABLED: &str = " should be enabled, as it is mandatory";
/// Introduces the device type list of a status message.
pub const FOR_DEVICE_TYPE: &str = " for device type: ";

/// Leading text of an element message, between name and expression.
pub const ELEMENT_CONFORMANCE: &str = " has mandatory conformance to ";
/// Follows the expression in an element message.
pub const ELEMENT_SHOULD_BE: &str = " and should be";

/// Status messages emitted for a feature whose level dictates its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureStatus {
    /// Enabled but [`NotSupported`](crate::conformance::ConformanceLevel::NotSupported).
    ShouldBeDisabled,
    /// Enabled but provisional.
    StillProvisional,
    /// Disabled but mandatory.
    ShouldBeEnabled,
}

impl FeatureStatus {
    const fn phrase(self) -> &'static str {
        match self {
            Self::ShouldBeDisabled => SHOULD_BE_DISABLED,
            Self::StillProvisional => STILL_PROVISIONAL,
            Self::ShouldBeEnabled => SHOULD_BE_ENABLED,
        }
    }
}

const fn state_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// `⚠ Check Feature Compliance on endpoint: <id>, cluster: <name>, `
#[must_use]
pub fn cluster_context(endpoint_id: u16, cluster: &str) -> String {
    format!("{COMPLIANCE_PREFIX}{endpoint_id}, cluster: {cluster}, ")
}

/// Prefix shared by every warning about `feature`; also its retraction pattern.
#[must_use]
pub fn feature_prefix(endpoint_id: u16, feature: &FeatureDescriptor) -> String {
    format!(
        "{}feature: {} ({}) (bit {} {FEATURE_BIT_SUFFIX})",
        cluster_context(endpoint_id, &feature.cluster),
        feature.name,
        feature.code,
        feature.bit,
    )
}

/// Refusal naming operands without a recorded state.
#[must_use]
pub fn unknown_operands(endpoint_id: u16, feature: &FeatureDescriptor, missing: &[String]) -> String {
    format!(
        "{}{UNKNOWN_OPERANDS}{}{UNKNOWN_OPERANDS_END}.",
        feature_prefix(endpoint_id, feature),
        missing.join(", ")
    )
}

/// Refusal for a feature whose own conformance mentions `desc`.
#[must_use]
pub fn feature_too_complex(endpoint_id: u16, feature: &FeatureDescriptor) -> String {
    format!("{}{FEATURE_TOO_COMPLEX}.", feature_prefix(endpoint_id, feature))
}

/// Refusal naming dependent elements whose conformance mentions `desc`,
/// grouped as `attribute A, B, command C, event E`.
#[must_use]
pub fn elements_too_complex(
    endpoint_id: u16,
    feature: &FeatureDescriptor,
    elements: &[&ElementDescriptor],
) -> String {
    let groups: Vec<String> = [ElementKind::Attribute, ElementKind::Command, ElementKind::Event]
        .into_iter()
        .filter_map(|kind| {
            let names: Vec<&str> = elements
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.name.as_str())
                .collect();
            (!names.is_empty()).then(|| format!("{kind} {}", names.join(", ")))
        })
        .collect();
    format!(
        "{}{ELEMENTS_TOO_COMPLEX_START}{}{ELEMENTS_TOO_COMPLEX_END}.",
        feature_prefix(endpoint_id, feature),
        groups.join(", ")
    )
}

/// Refusal listing dependent features and the state each would need.
#[must_use]
pub fn dependent_features(
    endpoint_id: u16,
    feature: &FeatureDescriptor,
    new_bit: bool,
    updates: &[(&FeatureDescriptor, bool)],
) -> String {
    let items: Vec<String> = updates
        .iter()
        .map(|(dependent, enabled)| {
            format!(
                "{} ({}) should be {}",
                dependent.name,
                dependent.code,
                state_word(*enabled)
            )
        })
        .collect();
    format!(
        "{} cannot be {}{DEPENDENT_FEATURES}{}.",
        feature_prefix(endpoint_id, feature),
        state_word(new_bit),
        items.join(", ")
    )
}

/// Status message for a feature, naming the operand states behind it.
#[must_use]
pub fn feature_status(
    endpoint_id: u16,
    feature: &FeatureDescriptor,
    status: FeatureStatus,
    state: &ElementStateMap,
) -> String {
    let mut message = feature_prefix(endpoint_id, feature);
    message.push_str(status.phrase());
    if !feature.device_types.is_empty() {
        message.push_str(FOR_DEVICE_TYPE);
        message.push_str(&feature.device_types.join(", "));
    }
    push_operand_clause(&mut message, &feature.conformance, state);
    message.push('.');
    message
}

/// Message for an element whose level dictates a state it is not in.
#[must_use]
pub fn element_status(element: &ElementDescriptor, required: bool, state: &ElementStateMap) -> String {
    let mut message = element_pattern(element);
    message.push(' ');
    message.push_str(state_word(required));
    push_operand_clause(&mut message, &element.conformance, state);
    message.push('.');
    message
}

/// Retraction pattern matching every [`element_status`] message of `element`.
#[must_use]
pub fn element_pattern(element: &ElementDescriptor) -> String {
    format!(
        "{}{ELEMENT_CONFORMANCE}{}{ELEMENT_SHOULD_BE}",
        element.name, element.conformance
    )
}

/// An element warning in the context of its cluster, as raised on import.
#[must_use]
pub fn cluster_element_warning(
    endpoint_id: u16,
    cluster: &str,
    kind: ElementKind,
    message: &str,
) -> String {
    format!("{}{kind}: {message}", cluster_context(endpoint_id, cluster))
}

/// Append ` when feature: A is enabled, element: B is disabled` for the
/// operands of `conformance`. Feature operands come first; protocol operands
/// and keywords are left out.
fn push_operand_clause(message: &mut String, conformance: &str, state: &ElementStateMap) {
    let operands: Vec<&str> = lexer::operands(conformance)
        .into_iter()
        .filter(|op| !is_reserved_operand(op))
        .collect();
    let describe = |label: &str, op: &str| format!("{label}: {op} is {}", state_word(state.is_enabled(op)));
    let mut terms: Vec<String> = operands
        .iter()
        .copied()
        .filter(|op| state.kind(op) == Some(OperandKind::Feature))
        .map(|op| describe("feature", op))
        .collect();
    terms.extend(
        operands
            .iter()
            .copied()
            .filter(|op| state.kind(op) != Some(OperandKind::Feature))
            .map(|op| describe("element", op)),
    );
    if !terms.is_empty() {
        message.push_str(" when ");
        message.push_str(&terms.join(", "));
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn state() -> ElementStateMap {
        ElementStateMap::new()
            .with_feature("CT", false)
            .with_feature("LT", true)
            .with_element("OnTime", true)
    }

    #[test]
    fn feature_prefix_names_code_and_bit() {
        insta::assert_snapshot!(
            feature_prefix(1, &feature("CT", 4, "Matter & CT")),
            @"⚠ Check Feature Compliance on endpoint: 1, cluster: On/Off, feature: CT Feature (CT) (bit 4 in featureMap attribute)"
        );
    }

    #[test]
    fn unknown_operands_message() {
        insta::assert_snapshot!(
            unknown_operands(2, &feature("LT", 0, "LT & XY"), &["XY".to_string(), "ZZ".to_string()]),
            @"⚠ Check Feature Compliance on endpoint: 2, cluster: On/Off, feature: LT Feature (LT) (bit 0 in featureMap attribute) cannot be enabled as its conformance depends on non device type features XY, ZZ with unknown values."
        );
    }

    #[test]
    fn elements_too_complex_groups_by_kind() {
        let a = element(ElementKind::Attribute, "OnTime", "LT & desc", true);
        let b = element(ElementKind::Attribute, "OffWaitTime", "LT & desc", true);
        let e = element(ElementKind::Event, "StateChange", "desc", true);
        insta::assert_snapshot!(
            elements_too_complex(1, &feature("LT", 0, "O"), &[&a, &e, &b]),
            @"⚠ Check Feature Compliance on endpoint: 1, cluster: On/Off, feature: LT Feature (LT) (bit 0 in featureMap attribute) cannot be enabled as attribute OnTime, OffWaitTime, event StateChange depend on the feature and their conformance are too complex to parse."
        );
    }

    #[test]
    fn dependent_features_message() {
        let dependent = feature("DF", 1, "LT");
        insta::assert_snapshot!(
            dependent_features(1, &feature("LT", 0, "O"), false, &[(&dependent, false)]),
            @"⚠ Check Feature Compliance on endpoint: 1, cluster: On/Off, feature: LT Feature (LT) (bit 0 in featureMap attribute) cannot be disabled until dependent features are updated: DF Feature (DF) should be disabled."
        );
    }

    #[test]
    fn feature_status_names_operand_states() {
        insta::assert_snapshot!(
            feature_status(1, &feature("XX", 3, "Matter & CT | OnTime"), FeatureStatus::ShouldBeDisabled, &state()),
            @"⚠ Check Feature Compliance on endpoint: 1, cluster: On/Off, feature: XX Feature (XX) (bit 3 in featureMap attribute) should be disabled, as it is not supported for device type: Dimmable Light when feature: CT is disabled, element: OnTime is enabled."
        );
    }

    #[test]
    fn feature_status_without_operands_or_device_types() {
        let mut provisional = feature("PR", 5, "P");
        provisional.device_types.clear();
        assert_eq!(
            feature_status(1, &provisional, FeatureStatus::StillProvisional, &state()),
            format!("{} is enabled, but it is still provisional.", feature_prefix(1, &provisional))
        );
    }

    #[test]
    fn element_status_message() {
        let attr = element(ElementKind::Attribute, "OnTime", "LT", false);
        insta::assert_snapshot!(
            element_status(&attr, true, &state()),
            @"OnTime has mandatory conformance to LT and should be enabled when feature: LT is enabled."
        );
    }

    #[test]
    fn element_pattern_is_prefix_of_status() {
        let attr = element(ElementKind::Command, "OffWithEffect", "LT", true);
        let message = element_status(&attr, false, &state());
        assert!(message.starts_with(&element_pattern(&attr)));
    }

    #[test]
    fn cluster_element_warning_message() {
        insta::assert_snapshot!(
            cluster_element_warning(3, "Level Control", ElementKind::Command, "Stop has mandatory conformance to LT and should be enabled."),
            @"⚠ Check Feature Compliance on endpoint: 3, cluster: Level Control, command: Stop has mandatory conformance to LT and should be enabled."
        );
    }
}
