//! Cascading re-evaluation when one feature bit is toggled.
use std::collections::BTreeMap;

use super::messages::{self, FeatureStatus};
use super::{ClusterScope, ElementDescriptor, ElementUpdate, FeatureDescriptor, UpdatePlan, compile};
use crate::conformance::{Conformance, ConformanceLevel, ElementStateMap};
use crate::error::ParseError;

/// Work out what toggling `changed` to `new_bit` means for the cluster.
///
/// `state` is the snapshot before the toggle; the check evaluates against a
/// copy with `changed.code` set to `new_bit`. The toggle is refused (the plan
/// has `disable_change` set and no element updates) when the feature depends
/// on operands with no recorded state, when it or a dependent element is too
/// complex to evaluate, or when dependent features would have to change too.
///
/// # Errors
///
/// Returns a [`ParseError`] if any conformance expression involved is
/// malformed. Refusals are reported in the plan, never as errors.
pub fn check_feature_change(
    scope: &ClusterScope,
    changed: &FeatureDescriptor,
    new_bit: bool,
    state: &ElementStateMap,
) -> Result<UpdatePlan, ParseError> {
    let endpoint = scope.endpoint_id;
    let own = Conformance::parse(&changed.conformance)?;
    let next = state.toggled(&changed.code, new_bit);

    let missing = own.missing_operands(&next);
    if !missing.is_empty() {
        tracing::debug!(feature = %changed.code, ?missing, "refusing toggle: unknown operands");
        return Ok(UpdatePlan::refused(messages::unknown_operands(
            endpoint, changed, &missing,
        )));
    }
    if own.is_described() {
        tracing::debug!(feature = %changed.code, "refusing toggle: conformance too complex");
        return Ok(UpdatePlan::refused(messages::feature_too_complex(
            endpoint, changed,
        )));
    }

    let mut features_to_update = BTreeMap::new();
    let mut dependents: Vec<(&FeatureDescriptor, bool)> = Vec::new();
    let mut changed_conform_features: Vec<&FeatureDescriptor> = Vec::new();
    for feature in scope.features.iter().filter(|f| f.code != changed.code) {
        let Some(conformance) = compile(&feature.conformance)? else {
            continue;
        };
        if !conformance.references(&changed.code) {
            continue;
        }
        let before = conformance.evaluate(state);
        let after = conformance.evaluate(&next);
        let enabled = next.is_enabled(&feature.code);
        if after.is_violated_by(enabled) {
            features_to_update.insert(feature.code.clone(), !enabled);
            dependents.push((feature, !enabled));
        }
        if before != after {
            changed_conform_features.push(feature);
        }
    }

    let mut dependent_elements = Vec::new();
    for element in &scope.elements {
        if let Some(conformance) = compile(&element.conformance)?
            && conformance.references(&changed.code)
        {
            dependent_elements.push((element, conformance));
        }
    }
    let too_complex: Vec<&ElementDescriptor> = dependent_elements
        .iter()
        .filter(|(_, conformance)| conformance.is_described())
        .map(|(element, _)| *element)
        .collect();
    if !too_complex.is_empty() {
        tracing::debug!(feature = %changed.code, count = too_complex.len(), "refusing toggle: dependent elements too complex");
        return Ok(UpdatePlan::refused(messages::elements_too_complex(
            endpoint,
            changed,
            &too_complex,
        )));
    }

    if !dependents.is_empty() {
        tracing::debug!(feature = %changed.code, ?features_to_update, "refusing toggle: dependent features");
        let mut plan = UpdatePlan::refused(messages::dependent_features(
            endpoint,
            changed,
            new_bit,
            &dependents,
        ));
        plan.features_to_update = features_to_update;
        return Ok(plan);
    }

    let level = own.evaluate(&next);
    let status = feature_status(level, new_bit);
    let warnings = status
        .map(|status| messages::feature_status(endpoint, changed, status, &next))
        .into_iter()
        .collect();

    let mut elements_to_update = Vec::new();
    let mut outdated_warning_patterns = vec![messages::feature_prefix(endpoint, changed)];
    outdated_warning_patterns.extend(
        changed_conform_features
            .iter()
            .map(|feature| messages::feature_prefix(endpoint, feature)),
    );
    for (element, conformance) in &dependent_elements {
        let after = conformance.evaluate(&next);
        let enabled = next.is_enabled(&element.name);
        if after.is_violated_by(enabled) {
            elements_to_update.push(ElementUpdate {
                element: (*element).clone(),
                enabled: !enabled,
            });
        }
        if conformance.evaluate(state) != after {
            outdated_warning_patterns.push(messages::element_pattern(element));
        }
    }

    Ok(UpdatePlan {
        elements_to_update,
        features_to_update,
        warnings,
        disable_change: false,
        display_warning: status.is_some(),
        outdated_warning_patterns,
        level: Some(level),
    })
}

/// The status message a feature in state `enabled` deserves at `level`, if any.
pub(crate) const fn feature_status(level: ConformanceLevel, enabled: bool) -> Option<FeatureStatus> {
    match level {
        ConformanceLevel::NotSupported if enabled => Some(FeatureStatus::ShouldBeDisabled),
        ConformanceLevel::Provisional if enabled => Some(FeatureStatus::StillProvisional),
        ConformanceLevel::Mandatory if !enabled => Some(FeatureStatus::ShouldBeEnabled),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::ElementKind;
    use super::super::test_support::*;
    use super::*;
    use crate::conformance::FeatureMapValue;

    // -----------------------------------------------------------------------
    // Refusals
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_operands_refuse_the_change() {
        let lt = feature("LT", 0, "LT & QQ");
        let scope = scope(vec![lt.clone()], vec![]);
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(plan.disable_change);
        assert!(plan.display_warning);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("non device type features QQ with unknown values"));
        assert!(plan.elements_to_update.is_empty());
    }

    #[test]
    fn described_feature_refuses_the_change() {
        let lt = feature("LT", 0, "desc");
        let scope = scope(vec![lt.clone()], vec![]);
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(plan.disable_change);
        assert!(plan.warnings[0].contains("too complex to parse"));
    }

    #[test]
    fn described_dependent_element_refuses_the_change() {
        let lt = feature("LT", 0, "O");
        let scope = scope(
            vec![lt.clone()],
            vec![
                element(ElementKind::Attribute, "OnTime", "LT & desc", false),
                element(ElementKind::Command, "Toggle", "M", true),
            ],
        );
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(plan.disable_change);
        assert!(plan.warnings[0].contains("as attribute OnTime depend on the feature"));
        assert!(plan.elements_to_update.is_empty());
    }

    #[test]
    fn dependent_feature_becoming_mandatory_refuses_the_change() {
        let x = feature("XX", 0, "O");
        let y = feature("YY", 1, "XX");
        let scope = scope(vec![x.clone(), y], vec![]);
        let plan = check_feature_change(&scope, &x, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(plan.disable_change);
        assert_eq!(plan.features_to_update, BTreeMap::from([("YY".to_string(), true)]));
        assert!(plan.warnings[0].contains("YY Feature (YY) should be enabled"));
        assert!(plan.elements_to_update.is_empty());
    }

    #[test]
    fn dependent_feature_becoming_unsupported_refuses_the_change() {
        let x = feature("XX", 0, "O");
        let y = feature("YY", 1, "[XX]");
        let scope = scope(vec![x.clone(), y], vec![]);
        let plan = check_feature_change(&scope, &x, false, &scope.state(FeatureMapValue(0b11))).unwrap();
        assert!(plan.disable_change);
        assert_eq!(plan.features_to_update, BTreeMap::from([("YY".to_string(), false)]));
        assert!(plan.warnings[0].contains("cannot be disabled"));
    }

    #[test]
    fn malformed_sibling_is_an_error() {
        let x = feature("XX", 0, "O");
        let y = feature("YY", 1, "XX & (");
        let scope = scope(vec![x.clone(), y], vec![]);
        assert!(check_feature_change(&scope, &x, true, &scope.state(FeatureMapValue(0))).is_err());
    }

    // -----------------------------------------------------------------------
    // Accepted changes
    // -----------------------------------------------------------------------

    #[test]
    fn enabled_unsupported_feature_warns() {
        let ct = feature("CT", 0, "O");
        let xx = feature("XX", 1, "Matter & CT");
        let scope = scope(vec![ct, xx.clone()], vec![]);
        let plan = check_feature_change(&scope, &xx, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(!plan.disable_change);
        assert!(plan.display_warning);
        assert_eq!(plan.level, Some(ConformanceLevel::NotSupported));
        assert!(plan.warnings[0].contains("should be disabled, as it is not supported for device type: Dimmable Light"));
    }

    #[test]
    fn disabling_mandatory_feature_warns() {
        let lt = feature("LT", 0, "M");
        let scope = scope(vec![lt.clone()], vec![]);
        let plan = check_feature_change(&scope, &lt, false, &scope.state(FeatureMapValue(1))).unwrap();
        assert!(!plan.disable_change);
        assert!(plan.display_warning);
        assert!(plan.warnings[0].contains("should be enabled, as it is mandatory"));
    }

    #[test]
    fn enabling_provisional_feature_warns() {
        let lt = feature("LT", 0, "P");
        let scope = scope(vec![lt.clone()], vec![]);
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(plan.display_warning);
        assert!(plan.warnings[0].contains("still provisional"));
    }

    #[test]
    fn conforming_change_is_silent() {
        let lt = feature("LT", 0, "O");
        let scope = scope(vec![lt.clone()], vec![]);
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(!plan.disable_change);
        assert!(!plan.display_warning);
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.level, Some(ConformanceLevel::Optional));
    }

    #[test]
    fn dependent_elements_are_flipped() {
        let lt = feature("LT", 0, "O");
        let scope = scope(
            vec![lt.clone()],
            vec![
                element(ElementKind::Attribute, "OnTime", "LT", false),
                element(ElementKind::Command, "OffWithEffect", "!LT", true),
                element(ElementKind::Event, "StateChange", "[LT]", false),
                element(ElementKind::Attribute, "OnOff", "M", false),
            ],
        );
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        let flips: Vec<(&str, bool)> = plan
            .elements_to_update
            .iter()
            .map(|u| (u.element.name.as_str(), u.enabled))
            .collect();
        assert_eq!(flips, [("OnTime", true), ("OffWithEffect", false)]);
    }

    #[test]
    fn outdated_patterns_cover_changed_feature_siblings_and_elements() {
        let lt = feature("LT", 0, "O");
        let df = feature("DF", 1, "LT, O");
        let scope = scope(
            vec![lt.clone(), df.clone()],
            vec![
                element(ElementKind::Attribute, "OnTime", "LT", false),
                element(ElementKind::Attribute, "GlobalSceneControl", "O", false),
            ],
        );
        // DF becomes mandatory but is already enabled, so the change goes through.
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0b10))).unwrap();
        assert!(!plan.disable_change);
        assert_eq!(
            plan.outdated_warning_patterns,
            [
                messages::feature_prefix(1, &lt),
                messages::feature_prefix(1, &df),
                "OnTime has mandatory conformance to LT and should be".to_string(),
            ]
        );
    }

    #[test]
    fn elements_without_conformance_are_ignored() {
        let lt = feature("LT", 0, "O");
        let scope = scope(
            vec![lt.clone(), feature("DF", 1, "")],
            vec![element(ElementKind::Attribute, "ClusterRevision", "", true)],
        );
        let plan = check_feature_change(&scope, &lt, true, &scope.state(FeatureMapValue(0))).unwrap();
        assert!(!plan.disable_change);
        assert!(plan.elements_to_update.is_empty());
    }

    #[test]
    fn operand_match_is_whole_word() {
        let lt = feature("LT", 0, "O");
        let scope = scope(
            vec![lt.clone()],
            vec![element(ElementKind::Attribute, "Other", "LTX", false)],
        );
        let mut state = scope.state(FeatureMapValue(0));
        state.set_element("LTX", true);
        let plan = check_feature_change(&scope, &lt, true, &state).unwrap();
        assert!(plan.elements_to_update.is_empty());
    }

    #[test]
    fn feature_status_table() {
        assert_eq!(feature_status(ConformanceLevel::NotSupported, true), Some(FeatureStatus::ShouldBeDisabled));
        assert_eq!(feature_status(ConformanceLevel::NotSupported, false), None);
        assert_eq!(feature_status(ConformanceLevel::Provisional, true), Some(FeatureStatus::StillProvisional));
        assert_eq!(feature_status(ConformanceLevel::Mandatory, false), Some(FeatureStatus::ShouldBeEnabled));
        assert_eq!(feature_status(ConformanceLevel::Mandatory, true), None);
        assert_eq!(feature_status(ConformanceLevel::Optional, true), None);
        assert_eq!(feature_status(ConformanceLevel::Described, false), None);
    }
}
