//! Batch search for elements whose state contradicts their conformance.
use std::collections::BTreeMap;

use serde::Serialize;

use super::feature::feature_status;
use super::messages;
use super::{ClusterScope, ElementDescriptor, compile};
use crate::conformance::{Conformance, ConformanceLevel, ElementStateMap};
use crate::error::ParseError;

/// Elements that must change state, keyed by element id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Mandatory but disabled.
    pub required: BTreeMap<String, String>,
    /// Not supported but enabled.
    pub not_supported: BTreeMap<String, String>,
}

impl ScanReport {
    /// Return `true` if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.not_supported.is_empty()
    }
}

struct Finding<'a> {
    element: &'a ElementDescriptor,
    level: ConformanceLevel,
    message: String,
}

fn findings<'a>(
    elements: &'a [ElementDescriptor],
    state: &ElementStateMap,
) -> Result<Vec<Finding<'a>>, ParseError> {
    let mut found = Vec::new();
    for element in elements {
        let Some(conformance) = compile(&element.conformance)? else {
            continue;
        };
        if !conforms_to_state(&conformance, state) {
            continue;
        }
        let level = conformance.evaluate(state);
        let enabled = state.is_enabled(&element.name);
        if let Some(required) = level.required_state()
            && required != enabled
        {
            found.push(Finding {
                element,
                level,
                message: messages::element_status(element, required, state),
            });
        }
    }
    Ok(found)
}

/// Elements whose expression references nothing in the map have nothing to
/// conform to.
fn conforms_to_state(conformance: &Conformance, state: &ElementStateMap) -> bool {
    conformance.operands().any(|op| state.contains(op))
}

/// Evaluate every element against `state` and collect the ones that are
/// mandatory but disabled or not supported but enabled.
///
/// # Errors
///
/// Returns a [`ParseError`] if an element's conformance is malformed.
pub fn scan_required_and_unsupported(
    elements: &[ElementDescriptor],
    state: &ElementStateMap,
) -> Result<ScanReport, ParseError> {
    let mut report = ScanReport::default();
    for finding in findings(elements, state)? {
        let target = if finding.level == ConformanceLevel::Mandatory {
            &mut report.required
        } else {
            &mut report.not_supported
        };
        target.insert(finding.element.id.clone(), finding.message);
    }
    Ok(report)
}

/// Every compliance warning a cluster raises as it stands: features whose
/// state contradicts their level, then non-conforming attributes, commands
/// and events.
///
/// # Errors
///
/// Returns a [`ParseError`] if any conformance expression is malformed.
pub fn cluster_compliance_warnings(
    scope: &ClusterScope,
    state: &ElementStateMap,
) -> Result<Vec<String>, ParseError> {
    let mut warnings = Vec::new();
    for feature in &scope.features {
        let Some(conformance) = compile(&feature.conformance)? else {
            continue;
        };
        let enabled = state.is_enabled(&feature.code);
        if let Some(status) = feature_status(conformance.evaluate(state), enabled) {
            warnings.push(messages::feature_status(scope.endpoint_id, feature, status, state));
        }
    }

    let mut found = findings(&scope.elements, state)?;
    found.sort_by_key(|f| f.element.kind);
    warnings.extend(found.into_iter().map(|f| {
        messages::cluster_element_warning(
            scope.endpoint_id,
            &scope.cluster_name,
            f.element.kind,
            &f.message,
        )
    }));
    Ok(warnings)
}
