//! Feature compliance checks for one cluster instance.
//!
//! - **[`feature`]**: cascading re-evaluation when a feature bit is toggled
//! - **[`scan`]**: batch search for required and unsupported elements
//! - **[`messages`]**: warning templates consumed by the notification store
pub mod feature;
pub mod messages;
pub mod scan;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conformance::{Conformance, ConformanceLevel, ElementStateMap, FeatureMapValue};
use crate::error::ParseError;

pub use feature::check_feature_change;
pub use scan::{ScanReport, cluster_compliance_warnings, scan_required_and_unsupported};

/// Kind of a non-feature cluster element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A cluster attribute.
    Attribute,
    /// A cluster command.
    Command,
    /// A cluster event.
    Event,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::Command => "command",
            Self::Event => "event",
        })
    }
}

/// A device-type feature of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDescriptor {
    /// Short code used as an operand (e.g. `LT`).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Bit index in the featureMap attribute.
    pub bit: u8,
    /// Conformance expression.
    pub conformance: String,
    /// Name of the cluster declaring the feature.
    pub cluster: String,
    /// Device types the conformance applies to.
    pub device_types: Vec<String>,
}

/// An attribute, command or event of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    /// Stable identifier reported in scan results.
    pub id: String,
    /// Name used as an operand.
    pub name: String,
    /// Element kind.
    pub kind: ElementKind,
    /// Conformance expression; empty when the schema declares none.
    pub conformance: String,
    /// Current state.
    pub enabled: bool,
}

/// Everything the checker needs to know about one cluster on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterScope {
    /// Endpoint identifier.
    pub endpoint_id: u16,
    /// Cluster name.
    pub cluster_name: String,
    /// Device-type features of the cluster.
    pub features: Vec<FeatureDescriptor>,
    /// Attributes, commands and events of the cluster.
    pub elements: Vec<ElementDescriptor>,
}

impl ClusterScope {
    /// Build the operand snapshot for this cluster: one entry per feature,
    /// decoded from `feature_map`, and one per element.
    ///
    /// # Examples
    ///
    /// ```
    /// use conformance_cli::compliance::{ClusterScope, FeatureDescriptor};
    /// use conformance_cli::conformance::FeatureMapValue;
    ///
    /// let scope = ClusterScope {
    ///     endpoint_id: 1,
    ///     cluster_name: "On/Off".into(),
    ///     features: vec![FeatureDescriptor {
    ///         code: "LT".into(),
    ///         name: "Lighting".into(),
    ///         bit: 0,
    ///         conformance: "O".into(),
    ///         cluster: "On/Off".into(),
    ///         device_types: vec![],
    ///     }],
    ///     elements: vec![],
    /// };
    /// assert!(scope.state(FeatureMapValue(1)).is_enabled("LT"));
    /// ```
    #[must_use]
    pub fn state(&self, feature_map: FeatureMapValue) -> ElementStateMap {
        let mut state = ElementStateMap::new();
        for feature in &self.features {
            state.set_feature(feature.code.clone(), feature_map.is_set(feature.bit));
        }
        for element in &self.elements {
            state.set_element(element.name.clone(), element.enabled);
        }
        state
    }

    /// Look up a feature by code.
    #[must_use]
    pub fn feature(&self, code: &str) -> Option<&FeatureDescriptor> {
        self.features.iter().find(|f| f.code == code)
    }
}

/// A queued change to an element's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementUpdate {
    /// The element to change.
    pub element: ElementDescriptor,
    /// State the element must be switched to.
    pub enabled: bool,
}

/// Result of checking a feature toggle.
///
/// A refused plan (`disable_change`) never carries element updates; its
/// `features_to_update` is informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlan {
    /// Elements whose state must flip for the cluster to conform.
    pub elements_to_update: Vec<ElementUpdate>,
    /// Dependent features and the state they would need.
    pub features_to_update: BTreeMap<String, bool>,
    /// Warning texts for the notification store.
    pub warnings: Vec<String>,
    /// The toggle must not be applied.
    pub disable_change: bool,
    /// The warnings should be shown to the user.
    pub display_warning: bool,
    /// Message prefixes of notifications made stale by the toggle.
    pub outdated_warning_patterns: Vec<String>,
    /// Level of the toggled feature after the change, when evaluated.
    pub level: Option<ConformanceLevel>,
}

impl UpdatePlan {
    pub(crate) fn refused(warning: String) -> Self {
        Self {
            warnings: vec![warning],
            disable_change: true,
            display_warning: true,
            ..Self::default()
        }
    }
}

/// Compile an element or sibling feature's conformance; `None` when it declares none.
fn compile(expression: &str) -> Result<Option<Conformance>, ParseError> {
    if expression.trim().is_empty() {
        return Ok(None);
    }
    Conformance::parse(expression).map(Some)
}
