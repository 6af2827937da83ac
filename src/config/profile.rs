//! Cluster profile files.
//!
//! A profile describes one cluster on one endpoint:
//!
//! ```toml
//! endpoint = 1
//! cluster = "On/Off"
//! feature_map = 1
//! device_types = ["Dimmable Light"]
//!
//! [[features]]
//! code = "LT"
//! name = "Lighting"
//! bit = 0
//! conformance = "O"
//!
//! [[attributes]]
//! name = "OnTime"
//! conformance_node = { mandatoryConform = [{ feature = "LT" }] }
//! enabled = true
//! ```
//!
//! Each feature and element gives its conformance either as an expression
//! string (`conformance`) or as a structured tree (`conformance_node`),
//! translated once at load time. An element without `enabled` starts enabled
//! unless it is optional.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::toml_loader::{load_toml, parse_toml, save_toml};
use crate::compliance::{
    ClusterScope, ElementDescriptor, ElementKind, FeatureDescriptor, UpdatePlan, check_feature_change,
};
use crate::conformance::xml::element_is_optional;
use crate::conformance::{ConformNode, ElementStateMap, FeatureMapValue, MATTER, ZIGBEE, translate};
use crate::error::{ConfigError, Error};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    endpoint: u16,
    cluster: String,
    #[serde(default)]
    feature_map: FeatureMapValue,
    #[serde(default)]
    device_types: Vec<String>,
    #[serde(default)]
    features: Vec<FeatureEntry>,
    #[serde(default)]
    attributes: Vec<ElementEntry>,
    #[serde(default)]
    commands: Vec<ElementEntry>,
    #[serde(default)]
    events: Vec<ElementEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureEntry {
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    bit: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformance_node: Option<ConformNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformance_node: Option<ConformNode>,
}

/// A loaded cluster profile.
#[derive(Debug, Clone)]
pub struct ClusterProfile {
    path: PathBuf,
    file: ProfileFile,
    scope: ClusterScope,
}

/// Load the profile at `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, is not a valid
/// profile, declares a protocol operand name, or gives a feature no
/// conformance.
pub fn load_profile(path: &Path) -> Result<ClusterProfile, ConfigError> {
    let file: ProfileFile = load_toml(path)?;
    ClusterProfile::from_file(path, file)
}

impl ClusterProfile {
    /// Parse a profile from TOML text; `path` names it in errors and is
    /// where [`save`](Self::save) writes.
    ///
    /// # Errors
    ///
    /// Same as [`load_profile`].
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ProfileFile = parse_toml(content, path)?;
        Self::from_file(path, file)
    }

    fn from_file(path: &Path, file: ProfileFile) -> Result<Self, ConfigError> {
        let source = path.display().to_string();
        let mut features = Vec::with_capacity(file.features.len());
        for entry in &file.features {
            check_name(&source, &entry.code)?;
            let conformance = resolve_conformance(
                &source,
                &entry.code,
                entry.conformance.as_deref(),
                entry.conformance_node.as_ref(),
            )?
            .ok_or_else(|| ConfigError::InvalidConformance {
                file: source.clone(),
                item: entry.code.clone(),
                message: "feature has no conformance".to_string(),
            })?;
            features.push(FeatureDescriptor {
                code: entry.code.clone(),
                name: entry.name.clone().unwrap_or_else(|| entry.code.clone()),
                bit: entry.bit,
                conformance,
                cluster: file.cluster.clone(),
                device_types: entry
                    .device_types
                    .clone()
                    .unwrap_or_else(|| file.device_types.clone()),
            });
        }

        let mut elements = Vec::new();
        for (kind, entries) in [
            (ElementKind::Attribute, &file.attributes),
            (ElementKind::Command, &file.commands),
            (ElementKind::Event, &file.events),
        ] {
            for entry in entries {
                check_name(&source, &entry.name)?;
                let conformance = resolve_conformance(
                    &source,
                    &entry.name,
                    entry.conformance.as_deref(),
                    entry.conformance_node.as_ref(),
                )?
                .unwrap_or_default();
                let enabled = entry
                    .enabled
                    .unwrap_or_else(|| !element_is_optional(entry.optional, &conformance, &entry.name));
                elements.push(ElementDescriptor {
                    id: entry.id.clone().unwrap_or_else(|| entry.name.clone()),
                    name: entry.name.clone(),
                    kind,
                    conformance,
                    enabled,
                });
            }
        }

        tracing::debug!(
            profile = %source,
            features = features.len(),
            elements = elements.len(),
            "loaded cluster profile"
        );
        let scope = ClusterScope {
            endpoint_id: file.endpoint,
            cluster_name: file.cluster.clone(),
            features,
            elements,
        };
        Ok(Self {
            path: path.to_path_buf(),
            file,
            scope,
        })
    }

    /// Path the profile was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Features and elements of the cluster.
    #[must_use]
    pub const fn scope(&self) -> &ClusterScope {
        &self.scope
    }

    /// Current featureMap value.
    #[must_use]
    pub const fn feature_map(&self) -> FeatureMapValue {
        self.file.feature_map
    }

    /// Operand snapshot of the cluster as it stands.
    #[must_use]
    pub fn state(&self) -> ElementStateMap {
        self.scope.state(self.file.feature_map)
    }

    /// Look up a feature by code.
    #[must_use]
    pub fn feature(&self, code: &str) -> Option<&FeatureDescriptor> {
        self.scope.feature(code)
    }

    /// Check toggling feature `code` to `new_bit` against the profile as it
    /// stands.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFeature`] if the profile has no feature
    /// `code`, or a parse error if a conformance expression is malformed.
    pub fn check_toggle(&self, code: &str, new_bit: bool) -> Result<UpdatePlan, Error> {
        let feature = self.feature(code).ok_or_else(|| ConfigError::UnknownFeature {
            file: self.path.display().to_string(),
            code: code.to_string(),
        })?;
        check_feature_change(&self.scope, feature, new_bit, &self.state()).map_err(Error::from)
    }

    /// Apply an accepted plan: set the feature's bit and flip the queued
    /// elements. Returns the new featureMap value, or `None` when the plan
    /// refused the change or the feature is unknown.
    pub fn apply_plan(&mut self, code: &str, new_bit: bool, plan: &UpdatePlan) -> Option<FeatureMapValue> {
        if plan.disable_change {
            return None;
        }
        let bit = self.scope.feature(code)?.bit;
        self.file.feature_map = self.file.feature_map.with_bit(bit, new_bit);

        for update in &plan.elements_to_update {
            let target = &update.element;
            if let Some(element) = self
                .scope
                .elements
                .iter_mut()
                .find(|e| e.kind == target.kind && e.name == target.name)
            {
                element.enabled = update.enabled;
            }
            let entries = match target.kind {
                ElementKind::Attribute => &mut self.file.attributes,
                ElementKind::Command => &mut self.file.commands,
                ElementKind::Event => &mut self.file.events,
            };
            if let Some(entry) = entries.iter_mut().find(|e| e.name == target.name) {
                entry.enabled = Some(update.enabled);
            }
        }
        Some(self.file.feature_map)
    }

    /// Write the profile back to its path. Comments are not preserved.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        save_toml(&self.path, &self.file)
    }
}

fn check_name(source: &str, name: &str) -> Result<(), ConfigError> {
    if name == MATTER || name == ZIGBEE {
        return Err(ConfigError::ReservedName {
            file: source.to_string(),
            item: name.to_string(),
        });
    }
    Ok(())
}

fn resolve_conformance(
    source: &str,
    item: &str,
    conformance: Option<&str>,
    node: Option<&ConformNode>,
) -> Result<Option<String>, ConfigError> {
    match (conformance, node) {
        (Some(_), Some(_)) => Err(ConfigError::InvalidConformance {
            file: source.to_string(),
            item: item.to_string(),
            message: "both conformance and conformance_node given".to_string(),
        }),
        (Some(expression), None) if expression.trim().is_empty() => Ok(None),
        (Some(expression), None) => Ok(Some(expression.trim().to_string())),
        (None, Some(node)) => translate(node)
            .map(Some)
            .map_err(|source| ConfigError::Translate {
                item: item.to_string(),
                source,
            }),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::compliance::ElementUpdate;

    const ON_OFF: &str = r#"
endpoint = 1
cluster = "On/Off"
feature_map = 1
device_types = ["Dimmable Light"]

[[features]]
code = "LT"
name = "Lighting"
bit = 0
conformance = "O"

[[features]]
code = "DF"
name = "DeadFrontBehavior"
bit = 2
conformance_node = { optionalConform = [{ notTerm = { feature = "LT" } }] }
device_types = ["On/Off Plug-in Unit"]

[[attributes]]
name = "OnOff"
conformance = "M"

[[attributes]]
id = "0x4001"
name = "OnTime"
conformance_node = { mandatoryConform = [{ feature = "LT" }] }
enabled = false

[[attributes]]
name = "StartUpOnOff"
conformance = "[LT]"

[[commands]]
name = "OffWithEffect"
conformance = "LT"
optional = false
"#;

    fn profile() -> ClusterProfile {
        ClusterProfile::from_toml(ON_OFF, Path::new("on-off.toml")).unwrap()
    }

    #[test]
    fn loads_features_with_defaults() {
        let profile = profile();
        let lt = profile.feature("LT").unwrap();
        assert_eq!(lt.name, "Lighting");
        assert_eq!(lt.cluster, "On/Off");
        assert_eq!(lt.device_types, ["Dimmable Light"]);
        let df = profile.feature("DF").unwrap();
        assert_eq!(df.conformance, "[!LT]");
        assert_eq!(df.device_types, ["On/Off Plug-in Unit"]);
    }

    #[test]
    fn loads_elements_of_every_kind() {
        let scope = profile().scope().clone();
        assert_eq!(scope.endpoint_id, 1);
        assert_eq!(scope.elements.len(), 4);
        let on_time = &scope.elements[1];
        assert_eq!(on_time.id, "0x4001");
        assert_eq!(on_time.conformance, "LT");
        assert!(!on_time.enabled);
        assert_eq!(scope.elements[3].kind, ElementKind::Command);
    }

    #[test]
    fn enabled_defaults_to_mandatory() {
        let scope = profile().scope().clone();
        // OnOff: "M", not optional.
        assert!(scope.elements[0].enabled);
        // StartUpOnOff: optional by conformance.
        assert!(!scope.elements[2].enabled);
        // OffWithEffect: the flag wins.
        assert!(scope.elements[3].enabled);
    }

    #[test]
    fn state_decodes_feature_map() {
        let state = profile().state();
        assert!(state.is_enabled("LT"));
        assert_eq!(state.get("DF"), Some(false));
        assert_eq!(state.get("OnTime"), Some(false));
    }

    #[test]
    fn both_conformance_forms_is_an_error() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[attributes]]
name = "A"
conformance = "M"
conformance_node = { mandatoryConform = [] }
"#;
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConformance { .. }));
    }

    #[test]
    fn feature_without_conformance_is_an_error() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[features]]
code = "LT"
bit = 0
"#;
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(err.to_string().contains("feature has no conformance"));
    }

    #[test]
    fn blank_feature_conformance_is_an_error() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[features]]
code = "LT"
bit = 0
conformance = "O"
[[features]]
code = "DF"
bit = 1
conformance = "  "
"#;
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidConformance { item, .. } if item == "DF"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn blank_element_conformance_loads_as_empty() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[attributes]]
name = "ClusterRevision"
conformance = ""
"#;
        let profile = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap();
        assert_eq!(profile.scope().elements[0].conformance, "");
    }

    #[test]
    fn check_toggle_plans_against_current_state() {
        let plan = profile().check_toggle("LT", false).unwrap();
        assert!(!plan.disable_change);
        assert!(plan.outdated_warning_patterns[0].contains("feature: Lighting (LT)"));
    }

    #[test]
    fn check_toggle_unknown_feature_is_an_error() {
        let err = profile().check_toggle("QQ", true).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownFeature { ref code, .. }) if code == "QQ"
        ));
        assert_eq!(err.to_string(), "Configuration error: feature 'QQ' not found in on-off.toml");
    }

    #[test]
    fn check_toggle_malformed_conformance_is_a_parse_error() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[features]]
code = "LT"
bit = 0
conformance = "LT &"
"#;
        let profile = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap();
        assert!(matches!(profile.check_toggle("LT", true), Err(Error::Parse(_))));
    }

    #[test]
    fn protocol_names_are_rejected() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[attributes]]
name = "Matter"
conformance = "M"
"#;
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReservedName { .. }));
    }

    #[test]
    fn bad_conformance_node_is_an_error() {
        let toml = r#"
endpoint = 1
cluster = "C"
[[attributes]]
name = "A"
conformance_node = { andTerm = [] }
"#;
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Translate { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml = "endpoint = 1\ncluster = \"C\"\nfeaturemap = 3\n";
        let err = ClusterProfile::from_toml(toml, Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn apply_plan_updates_bit_and_elements() {
        let mut profile = profile();
        let on_time = profile.scope().elements[1].clone();
        let plan = UpdatePlan {
            elements_to_update: vec![ElementUpdate {
                element: on_time,
                enabled: true,
            }],
            ..UpdatePlan::default()
        };
        let value = profile.apply_plan("DF", true, &plan);
        assert_eq!(value, Some(FeatureMapValue(0b101)));
        assert!(profile.scope().elements[1].enabled);
        assert!(profile.state().is_enabled("DF"));
    }

    #[test]
    fn apply_plan_ignores_refused_plans() {
        let mut profile = profile();
        let plan = UpdatePlan::refused("no".to_string());
        assert_eq!(profile.apply_plan("DF", true, &plan), None);
        assert_eq!(profile.feature_map(), FeatureMapValue(1));
    }

    #[test]
    fn save_persists_applied_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("on-off.toml");
        std::fs::write(&path, ON_OFF).unwrap();
        let mut profile = load_profile(&path).unwrap();
        profile.apply_plan("LT", false, &UpdatePlan::default());
        profile.save().unwrap();

        let reloaded = load_profile(&path).unwrap();
        assert_eq!(reloaded.feature_map(), FeatureMapValue(0));
        assert_eq!(reloaded.feature("DF").unwrap().conformance, "[!LT]");
    }
}
