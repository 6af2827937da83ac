//! Operand state snapshots evaluated by the conformance engine.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{MATTER, ZIGBEE};

/// Where an operand's state comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperandKind {
    /// A feature code backed by a bit in the cluster's featureMap attribute.
    Feature,
    /// An attribute, command or event name.
    Element,
    /// A protocol pseudo-operand (`Matter`, `Zigbee`).
    Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OperandState {
    enabled: bool,
    kind: OperandKind,
}

/// Snapshot of the enabled state of every operand relevant to one cluster
/// instance.
///
/// Always contains the protocol pseudo-operands `Matter` (enabled) and
/// `Zigbee` (disabled). Absent operands read as disabled; use
/// [`contains`](Self::contains) to tell "absent" from "disabled".
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::{ElementStateMap, OperandKind};
///
/// let state = ElementStateMap::new()
///     .with_feature("LT", true)
///     .with_element("OnTime", false);
/// assert!(state.is_enabled("LT"));
/// assert!(state.is_enabled("Matter"));
/// assert_eq!(state.kind("OnTime"), Some(OperandKind::Element));
/// assert!(!state.contains("DF"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementStateMap {
    entries: BTreeMap<String, OperandState>,
}

impl Default for ElementStateMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStateMap {
    /// Create a snapshot holding only the protocol pseudo-operands.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        for (name, enabled) in [(MATTER, true), (ZIGBEE, false)] {
            entries.insert(
                name.to_string(),
                OperandState {
                    enabled,
                    kind: OperandKind::Protocol,
                },
            );
        }
        Self { entries }
    }

    /// Record the state of a feature code.
    pub fn set_feature(&mut self, code: impl Into<String>, enabled: bool) {
        self.insert(code.into(), enabled, OperandKind::Feature);
    }

    /// Record the state of an attribute, command or event.
    pub fn set_element(&mut self, name: impl Into<String>, enabled: bool) {
        self.insert(name.into(), enabled, OperandKind::Element);
    }

    fn insert(&mut self, name: String, enabled: bool, kind: OperandKind) {
        // Protocol operands are fixed; a same-named element cannot override them.
        if let Some(existing) = self.entries.get(&name)
            && existing.kind == OperandKind::Protocol
        {
            return;
        }
        self.entries.insert(name, OperandState { enabled, kind });
    }

    /// Builder form of [`set_feature`](Self::set_feature).
    #[must_use]
    pub fn with_feature(mut self, code: impl Into<String>, enabled: bool) -> Self {
        self.set_feature(code, enabled);
        self
    }

    /// Builder form of [`set_element`](Self::set_element).
    #[must_use]
    pub fn with_element(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.set_element(name, enabled);
        self
    }

    /// Return a copy with `name` switched to `enabled`, keeping its kind.
    ///
    /// Unknown names are added as features, since toggles originate from
    /// the featureMap.
    #[must_use]
    pub fn toggled(&self, name: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        let kind = self.kind(name).unwrap_or(OperandKind::Feature);
        next.insert(name.to_string(), enabled, kind);
        next
    }

    /// Return `true` if the operand has a recorded state.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The recorded state of an operand, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|s| s.enabled)
    }

    /// Return `true` if the operand is recorded as enabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    /// The origin of an operand, if recorded.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<OperandKind> {
        self.entries.get(name).map(|s| s.kind)
    }

    /// Iterate over `(name, enabled, kind)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool, OperandKind)> {
        self.entries
            .iter()
            .map(|(name, s)| (name.as_str(), s.enabled, s.kind))
    }

    /// Number of recorded operands, including protocol operands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: protocol operands are always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collect plain element states; protocol operands are added automatically.
impl<S: Into<String>> FromIterator<(S, bool)> for ElementStateMap {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (name, enabled) in iter {
            state.set_element(name, enabled);
        }
        state
    }
}

/// Value of a cluster's featureMap attribute.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::FeatureMapValue;
///
/// let value = FeatureMapValue(0b0101);
/// assert!(value.is_set(0));
/// assert!(!value.is_set(1));
/// assert_eq!(value.toggled(1), FeatureMapValue(0b0111));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMapValue(pub u32);

impl FeatureMapValue {
    /// Return `true` if `bit` is set. Bits outside the 32-bit range are never set.
    #[must_use]
    pub fn is_set(self, bit: u8) -> bool {
        1u32.checked_shl(u32::from(bit))
            .is_some_and(|mask| self.0 & mask != 0)
    }

    /// Return the value with `bit` set to `on`. Out-of-range bits are ignored.
    #[must_use]
    pub fn with_bit(self, bit: u8, on: bool) -> Self {
        match 1u32.checked_shl(u32::from(bit)) {
            Some(mask) if on => Self(self.0 | mask),
            Some(mask) => Self(self.0 & !mask),
            None => self,
        }
    }

    /// Return the value with `bit` flipped.
    #[must_use]
    pub fn toggled(self, bit: u8) -> Self {
        self.with_bit(bit, !self.is_set(bit))
    }
}

impl fmt::Display for FeatureMapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn protocol_operands_are_always_present() {
        let state = ElementStateMap::new();
        assert_eq!(state.get("Matter"), Some(true));
        assert_eq!(state.get("Zigbee"), Some(false));
        assert_eq!(state.kind("Matter"), Some(OperandKind::Protocol));
        assert_eq!(state.len(), 2);
        assert!(!state.is_empty());
    }

    #[test]
    fn protocol_operands_cannot_be_overridden() {
        let state = ElementStateMap::new()
            .with_element("Matter", false)
            .with_feature("Zigbee", true);
        assert!(state.is_enabled("Matter"));
        assert!(!state.is_enabled("Zigbee"));
    }

    #[test]
    fn absent_operands_read_as_disabled() {
        let state = ElementStateMap::new();
        assert!(!state.contains("LT"));
        assert_eq!(state.get("LT"), None);
        assert!(!state.is_enabled("LT"));
    }

    #[test]
    fn toggled_keeps_kind_and_leaves_original() {
        let state = ElementStateMap::new().with_feature("LT", false);
        let next = state.toggled("LT", true);
        assert!(!state.is_enabled("LT"));
        assert!(next.is_enabled("LT"));
        assert_eq!(next.kind("LT"), Some(OperandKind::Feature));
    }

    #[test]
    fn toggled_unknown_name_becomes_feature() {
        let next = ElementStateMap::new().toggled("DF", true);
        assert_eq!(next.kind("DF"), Some(OperandKind::Feature));
    }

    #[test]
    fn from_iter_records_elements() {
        let state: ElementStateMap = [("A", true), ("B", false)].into_iter().collect();
        assert!(state.is_enabled("A"));
        assert_eq!(state.get("B"), Some(false));
        assert_eq!(state.kind("A"), Some(OperandKind::Element));
        assert!(state.contains("Matter"));
    }

    #[test]
    fn iter_is_name_ordered() {
        let state = ElementStateMap::new()
            .with_feature("LT", true)
            .with_element("Alpha", false);
        let names: Vec<&str> = state.iter().map(|(name, _, _)| name).collect();
        assert_eq!(names, ["Alpha", "LT", "Matter", "Zigbee"]);
    }

    #[test]
    fn feature_map_bits() {
        let value = FeatureMapValue(0);
        let value = value.with_bit(0, true).with_bit(3, true);
        assert_eq!(value, FeatureMapValue(0b1001));
        assert!(value.is_set(3));
        assert_eq!(value.with_bit(0, false), FeatureMapValue(0b1000));
        assert_eq!(value.toggled(3), FeatureMapValue(0b0001));
    }

    #[test]
    fn feature_map_out_of_range_bits() {
        let value = FeatureMapValue(u32::MAX);
        assert!(value.is_set(31));
        assert!(!value.is_set(32));
        assert_eq!(value.with_bit(40, false), value);
    }

    #[test]
    fn feature_map_display_is_hex() {
        assert_eq!(FeatureMapValue(0x11).to_string(), "0x0011");
    }
}
