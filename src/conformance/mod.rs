//! Conformance expression engine.
//!
//! Conformance expressions declare whether a cluster element (feature,
//! attribute, command or event) is mandatory, optional, provisional or not
//! supported, depending on the state of other elements.
//!
//! - **[`lexer`]**: tokenizer and operand extraction
//! - **[`parser`]**: recursive-descent parser producing a [`parser::Expression`] AST
//! - **[`evaluator`]**: level evaluation, missing-operand detection
//! - **[`state`]**: the [`ElementStateMap`] snapshot evaluated against
//! - **[`xml`]**: translation of structured conformance nodes into expression strings
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod state;
pub mod xml;

use std::fmt;

use serde::Serialize;

pub use evaluator::{Conformance, Resolution, evaluate, has_operand, missing_operands, resolve};
pub use state::{ElementStateMap, FeatureMapValue, OperandKind};
pub use xml::{ConformNode, translate};

/// Abbreviation for mandatory conformance.
pub const MANDATORY: &str = "M";
/// Abbreviation for optional conformance.
pub const OPTIONAL: &str = "O";
/// Abbreviation for provisional conformance.
pub const PROVISIONAL: &str = "P";
/// Abbreviation for deprecated conformance.
pub const DEPRECATED: &str = "D";
/// Abbreviation for disallowed conformance.
pub const DISALLOWED: &str = "X";
/// Reserved operand marking an expression too complex to evaluate.
pub const DESCRIBED: &str = "desc";

/// Every abbreviation that may stand alone as an otherwise term.
pub const ABBREVIATIONS: &[&str] = &[MANDATORY, OPTIONAL, PROVISIONAL, DEPRECATED, DISALLOWED];

/// Protocol pseudo-operand that is always enabled.
pub const MATTER: &str = "Matter";
/// Protocol pseudo-operand that is always disabled.
pub const ZIGBEE: &str = "Zigbee";

/// Return `true` if `name` is reserved by the grammar and cannot name an element.
#[must_use]
pub fn is_reserved_operand(name: &str) -> bool {
    name == DESCRIBED || name == MATTER || name == ZIGBEE || ABBREVIATIONS.contains(&name)
}

/// Obligation level of a schema element.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::ConformanceLevel;
///
/// assert_eq!(ConformanceLevel::from_abbreviation("X"), Some(ConformanceLevel::NotSupported));
/// assert_eq!(ConformanceLevel::Mandatory.to_string(), "mandatory");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConformanceLevel {
    /// The element must be enabled.
    Mandatory,
    /// The element may be enabled.
    Optional,
    /// The element is still provisional.
    Provisional,
    /// The element must be disabled.
    NotSupported,
    /// The expression references `desc` and cannot be evaluated safely.
    Described,
}

impl ConformanceLevel {
    /// Map a standalone abbreviation to its level.
    #[must_use]
    pub fn from_abbreviation(abbrev: &str) -> Option<Self> {
        match abbrev {
            MANDATORY => Some(Self::Mandatory),
            OPTIONAL => Some(Self::Optional),
            PROVISIONAL => Some(Self::Provisional),
            DEPRECATED | DISALLOWED => Some(Self::NotSupported),
            _ => None,
        }
    }

    /// Return `true` if the level dictates the element's state.
    #[must_use]
    pub const fn is_definite(self) -> bool {
        matches!(self, Self::Mandatory | Self::NotSupported)
    }

    /// The state an element must be in to conform, if the level dictates one.
    #[must_use]
    pub const fn required_state(self) -> Option<bool> {
        match self {
            Self::Mandatory => Some(true),
            Self::NotSupported => Some(false),
            Self::Optional | Self::Provisional | Self::Described => None,
        }
    }

    /// Return `true` if an element in state `enabled` violates this level.
    #[must_use]
    pub fn is_violated_by(self, enabled: bool) -> bool {
        self.required_state().is_some_and(|required| required != enabled)
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mandatory => "mandatory",
            Self::Optional => "optional",
            Self::Provisional => "provisional",
            Self::NotSupported => "notSupported",
            Self::Described => "desc",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_map_to_levels() {
        assert_eq!(
            ConformanceLevel::from_abbreviation("M"),
            Some(ConformanceLevel::Mandatory)
        );
        assert_eq!(
            ConformanceLevel::from_abbreviation("O"),
            Some(ConformanceLevel::Optional)
        );
        assert_eq!(
            ConformanceLevel::from_abbreviation("P"),
            Some(ConformanceLevel::Provisional)
        );
        assert_eq!(
            ConformanceLevel::from_abbreviation("D"),
            Some(ConformanceLevel::NotSupported)
        );
        assert_eq!(
            ConformanceLevel::from_abbreviation("X"),
            Some(ConformanceLevel::NotSupported)
        );
        assert_eq!(ConformanceLevel::from_abbreviation("desc"), None);
        assert_eq!(ConformanceLevel::from_abbreviation("LT"), None);
    }

    #[test]
    fn violation_only_for_definite_levels() {
        assert!(ConformanceLevel::Mandatory.is_violated_by(false));
        assert!(!ConformanceLevel::Mandatory.is_violated_by(true));
        assert!(ConformanceLevel::NotSupported.is_violated_by(true));
        assert!(!ConformanceLevel::Optional.is_violated_by(true));
        assert!(!ConformanceLevel::Provisional.is_violated_by(false));
        assert!(!ConformanceLevel::Described.is_violated_by(true));
    }

    #[test]
    fn reserved_operands() {
        for name in ["M", "O", "P", "D", "X", "desc", "Matter", "Zigbee"] {
            assert!(is_reserved_operand(name), "{name} should be reserved");
        }
        assert!(!is_reserved_operand("LT"));
        assert!(!is_reserved_operand("matter"));
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(ConformanceLevel::NotSupported.to_string(), "notSupported");
        assert_eq!(ConformanceLevel::Described.to_string(), "desc");
    }
}
