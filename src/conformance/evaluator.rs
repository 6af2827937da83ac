//! Evaluation of conformance expressions against an [`ElementStateMap`].
//!
//! [`evaluate`] always produces a level: operands absent from the map read as
//! disabled. [`resolve`] refuses to guess and reports the missing operands
//! instead. Both check for `desc` before parsing, so an expression that
//! mentions it is [`ConformanceLevel::Described`] whatever else it contains.
use serde::Serialize;

use super::parser::{Expression, Term, parse};
use super::state::ElementStateMap;
use super::{ABBREVIATIONS, ConformanceLevel, DESCRIBED, lexer};
use crate::error::ParseError;

/// Outcome of evaluating an expression without guessing absent operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum Resolution {
    /// Every referenced operand was present.
    Level {
        /// The resolved level.
        level: ConformanceLevel,
    },
    /// Some referenced operands have no recorded state.
    Indeterminate {
        /// Missing operands, in first-seen order.
        missing: Vec<String>,
    },
}

/// A compiled conformance expression: source text, operand set and AST.
///
/// Parsing once and evaluating many times is what the compliance checker
/// does for every feature and element of a cluster.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::{Conformance, ConformanceLevel, ElementStateMap};
///
/// let conformance = Conformance::parse("Matter & CT").unwrap();
/// let state = ElementStateMap::new().with_feature("CT", false);
/// assert_eq!(conformance.evaluate(&state), ConformanceLevel::NotSupported);
/// assert!(conformance.references("CT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conformance {
    source: String,
    operands: Vec<String>,
    // `None` when the expression mentions `desc`; it is never parsed.
    expression: Option<Expression>,
}

impl Conformance {
    /// Compile `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the expression is malformed. Expressions
    /// mentioning `desc` are not parsed and never fail.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let operands: Vec<String> = lexer::operands(source)
            .into_iter()
            .map(str::to_string)
            .collect();
        let expression = if operands.iter().any(|op| op == DESCRIBED) {
            None
        } else {
            Some(parse(source)?)
        };
        Ok(Self {
            source: source.to_string(),
            operands,
            expression,
        })
    }

    /// Source text as given.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every identifier the expression references, abbreviations included.
    pub fn operands(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().map(String::as_str)
    }

    /// Return `true` if the expression references `operand`.
    #[must_use]
    pub fn references(&self, operand: &str) -> bool {
        self.operands.iter().any(|op| op == operand)
    }

    /// Return `true` if the expression mentions `desc`.
    #[must_use]
    pub const fn is_described(&self) -> bool {
        self.expression.is_none()
    }

    /// Evaluate under `state`; absent operands read as disabled.
    #[must_use]
    pub fn evaluate(&self, state: &ElementStateMap) -> ConformanceLevel {
        let Some(expression) = &self.expression else {
            return ConformanceLevel::Described;
        };
        let lookup = |name: &str| state.is_enabled(name);
        for term in &expression.terms {
            match term {
                Term::Abbreviation(level) => return *level,
                Term::OptionalIf(inner) => {
                    return if inner.eval(&lookup) {
                        ConformanceLevel::Optional
                    } else {
                        ConformanceLevel::NotSupported
                    };
                }
                Term::MandatoryIf(inner) => {
                    if inner.eval(&lookup) {
                        return ConformanceLevel::Mandatory;
                    }
                }
            }
        }
        ConformanceLevel::NotSupported
    }

    /// Referenced operands absent from `state`, abbreviations and `desc` excluded.
    #[must_use]
    pub fn missing_operands(&self, state: &ElementStateMap) -> Vec<String> {
        self.operands
            .iter()
            .filter(|op| !is_keyword(op) && !state.contains(op))
            .cloned()
            .collect()
    }

    /// Evaluate under `state` unless an operand is missing.
    ///
    /// `desc` wins over missing operands, since the expression could not be
    /// evaluated even with a complete map.
    #[must_use]
    pub fn resolve(&self, state: &ElementStateMap) -> Resolution {
        if self.is_described() {
            return Resolution::Level {
                level: ConformanceLevel::Described,
            };
        }
        let missing = self.missing_operands(state);
        if missing.is_empty() {
            Resolution::Level {
                level: self.evaluate(state),
            }
        } else {
            Resolution::Indeterminate { missing }
        }
    }
}

fn is_keyword(name: &str) -> bool {
    name == DESCRIBED || ABBREVIATIONS.contains(&name)
}

/// Evaluate `expression` under `state`.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::{ConformanceLevel, ElementStateMap, evaluate};
///
/// let state: ElementStateMap = [("A", false), ("B", true)].into_iter().collect();
/// assert_eq!(evaluate("A, B", &state).unwrap(), ConformanceLevel::Mandatory);
/// assert_eq!(evaluate("[A]", &state).unwrap(), ConformanceLevel::NotSupported);
/// assert_eq!(evaluate("A & desc", &state).unwrap(), ConformanceLevel::Described);
/// ```
///
/// # Errors
///
/// Returns a [`ParseError`] if the expression is malformed.
pub fn evaluate(expression: &str, state: &ElementStateMap) -> Result<ConformanceLevel, ParseError> {
    Ok(Conformance::parse(expression)?.evaluate(state))
}

/// Evaluate `expression` under `state`, reporting missing operands instead of
/// reading them as disabled.
///
/// # Errors
///
/// Returns a [`ParseError`] if the expression is malformed.
pub fn resolve(expression: &str, state: &ElementStateMap) -> Result<Resolution, ParseError> {
    Ok(Conformance::parse(expression)?.resolve(state))
}

/// Operands referenced by `expression` that `state` has no entry for.
///
/// Abbreviations and `desc` are never reported. Works on malformed input.
#[must_use]
pub fn missing_operands(expression: &str, state: &ElementStateMap) -> Vec<String> {
    lexer::operands(expression)
        .into_iter()
        .filter(|op| !is_keyword(op) && !state.contains(op))
        .map(str::to_string)
        .collect()
}

/// Return `true` if `expression` references `operand`.
#[must_use]
pub fn has_operand(expression: &str, operand: &str) -> bool {
    lexer::operands(expression).contains(&operand)
}
