//! Translation of structured conformance nodes into expression strings.
//!
//! Schema files describe conformance as nested tags (`mandatoryConform`,
//! `andTerm`, `feature`, ...). [`ConformNode`] mirrors those tags one to one,
//! deserialized from JSON or TOML, and [`translate`] flattens a tree into the
//! string grammar accepted by [`parser`](super::parser).
//!
//! ```json
//! { "mandatoryConform": [
//!     { "andTerm": [
//!         { "feature": "LT" },
//!         { "orTerm": [ { "feature": "PIN" }, { "feature": "RID" } ] }
//!     ] }
//! ] }
//! ```
//!
//! translates to `LT & (PIN | RID)`.
use serde::{Deserialize, Serialize};

use super::{DEPRECATED, DESCRIBED, DISALLOWED, MANDATORY, OPTIONAL, PROVISIONAL, has_operand};
use crate::error::TranslateError;

/// Maximum tree depth accepted by [`translate`].
pub const MAX_DEPTH: usize = 200;

/// Every tag [`ConformNode`] recognizes.
const KNOWN_TAGS: &[&str] = &[
    "mandatoryConform",
    "optionalConform",
    "otherwiseConform",
    "notTerm",
    "andTerm",
    "orTerm",
    "provisionalConform",
    "disallowConform",
    "deprecateConform",
    "feature",
    "condition",
    "attribute",
    "command",
];

/// One structured conformance node.
///
/// Tags the schema uses that have no counterpart here (for example
/// `greaterTerm`) deserialize to [`ConformNode::Unsupported`] and translate
/// to `desc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConformNode {
    /// `M` when empty, otherwise its single child.
    MandatoryConform(Vec<Self>),
    /// `O` when empty, otherwise `[child]`.
    OptionalConform(Vec<Self>),
    /// Children joined as an otherwise chain.
    OtherwiseConform(Vec<Self>),
    /// Negation of its child.
    NotTerm(Box<Self>),
    /// Conjunction of its children.
    AndTerm(Vec<Self>),
    /// Disjunction of its children.
    OrTerm(Vec<Self>),
    /// `P`
    ProvisionalConform {},
    /// `X`
    DisallowConform {},
    /// `D`
    DeprecateConform {},
    /// A feature code.
    Feature(String),
    /// A named condition.
    Condition(String),
    /// An attribute name.
    Attribute(String),
    /// A command name.
    Command(String),
    /// Any other tag, kept verbatim. A known tag whose content has the wrong
    /// shape also lands here and is rejected by [`translate`].
    #[serde(untagged)]
    Unsupported(serde_json::Value),
}

impl ConformNode {
    /// Schema tag of the node.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::MandatoryConform(_) => "mandatoryConform",
            Self::OptionalConform(_) => "optionalConform",
            Self::OtherwiseConform(_) => "otherwiseConform",
            Self::NotTerm(_) => "notTerm",
            Self::AndTerm(_) => "andTerm",
            Self::OrTerm(_) => "orTerm",
            Self::ProvisionalConform {} => "provisionalConform",
            Self::DisallowConform {} => "disallowConform",
            Self::DeprecateConform {} => "deprecateConform",
            Self::Feature(_) => "feature",
            Self::Condition(_) => "condition",
            Self::Attribute(_) => "attribute",
            Self::Command(_) => "command",
            Self::Unsupported(_) => DESCRIBED,
        }
    }

    /// Return `true` for nodes that produce a level rather than a condition.
    const fn is_conform(&self) -> bool {
        matches!(
            self,
            Self::MandatoryConform(_)
                | Self::OptionalConform(_)
                | Self::OtherwiseConform(_)
                | Self::ProvisionalConform {}
                | Self::DisallowConform {}
                | Self::DeprecateConform {}
        )
    }
}

/// Translate a conformance tree into an expression string.
///
/// # Examples
///
/// ```
/// use conformance_cli::conformance::{ConformNode, translate};
///
/// let node = ConformNode::OptionalConform(vec![ConformNode::NotTerm(Box::new(
///     ConformNode::OrTerm(vec![
///         ConformNode::Feature("A".into()),
///         ConformNode::Feature("B".into()),
///     ]),
/// ))]);
/// assert_eq!(translate(&node).unwrap(), "[!(A | B)]");
/// ```
///
/// # Errors
///
/// Returns a [`TranslateError`] when the tree is deeper than [`MAX_DEPTH`],
/// an operator has no children, a conform wrapper has several children, a
/// conform wrapper or abbreviation is an operand of `andTerm`, `orTerm` or
/// `notTerm`, a known tag has content of the wrong shape, or a base term has
/// an empty name.
pub fn translate(node: &ConformNode) -> Result<String, TranslateError> {
    translate_at(node, 0)
}

fn translate_at(node: &ConformNode, depth: usize) -> Result<String, TranslateError> {
    if depth > MAX_DEPTH {
        return Err(TranslateError::RecursionLimit {
            limit: MAX_DEPTH,
            node: node.tag().to_string(),
        });
    }
    let out = match node {
        ConformNode::MandatoryConform(children) => match single(node, children)? {
            Some(child) => translate_at(child, depth + 1)?,
            None => MANDATORY.to_string(),
        },
        ConformNode::OptionalConform(children) => match single(node, children)? {
            Some(child) => format!("[{}]", translate_at(child, depth + 1)?),
            None => OPTIONAL.to_string(),
        },
        ConformNode::OtherwiseConform(children) => join(node, children, depth, ", ", None)?,
        ConformNode::NotTerm(child) => {
            operand_of(node, child)?;
            let inner = translate_at(child, depth + 1)?;
            if inner.contains(['&', '|']) {
                format!("!({inner})")
            } else {
                format!("!{inner}")
            }
        }
        ConformNode::AndTerm(children) => join(node, children, depth, " & ", Some('|'))?,
        ConformNode::OrTerm(children) => join(node, children, depth, " | ", Some('&'))?,
        ConformNode::ProvisionalConform {} => PROVISIONAL.to_string(),
        ConformNode::DisallowConform {} => DISALLOWED.to_string(),
        ConformNode::DeprecateConform {} => DEPRECATED.to_string(),
        ConformNode::Feature(name)
        | ConformNode::Condition(name)
        | ConformNode::Attribute(name)
        | ConformNode::Command(name) => {
            if name.trim().is_empty() {
                return Err(TranslateError::EmptyName { tag: node.tag() });
            }
            name.trim().to_string()
        }
        ConformNode::Unsupported(value) => {
            if let Some(tag) = known_tag(value) {
                return Err(TranslateError::InvalidShape { tag });
            }
            DESCRIBED.to_string()
        }
    };
    Ok(out)
}

/// Operators take conditions only; a nested level would re-parse as a
/// different otherwise chain.
fn operand_of(parent: &ConformNode, child: &ConformNode) -> Result<(), TranslateError> {
    if child.is_conform() {
        return Err(TranslateError::NestedConform {
            parent: parent.tag(),
            child: child.tag(),
        });
    }
    Ok(())
}

fn known_tag(value: &serde_json::Value) -> Option<&'static str> {
    let object = value.as_object()?;
    KNOWN_TAGS
        .iter()
        .copied()
        .find(|tag| object.contains_key(*tag))
}

fn single<'a>(
    node: &ConformNode,
    children: &'a [ConformNode],
) -> Result<Option<&'a ConformNode>, TranslateError> {
    match children {
        [] => Ok(None),
        [child] => Ok(Some(child)),
        _ => Err(TranslateError::MultipleChildren {
            tag: node.tag(),
            count: children.len(),
        }),
    }
}

/// Join translated children; a child containing `wrap_on` is parenthesized.
fn join(
    node: &ConformNode,
    children: &[ConformNode],
    depth: usize,
    separator: &str,
    wrap_on: Option<char>,
) -> Result<String, TranslateError> {
    if children.is_empty() {
        return Err(TranslateError::EmptyOperator { tag: node.tag() });
    }
    let parts = children
        .iter()
        .map(|child| {
            if wrap_on.is_some() {
                operand_of(node, child)?;
            }
            let text = translate_at(child, depth + 1)?;
            Ok(match wrap_on {
                Some(op) if text.contains(op) => format!("({text})"),
                _ => text,
            })
        })
        .collect::<Result<Vec<_>, TranslateError>>()?;
    Ok(parts.join(separator))
}

/// Decide whether an element is optional from its legacy `optional` flag and
/// its conformance expression.
///
/// The flag wins when present. Without it the element is optional unless the
/// expression mentions `M`; with neither, it is not optional.
#[must_use]
pub fn element_is_optional(optional: Option<bool>, conformance: &str, element: &str) -> bool {
    let conformance = conformance.trim();
    match optional {
        Some(flag) => {
            if !conformance.is_empty() {
                tracing::warn!(
                    "Redundant 'optional' flag and conformance defined for {element}; the flag takes precedence, consider removing it"
                );
            }
            flag
        }
        None if conformance.is_empty() => false,
        None => !has_operand(conformance, MANDATORY),
    }
}
