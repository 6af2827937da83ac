//! Domain-specific error types for the conformance engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library modules return typed errors (e.g., [`ParseError`], [`ConfigError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! Error
//! ├── Parse(ParseError)         conformance expression grammar violations
//! ├── Translate(TranslateError) malformed structured conformance nodes
//! ├── Config(ConfigError)       cluster profile loading
//! └── Store(StoreError)         notification store persistence
//! ```
//!
//! Missing operands and `desc` expressions are *not* errors: they are
//! reported as [`Resolution::Indeterminate`](crate::conformance::Resolution)
//! and [`ConformanceLevel::Described`](crate::conformance::ConformanceLevel).

use thiserror::Error;

/// Top-level error type for the conformance engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum Error {
    /// A conformance expression could not be parsed.
    #[error("Conformance expression error: {0}")]
    Parse(#[from] ParseError),

    /// A structured conformance node could not be translated.
    #[error("Conformance translation error: {0}")]
    Translate(#[from] TranslateError),

    /// A cluster profile could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The notification store could not be read or written.
    #[error("Notification store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while parsing a conformance expression.
///
/// Offsets are byte offsets into the original expression string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The expression is empty or contains only whitespace.
    #[error("empty conformance expression")]
    Empty,

    /// A character outside the grammar was found.
    #[error("illegal character '{ch}' at offset {offset}")]
    IllegalCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        offset: usize,
    },

    /// An opening or closing bracket/parenthesis has no partner.
    #[error("unbalanced '{delimiter}' at offset {offset}")]
    Unbalanced {
        /// The delimiter without a partner.
        delimiter: char,
        /// Byte offset of the delimiter.
        offset: usize,
    },

    /// A required sub-expression is missing (e.g., `A & ()`, `A,,B`, `[]`).
    #[error("expected {expected} at offset {offset}")]
    Expected {
        /// Description of what the parser was looking for.
        expected: &'static str,
        /// Byte offset where it was expected.
        offset: usize,
    },

    /// Groups are nested deeper than the parser accepts.
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep {
        /// Maximum accepted nesting depth.
        limit: usize,
        /// Byte offset of the group that exceeded it.
        offset: usize,
    },

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected {
        /// Source text of the unexpected token.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },
}

/// Errors raised while translating structured conformance nodes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Nesting exceeded the recursion guard, indicating malformed or cyclic input.
    #[error("maximum recursion depth {limit} exceeded when translating conformance: {node}")]
    RecursionLimit {
        /// The depth limit that was exceeded.
        limit: usize,
        /// Tag of the node at which the limit was hit.
        node: String,
    },

    /// An operator node (`andTerm`, `orTerm`, `otherwiseConform`) has no children.
    #[error("'{tag}' must contain at least one term")]
    EmptyOperator {
        /// Tag of the empty node.
        tag: &'static str,
    },

    /// A wrapper node that accepts a single child received several.
    #[error("'{tag}' must contain a single term, found {count}")]
    MultipleChildren {
        /// Tag of the wrapper node.
        tag: &'static str,
        /// Number of children found.
        count: usize,
    },

    /// A base term (feature, condition, attribute, command) has no name.
    #[error("'{tag}' term has an empty name")]
    EmptyName {
        /// Tag of the base term.
        tag: &'static str,
    },

    /// A conform wrapper or abbreviation appears as an operand of `parent`.
    #[error("'{child}' cannot be an operand of '{parent}'")]
    NestedConform {
        /// Tag of the operator node.
        parent: &'static str,
        /// Tag of the offending child.
        child: &'static str,
    },

    /// A known tag whose content does not have the expected shape.
    #[error("'{tag}' has an invalid shape")]
    InvalidShape {
        /// Tag of the malformed node.
        tag: &'static str,
    },
}

/// Errors that arise from loading cluster profiles.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading a profile file.
    #[error("IO error reading profile {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the profile schema.
    #[error("Invalid profile syntax in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        message: String,
    },

    /// A feature or element declares neither or both conformance forms.
    #[error("Invalid conformance for '{item}' in {file}: {message}")]
    InvalidConformance {
        /// File declaring the item.
        file: String,
        /// Feature code or element name.
        item: String,
        /// Human-readable reason.
        message: String,
    },

    /// A feature or element uses a protocol operand name.
    #[error("'{item}' in {file} collides with a reserved protocol operand")]
    ReservedName {
        /// File declaring the item.
        file: String,
        /// Feature code or element name.
        item: String,
    },

    /// A feature code that the profile does not declare.
    #[error("feature '{code}' not found in {file}")]
    UnknownFeature {
        /// Profile that was searched.
        file: String,
        /// Requested feature code.
        code: String,
    },

    /// A structured conformance node in the profile could not be translated.
    #[error("Cannot translate conformance for '{item}': {source}")]
    Translate {
        /// Feature code or element name.
        item: String,
        /// Underlying translation error.
        source: TranslateError,
    },
}

/// Errors raised by the notification store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error("IO error on notification store {path}: {source}")]
    Io {
        /// Path to the store file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The store file is not valid JSON.
    #[error("Corrupt notification store {path}: {source}")]
    Corrupt {
        /// Path to the store file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
