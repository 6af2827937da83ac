//! Conformance expression engine and cluster feature compliance checker.
//!
//! Cluster elements (features, attributes, commands, events) carry
//! conformance expressions such as `LT & !DF, [OO]` that decide whether the
//! element is mandatory, optional, provisional or not supported given the
//! state of other elements. This crate evaluates those expressions and works
//! out what toggling one feature means for the rest of a cluster.
//!
//! The public API is organised into layers:
//!
//! - **[`conformance`]**: tokenize, parse and evaluate expressions; translate
//!   structured conformance nodes
//! - **[`compliance`]**: feature toggle checks, batch scans and warning texts
//! - **[`notifications`]**: persistence and retraction of compliance warnings
//! - **[`config`]**: cluster profile files and their validation
//! - **[`commands`]**: top-level subcommand orchestration (`eval`, `check`, `scan`, `translate`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod compliance;
pub mod config;
pub mod conformance;
pub mod error;
pub mod logging;
pub mod notifications;

pub use error::{ConfigError, Error, ParseError, StoreError, TranslateError};
