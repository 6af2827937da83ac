// Shared helpers for integration tests.
//
// Provides a temporary directory for profile and notification files and a
// fluent builder for cluster profile TOML, so each integration test can set
// up an isolated cluster without repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use conformance_cli::config::{ClusterProfile, load_profile};

/// The On/Off cluster fixture: Lighting enabled, every element conforming.
pub const ON_OFF: &str = include_str!("../fixtures/on_off.toml");

/// An isolated directory backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory holding profiles and stores.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path to the context directory.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write `content` to `<root>/<name>` and return the path.
    pub fn write_profile(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        std::fs::write(&path, content).expect("write profile");
        path
    }

    /// Load a profile previously written with [`write_profile`](Self::write_profile).
    pub fn load(&self, name: &str) -> ClusterProfile {
        load_profile(&self.root.path().join(name)).expect("load profile")
    }

    /// Path for a notification store inside the context.
    pub fn store_path(&self) -> PathBuf {
        self.root.path().join("notifications.json")
    }
}

/// Fluent builder for cluster profile TOML.
pub struct ProfileBuilder {
    cluster: String,
    endpoint: u16,
    feature_map: u32,
    features: String,
    elements: String,
}

impl ProfileBuilder {
    /// Begin a profile for `cluster` on endpoint 1 with an empty featureMap.
    pub fn new(cluster: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            endpoint: 1,
            feature_map: 0,
            features: String::new(),
            elements: String::new(),
        }
    }

    /// Set the endpoint id.
    pub fn endpoint(mut self, id: u16) -> Self {
        self.endpoint = id;
        self
    }

    /// Set the featureMap value.
    pub fn feature_map(mut self, value: u32) -> Self {
        self.feature_map = value;
        self
    }

    /// Declare a feature.
    pub fn feature(mut self, code: &str, bit: u8, conformance: &str) -> Self {
        write!(
            self.features,
            "\n[[features]]\ncode = \"{code}\"\nbit = {bit}\nconformance = \"{conformance}\"\n"
        )
        .expect("write");
        self
    }

    /// Declare an attribute with an explicit state.
    pub fn attribute(self, name: &str, conformance: &str, enabled: bool) -> Self {
        self.element("attributes", name, conformance, enabled)
    }

    /// Declare a command with an explicit state.
    pub fn command(self, name: &str, conformance: &str, enabled: bool) -> Self {
        self.element("commands", name, conformance, enabled)
    }

    /// Declare an event with an explicit state.
    pub fn event(self, name: &str, conformance: &str, enabled: bool) -> Self {
        self.element("events", name, conformance, enabled)
    }

    fn element(mut self, table: &str, name: &str, conformance: &str, enabled: bool) -> Self {
        write!(
            self.elements,
            "\n[[{table}]]\nname = \"{name}\"\nconformance = \"{conformance}\"\nenabled = {enabled}\n"
        )
        .expect("write");
        self
    }

    /// Finish building and return the TOML text.
    pub fn build(self) -> String {
        format!(
            "endpoint = {}\ncluster = \"{}\"\nfeature_map = {}\n{}{}",
            self.endpoint, self.cluster, self.feature_map, self.features, self.elements
        )
    }
}
