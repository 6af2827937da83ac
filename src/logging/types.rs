//! Core logging types: cluster entries, status, and the [`Log`] trait.

/// Per-cluster result for summary reporting.
#[derive(Debug, Clone)]
pub struct ClusterEntry {
    /// Profile or cluster label.
    pub name: String,
    /// Outcome of checking the cluster.
    pub status: ClusterStatus,
    /// Optional detail message (e.g., warning count or error description).
    pub message: Option<String>,
}

/// Outcome of checking one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterStatus {
    /// Every feature and element matches its conformance.
    Compliant,
    /// At least one compliance warning was raised.
    NonCompliant,
    /// The profile could not be loaded or evaluated.
    Failed,
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (direct output) and
/// [`BufferedLog`](super::buffered::BufferedLog) (deferred output for
/// parallel scans) implement this trait, so checking code can log without
/// knowing whether output is immediate or buffered.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a cluster result for the summary.
    fn record_cluster(&self, name: &str, status: ClusterStatus, message: Option<&str>);
}
