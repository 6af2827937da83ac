//! Structured logger with summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::STAGE_TARGET;
use super::types::{ClusterEntry, ClusterStatus, Log};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record_cluster` method is **not** included because its signature
/// differs from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with summary collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/conformance/<command>.log` with timestamps and ANSI
/// codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    clusters: Mutex<Vec<ClusterEntry>>,
    log_file: Option<PathBuf>,
    /// Serializes console output from parallel buffered flushes.
    pub(super) flush_lock: Mutex<()>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The log file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber);
    /// this constructor does not write to the file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            clusters: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
            flush_lock: Mutex::new(()),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded cluster entries.
    #[must_use]
    pub fn cluster_entries(&self) -> Vec<ClusterEntry> {
        self.clusters.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a cluster result for the summary.
    pub fn record_cluster(&self, name: &str, status: ClusterStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.clusters.lock() {
            guard.push(ClusterEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count recorded clusters with the given status.
    #[must_use]
    pub fn count(&self, status: ClusterStatus) -> usize {
        self.clusters
            .lock()
            .map_or(0, |guard| guard.iter().filter(|c| c.status == status).count())
    }

    /// Return `true` if any cluster is non-compliant or failed to load.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.count(ClusterStatus::NonCompliant) + self.count(ClusterStatus::Failed) > 0
    }

    /// Print the summary of all recorded clusters.
    pub fn print_summary(&self) {
        let clusters = self.cluster_entries();
        if clusters.is_empty() {
            return;
        }

        self.stage("Summary");

        for cluster in &clusters {
            let (icon, color) = match cluster.status {
                ClusterStatus::Compliant => ("✓", "\x1b[32m"),
                ClusterStatus::NonCompliant => ("⚠", "\x1b[33m"),
                ClusterStatus::Failed => ("✗", "\x1b[31m"),
            };

            let suffix = cluster
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", cluster.name));
        }

        self.info(&format!(
            "{} clusters: \x1b[32m{} compliant\x1b[0m, \x1b[33m{} non-compliant\x1b[0m, \x1b[31m{} failed\x1b[0m",
            clusters.len(),
            self.count(ClusterStatus::Compliant),
            self.count(ClusterStatus::NonCompliant),
            self.count(ClusterStatus::Failed),
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record_cluster(&self, name: &str, status: ClusterStatus, message: Option<&str>) {
        self.record_cluster(name, status, message);
    }
}
