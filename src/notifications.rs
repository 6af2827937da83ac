//! Persistence of compliance warnings.
//!
//! The checker only produces text. A [`NotificationStore`] keeps it between
//! runs and retracts warnings made stale by a later toggle, matching them by
//! substring against [`UpdatePlan::outdated_warning_patterns`].
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compliance::UpdatePlan;
use crate::error::StoreError;

/// A stored warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity label, `WARNING` for everything the checker produces.
    pub severity: String,
    /// Warning text.
    pub message: String,
}

impl Notification {
    /// A `WARNING` notification.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: "WARNING".to_string(),
            message: message.into(),
        }
    }
}

/// Storage for compliance warnings.
pub trait NotificationStore {
    /// Store a warning. Identical messages are stored once.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn add(&mut self, message: &str) -> Result<(), StoreError>;

    /// Remove every warning containing any of `patterns`, returning how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn retract_matching(&mut self, patterns: &[String]) -> Result<usize, StoreError>;

    /// Every stored warning, oldest first.
    fn all(&self) -> Vec<Notification>;
}

/// Record the outcome of a feature toggle.
///
/// Stale warnings are retracted only when the toggle went through; warnings
/// are added only when the plan asks for them to be shown.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn apply_plan(store: &mut dyn NotificationStore, plan: &UpdatePlan) -> Result<(), StoreError> {
    if !plan.disable_change && !plan.outdated_warning_patterns.is_empty() {
        let removed = store.retract_matching(&plan.outdated_warning_patterns)?;
        tracing::debug!(removed, "retracted outdated warnings");
    }
    if plan.display_warning {
        for warning in &plan.warnings {
            store.add(warning)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    notifications: Vec<Notification>,
}

/// A [`NotificationStore`] backed by a JSON file, written after every change.
#[derive(Debug)]
pub struct JsonNotificationStore {
    path: PathBuf,
    file: StoreFile,
}

impl JsonNotificationStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Self { path, file })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(&self.file).map_err(|source| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, json).map_err(io_err)
    }
}

impl NotificationStore for JsonNotificationStore {
    fn add(&mut self, message: &str) -> Result<(), StoreError> {
        if self.file.notifications.iter().any(|n| n.message == message) {
            return Ok(());
        }
        self.file.notifications.push(Notification::warning(message));
        self.save()
    }

    fn retract_matching(&mut self, patterns: &[String]) -> Result<usize, StoreError> {
        let before = self.file.notifications.len();
        self.file
            .notifications
            .retain(|n| !patterns.iter().any(|p| n.message.contains(p.as_str())));
        let removed = before - self.file.notifications.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    fn all(&self) -> Vec<Notification> {
        self.file.notifications.clone()
    }
}
