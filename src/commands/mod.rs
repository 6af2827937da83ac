//! Top-level subcommand orchestration.
pub mod check;
pub mod eval;
pub mod scan;
pub mod translate;

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::config::{ClusterProfile, load_profile, validate_all};
use crate::logging::Log;

/// Load a cluster profile and report any validation warnings.
///
/// # Errors
///
/// Returns an error if the profile cannot be read or is invalid.
pub fn load_and_validate(path: &Path, log: &dyn Log) -> Result<ClusterProfile> {
    let profile =
        load_profile(path).with_context(|| format!("loading profile {}", path.display()))?;
    log.debug(&format!(
        "{}: endpoint {}, cluster {}, {} features, {} elements, featureMap {}",
        path.display(),
        profile.scope().endpoint_id,
        profile.scope().cluster_name,
        profile.scope().features.len(),
        profile.scope().elements.len(),
        profile.feature_map(),
    ));

    let warnings = validate_all(&profile);
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} profile warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!(
                "  {} [{}]: {}",
                warning.source, warning.item, warning.message
            ));
        }
    }
    Ok(profile)
}

/// Write `value` to stdout as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("writing output")?;
    Ok(())
}
