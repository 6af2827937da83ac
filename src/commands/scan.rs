//! The `scan` subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;

use crate::cli::ScanOpts;
use crate::compliance::{cluster_compliance_warnings, scan_required_and_unsupported};
use crate::logging::{BufferedLog, ClusterStatus, Log, Logger};

/// Run the scan command.
///
/// Profiles are checked in parallel unless `--no-parallel` is given; each
/// profile logs into its own buffer and the buffers are flushed in input
/// order.
///
/// # Errors
///
/// Returns an error if any profile fails to load or raises compliance
/// warnings.
pub fn run(opts: &ScanOpts, log: &Arc<Logger>) -> Result<()> {
    log.stage(&format!("Scanning {} profile(s)", opts.profiles.len()));

    let check = |path: &PathBuf| {
        let buf = BufferedLog::new(Arc::clone(log));
        scan_profile(path, &buf);
        buf
    };
    let buffers: Vec<BufferedLog> = if opts.parallel {
        opts.profiles.par_iter().map(check).collect()
    } else {
        opts.profiles.iter().map(check).collect()
    };
    for buf in &buffers {
        buf.flush();
    }

    log.print_summary();

    let failing = log.count(ClusterStatus::NonCompliant) + log.count(ClusterStatus::Failed);
    if failing > 0 {
        anyhow::bail!(
            "{failing} of {} profile(s) not compliant",
            opts.profiles.len()
        );
    }
    Ok(())
}

/// Check one profile, logging its warnings and recording the outcome.
fn scan_profile(path: &Path, log: &dyn Log) {
    let name = path.display().to_string();
    log.stage(&name);

    let profile = match super::load_and_validate(path, log) {
        Ok(profile) => profile,
        Err(e) => {
            log.error(&format!("{e:#}"));
            log.record_cluster(&name, ClusterStatus::Failed, Some(&e.root_cause().to_string()));
            return;
        }
    };

    let state = profile.state();
    let scope = profile.scope();
    let outcome = cluster_compliance_warnings(scope, &state).and_then(|warnings| {
        scan_required_and_unsupported(&scope.elements, &state).map(|report| (warnings, report))
    });
    let (warnings, report) = match outcome {
        Ok(found) => found,
        Err(e) => {
            log.error(&format!("{name}: {e}"));
            log.record_cluster(&name, ClusterStatus::Failed, Some(&e.to_string()));
            return;
        }
    };

    for warning in &warnings {
        log.warn(warning);
    }
    log.debug(&format!(
        "{} element(s) to enable, {} to disable",
        report.required.len(),
        report.not_supported.len()
    ));

    if warnings.is_empty() {
        log.info("compliant");
        log.record_cluster(&name, ClusterStatus::Compliant, None);
    } else {
        let message = format!("{} warning(s)", warnings.len());
        log.record_cluster(&name, ClusterStatus::NonCompliant, Some(&message));
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    const COMPLIANT: &str = r#"
endpoint = 1
cluster = "On/Off"
feature_map = 1

[[features]]
code = "LT"
bit = 0
conformance = "O"

[[attributes]]
name = "OnTime"
conformance = "LT"
enabled = true
"#;

    const NON_COMPLIANT: &str = r#"
endpoint = 2
cluster = "On/Off"
feature_map = 0

[[features]]
code = "LT"
bit = 0
conformance = "M"

[[attributes]]
name = "OnTime"
conformance = "LT"
enabled = true
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn opts(profiles: Vec<PathBuf>, parallel: bool) -> ScanOpts {
        ScanOpts { profiles, parallel }
    }

    #[test]
    fn compliant_profiles_pass() {
        let (log, tmp, _guard) = isolated_logger();
        let log = Arc::new(log);
        let a = write(tmp.path(), "a.toml", COMPLIANT);
        run(&opts(vec![a], false), &log).unwrap();
        let entries = log.cluster_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ClusterStatus::Compliant);
    }

    #[test]
    fn findings_fail_the_scan() {
        let (log, tmp, _guard) = isolated_logger();
        let log = Arc::new(log);
        let a = write(tmp.path(), "a.toml", COMPLIANT);
        let b = write(tmp.path(), "b.toml", NON_COMPLIANT);
        let err = run(&opts(vec![a, b], false), &log).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 profile(s) not compliant");

        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(contents.contains("endpoint: 2, cluster: On/Off, feature: LT (LT)"));
        assert!(contents.contains("attribute: OnTime"));
    }

    #[test]
    fn unreadable_profile_is_recorded_as_failed() {
        let (log, tmp, _guard) = isolated_logger();
        let log = Arc::new(log);
        let missing = tmp.path().join("missing.toml");
        assert!(run(&opts(vec![missing], false), &log).is_err());
        assert_eq!(log.count(ClusterStatus::Failed), 1);
    }

    #[test]
    fn parallel_output_is_flushed_in_input_order() {
        let (log, tmp, _guard) = isolated_logger();
        let log = Arc::new(log);
        let profiles: Vec<PathBuf> = (0..8)
            .map(|i| write(tmp.path(), &format!("p{i}.toml"), COMPLIANT))
            .collect();
        run(&opts(profiles.clone(), true), &log).unwrap();

        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        let positions: Vec<usize> = profiles
            .iter()
            .map(|p| {
                contents
                    .find(&format!("==> {}", p.display()))
                    .expect("stage header for profile")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(log.count(ClusterStatus::Compliant), 8);
    }
}
