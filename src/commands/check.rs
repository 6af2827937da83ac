//! The `check` subcommand.

use anyhow::{Context as _, Result};

use crate::cli::CheckOpts;
use crate::compliance::UpdatePlan;
use crate::logging::{Log, Logger};
use crate::notifications::{self, JsonNotificationStore, NotificationStore};

/// Run the check command.
///
/// # Errors
///
/// Returns an error if the profile cannot be loaded, the feature is unknown,
/// a conformance expression is malformed, the notification store cannot be
/// written, or `--apply` is given and the change is refused.
pub fn run(opts: &CheckOpts, log: &Logger) -> Result<()> {
    log.stage(&format!("Loading {}", opts.profile.display()));
    let mut profile = super::load_and_validate(&opts.profile, log)?;
    let feature = profile
        .feature(&opts.feature)
        .cloned()
        .with_context(|| {
            format!(
                "feature '{}' not found in {}",
                opts.feature,
                opts.profile.display()
            )
        })?;

    let current = profile.feature_map().is_set(feature.bit);
    let new_bit = opts.requested_bit().unwrap_or(!current);
    if new_bit == current {
        log.debug(&format!("{} is already {}", feature.code, on_off(current)));
    }

    log.stage(&format!(
        "Checking {} {} ({})",
        if new_bit { "enable" } else { "disable" },
        feature.name,
        feature.code
    ));
    let plan = profile
        .check_toggle(&feature.code, new_bit)
        .with_context(|| format!("checking feature {}", feature.code))?;

    if opts.json {
        super::print_json(&plan)?;
    } else {
        report(&feature.code, &plan, log);
    }

    if let Some(path) = &opts.notifications {
        let mut store = JsonNotificationStore::open(path)
            .with_context(|| format!("opening notification store {}", path.display()))?;
        notifications::apply_plan(&mut store, &plan)
            .with_context(|| format!("updating notification store {}", path.display()))?;
        log.debug(&format!(
            "{} notification(s) in {}",
            store.all().len(),
            store.path().display()
        ));
    }

    if opts.apply {
        let Some(feature_map) = profile.apply_plan(&feature.code, new_bit, &plan) else {
            anyhow::bail!(
                "change refused; {} was not modified",
                opts.profile.display()
            );
        };
        profile
            .save()
            .with_context(|| format!("saving {}", opts.profile.display()))?;
        log.info(&format!(
            "wrote {} (featureMap {feature_map})",
            opts.profile.display()
        ));
    }
    Ok(())
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// Log a plan in reading order: verdict, warnings, then the queued changes.
fn report(code: &str, plan: &UpdatePlan, log: &dyn Log) {
    if plan.disable_change {
        log.error(&format!("toggling {code} is refused"));
    }
    for warning in &plan.warnings {
        if plan.display_warning {
            log.warn(warning);
        } else {
            log.debug(warning);
        }
    }
    for (dependent, enabled) in &plan.features_to_update {
        log.info(&format!(
            "feature {dependent} would have to be {}",
            on_off(*enabled)
        ));
    }
    for update in &plan.elements_to_update {
        log.info(&format!(
            "{} {}: {}",
            update.element.kind,
            update.element.name,
            if update.enabled { "enable" } else { "disable" }
        ));
    }
    if let Some(level) = plan.level {
        log.info(&format!("{code} conformance is now {level}"));
    }
    if !plan.disable_change && plan.elements_to_update.is_empty() && plan.warnings.is_empty() {
        log.info("no other changes needed");
    }
}
