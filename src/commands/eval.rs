//! The `eval` subcommand.

use anyhow::{Context as _, Result};

use crate::cli::EvalOpts;
use crate::conformance::{Conformance, ElementStateMap, Resolution};
use crate::logging::Logger;

/// Run the eval command.
///
/// # Errors
///
/// Returns an error if the expression does not parse.
pub fn run(opts: &EvalOpts, log: &Logger) -> Result<()> {
    let conformance = Conformance::parse(&opts.expression)
        .with_context(|| format!("parsing '{}'", opts.expression))?;
    let state = build_state(&opts.set);
    let resolution = conformance.resolve(&state);

    if opts.json {
        return super::print_json(&resolution);
    }

    log.debug(&format!("operands: {}", conformance.operands().collect::<Vec<_>>().join(", ")));
    match resolution {
        Resolution::Level { level } => log.info(&level.to_string()),
        Resolution::Indeterminate { missing } => {
            log.info("indeterminate");
            log.warn(&format!("no state given for: {}", missing.join(", ")));
        }
    }
    Ok(())
}

/// Operand snapshot from `--set` assignments; later assignments win.
fn build_state(assignments: &[(String, bool)]) -> ElementStateMap {
    let mut state = ElementStateMap::new();
    for (name, enabled) in assignments {
        state.set_feature(name.as_str(), *enabled);
    }
    state
}
