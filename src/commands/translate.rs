//! The `translate` subcommand.

use std::io::Read as _;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::TranslateOpts;
use crate::conformance::{ConformNode, translate};
use crate::logging::Logger;

/// Run the translate command.
///
/// # Errors
///
/// Returns an error if the node cannot be read, is not valid JSON, or cannot
/// be translated.
pub fn run(opts: &TranslateOpts, log: &Logger) -> Result<()> {
    let json = read_input(&opts.node)?;
    let expression = translate_json(&json)?;
    log.info(&expression);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading conformance node from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Parse one JSON conformance node and translate it.
///
/// # Errors
///
/// Returns an error if `json` is not a conformance node or cannot be translated.
pub fn translate_json(json: &str) -> Result<String> {
    let node: ConformNode = serde_json::from_str(json).context("parsing conformance node")?;
    let expression = translate(&node).with_context(|| format!("translating <{}>", node.tag()))?;
    Ok(expression)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn translates_nested_terms() {
        let json = r#"{ "mandatoryConform": [
            { "andTerm": [ { "feature": "LT" }, { "orTerm": [ { "feature": "PIN" }, { "feature": "RID" } ] } ] }
        ] }"#;
        assert_eq!(translate_json(json).unwrap(), "LT & (PIN | RID)");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = translate_json("{ not json").unwrap_err();
        assert!(format!("{err:#}").contains("parsing conformance node"));
    }

    #[test]
    fn structural_errors_name_the_node() {
        let err = translate_json(r#"{ "andTerm": [] }"#).unwrap_err();
        assert!(format!("{err:#}").contains("translating <andTerm>"));
    }

    #[test]
    fn reads_node_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        std::fs::write(&path, r#"{ "optionalConform": [] }"#).unwrap();
        assert_eq!(translate_json(&read_input(&path).unwrap()).unwrap(), "O");
    }
}
