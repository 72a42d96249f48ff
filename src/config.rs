//! Loading [`InferOptions`] from disk.
//!
//! The file is a plain JSON object using the camelCase option names:
//!
//! ```json
//! { "literalNarrowing": "off", "delegationConstructor": "inherit" }
//! ```

use anyhow::{Context, Result};
use lsz_common::InferOptions;
use std::path::Path;
use tracing::debug;

/// Decode options from JSON text. Missing keys take their defaults.
pub fn parse_options(source: &str) -> Result<InferOptions> {
    InferOptions::from_json_str(source).context("failed to parse inference options")
}

pub fn load_options(path: &Path) -> Result<InferOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options: {}", path.display()))?;
    let options =
        parse_options(&source).with_context(|| format!("in options file: {}", path.display()))?;
    debug!(path = %path.display(), ?options, "load_options");
    Ok(options)
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;
