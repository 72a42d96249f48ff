//! Tracing subscriber setup.
//!
//! Output format is selected by `LSZ_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: indented span tree via `tracing-tree`
//! - `json`: one JSON object per span/event
//!
//! ```bash
//! # Every rule run, as a tree
//! LSZ_LOG=lsz_solver=trace LSZ_LOG_FORMAT=tree my-tool
//!
//! # Structured compile events only
//! LSZ_LOG=lsz::compile_json=trace LSZ_LOG_FORMAT=json my-tool
//! ```
//!
//! Nothing is installed unless `LSZ_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to [`LogFormat::Text`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("LSZ_LOG_FORMAT").unwrap_or_default())
    }
}

/// `LSZ_LOG` wins over `RUST_LOG`; both use `RUST_LOG` syntax.
fn build_filter() -> EnvFilter {
    match std::env::var("LSZ_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber. Output goes to stderr.
///
/// Does nothing when neither `LSZ_LOG` nor `RUST_LOG` is set, or when a
/// subscriber is already installed.
pub fn init_tracing() {
    let has_lsz_log = std::env::var("LSZ_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_lsz_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    // An already installed subscriber stays in place.
    let _ = match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);
            Registry::default().with(filter).with(text_layer).try_init()
        }
    };
}

#[cfg(test)]
#[path = "../tests/tracing_config_tests.rs"]
mod tests;
