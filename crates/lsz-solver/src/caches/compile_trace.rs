//! Structured tracing for node compilation.
//!
//! Events use target `lsz::compile_json` and are intended to be consumed with:
//! `LSZ_LOG=lsz::compile_json=trace LSZ_LOG_FORMAT=json`.
//!
//! Environment:
//! - `LSZ_COMPILE_RUN_ID`: optional run identifier attached to every event.

use super::SlotKey;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static COMPILE_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "lsz::compile_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    COMPILE_RUN_ID
        .get_or_init(|| std::env::var("LSZ_COMPILE_RUN_ID").unwrap_or_else(|_| "default".to_string()))
        .as_str()
}

/// `(slot kind, primary id, return index)` for a slot key.
const fn key_fields(key: SlotKey) -> (&'static str, u32, u32) {
    match key {
        SlotKey::Decl(decl) => ("decl", decl.0, 0),
        SlotKey::Return { func, index } => ("return", func.0, index),
        SlotKey::Generic(generic) => ("generic", generic.0, 0),
    }
}

#[inline]
pub(crate) fn compile_start(query_id: u64, key: SlotKey, decl_kind: &'static str) {
    let (slot, id, index) = key_fields(key);
    trace!(
        target: "lsz::compile_json",
        event = "compile",
        phase = "start",
        run_id = run_id(),
        query_id,
        slot,
        id,
        index,
        decl_kind
    );
}

#[inline]
pub(crate) fn compile_end(query_id: u64, key: SlotKey, members: usize, cache_hit: bool) {
    let (slot, id, index) = key_fields(key);
    trace!(
        target: "lsz::compile_json",
        event = "compile",
        phase = "end",
        run_id = run_id(),
        query_id,
        slot,
        id,
        index,
        members,
        cache_hit
    );
}
