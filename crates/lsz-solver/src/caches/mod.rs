//! Resolution-session caches.

pub(crate) mod compile_trace;
mod node_cache;

pub use node_cache::{EachNode, NodeCache, Slot, SlotKey, SlotState};
