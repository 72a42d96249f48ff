//! Common types and utilities for the lsz inference engine.
//!
//! This crate provides foundational types used across all lsz crates:
//! - String interning (`Atom`, `Interner`)
//! - Centralized limits and thresholds
//! - Inference options (`InferOptions`)

// String interning for names, keys and string literals
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;

// Options consumed by the resolver
pub mod options;
pub use options::InferOptions;
