//! osgi-deps benchmarking suite
//!
//! Benchmarks for version matching, manifest header parsing and full
//! resolution passes over synthetic platforms.

pub mod common;

pub use common::*;
