//! cadgraph-core
//!
//! Core library for turning CAD exchange files into a deterministic graph IR.
//!
//! This crate defines the IR (model), the canonical JSON-lines codec, unit
//! tables, the ingestion pipeline with its geometry-kernel backends, and the
//! bounded session cache that ties them together.
//!
//! All geometric computation is delegated to external kernels through the
//! `services::backends` adapters; nothing in here interprets geometry.

pub mod codec;
pub mod config;
pub mod model;
pub mod services;
pub mod units;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
