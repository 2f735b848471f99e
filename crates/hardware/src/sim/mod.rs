//! Simulation setup utilities.
//!
//! Provides program image parsing used to preload memory before the
//! simulation starts.

/// Program image formats and parsers.
pub mod loader;
