//! Shared test infrastructure.


/// Memory target test context.
pub mod harness;
