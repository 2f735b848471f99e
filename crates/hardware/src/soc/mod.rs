//! System-on-Chip (SoC) Components.
//!
//! Bus targets serving the simulated CPU. The only target today is the main
//! memory, which services load/store transactions and direct-access grants.

/// Main memory target, its storage, transactions and grants.
pub mod memory;

pub use memory::MemoryTarget;
