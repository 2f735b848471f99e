//! RISC-V simulation core.
//!
//! This crate provides the two pieces a RISC-V execution engine builds on:
//! 1. **ISA:** An RV32I decoder that extracts fields and immediates from a
//!    32-bit word and classifies it as an [`Opcode`].
//! 2. **Memory:** A bus target servicing timed and debug transactions, with a
//!    direct-access grant/invalidate protocol and program image loading.
//!
//! ```
//! use rvtlm_core::config::MemoryConfig;
//! use rvtlm_core::isa::{InstructionBits, Opcode};
//! use rvtlm_core::MemoryTarget;
//!
//! let mut mem = MemoryTarget::new(&MemoryConfig::default()).unwrap();
//! mem.write_u32(0, 0x0050_0093).unwrap(); // addi ra, zero, 5
//!
//! let inst = mem.fetch(0).unwrap();
//! assert_eq!(inst.decode(), Opcode::Addi);
//! assert_eq!(inst.rd(), 1);
//! assert_eq!(inst.imm_i(), 5);
//! ```

/// Error types shared across the crate.
pub mod common;
/// Configuration (defaults, JSON loading).
pub mod config;
/// Instruction set (fields, immediates, opcode decode).
pub mod isa;
/// Program image loading.
pub mod sim;
/// Bus targets (memory, transactions, direct access).
pub mod soc;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Decoded operation tag.
pub use crate::isa::Opcode;
/// One fetched instruction word.
pub use crate::isa::Instruction;
/// Main memory target.
pub use crate::soc::MemoryTarget;
