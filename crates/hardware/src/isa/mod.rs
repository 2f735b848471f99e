//! Instruction Set Architecture (ISA) Definitions.
//!
//! Decoder for the RV32I base integer instruction set: field extraction,
//! immediate reconstruction, and classification of a word into an
//! [`Opcode`].
//!
//! ```
//! use rvtlm_core::isa::{Instruction, InstructionBits, Opcode};
//!
//! let nop = Instruction::new(0x0000_0013);
//! assert_eq!(nop.decode(), Opcode::Addi);
//! assert_eq!((nop.rd(), nop.rs1(), nop.imm_i()), (0, 0, 0));
//! ```

/// Application Binary Interface (ABI) register name mappings.
pub mod abi;

/// Opcode classification and immediate reconstruction.
pub mod decode;

/// Instruction words and bit extraction utilities.
pub mod instruction;

/// Decoded opcode tags and instruction formats.
pub mod opcode;

/// Base integer instruction set encoding constants.
pub mod rv32i;

pub use decode::{Decoded, decode};
pub use instruction::{Instruction, InstructionBits};
pub use opcode::{Format, ImmFormat, Opcode};
