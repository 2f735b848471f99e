//! Instruction words and field extraction.
//!
//! [`InstructionBits`] pulls the fixed-position fields out of a raw 32-bit
//! encoding. [`Instruction`] wraps one fetched word and adds the immediate
//! accessors and the opcode decode on top of it.

use std::fmt;

use crate::common::error::DecodeError;
use crate::isa::decode;
use crate::isa::opcode::{ImmFormat, Opcode};

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for extracting the destination register field (bits 7-11).
pub const RD_MASK: u32 = 0x1F;
/// Bit mask for extracting the first source register field (bits 15-19).
pub const RS1_MASK: u32 = 0x1F;
/// Bit mask for extracting the second source register field (bits 20-24).
pub const RS2_MASK: u32 = 0x1F;
/// Bit mask for extracting the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for extracting the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;
/// Bit mask for extracting the CSR address field (bits 20-31).
pub const CSR_MASK: u32 = 0xFFF;

/// Trait for extracting instruction fields from encoded instructions.
///
/// Every method is a pure read of fixed bit positions; any 32-bit value is a
/// valid input.
pub trait InstructionBits {
    /// Extracts the opcode field (bits 0-6).
    fn opcode(&self) -> u32;

    /// Extracts the destination register field (bits 7-11).
    ///
    /// Register 0 (x0) is hardwired to zero; the decoder does not treat it
    /// specially.
    fn rd(&self) -> usize;

    /// Extracts the first source register field (bits 15-19).
    fn rs1(&self) -> usize;

    /// Extracts the second source register field (bits 20-24).
    fn rs2(&self) -> usize;

    /// Extracts the funct3 field (bits 12-14).
    fn funct3(&self) -> u32;

    /// Extracts the funct7 field (bits 25-31).
    ///
    /// Bit 5 of this field separates ADD from SUB and SRL/SRLI from
    /// SRA/SRAI.
    fn funct7(&self) -> u32;

    /// Extracts the CSR address field (bits 20-31).
    ///
    /// Same bits as the I-type immediate, but zero-extended: a CSR index is
    /// not a displacement.
    fn csr(&self) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & RD_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & RS1_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & RS2_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }

    #[inline(always)]
    fn csr(&self) -> u32 {
        (self >> 20) & CSR_MASK
    }
}

/// One fetched 32-bit instruction word.
///
/// A plain value: it is created per fetch, queried, and dropped. All
/// accessors are side-effect free and may be called any number of times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Instruction(u32);

impl Instruction {
    /// Wraps a raw instruction word.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw instruction word.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Sign-extended I-type immediate (`inst[31:20]`).
    pub const fn imm_i(self) -> i32 {
        decode::imm_i(self.0)
    }

    /// Sign-extended S-type immediate (`inst[31:25] | inst[11:7]`).
    pub const fn imm_s(self) -> i32 {
        decode::imm_s(self.0)
    }

    /// U-type immediate field `inst[31:12]`, unshifted and zero-extended.
    ///
    /// The consumer shifts it left by 12 to form the LUI/AUIPC operand.
    pub const fn imm_u(self) -> i32 {
        decode::imm_u(self.0)
    }

    /// Sign-extended B-type branch offset (always even).
    pub const fn imm_b(self) -> i32 {
        decode::imm_b(self.0)
    }

    /// Sign-extended J-type jump offset (always even).
    pub const fn imm_j(self) -> i32 {
        decode::imm_j(self.0)
    }

    /// Reads the word's immediate as the given format.
    pub const fn immediate(self, format: ImmFormat) -> i32 {
        match format {
            ImmFormat::I => self.imm_i(),
            ImmFormat::S => self.imm_s(),
            ImmFormat::U => self.imm_u(),
            ImmFormat::B => self.imm_b(),
            ImmFormat::J => self.imm_j(),
        }
    }

    /// Classifies the word; unrecognized encodings yield [`Opcode::Invalid`].
    pub const fn decode(self) -> Opcode {
        decode::decode_opcode(self.0)
    }

    /// Like [`Instruction::decode`], but reports an unrecognized encoding as
    /// an error the caller can propagate with `?`.
    pub fn try_decode(self) -> Result<Opcode, DecodeError> {
        match self.decode() {
            Opcode::Invalid => Err(DecodeError::Unrecognized(self.0)),
            op => Ok(op),
        }
    }
}

impl InstructionBits for Instruction {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self.0.opcode()
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        self.0.rd()
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        self.0.rs1()
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        self.0.rs2()
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        self.0.funct3()
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        self.0.funct7()
    }

    #[inline(always)]
    fn csr(&self) -> u32 {
        self.0.csr()
    }
}

impl From<u32> for Instruction {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Instruction> for u32 {
    fn from(inst: Instruction) -> Self {
        inst.0
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::LowerHex for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
