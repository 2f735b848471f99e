//! RISC-V Instruction Decoder.
//!
//! This module turns a raw 32-bit RV32I encoding into an [`Opcode`] tag and
//! rebuilds the immediates of the I, S, B, U and J formats. The B and J
//! formats scatter the immediate bits across the word; the shift and mask
//! constants below reproduce that placement bit for bit.

use std::fmt;

use crate::isa::abi;
use crate::isa::instruction::InstructionBits;
use crate::isa::opcode::{Format, Opcode};
use crate::isa::rv32i::{funct3, funct7, opcodes};

/// Total width of a RISC-V instruction in bits.
const INSTRUCTION_WIDTH: u32 = 32;

/// Bit shift for extracting I-Type immediate field (bits 20-31).
///
/// I-Type format: `imm[11:0] | rs1 | funct3 | rd | opcode`
/// The immediate occupies the upper 12 bits and is sign-extended.
const I_IMM_SHIFT: u32 = 20;

/// Bit shift for extracting S-Type immediate low field (bits 7-11).
///
/// S-Type format: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`
const S_IMM_LOW_SHIFT: u32 = 7;

/// Bit mask for S-Type immediate low field (5 bits: imm[4:0]).
const S_IMM_LOW_MASK: u32 = 0x1F;

/// Bit shift for extracting S-Type immediate high field (bits 25-31).
const S_IMM_HIGH_SHIFT: u32 = 25;

/// Bit mask for S-Type immediate high field (7 bits: imm[11:5]).
const S_IMM_HIGH_MASK: u32 = 0x7F;

/// Position of imm[11:5] in the reconstructed S-Type immediate.
const S_IMM_HIGH_POS: u32 = 5;

/// Total number of bits in S-Type immediate (12 bits).
const S_IMM_BITS: u32 = 12;

/// Bit shift for extracting B-Type immediate bit 11 (bit 7 of instruction).
///
/// B-Type format: `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`
const B_IMM_11_SHIFT: u32 = 7;

/// Bit shift for extracting B-Type immediate bits 4-1 (bits 8-11 of instruction).
const B_IMM_4_1_SHIFT: u32 = 8;

/// Bit mask for B-Type immediate bits 4-1 (4 bits).
const B_IMM_4_1_MASK: u32 = 0xF;

/// Bit shift for extracting B-Type immediate bits 10-5 (bits 25-30 of instruction).
const B_IMM_10_5_SHIFT: u32 = 25;

/// Bit mask for B-Type immediate bits 10-5 (6 bits).
const B_IMM_10_5_MASK: u32 = 0x3F;

/// Bit shift for extracting B-Type immediate bit 12 (bit 31 of instruction).
const B_IMM_12_SHIFT: u32 = 31;

/// Total number of bits in B-Type immediate (13 bits, sign-extended).
const B_IMM_BITS: u32 = 13;

/// Bit position of bit 12 in the reconstructed B-Type immediate.
const B_IMM_12_POS: u32 = 12;

/// Bit position of bit 11 in the reconstructed B-Type immediate.
const B_IMM_11_POS: u32 = 11;

/// Bit position of bits 10-5 in the reconstructed B-Type immediate.
const B_IMM_10_5_POS: u32 = 5;

/// Bit position of bits 4-1 in the reconstructed B-Type immediate.
const B_IMM_4_1_POS: u32 = 1;

/// Bit shift for extracting the U-Type immediate field (bits 12-31).
///
/// U-Type format: `imm[31:12] | rd | opcode`
const U_IMM_SHIFT: u32 = 12;

/// Bit shift for extracting J-Type immediate bits 19-12 (bits 12-19 of instruction).
///
/// J-Type format: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`
const J_IMM_19_12_SHIFT: u32 = 12;

/// Bit mask for J-Type immediate bits 19-12 (8 bits).
const J_IMM_19_12_MASK: u32 = 0xFF;

/// Bit shift for extracting J-Type immediate bit 11 (bit 20 of instruction).
const J_IMM_11_SHIFT: u32 = 20;

/// Bit shift for extracting J-Type immediate bits 10-1 (bits 21-30 of instruction).
const J_IMM_10_1_SHIFT: u32 = 21;

/// Bit mask for J-Type immediate bits 10-1 (10 bits).
const J_IMM_10_1_MASK: u32 = 0x3FF;

/// Bit shift for extracting J-Type immediate bit 20 (bit 31 of instruction).
const J_IMM_20_SHIFT: u32 = 31;

/// Total number of bits in J-Type immediate (21 bits, sign-extended).
const J_IMM_BITS: u32 = 21;

/// Bit position of bit 20 in the reconstructed J-Type immediate.
const J_IMM_20_POS: u32 = 20;

/// Bit position of bits 19-12 in the reconstructed J-Type immediate.
const J_IMM_19_12_POS: u32 = 12;

/// Bit position of bit 11 in the reconstructed J-Type immediate.
const J_IMM_11_POS: u32 = 11;

/// Bit position of bits 10-1 in the reconstructed J-Type immediate.
const J_IMM_10_1_POS: u32 = 1;

/// Decoded instruction snapshot.
///
/// Holds every field of the word plus the immediate selected by the
/// opcode's format (0 for R-type and invalid encodings).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Raw 32-bit instruction encoding.
    pub raw: u32,
    /// Operation tag.
    pub op: Opcode,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// Function code field 3.
    pub funct3: u32,
    /// Function code field 7.
    pub funct7: u32,
    /// Immediate for the opcode's format.
    pub imm: i32,
}

impl Default for Decoded {
    fn default() -> Self {
        Self {
            raw: 0,
            op: Opcode::Invalid,
            rd: 0,
            rs1: 0,
            rs2: 0,
            funct3: 0,
            funct7: 0,
            imm: 0,
        }
    }
}

/// Decodes a RISC-V instruction into its component fields.
///
/// # Arguments
///
/// * `inst` - The 32-bit instruction encoding to decode
///
/// # Returns
///
/// A `Decoded` structure containing all extracted instruction fields.
pub fn decode(inst: u32) -> Decoded {
    let op = decode_opcode(inst);

    let imm = match op.format() {
        Some(Format::I) => imm_i(inst),
        Some(Format::S) => imm_s(inst),
        Some(Format::B) => imm_b(inst),
        Some(Format::U) => imm_u(inst),
        Some(Format::J) => imm_j(inst),
        Some(Format::R) | None => 0,
    };

    Decoded {
        raw: inst,
        op,
        rd: inst.rd(),
        rs1: inst.rs1(),
        rs2: inst.rs2(),
        funct3: inst.funct3(),
        funct7: inst.funct7(),
        imm,
    }
}

/// Classifies a 32-bit word as one RV32I operation.
///
/// Total over `u32`: the major opcode picks the family, `funct3` picks the
/// operation, and `funct7` breaks the ADD/SUB, SRL/SRA and SRLI/SRAI ties.
/// Combinations outside the base table return [`Opcode::Invalid`].
pub const fn decode_opcode(inst: u32) -> Opcode {
    let f3 = (inst >> 12) & 0x7;
    let f7 = inst >> 25;

    match inst & 0x7F {
        opcodes::OP_LUI => Opcode::Lui,
        opcodes::OP_AUIPC => Opcode::Auipc,
        opcodes::OP_JAL => Opcode::Jal,
        opcodes::OP_JALR => match f3 {
            funct3::JALR => Opcode::Jalr,
            _ => Opcode::Invalid,
        },
        opcodes::OP_BRANCH => match f3 {
            funct3::BEQ => Opcode::Beq,
            funct3::BNE => Opcode::Bne,
            funct3::BLT => Opcode::Blt,
            funct3::BGE => Opcode::Bge,
            funct3::BLTU => Opcode::Bltu,
            funct3::BGEU => Opcode::Bgeu,
            _ => Opcode::Invalid,
        },
        opcodes::OP_LOAD => match f3 {
            funct3::LB => Opcode::Lb,
            funct3::LH => Opcode::Lh,
            funct3::LW => Opcode::Lw,
            funct3::LBU => Opcode::Lbu,
            funct3::LHU => Opcode::Lhu,
            _ => Opcode::Invalid,
        },
        opcodes::OP_STORE => match f3 {
            funct3::SB => Opcode::Sb,
            funct3::SH => Opcode::Sh,
            funct3::SW => Opcode::Sw,
            _ => Opcode::Invalid,
        },
        opcodes::OP_IMM => match (f3, f7) {
            (funct3::ADD_SUB, _) => Opcode::Addi,
            (funct3::SLT, _) => Opcode::Slti,
            (funct3::SLTU, _) => Opcode::Sltiu,
            (funct3::XOR, _) => Opcode::Xori,
            (funct3::OR, _) => Opcode::Ori,
            (funct3::AND, _) => Opcode::Andi,
            (funct3::SLL, funct7::DEFAULT) => Opcode::Slli,
            (funct3::SRL_SRA, funct7::DEFAULT) => Opcode::Srli,
            (funct3::SRL_SRA, funct7::SRA) => Opcode::Srai,
            _ => Opcode::Invalid,
        },
        opcodes::OP_REG => match (f7, f3) {
            (funct7::DEFAULT, funct3::ADD_SUB) => Opcode::Add,
            (funct7::DEFAULT, funct3::SLL) => Opcode::Sll,
            (funct7::DEFAULT, funct3::SLT) => Opcode::Slt,
            (funct7::DEFAULT, funct3::SLTU) => Opcode::Sltu,
            (funct7::DEFAULT, funct3::XOR) => Opcode::Xor,
            (funct7::DEFAULT, funct3::SRL_SRA) => Opcode::Srl,
            (funct7::DEFAULT, funct3::OR) => Opcode::Or,
            (funct7::DEFAULT, funct3::AND) => Opcode::And,
            (funct7::SUB, funct3::ADD_SUB) => Opcode::Sub,
            (funct7::SRA, funct3::SRL_SRA) => Opcode::Sra,
            _ => Opcode::Invalid,
        },
        _ => Opcode::Invalid,
    }
}

/// Decodes the immediate value for I-Type instructions.
///
/// I-Type format: `imm[11:0] | rs1 | funct3 | rd | opcode`
/// Used for Load, JALR, and Immediate Arithmetic instructions.
pub const fn imm_i(inst: u32) -> i32 {
    (inst as i32) >> I_IMM_SHIFT
}

/// Decodes the immediate value for S-Type instructions.
///
/// S-Type format: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`
pub const fn imm_s(inst: u32) -> i32 {
    let low = (inst >> S_IMM_LOW_SHIFT) & S_IMM_LOW_MASK;
    let high = (inst >> S_IMM_HIGH_SHIFT) & S_IMM_HIGH_MASK;
    sign_extend((high << S_IMM_HIGH_POS) | low, S_IMM_BITS)
}

/// Decodes the raw U-Type field `inst[31:12]`.
///
/// Not sign-extended and not shifted; LUI/AUIPC consumers apply `<< 12`.
pub const fn imm_u(inst: u32) -> i32 {
    (inst >> U_IMM_SHIFT) as i32
}

/// Decodes the immediate value for B-Type instructions.
///
/// B-Type format: `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`
/// The result is always even.
pub const fn imm_b(inst: u32) -> i32 {
    let bit_11 = (inst >> B_IMM_11_SHIFT) & 1;
    let bits_4_1 = (inst >> B_IMM_4_1_SHIFT) & B_IMM_4_1_MASK;
    let bits_10_5 = (inst >> B_IMM_10_5_SHIFT) & B_IMM_10_5_MASK;
    let bit_12 = (inst >> B_IMM_12_SHIFT) & 1;

    let combined = (bit_12 << B_IMM_12_POS)
        | (bit_11 << B_IMM_11_POS)
        | (bits_10_5 << B_IMM_10_5_POS)
        | (bits_4_1 << B_IMM_4_1_POS);
    sign_extend(combined, B_IMM_BITS)
}

/// Decodes the immediate value for J-Type instructions.
///
/// J-Type format: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`
/// The result is always even.
pub const fn imm_j(inst: u32) -> i32 {
    let bits_19_12 = (inst >> J_IMM_19_12_SHIFT) & J_IMM_19_12_MASK;
    let bit_11 = (inst >> J_IMM_11_SHIFT) & 1;
    let bits_10_1 = (inst >> J_IMM_10_1_SHIFT) & J_IMM_10_1_MASK;
    let bit_20 = (inst >> J_IMM_20_SHIFT) & 1;

    let combined = (bit_20 << J_IMM_20_POS)
        | (bits_19_12 << J_IMM_19_12_POS)
        | (bit_11 << J_IMM_11_POS)
        | (bits_10_1 << J_IMM_10_1_POS);
    sign_extend(combined, J_IMM_BITS)
}

/// Sign extends the low `bits` of `val`; the top bit of that field is always
/// instruction bit 31.
const fn sign_extend(val: u32, bits: u32) -> i32 {
    let shift = INSTRUCTION_WIDTH - bits;
    ((val as i32) << shift) >> shift
}

impl fmt::Display for Decoded {
    /// Formats in assembler syntax with ABI register names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rd = abi::name(self.rd);
        let rs1 = abi::name(self.rs1);
        let rs2 = abi::name(self.rs2);
        let m = self.op.mnemonic();

        match self.op {
            Opcode::Invalid => write!(f, "{m} {:#010x}", self.raw),
            Opcode::Lui | Opcode::Auipc => write!(f, "{m} {rd}, {:#x}", self.imm),
            Opcode::Jal => write!(f, "{m} {rd}, {}", self.imm),
            Opcode::Jalr => write!(f, "{m} {rd}, {}({rs1})", self.imm),
            op if op.is_load() => write!(f, "{m} {rd}, {}({rs1})", self.imm),
            op if op.is_store() => write!(f, "{m} {rs2}, {}({rs1})", self.imm),
            op if op.is_branch() => write!(f, "{m} {rs1}, {rs2}, {}", self.imm),
            Opcode::Slli | Opcode::Srli | Opcode::Srai => {
                write!(f, "{m} {rd}, {rs1}, {}", self.rs2)
            }
            op => match op.format() {
                Some(Format::R) => write!(f, "{m} {rd}, {rs1}, {rs2}"),
                _ => write!(f, "{m} {rd}, {rs1}, {}", self.imm),
            },
        }
    }
}
