//! # Decode Table Tests
//!
//! Every RV32I operation decodes from a representative word, and every
//! neighbouring encoding outside the base table decodes as invalid.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use rvtlm_core::common::DecodeError;
use rvtlm_core::isa::rv32i::opcodes::*;
use rvtlm_core::isa::{Format, Instruction, Opcode};

use crate::common::builder::instruction::{b_type, i_type, j_type, r_type, s_type, u_type};

// ══════════════════════════════════════════════════════════
// Valid Encodings
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::lui(u_type(OP_LUI, 1, 0x12345), Opcode::Lui)]
#[case::auipc(u_type(OP_AUIPC, 1, 0x1), Opcode::Auipc)]
#[case::jal(j_type(OP_JAL, 1, 16), Opcode::Jal)]
#[case::jalr(i_type(OP_JALR, 1, 0, 2, 4), Opcode::Jalr)]
#[case::beq(b_type(OP_BRANCH, 0b000, 1, 2, 8), Opcode::Beq)]
#[case::bne(b_type(OP_BRANCH, 0b001, 1, 2, 8), Opcode::Bne)]
#[case::blt(b_type(OP_BRANCH, 0b100, 1, 2, 8), Opcode::Blt)]
#[case::bge(b_type(OP_BRANCH, 0b101, 1, 2, 8), Opcode::Bge)]
#[case::bltu(b_type(OP_BRANCH, 0b110, 1, 2, 8), Opcode::Bltu)]
#[case::bgeu(b_type(OP_BRANCH, 0b111, 1, 2, 8), Opcode::Bgeu)]
#[case::lb(i_type(OP_LOAD, 1, 0b000, 2, 0), Opcode::Lb)]
#[case::lh(i_type(OP_LOAD, 1, 0b001, 2, 0), Opcode::Lh)]
#[case::lw(i_type(OP_LOAD, 1, 0b010, 2, 0), Opcode::Lw)]
#[case::lbu(i_type(OP_LOAD, 1, 0b100, 2, 0), Opcode::Lbu)]
#[case::lhu(i_type(OP_LOAD, 1, 0b101, 2, 0), Opcode::Lhu)]
#[case::sb(s_type(OP_STORE, 0b000, 2, 1, 0), Opcode::Sb)]
#[case::sh(s_type(OP_STORE, 0b001, 2, 1, 0), Opcode::Sh)]
#[case::sw(s_type(OP_STORE, 0b010, 2, 1, 0), Opcode::Sw)]
#[case::addi(i_type(OP_IMM, 1, 0b000, 2, -1), Opcode::Addi)]
#[case::slti(i_type(OP_IMM, 1, 0b010, 2, -1), Opcode::Slti)]
#[case::sltiu(i_type(OP_IMM, 1, 0b011, 2, -1), Opcode::Sltiu)]
#[case::xori(i_type(OP_IMM, 1, 0b100, 2, -1), Opcode::Xori)]
#[case::ori(i_type(OP_IMM, 1, 0b110, 2, -1), Opcode::Ori)]
#[case::andi(i_type(OP_IMM, 1, 0b111, 2, -1), Opcode::Andi)]
#[case::slli(r_type(OP_IMM, 1, 0b001, 2, 3, 0b0000000), Opcode::Slli)]
#[case::srli(r_type(OP_IMM, 1, 0b101, 2, 3, 0b0000000), Opcode::Srli)]
#[case::srai(r_type(OP_IMM, 1, 0b101, 2, 3, 0b0100000), Opcode::Srai)]
#[case::add(r_type(OP_REG, 1, 0b000, 2, 3, 0b0000000), Opcode::Add)]
#[case::sub(r_type(OP_REG, 1, 0b000, 2, 3, 0b0100000), Opcode::Sub)]
#[case::sll(r_type(OP_REG, 1, 0b001, 2, 3, 0b0000000), Opcode::Sll)]
#[case::slt(r_type(OP_REG, 1, 0b010, 2, 3, 0b0000000), Opcode::Slt)]
#[case::sltu(r_type(OP_REG, 1, 0b011, 2, 3, 0b0000000), Opcode::Sltu)]
#[case::xor(r_type(OP_REG, 1, 0b100, 2, 3, 0b0000000), Opcode::Xor)]
#[case::srl(r_type(OP_REG, 1, 0b101, 2, 3, 0b0000000), Opcode::Srl)]
#[case::sra(r_type(OP_REG, 1, 0b101, 2, 3, 0b0100000), Opcode::Sra)]
#[case::or(r_type(OP_REG, 1, 0b110, 2, 3, 0b0000000), Opcode::Or)]
#[case::and(r_type(OP_REG, 1, 0b111, 2, 3, 0b0000000), Opcode::And)]
fn decodes_base_operation(#[case] raw: u32, #[case] expected: Opcode) {
    let inst = Instruction::new(raw);
    assert_eq!(inst.decode(), expected);
    assert_eq!(inst.try_decode(), Ok(expected));
}

#[test]
fn addi_nop() {
    assert_eq!(Instruction::new(0x0000_0013).decode(), Opcode::Addi);
}

#[test]
fn immediate_ops_ignore_upper_bits_except_shifts() {
    // addi with imm = -1 sets funct7 to all ones; only shifts care.
    let addi = i_type(OP_IMM, 1, 0b000, 2, -1);
    assert_eq!(addi >> 25, 0x7F);
    assert_eq!(Instruction::new(addi).decode(), Opcode::Addi);
}

// ══════════════════════════════════════════════════════════
// Invalid Encodings
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::all_zero(0x0000_0000)]
#[case::all_ones(0xFFFF_FFFF)]
#[case::jalr_funct3(i_type(OP_JALR, 1, 0b001, 2, 0))]
#[case::branch_funct3_2(b_type(OP_BRANCH, 0b010, 1, 2, 8))]
#[case::branch_funct3_3(b_type(OP_BRANCH, 0b011, 1, 2, 8))]
#[case::load_funct3_3(i_type(OP_LOAD, 1, 0b011, 2, 0))]
#[case::load_funct3_6(i_type(OP_LOAD, 1, 0b110, 2, 0))]
#[case::load_funct3_7(i_type(OP_LOAD, 1, 0b111, 2, 0))]
#[case::store_funct3_3(s_type(OP_STORE, 0b011, 2, 1, 0))]
#[case::store_funct3_4(s_type(OP_STORE, 0b100, 2, 1, 0))]
#[case::slli_funct7(r_type(OP_IMM, 1, 0b001, 2, 3, 0b0100000))]
#[case::srli_funct7(r_type(OP_IMM, 1, 0b101, 2, 3, 0b0000001))]
#[case::add_funct7_mul(r_type(OP_REG, 1, 0b000, 2, 3, 0b0000001))]
#[case::sll_funct7_alt(r_type(OP_REG, 1, 0b001, 2, 3, 0b0100000))]
#[case::and_funct7_alt(r_type(OP_REG, 1, 0b111, 2, 3, 0b0100000))]
#[case::system(0x0000_0073)]
#[case::fence(0x0FF0_000F)]
#[case::compressed(0x0000_4501)]
fn rejects_encoding_outside_base_table(#[case] raw: u32) {
    let inst = Instruction::new(raw);
    assert_eq!(inst.decode(), Opcode::Invalid);
    assert_eq!(inst.try_decode(), Err(DecodeError::Unrecognized(raw)));
}

#[test]
fn unrecognized_error_names_the_word() {
    let err = Instruction::new(0).try_decode().unwrap_err();
    assert_eq!(err.to_string(), "unrecognized instruction encoding 0x00000000");
}

// ══════════════════════════════════════════════════════════
// Opcode Metadata
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(Opcode::Add, Some(Format::R))]
#[case(Opcode::Srai, Some(Format::I))]
#[case(Opcode::Lw, Some(Format::I))]
#[case(Opcode::Sh, Some(Format::S))]
#[case(Opcode::Bgeu, Some(Format::B))]
#[case(Opcode::Auipc, Some(Format::U))]
#[case(Opcode::Jal, Some(Format::J))]
#[case(Opcode::Invalid, None)]
fn opcode_formats(#[case] op: Opcode, #[case] format: Option<Format>) {
    assert_eq!(op.format(), format);
}

#[test]
fn memory_access_sizes() {
    assert_eq!(Opcode::Lb.access_size(), Some(1));
    assert_eq!(Opcode::Lhu.access_size(), Some(2));
    assert_eq!(Opcode::Sw.access_size(), Some(4));
    assert_eq!(Opcode::Add.access_size(), None);
    assert!(Opcode::Lbu.is_load() && !Opcode::Lbu.is_store());
    assert!(Opcode::Sb.is_store() && !Opcode::Sb.is_load());
    assert!(Opcode::Bltu.is_branch() && !Opcode::Jal.is_branch());
}

#[test]
fn mnemonics() {
    assert_eq!(Opcode::Sltiu.to_string(), "sltiu");
    assert_eq!(Opcode::Invalid.mnemonic(), "illegal");
}

// ══════════════════════════════════════════════════════════
// Totality
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn decode_is_total_and_consistent(raw in any::<u32>()) {
        let inst = Instruction::new(raw);
        let op = inst.decode();
        prop_assert_eq!(op == Opcode::Invalid, inst.try_decode().is_err());
        prop_assert_eq!(rvtlm_core::isa::decode(raw).op, op);
    }

    #[test]
    fn unknown_major_opcodes_are_invalid(raw in any::<u32>()) {
        let known = [
            OP_LUI, OP_AUIPC, OP_JAL, OP_JALR, OP_BRANCH, OP_LOAD, OP_STORE, OP_IMM, OP_REG,
        ];
        prop_assume!(!known.contains(&(raw & 0x7F)));
        prop_assert_eq!(Instruction::new(raw).decode(), Opcode::Invalid);
    }
}
