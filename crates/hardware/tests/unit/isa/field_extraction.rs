//! # Field Extraction Tests
//!
//! Verifies register and function fields are pulled from the right bit
//! positions regardless of what surrounds them.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rvtlm_core::isa::{Instruction, InstructionBits};

// ══════════════════════════════════════════════════════════
// Fixed Words
// ══════════════════════════════════════════════════════════

#[test]
fn add_fields() {
    // add x3, x1, x2
    let inst = Instruction::new(0x0020_81B3);
    assert_eq!(inst.opcode(), 0x33);
    assert_eq!(inst.rd(), 3);
    assert_eq!(inst.funct3(), 0);
    assert_eq!(inst.rs1(), 1);
    assert_eq!(inst.rs2(), 2);
    assert_eq!(inst.funct7(), 0);
}

#[test]
fn sub_funct7() {
    // sub x3, x1, x2
    let inst = Instruction::new(0x4020_81B3);
    assert_eq!(inst.funct7(), 0b0100000);
    assert_eq!(inst.funct3(), 0);
}

#[test]
fn all_ones_fields_saturate() {
    let inst = Instruction::new(0xFFFF_FFFF);
    assert_eq!(inst.opcode(), 0x7F);
    assert_eq!(inst.rd(), 31);
    assert_eq!(inst.rs1(), 31);
    assert_eq!(inst.rs2(), 31);
    assert_eq!(inst.funct3(), 7);
    assert_eq!(inst.funct7(), 0x7F);
    assert_eq!(inst.csr(), 0xFFF);
}

#[test]
fn csr_field_is_zero_extended() {
    // csrrw x0, 0xC00, x0 (cycle); the field is unsigned
    let inst = Instruction::new(0xC000_1073);
    assert_eq!(inst.csr(), 0xC00);
}

#[test]
fn raw_word_round_trips() {
    let inst = Instruction::from(0xDEAD_BEEF);
    assert_eq!(inst.raw(), 0xDEAD_BEEF);
    assert_eq!(u32::from(inst), 0xDEAD_BEEF);
    assert_eq!(format!("{inst}"), "0xdeadbeef");
    assert_eq!(format!("{inst:x}"), "deadbeef");
}

#[test]
fn trait_is_implemented_for_raw_words() {
    let word: u32 = 0x0020_81B3;
    assert_eq!(word.rd(), Instruction::new(word).rd());
    assert_eq!(word.rs2(), Instruction::new(word).rs2());
}

// ══════════════════════════════════════════════════════════
// Properties
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fields_stay_in_range(raw in any::<u32>()) {
        let inst = Instruction::new(raw);
        prop_assert!(inst.opcode() <= 0x7F);
        prop_assert!(inst.rd() <= 31);
        prop_assert!(inst.rs1() <= 31);
        prop_assert!(inst.rs2() <= 31);
        prop_assert!(inst.funct3() <= 7);
        prop_assert!(inst.funct7() <= 0x7F);
        prop_assert!(inst.csr() <= 0xFFF);
    }

    #[test]
    fn fields_reassemble_the_word(raw in any::<u32>()) {
        let inst = Instruction::new(raw);
        let rebuilt = (inst.funct7() << 25)
            | ((inst.rs2() as u32) << 20)
            | ((inst.rs1() as u32) << 15)
            | (inst.funct3() << 12)
            | ((inst.rd() as u32) << 7)
            | inst.opcode();
        prop_assert_eq!(rebuilt, raw);
    }

    #[test]
    fn accessors_are_pure(raw in any::<u32>()) {
        let inst = Instruction::new(raw);
        prop_assert_eq!(inst.decode(), inst.decode());
        prop_assert_eq!(inst.imm_j(), inst.imm_j());
        prop_assert_eq!(inst.raw(), raw);
    }
}
