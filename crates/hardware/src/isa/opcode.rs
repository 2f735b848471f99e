//! Decoded opcode tags.
//!
//! [`Opcode`] is the closed set of RV32I base instructions the decoder
//! recognizes, plus [`Opcode::Invalid`] for every other encoding. Each tag
//! knows its encoding [`Format`] and its assembler mnemonic.

use std::fmt;

/// Instruction encoding format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Register-register: `funct7 | rs2 | rs1 | funct3 | rd | opcode`.
    R,
    /// Register-immediate: `imm[11:0] | rs1 | funct3 | rd | opcode`.
    I,
    /// Store: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`.
    S,
    /// Branch: `imm[12|10:5] | rs2 | rs1 | funct3 | imm[4:1|11] | opcode`.
    B,
    /// Upper immediate: `imm[31:12] | rd | opcode`.
    U,
    /// Jump: `imm[20|10:1|11|19:12] | rd | opcode`.
    J,
}

/// Immediate encodings an instruction word can be read as.
///
/// R-type instructions carry no immediate, so this is the subset of
/// [`Format`] that does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImmFormat {
    /// 12-bit signed immediate in bits 31:20.
    I,
    /// 12-bit signed immediate split across bits 31:25 and 11:7.
    S,
    /// 20-bit upper immediate in bits 31:12, not sign-extended.
    U,
    /// 13-bit signed, even branch offset.
    B,
    /// 21-bit signed, even jump offset.
    J,
}

impl Format {
    /// Returns the immediate encoding used by this format, if any.
    pub const fn immediate(self) -> Option<ImmFormat> {
        match self {
            Self::R => None,
            Self::I => Some(ImmFormat::I),
            Self::S => Some(ImmFormat::S),
            Self::B => Some(ImmFormat::B),
            Self::U => Some(ImmFormat::U),
            Self::J => Some(ImmFormat::J),
        }
    }
}

/// Operation of a decoded RV32I instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Opcode {
    Lui,
    Auipc,
    Jal,
    Jalr,

    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,

    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,

    Sb,
    Sh,
    Sw,

    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,

    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,

    /// Any encoding outside the table above.
    Invalid,
}

impl Opcode {
    /// Encoding format of the instruction, `None` for [`Opcode::Invalid`].
    pub const fn format(self) -> Option<Format> {
        match self {
            Self::Lui | Self::Auipc => Some(Format::U),
            Self::Jal => Some(Format::J),
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu => {
                Some(Format::B)
            }
            Self::Sb | Self::Sh | Self::Sw => Some(Format::S),
            Self::Jalr
            | Self::Lb
            | Self::Lh
            | Self::Lw
            | Self::Lbu
            | Self::Lhu
            | Self::Addi
            | Self::Slti
            | Self::Sltiu
            | Self::Xori
            | Self::Ori
            | Self::Andi
            | Self::Slli
            | Self::Srli
            | Self::Srai => Some(Format::I),
            Self::Add
            | Self::Sub
            | Self::Sll
            | Self::Slt
            | Self::Sltu
            | Self::Xor
            | Self::Srl
            | Self::Sra
            | Self::Or
            | Self::And => Some(Format::R),
            Self::Invalid => None,
        }
    }

    /// Lower-case assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lui => "lui",
            Self::Auipc => "auipc",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Sll => "sll",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Xor => "xor",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
            Self::Invalid => "illegal",
        }
    }

    /// True for loads (LB, LH, LW, LBU, LHU).
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Lb | Self::Lh | Self::Lw | Self::Lbu | Self::Lhu)
    }

    /// True for stores (SB, SH, SW).
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Sb | Self::Sh | Self::Sw)
    }

    /// Number of bytes moved by a load or store, `None` otherwise.
    pub const fn access_size(self) -> Option<usize> {
        match self {
            Self::Lb | Self::Lbu | Self::Sb => Some(1),
            Self::Lh | Self::Lhu | Self::Sh => Some(2),
            Self::Lw | Self::Sw => Some(4),
            _ => None,
        }
    }

    /// True for conditional branches.
    pub const fn is_branch(self) -> bool {
        matches!(self.format(), Some(Format::B))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
