//! The instruction set: reference data for the encoder and both passes.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// `#N`
    Immediate,
    /// a label
    Direct,
    /// `*rK`
    RegisterIndirect,
    /// `rK`
    RegisterDirect,
}

impl AddressingMode {
    pub fn code(self) -> u16 {
        match self {
            AddressingMode::Immediate => 0,
            AddressingMode::Direct => 1,
            AddressingMode::RegisterIndirect => 2,
            AddressingMode::RegisterDirect => 3,
        }
    }

    /// The bit this mode contributes to a head-word role mask.
    pub fn mask(self) -> u16 {
        1 << self.code()
    }

    pub fn is_register(self) -> bool {
        matches!(
            self,
            AddressingMode::RegisterIndirect | AddressingMode::RegisterDirect
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandCount {
    Zero,
    One,
    Two,
}

#[derive(Debug)]
pub struct Operation {
    pub mnemonic: &'static str,
    pub opcode: u16,
    pub operands: OperandCount,
    pub src_modes: &'static [AddressingMode],
    pub dst_modes: &'static [AddressingMode],
}

use AddressingMode::{Direct, Immediate, RegisterDirect, RegisterIndirect};
use OperandCount::{One, Two, Zero};

const ALL: &[AddressingMode] = &[Immediate, Direct, RegisterIndirect, RegisterDirect];
const NO_IMMEDIATE: &[AddressingMode] = &[Direct, RegisterIndirect, RegisterDirect];
const JUMP: &[AddressingMode] = &[Direct, RegisterIndirect];
const NONE: &[AddressingMode] = &[];

#[rustfmt::skip]
pub static OPERATIONS: [Operation; 16] = [
    Operation { mnemonic: "mov",  opcode: 0,  operands: Two,  src_modes: ALL,          dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "cmp",  opcode: 1,  operands: Two,  src_modes: ALL,          dst_modes: ALL },
    Operation { mnemonic: "add",  opcode: 2,  operands: Two,  src_modes: NO_IMMEDIATE, dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "sub",  opcode: 3,  operands: Two,  src_modes: NO_IMMEDIATE, dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "lea",  opcode: 4,  operands: Two,  src_modes: &[Direct],    dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "clr",  opcode: 5,  operands: One,  src_modes: NONE,         dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "not",  opcode: 6,  operands: One,  src_modes: NONE,         dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "inc",  opcode: 7,  operands: One,  src_modes: NONE,         dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "dec",  opcode: 8,  operands: One,  src_modes: NONE,         dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "jmp",  opcode: 9,  operands: One,  src_modes: NONE,         dst_modes: JUMP },
    Operation { mnemonic: "bne",  opcode: 10, operands: One,  src_modes: NONE,         dst_modes: JUMP },
    Operation { mnemonic: "red",  opcode: 11, operands: One,  src_modes: NONE,         dst_modes: NO_IMMEDIATE },
    Operation { mnemonic: "prn",  opcode: 12, operands: One,  src_modes: NONE,         dst_modes: ALL },
    Operation { mnemonic: "jsr",  opcode: 13, operands: One,  src_modes: NONE,         dst_modes: JUMP },
    Operation { mnemonic: "rts",  opcode: 14, operands: Zero, src_modes: NONE,         dst_modes: NONE },
    Operation { mnemonic: "stop", opcode: 15, operands: Zero, src_modes: NONE,         dst_modes: NONE },
];

static MNEMONICS: OnceCell<HashMap<&'static str, &'static Operation>> = OnceCell::new();

pub fn lookup(mnemonic: &str) -> Option<&'static Operation> {
    MNEMONICS
        .get_or_init(|| OPERATIONS.iter().map(|op| (op.mnemonic, op)).collect())
        .get(mnemonic)
        .copied()
}

pub fn is_mnemonic(name: &str) -> bool {
    lookup(name).is_some()
}

pub const DIRECTIVES: [&str; 4] = [".data", ".string", ".entry", ".extern"];

/// Names that cannot be used for macros or labels.
pub fn is_reserved(name: &str) -> bool {
    is_mnemonic(name) || DIRECTIVES.contains(&name)
}
