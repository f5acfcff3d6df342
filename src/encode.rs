//! Instruction encoding: operand splitting, addressing-mode
//! classification, per-opcode validation, and emission of the head word
//! plus extension words.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::ErrorKind;
use crate::labels;
use crate::op::{AddressingMode, OperandCount, Operation};
use crate::word::{Are, Word};

pub static MAX_IMMEDIATE: i32 = 2047; // 0x07_FF
pub static MIN_IMMEDIATE: i32 = -2048; // 0x08_00

static IMMEDIATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[+-]?[0-9]+$").expect("invalid immediate regex"));

/// One classified operand. `value` carries the immediate or the
/// register number; direct operands keep their label in `text` until
/// the second pass supplies the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand<'a> {
    pub text: &'a str,
    pub mode: AddressingMode,
    pub value: i32,
}

#[derive(Clone, Copy)]
enum Role {
    Src,
    Dst,
}

/// Everything one instruction line produces: the words to append at IC,
/// and label references as (name, word offset from the head).
#[derive(Debug)]
pub struct Encoded {
    pub words: Vec<Word>,
    pub refs: Vec<(String, usize)>,
}

fn register_number(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    (bytes.len() == 2 && bytes[0] == b'r' && (b'0'..=b'7').contains(&bytes[1]))
        .then(|| i32::from(bytes[1] - b'0'))
}

/// Decide the addressing mode of a single operand token.
pub fn classify(operand: &str) -> Result<Operand<'_>, ErrorKind> {
    if let Some(literal) = operand.strip_prefix('#') {
        if !IMMEDIATE_REGEX.is_match(literal) {
            return Err(ErrorKind::InvalidOperand);
        }
        let value = literal.parse::<i32>().map_err(|_| ErrorKind::OutOfRange)?;
        if !(MIN_IMMEDIATE..=MAX_IMMEDIATE).contains(&value) {
            return Err(ErrorKind::OutOfRange);
        }
        return Ok(Operand {
            text: operand,
            mode: AddressingMode::Immediate,
            value,
        });
    }

    if let Some(value) = register_number(operand) {
        return Ok(Operand {
            text: operand,
            mode: AddressingMode::RegisterDirect,
            value,
        });
    }

    if let Some(inner) = operand.strip_prefix('*') {
        return match register_number(inner) {
            Some(value) => Ok(Operand {
                text: operand,
                mode: AddressingMode::RegisterIndirect,
                value,
            }),
            None => Err(ErrorKind::InvalidRegister),
        };
    }

    // Anything else is a label use; shape is checked per role.
    Ok(Operand {
        text: operand,
        mode: AddressingMode::Direct,
        value: 0,
    })
}

fn check_against(operand: &Operand, allowed: &[AddressingMode]) -> Result<(), ErrorKind> {
    if operand.mode == AddressingMode::Direct && !labels::is_valid_name(operand.text) {
        return Err(ErrorKind::InvalidLabelFormat);
    }
    if !allowed.contains(&operand.mode) {
        return Err(ErrorKind::InvalidOperandType);
    }
    Ok(())
}

/// Two commas with nothing but whitespace between them.
fn has_duplicate_comma(text: &str) -> bool {
    let mut after_comma = false;
    for c in text.chars() {
        if c == ',' {
            if after_comma {
                return true;
            }
            after_comma = true;
        } else if !c.is_whitespace() {
            after_comma = false;
        }
    }
    false
}

/// Split the operand field into trimmed single-token operands. The
/// comma policies are checked in a fixed order, each with its own
/// diagnostic: leading comma, duplicate comma, trailing comma, missing
/// comma between operands, extra text after the last operand.
pub fn split_operands(rest: &str, count: OperandCount) -> Result<Vec<&str>, ErrorKind> {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return Err(ErrorKind::MissingOperand);
    }
    if trimmed.starts_with(',') {
        return Err(ErrorKind::CommaBeforeOperand);
    }
    if has_duplicate_comma(trimmed) {
        return Err(ErrorKind::DuplicateComma);
    }
    if trimmed.ends_with(',') {
        return Err(ErrorKind::CommaAfterLastOperand);
    }

    let pieces: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let expected = match count {
        OperandCount::Zero => 0,
        OperandCount::One => 1,
        OperandCount::Two => 2,
    };
    if pieces.len() > expected {
        return Err(ErrorKind::TooManyOperands);
    }

    for (idx, piece) in pieces.iter().enumerate() {
        if piece.split_whitespace().count() > 1 {
            let last = idx + 1 == pieces.len();
            if count == OperandCount::Two && (pieces.len() < expected || !last) {
                return Err(ErrorKind::MissingCommaBetweenOperands);
            }
            return Err(ErrorKind::ExtraTextAfterOperands);
        }
    }

    Ok(pieces)
}

fn extension_word(operand: &Operand, role: Role) -> Word {
    match operand.mode {
        AddressingMode::RegisterDirect | AddressingMode::RegisterIndirect => match role {
            Role::Src => Word::Registers {
                src: operand.value as u16,
                dst: 0,
            },
            Role::Dst => Word::Registers {
                src: 0,
                dst: operand.value as u16,
            },
        },
        AddressingMode::Immediate => Word::Operand {
            value: operand.value as i16,
            are: Are::Absolute,
        },
        // Placeholder until the second pass patches in the address.
        AddressingMode::Direct => Word::Operand {
            value: 0,
            are: Are::Absolute,
        },
    }
}

/// Encode one instruction line. Returns the full word sequence or the
/// first diagnostic; a failing line contributes no words and no refs.
pub fn encode(op: &'static Operation, rest: &str) -> Result<Encoded, ErrorKind> {
    match op.operands {
        OperandCount::Zero => {
            if !rest.trim().is_empty() {
                return Err(ErrorKind::ExtraTextAfterCommand);
            }
            Ok(Encoded {
                words: vec![Word::Head {
                    opcode: op.opcode,
                    src_mask: 0,
                    dst_mask: 0,
                }],
                refs: Vec::new(),
            })
        }

        OperandCount::One => {
            let operands = split_operands(rest, OperandCount::One)?;
            let dst = classify(operands[0])?;
            check_against(&dst, op.dst_modes)?;

            let words = vec![
                Word::Head {
                    opcode: op.opcode,
                    src_mask: 0,
                    dst_mask: dst.mode.mask(),
                },
                extension_word(&dst, Role::Dst),
            ];
            let mut refs = Vec::new();
            if dst.mode == AddressingMode::Direct {
                refs.push((dst.text.to_owned(), 1));
            }
            Ok(Encoded { words, refs })
        }

        OperandCount::Two => {
            let operands = split_operands(rest, OperandCount::Two)?;
            if operands.len() < 2 {
                return Err(ErrorKind::MissingDestOperand);
            }
            let src = classify(operands[0])?;
            check_against(&src, op.src_modes)?;
            let dst = classify(operands[1])?;
            check_against(&dst, op.dst_modes)?;

            let mut words = vec![Word::Head {
                opcode: op.opcode,
                src_mask: src.mode.mask(),
                dst_mask: dst.mode.mask(),
            }];
            let mut refs = Vec::new();

            if src.mode.is_register() && dst.mode.is_register() {
                // Both register-class: one shared extension word.
                words.push(Word::Registers {
                    src: src.value as u16,
                    dst: dst.value as u16,
                });
            } else {
                words.push(extension_word(&src, Role::Src));
                words.push(extension_word(&dst, Role::Dst));
                if src.mode == AddressingMode::Direct {
                    refs.push((src.text.to_owned(), 1));
                }
                if dst.mode == AddressingMode::Direct {
                    refs.push((dst.text.to_owned(), 2));
                }
            }

            Ok(Encoded { words, refs })
        }
    }
}
