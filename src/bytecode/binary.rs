/*!
  This module is responsible for the encoding and decoding of binary instructions.

*/
use std::convert::TryFrom;

use super::{CompareMode, DualOperation, Instruction, SingleOperation, S_FORM_OPCODE};
use crate::address::Address;

// If you change this you must also change `encode_instruction` and `decode_instruction`.
pub type Word = u32;

// Field positions. See the module documentation of `bytecode` for the layouts.
const PRIMARY_SHIFT: u32 = 28;
const OPERAND_A_SHIFT: u32 = 14;
const SECONDARY_SHIFT: u32 = 24;
const COMPARE_SHIFT: u32 = 21;
const UNUSED_SHIFT: u32 = 20;
const IMMEDIATE_SHIFT: u32 = 14;

const NIBBLE_MASK: Word = 0x0F;
const COMPARE_MASK: Word = 0x07;
const UNUSED_MASK: Word = 0x01;
const IMMEDIATE_MASK: Word = 0x3F;

/// The 28 bits below the primary opcode, shared by both layouts.
pub const PAYLOAD_MASK: Word = 0x0FFF_FFFF;

/**
  Decodes one instruction word. This never fails: a word whose primary opcode, secondary
  opcode, or comparison mode is undefined decodes to `Instruction::Invalid`, which keeps the
  raw word.
*/
pub fn decode_instruction(word: Word) -> Instruction {
  let primary = ((word >> PRIMARY_SHIFT) & NIBBLE_MASK) as u8;

  if primary == S_FORM_OPCODE {
    // [0:4][Opcode:4][Compare Mode:3][Unused:1][Immediate:6][Source:14]
    let operation = match SingleOperation::try_from(((word >> SECONDARY_SHIFT) & NIBBLE_MASK) as u8) {
      Ok(operation) => operation,
      Err(_e) => return Instruction::Invalid(word)
    };
    let compare_mode = ((word >> COMPARE_SHIFT) & COMPARE_MASK) as u8;
    if operation == SingleOperation::Cmpz && CompareMode::try_from(compare_mode).is_err() {
      return Instruction::Invalid(word);
    }

    let source = match operation {
      SingleOperation::Input => Address::port_field(word, 0),
      _ => Address::memory_field(word, 0)
    };

    Instruction::Single {
      operation,
      compare_mode,
      unused: ((word >> UNUSED_SHIFT) & UNUSED_MASK) as u8,
      immediate: ((word >> IMMEDIATE_SHIFT) & IMMEDIATE_MASK) as u8,
      source
    }

  } else {
    // [Opcode:4][Operand A:14][Operand B:14]
    let operation = match DualOperation::try_from(primary) {
      Ok(operation) => operation,
      Err(_e) => return Instruction::Invalid(word)
    };

    let operand_a = match operation {
      DualOperation::Output => Address::port_field(word, OPERAND_A_SHIFT),
      _ => Address::memory_field(word, OPERAND_A_SHIFT)
    };

    Instruction::Dual {
      operation,
      operand_a,
      operand_b: Address::memory_field(word, 0)
    }
  }
}

/**
  Encodes the instruction into a word. Address fields wider than 14 bits are truncated; it
  is the caller's responsibility to keep them in range.
*/
pub fn encode_instruction(instruction: &Instruction) -> Word {
  match instruction {

    Instruction::Dual { operation, operand_a, operand_b } => {
      // [Opcode:4][Operand A:14][Operand B:14]
      ((operation.code() as Word) << PRIMARY_SHIFT)
        | (operand_a.field() << OPERAND_A_SHIFT)
        |  operand_b.field()
    }

    Instruction::Single { operation, compare_mode, unused, immediate, source } => {
      // [0:4][Opcode:4][Compare Mode:3][Unused:1][Immediate:6][Source:14]
      ((operation.code() as Word) << SECONDARY_SHIFT)
        | (((*compare_mode as Word) & COMPARE_MASK) << COMPARE_SHIFT)
        | (((*unused as Word) & UNUSED_MASK) << UNUSED_SHIFT)
        | (((*immediate as Word) & IMMEDIATE_MASK) << IMMEDIATE_SHIFT)
        |  source.field()
    }

    Instruction::Invalid(word) => *word,
  }
}
