/*!

  The VM uses a 32 bit instruction word. Every line of a program is one instruction word
  paired with one 64 bit floating point constant. The top four bits of the word select
  between two overlapping layouts of the remaining 28 bits:

    D-form (primary opcode != 0):
      [Opcode:4][Operand A:14][Operand B:14]

    S-form (primary opcode == 0):
      [0:4][Opcode:4][Compare Mode:3][Unused:1][Immediate:6][Source:14]

  Both layouts are always extracted from the same low 28 bits; only the primary opcode
  decides which of them is meaningful. The immediate and the unused bit are reserved: they
  are decoded and kept so that re-encoding reproduces the word, but no operation consumes
  them.

  An instruction's result is written to the memory slot of its own line, so the slot
  number is not part of the encoding. It is attached by the program loader.

*/

mod binary;
mod assembly;

pub use binary::{decode_instruction, encode_instruction, Word, PAYLOAD_MASK};
pub use assembly::parse_assembly;

use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::address::Address;

/// Primary opcode value announcing an S-form word.
pub const S_FORM_OPCODE: u8 = 0;

/**
  Opcodes of the D-form. The discriminants are the primary opcode values, so the order and
  numbering below is significant.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,         Hash
)]
#[repr(u8)]
pub enum DualOperation {
  Add    = 1, // M[slot] = M[a] + M[b]
  Sub    = 2, // M[slot] = M[a] - M[b]
  Mult   = 3, // M[slot] = M[a] * M[b]
  Div    = 4, // M[slot] = M[a] / M[b], skipped when M[b] == 0
  Output = 5, // P_out[a] = M[b]
  Phi    = 6, // M[slot] = if status { M[a] } else { M[b] }
}

/// Opcodes of the S-form, numbered by their secondary opcode value.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,         Hash
)]
#[repr(u8)]
pub enum SingleOperation {
  Noop  = 0,
  Cmpz  = 1, // status = M[source] <mode> 0.0
  Sqrt  = 2, // M[slot] = sqrt(M[source])
  Copy  = 3, // M[slot] = M[source]
  Input = 4, // M[slot] = P_in[source]
}

/// The comparison a `Cmpz` performs against zero.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,         Hash
)]
#[repr(u8)]
pub enum CompareMode {
  Ltz = 0,
  Lez = 1,
  Eqz = 2,
  Gez = 3,
  Gtz = 4,
}

impl CompareMode {
  /// Evaluates the comparison for `value`. Any comparison involving NaN is false.
  pub fn holds(&self, value: f64) -> bool {
    match self {
      CompareMode::Ltz => value <  0.0,
      CompareMode::Lez => value <= 0.0,
      CompareMode::Eqz => value == 0.0,
      CompareMode::Gez => value >= 0.0,
      CompareMode::Gtz => value >  0.0,
    }
  }
}

impl DualOperation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }
}

impl SingleOperation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }
}

/// Holds the unencoded components of an instruction word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// [Opcode:4][Operand A:14][Operand B:14]
  Dual {
    operation: DualOperation,
    operand_a: Address,
    operand_b: Address
  },
  /// [0:4][Opcode:4][Compare Mode:3][Unused:1][Immediate:6][Source:14]
  Single {
    operation: SingleOperation,
    /// Raw mode bits. Only meaningful for `Cmpz`, see `Instruction::compare_mode`.
    compare_mode: u8,
    /// Bit 20. Reserved.
    unused: u8,
    /// Reserved.
    immediate: u8,
    source: Address
  },
  /// A word whose opcode (or `Cmpz` mode) is not defined. Executes as a no-op.
  Invalid(Word),
}

impl Instruction {
  /// Shorthand for a D-form instruction over two memory operands.
  pub fn dual(operation: DualOperation, operand_a: usize, operand_b: usize) -> Instruction {
    let operand_a = match operation {
      DualOperation::Output => Address::Port(operand_a),
      _ => Address::Memory(operand_a)
    };
    Instruction::Dual { operation, operand_a, operand_b: Address::Memory(operand_b) }
  }

  /// Shorthand for an S-form instruction with a zero immediate.
  pub fn single(operation: SingleOperation, source: usize) -> Instruction {
    let source = match operation {
      SingleOperation::Input => Address::Port(source),
      _ => Address::Memory(source)
    };
    Instruction::Single { operation, compare_mode: 0, unused: 0, immediate: 0, source }
  }

  pub fn compare(mode: CompareMode, source: usize) -> Instruction {
    Instruction::Single {
      operation: SingleOperation::Cmpz,
      compare_mode: mode.into(),
      unused: 0,
      immediate: 0,
      source: Address::Memory(source)
    }
  }

  pub fn noop() -> Instruction {
    Instruction::single(SingleOperation::Noop, 0)
  }

  /// The decoded comparison of a `Cmpz`, `None` for every other instruction.
  pub fn compare_mode(&self) -> Option<CompareMode> {
    use std::convert::TryFrom;

    match self {
      Instruction::Single { operation: SingleOperation::Cmpz, compare_mode, .. } => {
        CompareMode::try_from(*compare_mode).ok()
      }
      _ => None
    }
  }

  /// False for undefined words and for a `Cmpz` whose mode bits name no comparison.
  pub fn is_valid(&self) -> bool {
    match self {
      Instruction::Invalid(_) => false,
      Instruction::Single { operation: SingleOperation::Cmpz, .. } => self.compare_mode().is_some(),
      _ => true
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Dual { operation, operand_a, operand_b } => {
        write!(f, "{}({}, {})", operation, operand_a.idx(), operand_b.idx())
      }

      Instruction::Single { operation: SingleOperation::Noop, .. } => {
        write!(f, "{}", SingleOperation::Noop)
      }

      Instruction::Single { operation: SingleOperation::Cmpz, source, .. } => {
        match self.compare_mode() {
          Some(mode) => write!(f, "{}({}, {})", SingleOperation::Cmpz, mode, source.idx()),
          None => write!(f, "{}(?, {})", SingleOperation::Cmpz, source.idx())
        }
      }

      Instruction::Single { operation, source, .. } => {
        write!(f, "{}({})", operation, source.idx())
      }

      Instruction::Invalid(word) => {
        write!(f, "Invalid({:#010x})", word)
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn compare_modes_against_zero() {
    assert!(CompareMode::Ltz.holds(-1.0));
    assert!(!CompareMode::Ltz.holds(0.0));
    assert!(CompareMode::Lez.holds(0.0));
    assert!(CompareMode::Eqz.holds(-0.0));
    assert!(CompareMode::Gez.holds(0.0));
    assert!(!CompareMode::Gtz.holds(0.0));
    assert!(!CompareMode::Gez.holds(std::f64::NAN));
  }

  #[test]
  fn mnemonics_round_trip_through_strum() {
    assert_eq!(DualOperation::from_str("Phi").unwrap(), DualOperation::Phi);
    assert_eq!(SingleOperation::Input.to_string(), "Input");
    assert_eq!(CompareMode::from_str("Gez").unwrap(), CompareMode::Gez);
    assert!(DualOperation::from_str("Noop").is_err());
  }

  #[test]
  fn displays_assembly_form() {
    assert_eq!(Instruction::dual(DualOperation::Add, 3, 4).to_string(), "Add(3, 4)");
    assert_eq!(Instruction::dual(DualOperation::Output, 2, 10).to_string(), "Output(2, 10)");
    assert_eq!(Instruction::compare(CompareMode::Ltz, 5).to_string(), "Cmpz(Ltz, 5)");
    assert_eq!(Instruction::single(SingleOperation::Input, 16000).to_string(), "Input(16000)");
    assert_eq!(Instruction::noop().to_string(), "Noop");
    assert_eq!(Instruction::Invalid(0x7ABC_0000).to_string(), "Invalid(0x7abc0000)");
  }

  #[test]
  fn ports_are_typed_by_operation() {
    match Instruction::dual(DualOperation::Output, 1, 2) {
      Instruction::Dual { operand_a, operand_b, .. } => {
        assert_eq!(operand_a, Address::Port(1));
        assert_eq!(operand_b, Address::Memory(2));
      }
      other => panic!("unexpected {:?}", other)
    }
    assert_eq!(Instruction::noop().compare_mode(), None);
    assert_eq!(Instruction::compare(CompareMode::Eqz, 0).compare_mode(), Some(CompareMode::Eqz));
  }

  #[test]
  fn cmpz_without_a_comparison_is_invalid() {
    let bad_mode = Instruction::Single {
      operation: SingleOperation::Cmpz,
      compare_mode: 6,
      unused: 0,
      immediate: 0,
      source: Address::Memory(3)
    };
    assert!(!bad_mode.is_valid());
    assert!(Instruction::compare(CompareMode::Gtz, 3).is_valid());
    assert!(!Instruction::Invalid(0xF000_0000).is_valid());
  }
}
