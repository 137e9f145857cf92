/*!
  Programs and their on-disk format.

  A program file is a sequence of 12 byte records, one per line, with no header and no
  trailer. Each record holds an instruction word and a constant, and the order of the two
  alternates with the line's slot:

    even slot:  [Constant:64][Instruction:32]
    odd slot:   [Instruction:32][Constant:64]

  Both fields are little-endian. A short record at the end of the stream is dropped.
*/

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

use nom::{
  combinator::map,
  number::complete::{le_f64, le_u32},
  sequence::pair,
  IResult
};
use tracing::debug;

use crate::bytecode::{decode_instruction, encode_instruction, parse_assembly, Instruction, Word};
use crate::error::{AssemblyError, LoadError};

/// Bytes per record.
pub const RECORD_SIZE: usize = 12;

/// One decoded program line. The constant is the initial content of memory slot `slot`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
  pub slot: usize,
  pub instruction: Instruction,
  pub constant: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
  lines: Vec<Line>
}

// [Constant:64][Instruction:32]
fn even_record(input: &[u8]) -> IResult<&[u8], (Word, f64)> {
  map(pair(le_f64, le_u32), |(constant, word)| (word, constant))(input)
}

// [Instruction:32][Constant:64]
fn odd_record(input: &[u8]) -> IResult<&[u8], (Word, f64)> {
  pair(le_u32, le_f64)(input)
}

impl Program {
  pub fn new() -> Program {
    Program { lines: vec![] }
  }

  /// Appends a line and returns the slot it occupies.
  pub fn push(&mut self, instruction: Instruction, constant: f64) -> usize {
    let slot = self.lines.len();
    self.lines.push(Line { slot, instruction, constant });
    slot
  }

  pub fn lines(&self) -> &[Line] {
    &self.lines
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Lines whose word did not decode to a defined instruction.
  pub fn invalid_lines(&self) -> impl Iterator<Item = &Line> + '_ {
    self.lines.iter().filter(|line| !line.instruction.is_valid())
  }

  /**
    Decodes every complete record of `bytes`. Reading stops at the first record that does not
    fit in what is left; those trailing bytes are ignored.
  */
  pub fn from_bytes(bytes: &[u8]) -> Program {
    let mut program = Program::new();
    let mut input = bytes;

    loop {
      let record = match program.len() % 2 {
        0 => even_record(input),
        _ => odd_record(input)
      };
      match record {
        Ok((rest, (word, constant))) => {
          program.push(decode_instruction(word), constant);
          input = rest;
        }
        Err(_e) => break
      }
    }

    if !input.is_empty() {
      debug!(slot = program.len(), bytes = input.len(), "dropping truncated trailing record");
    }
    program
  }

  pub fn read_from<R: Read>(mut reader: R) -> Result<Program, LoadError> {
    let mut bytes = vec![];
    reader.read_to_end(&mut bytes)?;
    Ok(Program::from_bytes(&bytes))
  }

  pub fn open<P: AsRef<Path>>(path: P) -> Result<Program, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| {
      LoadError::Open { path: path.to_path_buf(), source }
    })?;
    Program::read_from(BufReader::new(file))
  }

  /// Serializes the program in the format `from_bytes` reads.
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(self.lines.len() * RECORD_SIZE);
    for (slot, line) in self.lines.iter().enumerate() {
      let word = encode_instruction(&line.instruction).to_le_bytes();
      let constant = line.constant.to_le_bytes();
      match slot % 2 {
        0 => {
          bytes.extend_from_slice(&constant);
          bytes.extend_from_slice(&word);
        }
        _ => {
          bytes.extend_from_slice(&word);
          bytes.extend_from_slice(&constant);
        }
      }
    }
    bytes
  }

  pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
    writer.write_all(&self.to_bytes())?;
    writer.flush()
  }
}

/// One line per slot in assembly form, e.g. `Add(3, 4) = 0.0`.
impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for line in &self.lines {
      writeln!(f, "{} = {:?}", line.instruction, line.constant)?;
    }
    Ok(())
  }
}

impl FromStr for Program {
  type Err = AssemblyError;

  fn from_str(text: &str) -> Result<Program, AssemblyError> {
    parse_assembly(text)
  }
}
