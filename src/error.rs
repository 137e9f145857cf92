//! Error types. Nothing here can be raised by a cycle once a program is installed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::address::Address;
use crate::bytecode::Word;

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("can't load {}: {source}", .path.display())]
  Open {
    path: PathBuf,
    source: io::Error
  },
  #[error("failed to read program: {0}")]
  Read(#[from] io::Error),
  #[error("program has {lines} lines but memory holds only {capacity} slots")]
  TooLarge {
    lines: usize,
    capacity: usize
  },
  #[error("{address} used at slot {slot} is outside the machine")]
  AddressOutOfRange {
    slot: usize,
    address: Address
  },
  #[error("undefined instruction {word:#010x} at slot {slot}")]
  InvalidInstruction {
    slot: usize,
    word: Word
  },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
  #[error("no program is loaded")]
  NotLoaded,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
  #[error("port {port} is outside the bank of {count} ports")]
  OutOfRange {
    port: usize,
    count: usize
  },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
  #[error("{which} holds {size} entries, fewer than the {required} a 14 bit address reaches")]
  TooSmall {
    which: &'static str,
    size: usize,
    required: usize
  },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
  #[error("error on line {line}: cannot parse `{text}`")]
  Syntax {
    line: usize,
    text: String
  },
  #[error("error on line {line}: {name} is not an operation")]
  NotAnOperation {
    line: usize,
    name: String
  },
  #[error("error on line {line}: {operation} requires {expected} arguments but was given {found}")]
  WrongArity {
    line: usize,
    operation: String,
    expected: usize,
    found: usize
  },
  #[error("error on line {line}: bad argument `{argument}`")]
  BadArgument {
    line: usize,
    argument: String
  },
}
