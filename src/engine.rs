/*!
  The execution engine. A program is lowered once, when it is loaded, into a flat list of
  operations with resolved indices (`Cycle`). Running a cycle executes that list exactly
  once, in program order, against a `MachineState`.

  Memory is not double-buffered. An operation that reads a slot written earlier in the same
  cycle sees the new value; one that reads a slot written later in the cycle sees the value
  left by the previous cycle (or the load-time constant on the first cycle). The status
  flag likewise carries over between cycles until a `Cmpz` overwrites it.
*/

use std::fmt::{Display, Formatter};

#[cfg(feature = "trace_computation")]
use tracing::trace;

use crate::address::Address;
use crate::bytecode::{CompareMode, DualOperation, Instruction, SingleOperation};
use crate::error::LoadError;
use crate::ports::Ports;
use crate::program::Program;

/// Everything a cycle reads or writes. Each VM owns its own, so instances never alias.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineState {
  pub(crate) memory: Box<[f64]>,
  pub(crate) input: Ports,
  pub(crate) output: Ports,
  pub(crate) status: bool,
}

impl MachineState {
  /// Zeroed memory and ports; the status flag starts false.
  pub fn new(memory_slots: usize, port_count: usize) -> MachineState {
    MachineState {
      memory: vec![0.0; memory_slots].into_boxed_slice(),
      input: Ports::new(port_count),
      output: Ports::new(port_count),
      status: false,
    }
  }

  pub fn memory(&self) -> &[f64] {
    &self.memory
  }

  pub fn input(&self) -> &Ports {
    &self.input
  }

  pub fn output(&self) -> &Ports {
    &self.output
  }

  pub fn status(&self) -> bool {
    self.status
  }

  /// Writes every line's constant into its slot.
  pub fn install_constants(&mut self, program: &Program) {
    for line in program.lines() {
      self.memory[line.slot] = line.constant;
    }
  }

  pub fn reset(&mut self) {
    for value in self.memory.iter_mut() {
      *value = 0.0;
    }
    self.input.clear();
    self.output.clear();
    self.status = false;
  }
}

/// A resolved operation. `Noop` and undefined instructions have no counterpart.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Op {
  Add    { slot: usize, a: usize, b: usize },
  Sub    { slot: usize, a: usize, b: usize },
  Mult   { slot: usize, a: usize, b: usize },
  Div    { slot: usize, a: usize, b: usize },
  Output { port: usize, source: usize },
  Phi    { slot: usize, a: usize, b: usize },
  Cmpz   { mode: CompareMode, source: usize },
  Sqrt   { slot: usize, source: usize },
  Copy   { slot: usize, source: usize },
  Input  { slot: usize, port: usize },
}

impl Display for Op {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Op::Add  { slot, a, b } => write!(f, "M[{}] = M[{}] + M[{}]", slot, a, b),
      Op::Sub  { slot, a, b } => write!(f, "M[{}] = M[{}] - M[{}]", slot, a, b),
      Op::Mult { slot, a, b } => write!(f, "M[{}] = M[{}] * M[{}]", slot, a, b),
      Op::Div  { slot, a, b } => write!(f, "M[{}] = M[{}] / M[{}]", slot, a, b),
      Op::Output { port, source } => write!(f, "P[{}] = M[{}]", port, source),
      Op::Phi  { slot, a, b } => write!(f, "M[{}] = status ? M[{}] : M[{}]", slot, a, b),
      Op::Cmpz { mode, source } => write!(f, "status = {}(M[{}])", mode, source),
      Op::Sqrt { slot, source } => write!(f, "M[{}] = sqrt(M[{}])", slot, source),
      Op::Copy { slot, source } => write!(f, "M[{}] = M[{}]", slot, source),
      Op::Input { slot, port } => write!(f, "M[{}] = P[{}]", slot, port),
    }
  }
}

/// A program lowered for execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cycle {
  ops: Vec<Op>
}

impl Cycle {
  /**
    Lowers `program` to run against `state`. Every index is checked against the sizes of
    `state` here, so running the result on that state can not go out of bounds.
  */
  pub fn compile(program: &Program, state: &MachineState) -> Result<Cycle, LoadError> {
    let memory_slots = state.memory.len();
    let port_count = state.input.len().min(state.output.len());
    let mut ops = Vec::with_capacity(program.len());

    for line in program.lines() {
      let slot = line.slot;
      let check = |address: Address| -> Result<usize, LoadError> {
        let limit = match address {
          Address::Memory(_) => memory_slots,
          Address::Port(_) => port_count
        };
        match address.idx() < limit {
          true  => Ok(address.idx()),
          false => Err(LoadError::AddressOutOfRange { slot, address })
        }
      };
      check(Address::Memory(slot))?;

      let op = match line.instruction {

        Instruction::Dual { operation, operand_a, operand_b } => {
          let (a, b) = (check(operand_a)?, check(operand_b)?);
          match operation {
            DualOperation::Add    => Op::Add  { slot, a, b },
            DualOperation::Sub    => Op::Sub  { slot, a, b },
            DualOperation::Mult   => Op::Mult { slot, a, b },
            DualOperation::Div    => Op::Div  { slot, a, b },
            DualOperation::Output => Op::Output { port: a, source: b },
            DualOperation::Phi    => Op::Phi  { slot, a, b },
          }
        }

        Instruction::Single { operation, source, .. } => {
          let source = check(source)?;
          match operation {
            SingleOperation::Noop => continue,
            SingleOperation::Cmpz => match line.instruction.compare_mode() {
              Some(mode) => Op::Cmpz { mode, source },
              None => continue
            },
            SingleOperation::Sqrt  => Op::Sqrt { slot, source },
            SingleOperation::Copy  => Op::Copy { slot, source },
            SingleOperation::Input => Op::Input { slot, port: source },
          }
        }

        Instruction::Invalid(_) => continue,
      };
      ops.push(op);
    }

    Ok(Cycle { ops })
  }

  /// Number of operations executed per cycle.
  pub fn len(&self) -> usize {
    self.ops.len()
  }

  /// Executes every operation once, in program order.
  pub fn run(&self, state: &mut MachineState) {
    let MachineState { memory, input, output, status } = state;
    let input = input.as_slice();
    let output = output.as_mut_slice();

    for op in self.ops.iter() {
      match *op {
        Op::Add  { slot, a, b } => memory[slot] = memory[a] + memory[b],
        Op::Sub  { slot, a, b } => memory[slot] = memory[a] - memory[b],
        Op::Mult { slot, a, b } => memory[slot] = memory[a] * memory[b],
        Op::Div  { slot, a, b } => {
          // Division by zero leaves the slot as it was.
          let divisor = memory[b];
          if divisor != 0.0 {
            memory[slot] = memory[a] / divisor;
          }
        }
        Op::Output { port, source } => output[port] = memory[source],
        Op::Phi  { slot, a, b } => memory[slot] = if *status { memory[a] } else { memory[b] },
        Op::Cmpz { mode, source } => *status = mode.holds(memory[source]),
        Op::Sqrt { slot, source } => memory[slot] = memory[source].sqrt(),
        Op::Copy { slot, source } => memory[slot] = memory[source],
        Op::Input { slot, port } => memory[slot] = input[port],
      }

      #[cfg(feature = "trace_computation")]
      trace!(status = *status, "{}", op);
    }
  }
}
