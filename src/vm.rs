//! Structures and functions for the orbit VM: a program, the machine state it runs against,
//! and the lifecycle tying the two together.

use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;

use prettytable::{format as TableFormat, Table};
use strum_macros::Display as StrumDisplay;
use tracing::{debug, warn};

use crate::bytecode::encode_instruction;
use crate::config::VmConfig;
use crate::engine::{Cycle, MachineState};
use crate::error::{ConfigError, LoadError, PortError, RunError};
use crate::program::Program;

#[derive(StrumDisplay, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Lifecycle {
  /// Memory and ports zeroed, no program.
  Created,
  /// Program and its constants installed, no cycle run yet.
  Loaded,
  /// At least one cycle has run.
  Ready,
}

pub struct Vm {
  config  : VmConfig,
  state   : MachineState,
  program : Program,
  cycle   : Option<Cycle>, // The loaded program lowered for execution
  cycles  : u64,           // Completed cycles since load
}

impl Vm {

  // region Display methods

  fn make_register_table<I> (name: char, entries: I) -> Table
    where I: IntoIterator<Item = (usize, f64)>
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, value) in entries {
      table.add_row(
        row![r->format!("{}[{}] =", name, i), format!("{}", value)]
      );
    }
    table
  }

  /// A table of every output port that does not hold 0.0.
  pub fn report(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Port", ubl->"Value"]);

    for (port, value) in self.state.output().active() {
      table.add_row(row![r->port, value]);
    }
    table
  }

  // endregion

  // region Lifecycle

  /// A VM with the reference sizes.
  pub fn new() -> Vm {
    Vm::build(VmConfig::default())
  }

  pub fn with_config(config: VmConfig) -> Result<Vm, ConfigError> {
    config.validate()?;
    Ok(Vm::build(config))
  }

  fn build(config: VmConfig) -> Vm {
    Vm {
      config,
      state   : MachineState::new(config.memory_slots, config.port_count),
      program : Program::new(),
      cycle   : None,
      cycles  : 0,
    }
  }

  pub fn config(&self) -> &VmConfig {
    &self.config
  }

  pub fn lifecycle(&self) -> Lifecycle {
    match (&self.cycle, self.cycles) {
      (None, _)    => Lifecycle::Created,
      (Some(_), 0) => Lifecycle::Loaded,
      (Some(_), _) => Lifecycle::Ready,
    }
  }

  /// Reads a program in the binary record format from `source` and installs it.
  pub fn load<R: Read>(&mut self, source: R) -> Result<(), LoadError> {
    let program = Program::read_from(source)?;
    self.load_program(program)
  }

  pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
    let program = Program::open(path)?;
    self.load_program(program)
  }

  /**
    Installs `program`: its constants are written into memory and it becomes the cycle
    function. On error the VM is left exactly as it was. Loading into a VM that already has a
    program starts over from a zeroed machine.
  */
  pub fn load_program(&mut self, program: Program) -> Result<(), LoadError> {
    if program.len() > self.config.memory_slots {
      return Err(LoadError::TooLarge {
        lines: program.len(),
        capacity: self.config.memory_slots
      });
    }

    for line in program.invalid_lines() {
      let word = encode_instruction(&line.instruction);
      match self.config.strict {
        true  => return Err(LoadError::InvalidInstruction { slot: line.slot, word }),
        false => warn!(slot = line.slot, "undefined instruction {:#010x} runs as a no-op", word)
      }
    }

    let cycle = Cycle::compile(&program, &self.state)?;

    if self.cycle.is_some() {
      debug!("replacing loaded program");
      self.state.reset();
    }
    self.state.install_constants(&program);
    debug!(lines = program.len(), operations = cycle.len(), "program loaded");

    self.program = program;
    self.cycle   = Some(cycle);
    self.cycles  = 0;
    Ok(())
  }

  // endregion

  // region Execution

  /// Advances the machine by exactly one cycle.
  pub fn run_cycle(&mut self) -> Result<(), RunError> {
    let cycle = self.cycle.as_ref().ok_or(RunError::NotLoaded)?;
    cycle.run(&mut self.state);
    self.cycles += 1;
    Ok(())
  }

  /// Runs `count` cycles back to back, without host intervention in between.
  pub fn run(&mut self, count: u64) -> Result<(), RunError> {
    for _ in 0..count {
      self.run_cycle()?;
    }
    Ok(())
  }

  // endregion

  // region Host access

  pub fn write_input(&mut self, port: usize, value: f64) -> Result<(), PortError> {
    self.state.input.write(port, value)
  }

  pub fn read_input(&self, port: usize) -> Result<f64, PortError> {
    self.state.input().read(port)
  }

  pub fn read_output(&self, port: usize) -> Result<f64, PortError> {
    self.state.output().read(port)
  }

  pub fn memory(&self) -> &[f64] {
    self.state.memory()
  }

  pub fn status(&self) -> bool {
    self.state.status()
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  // endregion

}

impl Default for Vm {
  fn default() -> Vm {
    Vm::new()
  }
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Vm {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let used_memory = &self.state.memory()[..self.program.len()];
    let m_table = Vm::make_register_table(
      'M',
      used_memory.iter().copied().enumerate().filter(|(_, value)| *value != 0.0)
    );
    let o_table = Vm::make_register_table('O', self.state.output().active());

    let mut combined_table = table!([m_table, o_table]);

    combined_table.set_titles(row![ub->"Memory", ub->"Output Ports"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(
      f,
      "State: {}\tCycles: {}\tStatus: {}\n{}",
      self.lifecycle(), self.cycles, self.state.status(), combined_table
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::address::Address;
  use crate::bytecode::{DualOperation, Instruction, SingleOperation};

  fn doubler() -> Program {
    "Copy(1)\nAdd(0, 0) = 4.0\nOutput(7, 1)".parse().unwrap()
  }

  #[test]
  fn lifecycle_moves_forward() {
    let mut vm = Vm::new();
    assert_eq!(vm.lifecycle(), Lifecycle::Created);
    assert_eq!(vm.run_cycle(), Err(RunError::NotLoaded));

    vm.load_program(doubler()).unwrap();
    assert_eq!(vm.lifecycle(), Lifecycle::Loaded);
    assert_eq!(vm.memory()[1], 4.0);

    vm.run(3).unwrap();
    assert_eq!(vm.lifecycle(), Lifecycle::Ready);
    assert_eq!(vm.cycles(), 3);
    assert_eq!(vm.read_output(7), Ok(32.0));
  }

  #[test]
  fn reload_starts_from_a_fresh_machine() {
    let mut vm = Vm::new();
    vm.load_program(doubler()).unwrap();
    vm.write_input(3, 1.0).unwrap();
    vm.run(2).unwrap();

    let mut other = Program::new();
    other.push(Instruction::single(SingleOperation::Input, 3), 0.0);
    vm.load_program(other).unwrap();
    assert_eq!(vm.lifecycle(), Lifecycle::Loaded);
    assert_eq!(vm.read_input(3), Ok(0.0));
    assert_eq!(vm.read_output(7), Ok(0.0));
    assert_eq!(vm.memory()[1], 0.0);
  }

  #[test]
  fn inputs_written_before_the_first_load_survive_it() {
    let mut vm = Vm::new();
    vm.write_input(16000, 1001.0).unwrap();
    let mut program = Program::new();
    program.push(Instruction::single(SingleOperation::Input, 16000), 0.0);
    vm.load_program(program).unwrap();
    vm.run_cycle().unwrap();
    assert_eq!(vm.memory()[0], 1001.0);
  }

  #[test]
  fn failed_load_leaves_vm_untouched() {
    let mut vm = Vm::with_config(VmConfig::default().strict(true)).unwrap();
    let mut program = Program::new();
    program.push(Instruction::noop(), 1.0);
    program.push(Instruction::Invalid(0xE000_0000), 2.0);

    match vm.load_program(program) {
      Err(LoadError::InvalidInstruction { slot, word }) => {
        assert_eq!(slot, 1);
        assert_eq!(word, 0xE000_0000);
      }
      other => panic!("unexpected {:?}", other)
    }
    assert_eq!(vm.lifecycle(), Lifecycle::Created);
    assert_eq!(vm.memory()[0], 0.0);
  }

  #[test]
  fn lenient_load_runs_invalid_words_as_noops() {
    let mut vm = Vm::new();
    let mut program = Program::new();
    program.push(Instruction::Invalid(0xE000_0000), 2.0);
    vm.load_program(program).unwrap();
    vm.run_cycle().unwrap();
    assert_eq!(vm.memory()[0], 2.0);
  }

  #[test]
  fn strict_load_rejects_cmpz_without_a_comparison() {
    let bad_mode = Instruction::Single {
      operation: SingleOperation::Cmpz,
      compare_mode: 5,
      unused: 0,
      immediate: 0,
      source: Address::Memory(0)
    };
    let mut program = Program::new();
    program.push(bad_mode, 0.0);

    let mut strict = Vm::with_config(VmConfig::default().strict(true)).unwrap();
    match strict.load_program(program.clone()) {
      Err(LoadError::InvalidInstruction { slot, word }) => {
        assert_eq!(slot, 0);
        assert_eq!(word, (1 << 24) | (5 << 21));
      }
      other => panic!("unexpected {:?}", other)
    }

    let mut lenient = Vm::new();
    lenient.load_program(program).unwrap();
    lenient.run_cycle().unwrap();
    assert!(!lenient.status());
  }

  #[test]
  fn rejects_programs_longer_than_memory() {
    let config = VmConfig::default().memory_slots(16384);
    let mut vm = Vm::with_config(config).unwrap();
    let mut program = Program::new();
    for _ in 0..16385 {
      program.push(Instruction::noop(), 0.0);
    }
    assert!(matches!(
      vm.load_program(program),
      Err(LoadError::TooLarge { lines: 16385, capacity: 16384 })
    ));
  }

  #[test]
  fn port_access_is_bounds_checked() {
    let mut vm = Vm::new();
    assert!(vm.write_input(32768, 1.0).is_err());
    assert!(vm.read_output(40000).is_err());
  }

  #[test]
  fn report_lists_nonzero_outputs() {
    let mut vm = Vm::new();
    let mut program = Program::new();
    program.push(Instruction::noop(), 12.5);
    program.push(Instruction::dual(DualOperation::Output, 4, 0), 0.0);
    vm.load_program(program).unwrap();
    vm.run_cycle().unwrap();

    let report = vm.report();
    assert_eq!(report.len(), 1);
    let rendered = report.to_string();
    assert!(rendered.contains("12.5"));

    let status = vm.to_string();
    assert!(status.starts_with("State: Ready\tCycles: 1\tStatus: false"));
    assert!(status.contains("M[0] ="));
    assert!(status.contains("O[4] ="));
  }
}
