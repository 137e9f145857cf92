/*!
  A virtual machine for orbit simulation binaries.

  A program is a fixed dataflow network over a memory of `f64` slots. The host loads it once,
  then advances the machine one cycle at a time, exchanging values with it through numbered
  input and output ports between cycles:

  ```no_run
  use orbit_vm::Vm;

  let mut vm = Vm::new();
  vm.load_file("bin1.obf").unwrap();
  vm.write_input(0x3E80, 1001.0).unwrap();
  vm.run_cycle().unwrap();
  println!("{}", vm.read_output(0).unwrap());
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod config;
mod engine;
pub mod error;
pub mod ports;
pub mod program;
pub mod vm;

pub use address::Address;
pub use bytecode::{decode_instruction, encode_instruction, parse_assembly, Instruction};
pub use config::VmConfig;
pub use error::{AssemblyError, ConfigError, LoadError, PortError, RunError};
pub use program::{Line, Program};
pub use vm::{Lifecycle, Vm};
