use std::error::Error;
use std::fs::{read_to_string, File};
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orbit_vm::config::DEFAULT_MEMORY_SLOTS;
use orbit_vm::{parse_assembly, Program, Vm, VmConfig};

/// Input port the reference binaries read their scenario number from.
const CONFIG_PORT: usize = 0x3E80;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load a program and run it for a number of cycles
  Run {
    program: PathBuf,
    #[arg(long, default_value_t = 1)]
    cycles: u64,
    /// Scenario number written to the configuration port before the first cycle
    #[arg(long)]
    scenario: Option<u32>,
    #[arg(long, default_value_t = CONFIG_PORT)]
    config_port: usize,
    /// Input port assignment, PORT=VALUE. May be repeated.
    #[arg(long = "input", value_parser = parse_assignment)]
    inputs: Vec<(usize, f64)>,
    /// Refuse programs containing undefined instructions
    #[arg(long)]
    strict: bool,
    #[arg(long, default_value_t = DEFAULT_MEMORY_SLOTS)]
    memory_slots: usize,
    /// Print the whole machine state instead of the output port report
    #[arg(long)]
    status: bool,
  },
  /// Print a program in assembly form
  Disasm {
    program: PathBuf,
  },
  /// Assemble a text program into the binary format
  Asm {
    source: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
  },
}

fn parse_assignment(text: &str) -> Result<(usize, f64), String> {
  let (port, value) = text
    .split_once('=')
    .ok_or_else(|| format!("expected PORT=VALUE, got `{}`", text))?;
  let port = port.trim().parse::<usize>().map_err(|e| e.to_string())?;
  let value = value.trim().parse::<f64>().map_err(|e| e.to_string())?;
  Ok((port, value))
}

fn setup_tracing() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with(fmt::layer().with_target(false))
    .init();
}

fn main() -> Result<(), Box<dyn Error>> {
  setup_tracing();

  match Cli::parse().command {

    Command::Run { program, cycles, scenario, config_port, inputs, strict, memory_slots, status } => {
      let config = VmConfig::default().strict(strict).memory_slots(memory_slots);
      let mut vm = Vm::with_config(config)?;
      vm.load_file(&program)?;

      if let Some(scenario) = scenario {
        vm.write_input(config_port, f64::from(scenario))?;
      }
      for (port, value) in inputs {
        vm.write_input(port, value)?;
      }

      vm.run(cycles)?;
      info!(cycles = vm.cycles(), "run finished");

      match status {
        true  => println!("{}", vm),
        false => { vm.report().printstd(); }
      }
    }

    Command::Disasm { program } => {
      let program = Program::open(&program)?;
      for line in program.lines() {
        println!("{:>5}: {} = {:?}", line.slot, line.instruction, line.constant);
      }
    }

    Command::Asm { source, output } => {
      let program = parse_assembly(&read_to_string(&source)?)?;
      program.write_to(BufWriter::new(File::create(&output)?))?;
      info!(lines = program.len(), output = %output.display(), "assembled");
    }

  }

  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_port_assignments() {
    assert_eq!(parse_assignment("16000=1001"), Ok((16000, 1001.0)));
    assert_eq!(parse_assignment(" 2 = -0.5 "), Ok((2, -0.5)));
    assert!(parse_assignment("2").is_err());
    assert!(parse_assignment("x=1").is_err());
  }
}
