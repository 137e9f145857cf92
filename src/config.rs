//! Sizes and decoding policy of a VM instance.

use crate::address::ADDRESS_RANGE;
use crate::error::ConfigError;

/// Memory slots of the reference machine.
pub const DEFAULT_MEMORY_SLOTS: usize = 2 << 14;
/// Ports per bank (input and output each) of the reference machine.
pub const DEFAULT_PORT_COUNT: usize = 2 << 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmConfig {
  /// Capacity of the data memory. Also bounds the number of program lines.
  pub memory_slots: usize,
  /// Size of the input bank and, separately, of the output bank.
  pub port_count: usize,
  /// Reject programs containing undefined instructions instead of running them as no-ops.
  pub strict: bool,
}

impl Default for VmConfig {
  fn default() -> VmConfig {
    VmConfig {
      memory_slots: DEFAULT_MEMORY_SLOTS,
      port_count: DEFAULT_PORT_COUNT,
      strict: false,
    }
  }
}

impl VmConfig {
  pub fn strict(mut self, strict: bool) -> VmConfig {
    self.strict = strict;
    self
  }

  pub fn memory_slots(mut self, memory_slots: usize) -> VmConfig {
    self.memory_slots = memory_slots;
    self
  }

  pub fn port_count(mut self, port_count: usize) -> VmConfig {
    self.port_count = port_count;
    self
  }

  /**
    Checks that every address an instruction field can hold is in bounds. Once this holds,
    the only load-time bounds check left is the program length against `memory_slots`.
  */
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.memory_slots < ADDRESS_RANGE {
      return Err(ConfigError::TooSmall {
        which: "memory",
        size: self.memory_slots,
        required: ADDRESS_RANGE
      });
    }
    if self.port_count < ADDRESS_RANGE {
      return Err(ConfigError::TooSmall {
        which: "port bank",
        size: self.port_count,
        required: ADDRESS_RANGE
      });
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_matches_reference_sizes() {
    let config = VmConfig::default();
    assert_eq!(config.memory_slots, 32768);
    assert_eq!(config.port_count, 32768);
    assert!(!config.strict);
    assert_eq!(config.validate(), Ok(()));
  }

  #[test]
  fn rejects_banks_narrower_than_an_address_field() {
    let config = VmConfig::default().memory_slots(1000);
    assert_eq!(
      config.validate(),
      Err(ConfigError::TooSmall { which: "memory", size: 1000, required: 16384 })
    );
    assert!(VmConfig::default().port_count(16383).validate().is_err());
    assert!(VmConfig::default().port_count(16384).validate().is_ok());
  }
}
