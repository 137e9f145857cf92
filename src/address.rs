//! An `Either` type that holds the address of either a memory slot or a port, with some
//! convenience functions. Both are carried in the same 14 bit instruction fields; which one
//! a field means is decided by the operation that owns it.

use std::fmt::{Display, Formatter};

// `AddressNumberType` is `usize`, as it is naturally an index into a memory store.
pub type AddressNumberType = usize;

/// Width in bits of every address field of an instruction word.
pub const ADDRESS_BITS: u32 = 14;
pub const ADDRESS_MASK: u32 = (1 << ADDRESS_BITS) - 1;
/// Number of distinct values an address field can hold.
pub const ADDRESS_RANGE: usize = 1 << ADDRESS_BITS;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// An index into the data memory. Instruction results are written to memory slots.
  Memory(AddressNumberType),
  /// A host-facing channel number, either an input port or an output port.
  Port(AddressNumberType)
}

impl Address {
  /// Converts the address to an index into the corresponding vector.
  pub fn idx(&self) -> AddressNumberType {
    match self {
      | Address::Memory(i)
      | Address::Port(i) => *i
    }
  }

  /// Extracts a memory address from the 14 bits of `word` starting at `shift`.
  pub fn memory_field(word: u32, shift: u32) -> Address {
    Address::Memory(((word >> shift) & ADDRESS_MASK) as AddressNumberType)
  }

  /// Extracts a port address from the 14 bits of `word` starting at `shift`.
  pub fn port_field(word: u32, shift: u32) -> Address {
    Address::Port(((word >> shift) & ADDRESS_MASK) as AddressNumberType)
  }

  /// The address as a raw field value, ready to be shifted into an instruction word.
  /// Anything beyond 14 bits is dropped.
  pub fn field(&self) -> u32 {
    (self.idx() as u32) & ADDRESS_MASK
  }

  /// Whether the address fits in an instruction field.
  pub fn is_encodable(&self) -> bool {
    self.idx() < ADDRESS_RANGE
  }

  pub fn is_port(&self) -> bool {
    match self {
      Address::Port(_) => true,
      _ => false
    }
  }
}


impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Memory(i) => {
        write!(f, "M[{}]", i)
      },
      Address::Port(i) => {
        write!(f, "P[{}]", i)
      }
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields_are_masked_to_fourteen_bits() {
    let word = 0xFFFF_FFFF;
    assert_eq!(Address::memory_field(word, 0), Address::Memory(0x3FFF));
    assert_eq!(Address::port_field(word, 14), Address::Port(0x3FFF));
    assert_eq!(Address::Memory(ADDRESS_RANGE + 3).field(), 3);
  }

  #[test]
  fn displays_its_store() {
    assert_eq!(Address::Memory(12).to_string(), "M[12]");
    assert_eq!(Address::Port(16000).to_string(), "P[16000]");
    assert!(Address::Port(1).is_port());
    assert!(!Address::Memory(ADDRESS_RANGE).is_encodable());
  }
}
