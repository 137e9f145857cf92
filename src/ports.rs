//! A bank of numbered `f64` channels through which the host and the VM exchange values.
//! Port numbers carry no meaning here; what a port represents is up to the host.

use crate::error::PortError;

#[derive(Clone, Debug, PartialEq)]
pub struct Ports {
  values: Box<[f64]>
}

impl Ports {
  /// A bank of `count` ports, all reading 0.0.
  pub fn new(count: usize) -> Ports {
    Ports {
      values: vec![0.0; count].into_boxed_slice()
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn read(&self, port: usize) -> Result<f64, PortError> {
    self.values
        .get(port)
        .copied()
        .ok_or(PortError::OutOfRange { port, count: self.values.len() })
  }

  pub fn write(&mut self, port: usize, value: f64) -> Result<(), PortError> {
    let count = self.values.len();
    match self.values.get_mut(port) {
      Some(cell) => {
        *cell = value;
        Ok(())
      }
      None => Err(PortError::OutOfRange { port, count })
    }
  }

  /// Ports holding anything other than 0.0, in port order.
  pub fn active(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
    self.values
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != 0.0)
        .map(|(port, value)| (port, *value))
  }

  pub fn clear(&mut self) {
    for value in self.values.iter_mut() {
      *value = 0.0;
    }
  }

  pub(crate) fn as_slice(&self) -> &[f64] {
    &self.values
  }

  pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
    &mut self.values
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unwritten_ports_read_zero() {
    let ports = Ports::new(8);
    assert_eq!(ports.read(7), Ok(0.0));
    assert_eq!(ports.active().count(), 0);
  }

  #[test]
  fn writes_are_bounds_checked() {
    let mut ports = Ports::new(4);
    assert_eq!(ports.write(3, 1.5), Ok(()));
    assert_eq!(ports.read(3), Ok(1.5));
    assert_eq!(ports.write(4, 1.0), Err(PortError::OutOfRange { port: 4, count: 4 }));
    assert_eq!(ports.read(100), Err(PortError::OutOfRange { port: 100, count: 4 }));
  }

  #[test]
  fn active_lists_nonzero_ports() {
    let mut ports = Ports::new(16);
    ports.write(2, -1.0).unwrap();
    ports.write(9, 4.0).unwrap();
    assert_eq!(ports.active().collect::<Vec<_>>(), vec![(2, -1.0), (9, 4.0)]);
    ports.clear();
    assert_eq!(ports.active().count(), 0);
  }
}
