//! Register bank shared by host functions and guest code.
//!
//! A bank is a fixed number of independently sized byte buffers addressed by
//! index. Registers are the only bulk-data channel across the host/guest
//! boundary: both sides pass an index, never a pointer into the other side's
//! memory.

use crate::error::BridgeError;

/// Fixed-size bank of byte registers.
///
/// All registers exist from construction and start empty. Setting one
/// register never touches the buffer of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    registers: Vec<Vec<u8>>,
}

impl RegisterBank {
    /// Create a bank of `count` empty registers.
    pub fn new(count: u32) -> Self {
        Self {
            registers: vec![Vec::new(); count as usize],
        }
    }

    /// Number of registers in the bank.
    pub fn count(&self) -> u32 {
        self.registers.len() as u32
    }

    /// Current contents of register `index`.
    pub fn get(&self, index: u32) -> Result<&[u8], BridgeError> {
        self.registers
            .get(index as usize)
            .map(Vec::as_slice)
            .ok_or_else(|| self.out_of_range(index))
    }

    /// Replace the contents of register `index` with `bytes`.
    ///
    /// The index is checked before anything is written, so a failed call
    /// leaves every register unchanged.
    pub fn set(&mut self, index: u32, bytes: &[u8]) -> Result<(), BridgeError> {
        let count = self.count();
        let reg = self
            .registers
            .get_mut(index as usize)
            .ok_or(BridgeError::OutOfRange { index, count })?;
        reg.clear();
        reg.extend_from_slice(bytes);
        Ok(())
    }

    /// Length of register `index` in bytes.
    pub fn len(&self, index: u32) -> Result<usize, BridgeError> {
        self.get(index).map(<[u8]>::len)
    }

    /// Empty register `index`, keeping its allocation.
    pub fn clear(&mut self, index: u32) -> Result<(), BridgeError> {
        self.set(index, &[])
    }

    fn out_of_range(&self, index: u32) -> BridgeError {
        BridgeError::OutOfRange {
            index,
            count: self.count(),
        }
    }
}
