//! In-memory EEPROM adapter.
//!
//! Implements [`StoragePort`] over a byte vector, erased to `0xFF` like a
//! fresh part. Writes are update-style: only bytes that differ are
//! programmed, and programmed bytes are counted so simulations can reason
//! about cell wear.

use crate::app::ports::{StorageError, StoragePort};

pub struct MemEeprom {
    cells: Vec<u8>,
    bytes_programmed: usize,
}

impl MemEeprom {
    /// Blank store of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0xFF; capacity],
            bytes_programmed: 0,
        }
    }

    /// Store pre-loaded with `image`, e.g. a dump from a running unit.
    pub fn from_image(image: &[u8]) -> Self {
        Self {
            cells: image.to_vec(),
            bytes_programmed: 0,
        }
    }

    /// Bytes actually changed since construction.
    pub fn bytes_programmed(&self) -> usize {
        self.bytes_programmed
    }

    pub fn image(&self) -> &[u8] {
        &self.cells
    }

    /// Corrupt one byte in place.
    pub fn flip(&mut self, addr: usize, mask: u8) -> Result<(), StorageError> {
        let cell = self.cells.get_mut(addr).ok_or(StorageError::OutOfBounds)?;
        *cell ^= mask;
        Ok(())
    }

    fn range(&self, addr: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let end = addr.checked_add(len).ok_or(StorageError::OutOfBounds)?;
        if end > self.cells.len() {
            return Err(StorageError::OutOfBounds);
        }
        Ok(addr..end)
    }
}

impl StoragePort for MemEeprom {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let range = self.range(addr, data.len())?;
        for (cell, &b) in self.cells[range].iter_mut().zip(data) {
            if *cell != b {
                *cell = b;
                self.bytes_programmed += 1;
            }
        }
        Ok(())
    }
}
