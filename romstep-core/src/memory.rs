use std::fmt;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum MemoryError {
    #[error("cannot load {length} bytes at 0x{base:04X}: address space is only 0x{size:X} bytes")]
    OutOfBounds {
        base: usize,
        length: usize,
        size: usize,
    },
}

/// Flat, byte-addressable address space.
///
/// Every runtime access wraps modulo the memory size, the same way a 16-bit address bus
/// rolls over from 0xFFFF to 0x0000. Only [`Memory::load`] is bounds-checked.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    buffer: Box<[u8]>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory[0x{:X} bytes]", self.buffer.len())
    }
}

impl Memory {
    pub fn new(size: usize) -> Self {
        if size == 0 {
            panic!("Memory must hold at least one byte");
        }

        Self {
            buffer: vec![0; size].into_boxed_slice(),
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    fn wrap(&self, address: usize) -> usize {
        address % self.buffer.len()
    }

    pub fn read_u8(&self, address: usize) -> u8 {
        self.buffer[self.wrap(address)]
    }

    pub fn write_u8(&mut self, address: usize, value: u8) {
        let address = self.wrap(address);
        self.buffer[address] = value;
    }

    pub fn read_u16_le(&self, address: usize) -> u16 {
        let lo = self.read_u8(address);
        let hi = self.read_u8(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub fn write_u16_le(&mut self, address: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_u8(address, lo);
        self.write_u8(address.wrapping_add(1), hi);
    }

    pub fn read(&self, address: usize, length: usize) -> Vec<u8> {
        (0..length)
            .map(|offset| self.read_u8(address.wrapping_add(offset)))
            .collect()
    }

    /// Copies `data` into memory starting at `base`.
    ///
    /// Fails without touching memory if the image would run past the end of the address
    /// space.
    pub fn load(&mut self, data: &[u8], base: usize) -> Result<(), MemoryError> {
        let size = self.buffer.len();
        let end = base
            .checked_add(data.len())
            .filter(|end| *end <= size)
            .ok_or(MemoryError::OutOfBounds {
                base,
                length: data.len(),
                size,
            })?;
        self.buffer[base..end].copy_from_slice(data);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}
