use std::fmt;

use romstep_core::{Memory, Reg8};

pub const STACK_PAGE: usize = 0x0100;

/// The hardware stack: page 1, growing downward, `SP` pointing at the next free slot.
/// The pointer wraps within the page in both directions.
pub struct Stack<'a> {
    sp: &'a mut Reg8,
    memory: &'a mut Memory,
}

impl<'a> fmt::Debug for Stack<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("6502 Stack").field("sp", &self.sp).finish()
    }
}

impl<'a> Stack<'a> {
    pub fn new(sp: &'a mut Reg8, memory: &'a mut Memory) -> Self {
        Self { sp, memory }
    }

    fn top(&self) -> usize {
        STACK_PAGE | self.sp.read_as::<usize>()
    }

    pub fn push(&mut self, value: u8) {
        let address = self.top();
        self.memory.write_u8(address, value);
        self.sp.decrement();
    }

    pub fn pop(&mut self) -> u8 {
        self.sp.increment();
        self.memory.read_u8(self.top())
    }

    /// High byte first, so the word sits little-endian in memory.
    pub fn push_u16(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(hi);
        self.push(lo);
    }

    pub fn pop_u16(&mut self) -> u16 {
        let lo = self.pop();
        let hi = self.pop();
        u16::from_le_bytes([lo, hi])
    }
}
