use std::fmt;

use bitflags::bitflags;
use romstep_core::{Reg16, Reg8};

bitflags! {
    /// The processor status register `P`.
    ///
    /// Bits 4 (break) and 5 (unused) have no storage on the chip; they only exist in the
    /// byte pushed by `PHP` and `BRK`, see [`BREAK_BIT`] and [`UNUSED_BIT`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        const CARRY = 1 << 0;
        const ZERO = 1 << 1;
        const INTERRUPT_DISABLE = 1 << 2;
        const DECIMAL = 1 << 3;
        const OVERFLOW = 1 << 6;
        const NEGATIVE = 1 << 7;
    }
}

pub const BREAK_BIT: u8 = 1 << 4;
pub const UNUSED_BIT: u8 = 1 << 5;

impl Default for StatusFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl StatusFlags {
    /// Sets Z and N from a result byte.
    pub fn update_zero_negative(&mut self, value: u8) {
        self.set(StatusFlags::ZERO, value == 0);
        self.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }

    /// The byte written to the stack: the stored flags plus the unused bit, with the break
    /// bit only when pushed by software.
    pub fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | UNUSED_BIT;
        if brk {
            value |= BREAK_BIT;
        }
        value
    }

    /// Inverse of [`StatusFlags::to_stack_byte`]; the break and unused bits are dropped.
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate(value)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c.to_ascii_uppercase() } else { c };
        write!(
            f,
            "{}{}--{}{}{}{}",
            flag(self.contains(StatusFlags::NEGATIVE), 'n'),
            flag(self.contains(StatusFlags::OVERFLOW), 'v'),
            flag(self.contains(StatusFlags::DECIMAL), 'd'),
            flag(self.contains(StatusFlags::INTERRUPT_DISABLE), 'i'),
            flag(self.contains(StatusFlags::ZERO), 'z'),
            flag(self.contains(StatusFlags::CARRY), 'c'),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mos6502Registers {
    /// Accumulator.
    pub a: Reg8,
    pub x: Reg8,
    pub y: Reg8,
    /// Stack pointer, an offset into page 1.
    pub sp: Reg8,
    pub pc: Reg16,
    pub p: StatusFlags,
}

impl fmt::Display for Mos6502Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC:{} A:{} X:{} Y:{} SP:{} P:{}",
            self.pc, self.a, self.x, self.y, self.sp, self.p
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_never_hold_break_or_unused() {
        for value in 0..=u8::MAX {
            let flags = StatusFlags::from_stack_byte(value);
            assert_eq!(flags.bits() & (BREAK_BIT | UNUSED_BIT), 0);
            assert_eq!(flags.bits(), value & !(BREAK_BIT | UNUSED_BIT));
        }
    }

    #[test]
    fn stack_byte_sets_unused_and_optional_break() {
        let flags = StatusFlags::CARRY | StatusFlags::NEGATIVE;
        assert_eq!(flags.to_stack_byte(false), 0b1010_0001);
        assert_eq!(flags.to_stack_byte(true), 0b1011_0001);
        assert_eq!(
            StatusFlags::from_stack_byte(flags.to_stack_byte(true)),
            flags
        );
    }

    #[test]
    fn zero_negative() {
        let mut flags = StatusFlags::CARRY;
        flags.update_zero_negative(0);
        assert_eq!(flags, StatusFlags::CARRY | StatusFlags::ZERO);
        flags.update_zero_negative(0x80);
        assert_eq!(flags, StatusFlags::CARRY | StatusFlags::NEGATIVE);
        flags.update_zero_negative(0x7F);
        assert_eq!(flags, StatusFlags::CARRY);
    }

    #[test]
    fn display() {
        let regs = Mos6502Registers {
            a: Reg8::new(0x12),
            x: Reg8::new(0x34),
            y: Reg8::new(0x56),
            sp: Reg8::new(0xFD),
            pc: Reg16::new(0xC000),
            p: StatusFlags::INTERRUPT_DISABLE | StatusFlags::CARRY,
        };
        assert_eq!(regs.to_string(), "PC:C000 A:12 X:34 Y:56 SP:FD P:nv--dIzC");
        assert_eq!(
            Mos6502Registers::default().to_string(),
            "PC:0000 A:00 X:00 Y:00 SP:00 P:nv--dizc"
        );
    }
}
