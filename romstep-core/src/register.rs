use std::fmt;

use num_traits::{Unsigned, WrappingAdd, WrappingSub};

/// A fixed-width machine register.
///
/// The width is carried by `T`, so every write is already truncated to the register size
/// and the arithmetic helpers wrap the way the hardware does.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register<T>
where
    T: Unsigned + Copy,
{
    value: T,
}

impl<T: Unsigned + Copy + WrappingAdd + WrappingSub> Register<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn read(&self) -> T {
        self.value
    }

    pub fn write(&mut self, value: T) {
        self.value = value;
    }

    pub fn read_as<V: From<T>>(&self) -> V {
        V::from(self.value)
    }

    /// Adds `delta`, wrapping at the register width, and returns the new value.
    pub fn wrapping_add(&mut self, delta: T) -> T {
        self.value = self.value.wrapping_add(&delta);
        self.value
    }

    /// Subtracts `delta`, wrapping at the register width, and returns the new value.
    pub fn wrapping_sub(&mut self, delta: T) -> T {
        self.value = self.value.wrapping_sub(&delta);
        self.value
    }

    pub fn increment(&mut self) -> T {
        self.wrapping_add(T::one())
    }

    pub fn decrement(&mut self) -> T {
        self.wrapping_sub(T::one())
    }
}

pub type Reg8 = Register<u8>;
impl fmt::Debug for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("0x{:02X}", self.value))
    }
}
impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:02X}", self.value))
    }
}

pub type Reg16 = Register<u16>;
impl fmt::Debug for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("0x{:04X}", self.value))
    }
}
impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:04X}", self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg8() {
        let mut reg = Reg8::default();
        assert_eq!(reg.read(), 0);
        reg.write(1);
        assert_eq!(reg.read(), 1);
        reg.write(u8::MAX);
        assert_eq!(reg.read(), u8::MAX);
        let word: u16 = reg.read_as();
        assert_eq!(word, u8::MAX.into());
        let usize: usize = reg.read_as();
        assert_eq!(usize, u8::MAX.into());
        let signed_word: i16 = reg.read_as();
        assert_eq!(signed_word, u8::MAX.into());
    }

    #[test]
    fn test_reg8_wraps() {
        let mut reg = Reg8::new(0xFF);
        assert_eq!(reg.increment(), 0x00);
        assert_eq!(reg.decrement(), 0xFF);
        assert_eq!(reg.wrapping_add(0x02), 0x01);
        assert_eq!(reg.wrapping_sub(0x03), 0xFE);
    }

    #[test]
    fn test_reg16() {
        let mut reg = Reg16::default();
        assert_eq!(reg.read(), 0);
        reg.write(u16::MAX);
        assert_eq!(reg.read(), u16::MAX);
        let double_word: u32 = reg.read_as();
        assert_eq!(double_word, u16::MAX.into());
        assert_eq!(reg.increment(), 0x0000);
        assert_eq!(reg.wrapping_sub(0x0001), 0xFFFF);
    }

    #[test]
    fn formatting_is_padded_hex() {
        assert_eq!(format!("{:?}", Reg8::new(0x0A)), "0x0A");
        assert_eq!(format!("{}", Reg8::new(0x0A)), "0A");
        assert_eq!(format!("{:?}", Reg16::new(0xBEEF)), "0xBEEF");
        assert_eq!(format!("{}", Reg16::new(0x00EF)), "00EF");
    }
}
