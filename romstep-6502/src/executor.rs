use romstep_core::{Execution, Fault, Memory};

use crate::instructions::{Mnemonic, Mos6502Instruction, OpcodeDef, Operand};
use crate::registers::{Mos6502Registers, StatusFlags};
use crate::stack::Stack;

/// Where an instruction's operand lives once its addressing mode has been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Implied,
    Accumulator,
    Immediate(u8),
    Address { address: u16, page_crossed: bool },
}

impl Target {
    fn page_crossed(&self) -> bool {
        matches!(self, Target::Address { page_crossed: true, .. })
    }
}

fn crosses_page(from: u16, to: u16) -> bool {
    (from ^ to) & 0xFF00 != 0
}

/// Applies one decoded instruction to the register file and memory.
///
/// The program counter is first moved past the instruction; branches, jumps, calls and
/// returns then overwrite it. An illegal instruction changes nothing and is reported as a
/// fault at the current program counter.
pub fn execute(
    instruction: &Mos6502Instruction,
    registers: &mut Mos6502Registers,
    memory: &mut Memory,
    decimal_mode: bool,
) -> Execution {
    match instruction {
        Mos6502Instruction::Illegal(opcode) => Execution::Fault(Fault::IllegalOpcode {
            opcode: *opcode,
            address: registers.pc.read_as(),
        }),
        Mos6502Instruction::Op { def, operand, .. } => {
            let mut executor = Executor {
                regs: registers,
                memory,
                decimal_mode,
            };
            executor.run(def, *operand)
        }
    }
}

struct Executor<'a> {
    regs: &'a mut Mos6502Registers,
    memory: &'a mut Memory,
    decimal_mode: bool,
}

impl<'a> Executor<'a> {
    fn run(&mut self, def: &OpcodeDef, operand: Operand) -> Execution {
        let next_pc = self.regs.pc.read().wrapping_add(def.len_bytes() as u16);
        let target = self.resolve(operand, next_pc);
        let mut cycles = u32::from(def.cycles);
        if def.page_penalty && target.page_crossed() {
            cycles += 1;
        }
        self.regs.pc.write(next_pc);

        match def.mnemonic {
            // loads and stores
            Mnemonic::Lda => {
                let value = self.read(target);
                self.regs.a.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Ldx => {
                let value = self.read(target);
                self.regs.x.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Ldy => {
                let value = self.read(target);
                self.regs.y.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Sta => self.write(target, self.regs.a.read()),
            Mnemonic::Stx => self.write(target, self.regs.x.read()),
            Mnemonic::Sty => self.write(target, self.regs.y.read()),

            // transfers
            Mnemonic::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_zero_negative(self.regs.x.read());
            }
            Mnemonic::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_zero_negative(self.regs.y.read());
            }
            Mnemonic::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_zero_negative(self.regs.a.read());
            }
            Mnemonic::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_zero_negative(self.regs.a.read());
            }
            Mnemonic::Tsx => {
                self.regs.x = self.regs.sp;
                self.regs.p.update_zero_negative(self.regs.x.read());
            }
            Mnemonic::Txs => self.regs.sp = self.regs.x,

            // stack
            Mnemonic::Pha => {
                let value = self.regs.a.read();
                self.stack().push(value);
            }
            Mnemonic::Php => {
                let value = self.regs.p.to_stack_byte(true);
                self.stack().push(value);
            }
            Mnemonic::Pla => {
                let value = self.stack().pop();
                self.regs.a.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Plp => {
                let value = self.stack().pop();
                self.regs.p = StatusFlags::from_stack_byte(value);
            }

            // logic and arithmetic
            Mnemonic::And => {
                let value = self.regs.a.read() & self.read(target);
                self.regs.a.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Ora => {
                let value = self.regs.a.read() | self.read(target);
                self.regs.a.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Eor => {
                let value = self.regs.a.read() ^ self.read(target);
                self.regs.a.write(value);
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Bit => {
                let value = self.read(target);
                let p = &mut self.regs.p;
                p.set(StatusFlags::ZERO, self.regs.a.read() & value == 0);
                p.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
                p.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
            }
            Mnemonic::Adc => {
                let value = self.read(target);
                self.add_with_carry(value);
            }
            Mnemonic::Sbc => {
                let value = self.read(target);
                self.subtract_with_borrow(value);
            }
            Mnemonic::Cmp => {
                let value = self.read(target);
                self.compare(self.regs.a.read(), value);
            }
            Mnemonic::Cpx => {
                let value = self.read(target);
                self.compare(self.regs.x.read(), value);
            }
            Mnemonic::Cpy => {
                let value = self.read(target);
                self.compare(self.regs.y.read(), value);
            }

            // increments and decrements
            Mnemonic::Inc => {
                self.modify(target, |value, _| (value.wrapping_add(1), None));
            }
            Mnemonic::Dec => {
                self.modify(target, |value, _| (value.wrapping_sub(1), None));
            }
            Mnemonic::Inx => {
                let value = self.regs.x.increment();
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Iny => {
                let value = self.regs.y.increment();
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Dex => {
                let value = self.regs.x.decrement();
                self.regs.p.update_zero_negative(value);
            }
            Mnemonic::Dey => {
                let value = self.regs.y.decrement();
                self.regs.p.update_zero_negative(value);
            }

            // shifts and rotates
            Mnemonic::Asl => {
                self.modify(target, |value, _| (value << 1, Some(value & 0x80 != 0)));
            }
            Mnemonic::Lsr => {
                self.modify(target, |value, _| (value >> 1, Some(value & 0x01 != 0)));
            }
            Mnemonic::Rol => {
                self.modify(target, |value, carry| {
                    ((value << 1) | u8::from(carry), Some(value & 0x80 != 0))
                });
            }
            Mnemonic::Ror => {
                self.modify(target, |value, carry| {
                    ((value >> 1) | (u8::from(carry) << 7), Some(value & 0x01 != 0))
                });
            }

            // branches
            Mnemonic::Bcc => {
                cycles += self.branch(!self.regs.p.contains(StatusFlags::CARRY), target)
            }
            Mnemonic::Bcs => {
                cycles += self.branch(self.regs.p.contains(StatusFlags::CARRY), target)
            }
            Mnemonic::Bne => {
                cycles += self.branch(!self.regs.p.contains(StatusFlags::ZERO), target)
            }
            Mnemonic::Beq => {
                cycles += self.branch(self.regs.p.contains(StatusFlags::ZERO), target)
            }
            Mnemonic::Bpl => {
                cycles += self.branch(!self.regs.p.contains(StatusFlags::NEGATIVE), target)
            }
            Mnemonic::Bmi => {
                cycles += self.branch(self.regs.p.contains(StatusFlags::NEGATIVE), target)
            }
            Mnemonic::Bvc => {
                cycles += self.branch(!self.regs.p.contains(StatusFlags::OVERFLOW), target)
            }
            Mnemonic::Bvs => {
                cycles += self.branch(self.regs.p.contains(StatusFlags::OVERFLOW), target)
            }

            // jumps, calls and returns
            Mnemonic::Jmp => self.jump(target),
            Mnemonic::Jsr => {
                // the pushed return address is the last byte of the JSR itself
                self.stack().push_u16(next_pc.wrapping_sub(1));
                self.jump(target);
            }
            Mnemonic::Rts => {
                let address = self.stack().pop_u16();
                self.regs.pc.write(address.wrapping_add(1));
            }
            Mnemonic::Rti => {
                let flags = self.stack().pop();
                let address = self.stack().pop_u16();
                self.regs.p = StatusFlags::from_stack_byte(flags);
                self.regs.pc.write(address);
            }

            // flags
            Mnemonic::Clc => self.regs.p.remove(StatusFlags::CARRY),
            Mnemonic::Cld => self.regs.p.remove(StatusFlags::DECIMAL),
            Mnemonic::Cli => self.regs.p.remove(StatusFlags::INTERRUPT_DISABLE),
            Mnemonic::Clv => self.regs.p.remove(StatusFlags::OVERFLOW),
            Mnemonic::Sec => self.regs.p.insert(StatusFlags::CARRY),
            Mnemonic::Sed => self.regs.p.insert(StatusFlags::DECIMAL),
            Mnemonic::Sei => self.regs.p.insert(StatusFlags::INTERRUPT_DISABLE),

            Mnemonic::Nop => {}
            // No interrupt controller is attached, so BRK stops the machine instead of
            // vectoring through 0xFFFE.
            Mnemonic::Brk => return Execution::Halt { cycles },
        }

        Execution::Continue { cycles }
    }

    fn stack(&mut self) -> Stack<'_> {
        Stack::new(&mut self.regs.sp, self.memory)
    }

    fn zero_page_word(&self, pointer: u8) -> u16 {
        let lo = self.memory.read_u8(usize::from(pointer));
        let hi = self.memory.read_u8(usize::from(pointer.wrapping_add(1)));
        u16::from_le_bytes([lo, hi])
    }

    fn resolve(&self, operand: Operand, next_pc: u16) -> Target {
        let x = self.regs.x.read();
        let y = self.regs.y.read();
        let address = |address: u16| Target::Address {
            address,
            page_crossed: false,
        };
        let indexed = |base: u16, index: u8| {
            let address = base.wrapping_add(u16::from(index));
            Target::Address {
                address,
                page_crossed: crosses_page(base, address),
            }
        };

        match operand {
            Operand::Implied => Target::Implied,
            Operand::Accumulator => Target::Accumulator,
            Operand::Immediate(value) => Target::Immediate(value),
            Operand::ZeroPage(zp) => address(u16::from(zp)),
            Operand::ZeroPageX(zp) => address(u16::from(zp.wrapping_add(x))),
            Operand::ZeroPageY(zp) => address(u16::from(zp.wrapping_add(y))),
            Operand::Absolute(base) => address(base),
            Operand::AbsoluteX(base) => indexed(base, x),
            Operand::AbsoluteY(base) => indexed(base, y),
            Operand::Indirect(pointer) => {
                // NMOS bug: the high byte is fetched without carrying into the page
                let lo = self.memory.read_u8(usize::from(pointer));
                let hi_pointer = (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF);
                let hi = self.memory.read_u8(usize::from(hi_pointer));
                address(u16::from_le_bytes([lo, hi]))
            }
            Operand::IndirectX(zp) => address(self.zero_page_word(zp.wrapping_add(x))),
            Operand::IndirectY(zp) => indexed(self.zero_page_word(zp), y),
            Operand::Relative(offset) => {
                let destination = next_pc.wrapping_add(offset as i16 as u16);
                Target::Address {
                    address: destination,
                    page_crossed: crosses_page(next_pc, destination),
                }
            }
        }
    }

    fn read(&self, target: Target) -> u8 {
        match target {
            Target::Accumulator => self.regs.a.read(),
            Target::Immediate(value) => value,
            Target::Address { address, .. } => self.memory.read_u8(usize::from(address)),
            Target::Implied => unreachable!("implied operands have no value"),
        }
    }

    fn write(&mut self, target: Target, value: u8) {
        match target {
            Target::Accumulator => self.regs.a.write(value),
            Target::Address { address, .. } => self.memory.write_u8(usize::from(address), value),
            Target::Implied | Target::Immediate(_) => {
                unreachable!("cannot store to {:?}", target)
            }
        }
    }

    /// Read-modify-write. `f` receives the old value and the carry flag and returns the new
    /// value plus the new carry, if the operation defines one.
    fn modify<F>(&mut self, target: Target, f: F)
    where
        F: FnOnce(u8, bool) -> (u8, Option<bool>),
    {
        let old = self.read(target);
        let (new, carry) = f(old, self.regs.p.contains(StatusFlags::CARRY));
        self.write(target, new);
        if let Some(carry) = carry {
            self.regs.p.set(StatusFlags::CARRY, carry);
        }
        self.regs.p.update_zero_negative(new);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set(StatusFlags::CARRY, register >= value);
        self.regs.p.update_zero_negative(register.wrapping_sub(value));
    }

    fn decimal_active(&self) -> bool {
        self.decimal_mode && self.regs.p.contains(StatusFlags::DECIMAL)
    }

    fn add_binary(&mut self, value: u8) {
        let a = self.regs.a.read();
        let carry = self.regs.p.contains(StatusFlags::CARRY);
        let sum = u16::from(a) + u16::from(value) + u16::from(carry);
        let result = sum as u8;

        self.regs.p.set(StatusFlags::CARRY, sum > 0xFF);
        self.regs
            .p
            .set(StatusFlags::OVERFLOW, !(a ^ value) & (a ^ result) & 0x80 != 0);
        self.regs.a.write(result);
        self.regs.p.update_zero_negative(result);
    }

    fn add_with_carry(&mut self, value: u8) {
        if !self.decimal_active() {
            self.add_binary(value);
            return;
        }

        // NMOS decimal mode: Z comes from the binary sum, N and V from the sum before the
        // high nibble is adjusted.
        let a = self.regs.a.read();
        let carry = self.regs.p.contains(StatusFlags::CARRY);

        let mut lo = u16::from(a & 0x0F) + u16::from(value & 0x0F) + u16::from(carry);
        if lo >= 0x0A {
            lo = ((lo + 0x06) & 0x0F) + 0x10;
        }
        let mut sum = u16::from(a & 0xF0) + u16::from(value & 0xF0) + lo;
        let signed = i16::from((a & 0xF0) as i8) + i16::from((value & 0xF0) as i8) + lo as i16;
        let binary = a.wrapping_add(value).wrapping_add(u8::from(carry));
        if sum >= 0xA0 {
            sum += 0x60;
        }

        let p = &mut self.regs.p;
        p.set(StatusFlags::ZERO, binary == 0);
        p.set(StatusFlags::NEGATIVE, signed & 0x80 != 0);
        p.set(StatusFlags::OVERFLOW, !(-128..=127).contains(&signed));
        p.set(StatusFlags::CARRY, sum >= 0x100);
        self.regs.a.write(sum as u8);
    }

    fn subtract_with_borrow(&mut self, value: u8) {
        let a = self.regs.a.read();
        let carry = self.regs.p.contains(StatusFlags::CARRY);

        // flags are those of the binary subtraction in both modes
        self.add_binary(value ^ 0xFF);
        if !self.decimal_active() {
            return;
        }

        let mut lo = i16::from(a & 0x0F) - i16::from(value & 0x0F) + i16::from(carry) - 1;
        if lo < 0 {
            lo = ((lo - 0x06) & 0x0F) - 0x10;
        }
        let mut result = i16::from(a & 0xF0) - i16::from(value & 0xF0) + lo;
        if result < 0 {
            result -= 0x60;
        }
        self.regs.a.write(result as u8);
    }

    /// Takes the branch if `condition` holds and returns the extra cycles spent.
    fn branch(&mut self, condition: bool, target: Target) -> u32 {
        if !condition {
            return 0;
        }
        self.jump(target);
        1 + u32::from(target.page_crossed())
    }

    fn jump(&mut self, target: Target) {
        if let Target::Address { address, .. } = target {
            self.regs.pc.write(address);
        }
    }
}
