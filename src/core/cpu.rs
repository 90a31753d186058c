use log::*;

use crate::core::{
    opcodes::{AddressingMode, Op, Opcode, OPCODES},
    StatusRegister, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR,
};

/// The CPU's memory port.
///
/// The CPU itself owns no memory; every access goes through this trait. The
/// system [`Bus`][crate::core::Bus] implements it for real runs, and tests
/// implement it over flat RAM.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    /// Read a little-endian 16-bit value.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}

/// The CPU of the NES, a 6502 without decimal mode.
///
/// A cycle-pacing state machine: [`Cpu::tick`] advances exactly one CPU
/// cycle. An instruction executes in full on its first tick and the
/// remaining cycles are burned one tick at a time, so timing-sensitive bus
/// traffic (DMA, NMI delivery) interleaves at the right cycle boundaries.
pub struct Cpu {
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer, addressing page 1
    pub sp: u8,
    /// Program counter
    pub pc: u16,
    /// Processor status
    pub status: StatusRegister,
    // Cycles left before the next opcode fetch
    pending_cycles: u8,
    // Last fetched opcode
    opcode: u8,
    // Effective address of the current operation
    addr_abs: u16,
    // Branch displacement, sign-extended to 16 bits
    addr_rel: u16,
    // Operand byte handed to the ALU
    fetched: u8,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: StatusRegister::new(),
            pending_cycles: 0,
            opcode: 0,
            addr_abs: 0,
            addr_rel: 0,
            fetched: 0,
        }
    }

    /// Cycles remaining before the next opcode fetch.
    pub fn pending_cycles(&self) -> u8 {
        self.pending_cycles
    }

    /// Reset the CPU.
    ///
    /// Clears the registers, reloads the PC from the reset vector and
    /// consumes the 8 cycles the hardware takes.
    pub fn rst<B: CpuBus>(&mut self, bus: &mut B) {
        trace!("resetting the CPU");
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = StatusRegister::new();
        self.pc = bus.read_u16(RESET_VECTOR);
        self.pending_cycles = 8;
        debug!("reset vector -> {:#06X}", self.pc);
    }

    /// Deliver a non-maskable interrupt.
    pub fn nmi<B: CpuBus>(&mut self, bus: &mut B) {
        trace!("NMI received");
        self.interrupt(bus, NMI_VECTOR, false);
        self.pending_cycles = 7;
    }

    /// Deliver a maskable interrupt. Ignored while the I flag is set.
    pub fn irq<B: CpuBus>(&mut self, bus: &mut B) {
        if self.status.i() {
            trace!("ignoring IRQ (I flag set)");
            return;
        }
        self.interrupt(bus, IRQ_VECTOR, false);
        self.pending_cycles = 7;
    }

    /// Advance the CPU by one cycle.
    ///
    /// While cycles from a previous instruction are pending this only counts
    /// one down. Otherwise it fetches, decodes and executes the next
    /// instruction, leaving its remaining cycle cost pending.
    pub fn tick<B: CpuBus>(&mut self, bus: &mut B) {
        if self.pending_cycles > 0 {
            self.pending_cycles -= 1;
            return;
        }

        self.sanity();

        self.opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let entry = &OPCODES[self.opcode as usize];
        if entry.unknown {
            self.dump_state();
            panic!(
                "unknown opcode {:#04X} at {:#06X}",
                self.opcode,
                self.pc.wrapping_sub(1)
            );
        }

        self.pending_cycles = entry.cycles;
        self.resolve_address(bus, entry);
        self.execute(bus, entry);

        self.sanity();

        // This tick was a cycle too.
        self.pending_cycles -= 1;
    }

    // The always-set status bit reading as zero means the register was
    // corrupted somewhere; continuing would silently diverge from hardware.
    fn sanity(&self) {
        if !self.status.always_set_bit_ok() {
            self.dump_state();
            panic!("always-set status bit is not set");
        }
    }

    /// Log the full register file, used right before aborting on an
    /// impossible state.
    pub fn dump_state(&self) {
        error!("register dump");
        error!("  a  = {:#04X}", self.a);
        error!("  x  = {:#04X}", self.x);
        error!("  y  = {:#04X}", self.y);
        error!("  sp = {:#04X}", self.sp);
        error!("  pc = {:#06X}", self.pc);
        error!("  p  = {:#010b} (0bNV1BDIZC)", self.status.bits());
        error!(
            "  opcode = {:#04X} ({}), addr_abs = {:#06X}",
            self.opcode,
            OPCODES[self.opcode as usize].mnemonic,
            self.addr_abs
        );
    }

    fn resolve_address<B: CpuBus>(&mut self, bus: &mut B, entry: &Opcode) {
        match entry.mode {
            AddressingMode::Implicit => {
                // Implied and accumulator operations work on A.
                self.fetched = self.a;
            }
            AddressingMode::Immediate => {
                self.addr_abs = self.pc;
                self.pc = self.pc.wrapping_add(1);
            }
            AddressingMode::ZeroPage => {
                self.addr_abs = bus.read(self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
            }
            AddressingMode::ZeroPageX => {
                self.addr_abs = bus.read(self.pc).wrapping_add(self.x) as u16;
                self.pc = self.pc.wrapping_add(1);
            }
            AddressingMode::ZeroPageY => {
                self.addr_abs = bus.read(self.pc).wrapping_add(self.y) as u16;
                self.pc = self.pc.wrapping_add(1);
            }
            AddressingMode::Absolute => {
                self.addr_abs = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
            }
            AddressingMode::AbsoluteX => {
                let base = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.addr_abs = base.wrapping_add(self.x as u16);
                if entry.page_penalty && (self.addr_abs & 0xFF00) != (base & 0xFF00) {
                    self.pending_cycles += 1;
                }
            }
            AddressingMode::AbsoluteY => {
                let base = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.addr_abs = base.wrapping_add(self.y as u16);
                if entry.page_penalty && (self.addr_abs & 0xFF00) != (base & 0xFF00) {
                    self.pending_cycles += 1;
                }
            }
            AddressingMode::Relative => {
                self.addr_rel = bus.read(self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
                // Sign-extend the offset.
                if self.addr_rel & 0x0080 != 0 {
                    self.addr_rel |= 0xFF00;
                }
            }
            AddressingMode::Indirect => {
                let ptr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                // Hardware bug: the high byte of a pointer ending in $FF is
                // fetched from the start of the same page.
                if ptr & 0x00FF == 0x00FF {
                    let lo = bus.read(ptr) as u16;
                    let hi = bus.read(ptr & 0xFF00) as u16;
                    self.addr_abs = (hi << 8) | lo;
                } else {
                    self.addr_abs = bus.read_u16(ptr);
                }
            }
            AddressingMode::IndirectX => {
                let zp = bus.read(self.pc).wrapping_add(self.x);
                self.pc = self.pc.wrapping_add(1);
                // Both pointer bytes wrap within the zero page.
                let lo = bus.read(zp as u16) as u16;
                let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
                self.addr_abs = (hi << 8) | lo;
            }
            AddressingMode::IndirectY => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(zp as u16) as u16;
                let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
                let base = (hi << 8) | lo;
                self.addr_abs = base.wrapping_add(self.y as u16);
                if entry.page_penalty && (self.addr_abs & 0xFF00) != (base & 0xFF00) {
                    self.pending_cycles += 1;
                }
            }
        }
    }

    // For everything but implied/accumulator mode the operand comes from the
    // effective address.
    fn fetch<B: CpuBus>(&mut self, bus: &mut B, entry: &Opcode) {
        if entry.mode != AddressingMode::Implicit {
            self.fetched = bus.read(self.addr_abs);
        }
    }

    fn set_zn(&mut self, value: u8) {
        self.status.set_z(value == 0);
        self.status.set_n(value & 0x80 != 0);
    }

    // Store a shift/rotate result in A or memory depending on the mode.
    fn store_shift<B: CpuBus>(&mut self, bus: &mut B, entry: &Opcode, value: u8) {
        if entry.mode == AddressingMode::Implicit {
            self.a = value;
        } else {
            bus.write(self.addr_abs, value);
        }
    }

    fn branch_if(&mut self, condition: bool) {
        if !condition {
            return;
        }
        // Taken branches cost a cycle, and another when they cross a page.
        self.pending_cycles += 1;
        self.addr_abs = self.pc.wrapping_add(self.addr_rel);
        if (self.addr_abs & 0xFF00) != (self.pc & 0xFF00) {
            self.pending_cycles += 1;
        }
        self.pc = self.addr_abs;
    }

    // A + value + C, shared by ADC and SBC (which feeds the inverted operand).
    fn add_with_carry(&mut self, value: u8) {
        let result = self.a as u16 + value as u16 + self.status.c() as u16;
        self.status
            .set_v((!(self.a ^ value) & (self.a ^ result as u8)) & 0x80 != 0);
        self.status.set_c(result > 0xFF);
        self.a = result as u8;
        self.set_zn(self.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.status.set_c(register >= value);
        self.set_zn(result);
    }

    fn interrupt<B: CpuBus>(&mut self, bus: &mut B, vector: u16, from_brk: bool) {
        trace!("interrupt through vector {:#06X}", vector);
        self.push_pc(bus);
        // The stack copy of the status byte carries B only for BRK.
        let pushed = if from_brk {
            self.status.bits() | 0x10
        } else {
            self.status.bits() & !0x10
        };
        self.push(bus, pushed);
        self.status.set_i(true);
        self.pc = bus.read_u16(vector);
    }

    fn push<B: CpuBus>(&mut self, bus: &mut B, value: u8) {
        bus.write(0x0100 + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn push_pc<B: CpuBus>(&mut self, bus: &mut B) {
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, self.pc as u8);
    }

    fn pop<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 + self.sp as u16)
    }

    fn pop_pc<B: CpuBus>(&mut self, bus: &mut B) {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        self.pc = (hi << 8) | lo;
    }

    fn execute<B: CpuBus>(&mut self, bus: &mut B, entry: &Opcode) {
        match entry.op {
            Op::Adc => {
                self.fetch(bus, entry);
                self.add_with_carry(self.fetched);
            }
            Op::Sbc => {
                self.fetch(bus, entry);
                // Inverting the operand makes subtraction the same add.
                self.add_with_carry(self.fetched ^ 0xFF);
            }
            Op::And => {
                self.fetch(bus, entry);
                self.a &= self.fetched;
                self.set_zn(self.a);
            }
            Op::Ora => {
                self.fetch(bus, entry);
                self.a |= self.fetched;
                self.set_zn(self.a);
            }
            Op::Eor => {
                self.fetch(bus, entry);
                self.a ^= self.fetched;
                self.set_zn(self.a);
            }
            Op::Asl => {
                self.fetch(bus, entry);
                let result = self.fetched << 1;
                self.status.set_c(self.fetched & 0x80 != 0);
                self.set_zn(result);
                self.store_shift(bus, entry, result);
            }
            Op::Lsr => {
                self.fetch(bus, entry);
                let result = self.fetched >> 1;
                self.status.set_c(self.fetched & 0x01 != 0);
                self.set_zn(result);
                self.store_shift(bus, entry, result);
            }
            Op::Rol => {
                self.fetch(bus, entry);
                let result = (self.fetched << 1) | self.status.c() as u8;
                self.status.set_c(self.fetched & 0x80 != 0);
                self.set_zn(result);
                self.store_shift(bus, entry, result);
            }
            Op::Ror => {
                self.fetch(bus, entry);
                let result = (self.fetched >> 1) | ((self.status.c() as u8) << 7);
                self.status.set_c(self.fetched & 0x01 != 0);
                self.set_zn(result);
                self.store_shift(bus, entry, result);
            }
            Op::Bit => {
                self.fetch(bus, entry);
                self.status.set_z(self.a & self.fetched == 0);
                self.status.set_n(self.fetched & 0x80 != 0);
                self.status.set_v(self.fetched & 0x40 != 0);
            }
            Op::Bcc => self.branch_if(!self.status.c()),
            Op::Bcs => self.branch_if(self.status.c()),
            Op::Beq => self.branch_if(self.status.z()),
            Op::Bne => self.branch_if(!self.status.z()),
            Op::Bmi => self.branch_if(self.status.n()),
            Op::Bpl => self.branch_if(!self.status.n()),
            Op::Bvc => self.branch_if(!self.status.v()),
            Op::Bvs => self.branch_if(self.status.v()),
            Op::Brk => self.interrupt(bus, IRQ_VECTOR, true),
            Op::Clc => self.status.set_c(false),
            Op::Cld => self.status.set_d(false),
            Op::Cli => self.status.set_i(false),
            Op::Clv => self.status.set_v(false),
            Op::Sec => self.status.set_c(true),
            Op::Sed => self.status.set_d(true),
            Op::Sei => self.status.set_i(true),
            Op::Cmp => {
                self.fetch(bus, entry);
                self.compare(self.a, self.fetched);
            }
            Op::Cpx => {
                self.fetch(bus, entry);
                self.compare(self.x, self.fetched);
            }
            Op::Cpy => {
                self.fetch(bus, entry);
                self.compare(self.y, self.fetched);
            }
            Op::Dec => {
                self.fetch(bus, entry);
                let result = self.fetched.wrapping_sub(1);
                bus.write(self.addr_abs, result);
                self.set_zn(result);
            }
            Op::Inc => {
                self.fetch(bus, entry);
                let result = self.fetched.wrapping_add(1);
                bus.write(self.addr_abs, result);
                self.set_zn(result);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Op::Jmp => self.pc = self.addr_abs,
            Op::Jsr => {
                // The 6502 pushes the address of the last operand byte.
                self.pc = self.pc.wrapping_sub(1);
                self.push_pc(bus);
                self.pc = self.addr_abs;
            }
            Op::Rts => {
                self.pop_pc(bus);
                self.pc = self.pc.wrapping_add(1);
            }
            Op::Rti => {
                let bits = self.pop(bus);
                self.status.set_bits(bits);
                self.pop_pc(bus);
            }
            Op::Lda => {
                self.fetch(bus, entry);
                self.a = self.fetched;
                self.set_zn(self.a);
            }
            Op::Ldx => {
                self.fetch(bus, entry);
                self.x = self.fetched;
                self.set_zn(self.x);
            }
            Op::Ldy => {
                self.fetch(bus, entry);
                self.y = self.fetched;
                self.set_zn(self.y);
            }
            Op::Sta => bus.write(self.addr_abs, self.a),
            Op::Stx => bus.write(self.addr_abs, self.x),
            Op::Sty => bus.write(self.addr_abs, self.y),
            Op::Pha => self.push(bus, self.a),
            Op::Php => {
                // The pushed copy always carries B set.
                self.push(bus, self.status.bits() | 0x10);
            }
            Op::Pla => {
                self.a = self.pop(bus);
                self.set_zn(self.a);
            }
            Op::Plp => {
                let bits = self.pop(bus);
                self.status.set_bits(bits);
            }
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }
            // The only transfer that leaves the flags alone.
            Op::Txs => self.sp = self.x,
            Op::Nop => {}
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A={:02X} X={:02X} Y={:02X} SP={:02X} PC={:04X} P={:02X}",
            self.a,
            self.x,
            self.y,
            self.sp,
            self.pc,
            self.status.bits()
        )
    }
}
