//! The CPU's instruction table.
//!
//! One immutable entry per opcode byte. Unknown opcodes keep a placeholder
//! entry whose `unknown` flag makes the CPU abort instead of silently
//! desynchronizing from hardware.

/// How an instruction finds its operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    /// Implicitly part of the instruction, or operating on the accumulator.
    Implicit,
    /// Immediate 8-bit value after the opcode.
    Immediate,
    /// Immediate 8-bit value mapped to the zero page.
    ZeroPage,
    /// Zero page + X (wraps within the page).
    ZeroPageX,
    /// Zero page + Y (wraps within the page).
    ZeroPageY,
    /// Immediate 16-bit little-endian address after the opcode.
    Absolute,
    /// Immediate 16-bit address + X.
    AbsoluteX,
    /// Immediate 16-bit address + Y.
    AbsoluteY,
    /// Immediate 8-bit signed branch offset.
    Relative,
    /// 16-bit address stored in memory (JMP only).
    Indirect,
    /// 16-bit address stored at (zero page + X).
    IndirectX,
    /// (16-bit address stored at zero page) + Y.
    IndirectY,
}

/// The 56 documented operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

/// One decoded table entry.
pub struct Opcode {
    pub mnemonic: &'static str,
    pub op: Op,
    pub mode: AddressingMode,
    /// Base cycle count; penalties are added at runtime.
    pub cycles: u8,
    /// Whether crossing a page during address resolution costs a cycle.
    pub page_penalty: bool,
    /// Dispatching an unknown entry is fatal.
    pub unknown: bool,
}

const fn op(mnemonic: &'static str, op: Op, mode: AddressingMode, cycles: u8) -> Opcode {
    Opcode {
        mnemonic,
        op,
        mode,
        cycles,
        page_penalty: false,
        unknown: false,
    }
}

// Same, for the read instructions that pay for crossing a page.
const fn pp(mnemonic: &'static str, op: Op, mode: AddressingMode, cycles: u8) -> Opcode {
    Opcode {
        mnemonic,
        op,
        mode,
        cycles,
        page_penalty: true,
        unknown: false,
    }
}

const UNKNOWN: Opcode = Opcode {
    mnemonic: "???",
    op: Op::Nop,
    mode: AddressingMode::Implicit,
    cycles: 2,
    page_penalty: false,
    unknown: true,
};

use AddressingMode as AM;

/// The instruction table, indexed by opcode byte.
pub static OPCODES: [Opcode; 256] = [
    // 0x00
    op("BRK", Op::Brk, AM::Implicit, 7),
    op("ORA", Op::Ora, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("ORA", Op::Ora, AM::ZeroPage, 3),
    op("ASL", Op::Asl, AM::ZeroPage, 5),
    UNKNOWN,
    op("PHP", Op::Php, AM::Implicit, 3),
    op("ORA", Op::Ora, AM::Immediate, 2),
    op("ASL", Op::Asl, AM::Implicit, 2),
    UNKNOWN,
    UNKNOWN,
    op("ORA", Op::Ora, AM::Absolute, 4),
    op("ASL", Op::Asl, AM::Absolute, 6),
    UNKNOWN,
    // 0x10
    op("BPL", Op::Bpl, AM::Relative, 2),
    pp("ORA", Op::Ora, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("ORA", Op::Ora, AM::ZeroPageX, 4),
    op("ASL", Op::Asl, AM::ZeroPageX, 6),
    UNKNOWN,
    op("CLC", Op::Clc, AM::Implicit, 2),
    pp("ORA", Op::Ora, AM::AbsoluteY, 4),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    pp("ORA", Op::Ora, AM::AbsoluteX, 4),
    op("ASL", Op::Asl, AM::AbsoluteX, 7),
    UNKNOWN,
    // 0x20
    op("JSR", Op::Jsr, AM::Absolute, 6),
    op("AND", Op::And, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    op("BIT", Op::Bit, AM::ZeroPage, 3),
    op("AND", Op::And, AM::ZeroPage, 3),
    op("ROL", Op::Rol, AM::ZeroPage, 5),
    UNKNOWN,
    op("PLP", Op::Plp, AM::Implicit, 4),
    op("AND", Op::And, AM::Immediate, 2),
    op("ROL", Op::Rol, AM::Implicit, 2),
    UNKNOWN,
    op("BIT", Op::Bit, AM::Absolute, 4),
    op("AND", Op::And, AM::Absolute, 4),
    op("ROL", Op::Rol, AM::Absolute, 6),
    UNKNOWN,
    // 0x30
    op("BMI", Op::Bmi, AM::Relative, 2),
    pp("AND", Op::And, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("AND", Op::And, AM::ZeroPageX, 4),
    op("ROL", Op::Rol, AM::ZeroPageX, 6),
    UNKNOWN,
    op("SEC", Op::Sec, AM::Implicit, 2),
    pp("AND", Op::And, AM::AbsoluteY, 4),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    pp("AND", Op::And, AM::AbsoluteX, 4),
    op("ROL", Op::Rol, AM::AbsoluteX, 7),
    UNKNOWN,
    // 0x40
    op("RTI", Op::Rti, AM::Implicit, 6),
    op("EOR", Op::Eor, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("EOR", Op::Eor, AM::ZeroPage, 3),
    op("LSR", Op::Lsr, AM::ZeroPage, 5),
    UNKNOWN,
    op("PHA", Op::Pha, AM::Implicit, 3),
    op("EOR", Op::Eor, AM::Immediate, 2),
    op("LSR", Op::Lsr, AM::Implicit, 2),
    UNKNOWN,
    op("JMP", Op::Jmp, AM::Absolute, 3),
    op("EOR", Op::Eor, AM::Absolute, 4),
    op("LSR", Op::Lsr, AM::Absolute, 6),
    UNKNOWN,
    // 0x50
    op("BVC", Op::Bvc, AM::Relative, 2),
    pp("EOR", Op::Eor, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("EOR", Op::Eor, AM::ZeroPageX, 4),
    op("LSR", Op::Lsr, AM::ZeroPageX, 6),
    UNKNOWN,
    op("CLI", Op::Cli, AM::Implicit, 2),
    pp("EOR", Op::Eor, AM::AbsoluteY, 4),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    pp("EOR", Op::Eor, AM::AbsoluteX, 4),
    op("LSR", Op::Lsr, AM::AbsoluteX, 7),
    UNKNOWN,
    // 0x60
    op("RTS", Op::Rts, AM::Implicit, 6),
    op("ADC", Op::Adc, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("ADC", Op::Adc, AM::ZeroPage, 3),
    op("ROR", Op::Ror, AM::ZeroPage, 5),
    UNKNOWN,
    op("PLA", Op::Pla, AM::Implicit, 4),
    op("ADC", Op::Adc, AM::Immediate, 2),
    op("ROR", Op::Ror, AM::Implicit, 2),
    UNKNOWN,
    op("JMP", Op::Jmp, AM::Indirect, 5),
    op("ADC", Op::Adc, AM::Absolute, 4),
    op("ROR", Op::Ror, AM::Absolute, 6),
    UNKNOWN,
    // 0x70
    op("BVS", Op::Bvs, AM::Relative, 2),
    pp("ADC", Op::Adc, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("ADC", Op::Adc, AM::ZeroPageX, 4),
    op("ROR", Op::Ror, AM::ZeroPageX, 6),
    UNKNOWN,
    op("SEI", Op::Sei, AM::Implicit, 2),
    pp("ADC", Op::Adc, AM::AbsoluteY, 4),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    pp("ADC", Op::Adc, AM::AbsoluteX, 4),
    op("ROR", Op::Ror, AM::AbsoluteX, 7),
    UNKNOWN,
    // 0x80
    UNKNOWN,
    op("STA", Op::Sta, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    op("STY", Op::Sty, AM::ZeroPage, 3),
    op("STA", Op::Sta, AM::ZeroPage, 3),
    op("STX", Op::Stx, AM::ZeroPage, 3),
    UNKNOWN,
    op("DEY", Op::Dey, AM::Implicit, 2),
    UNKNOWN,
    op("TXA", Op::Txa, AM::Implicit, 2),
    UNKNOWN,
    op("STY", Op::Sty, AM::Absolute, 4),
    op("STA", Op::Sta, AM::Absolute, 4),
    op("STX", Op::Stx, AM::Absolute, 4),
    UNKNOWN,
    // 0x90
    op("BCC", Op::Bcc, AM::Relative, 2),
    op("STA", Op::Sta, AM::IndirectY, 6),
    UNKNOWN,
    UNKNOWN,
    op("STY", Op::Sty, AM::ZeroPageX, 4),
    op("STA", Op::Sta, AM::ZeroPageX, 4),
    op("STX", Op::Stx, AM::ZeroPageY, 4),
    UNKNOWN,
    op("TYA", Op::Tya, AM::Implicit, 2),
    op("STA", Op::Sta, AM::AbsoluteY, 5),
    op("TXS", Op::Txs, AM::Implicit, 2),
    UNKNOWN,
    UNKNOWN,
    op("STA", Op::Sta, AM::AbsoluteX, 5),
    UNKNOWN,
    UNKNOWN,
    // 0xA0
    op("LDY", Op::Ldy, AM::Immediate, 2),
    op("LDA", Op::Lda, AM::IndirectX, 6),
    op("LDX", Op::Ldx, AM::Immediate, 2),
    UNKNOWN,
    op("LDY", Op::Ldy, AM::ZeroPage, 3),
    op("LDA", Op::Lda, AM::ZeroPage, 3),
    op("LDX", Op::Ldx, AM::ZeroPage, 3),
    UNKNOWN,
    op("TAY", Op::Tay, AM::Implicit, 2),
    op("LDA", Op::Lda, AM::Immediate, 2),
    op("TAX", Op::Tax, AM::Implicit, 2),
    UNKNOWN,
    op("LDY", Op::Ldy, AM::Absolute, 4),
    op("LDA", Op::Lda, AM::Absolute, 4),
    op("LDX", Op::Ldx, AM::Absolute, 4),
    UNKNOWN,
    // 0xB0
    op("BCS", Op::Bcs, AM::Relative, 2),
    pp("LDA", Op::Lda, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    op("LDY", Op::Ldy, AM::ZeroPageX, 4),
    op("LDA", Op::Lda, AM::ZeroPageX, 4),
    op("LDX", Op::Ldx, AM::ZeroPageY, 4),
    UNKNOWN,
    op("CLV", Op::Clv, AM::Implicit, 2),
    pp("LDA", Op::Lda, AM::AbsoluteY, 4),
    op("TSX", Op::Tsx, AM::Implicit, 2),
    UNKNOWN,
    pp("LDY", Op::Ldy, AM::AbsoluteX, 4),
    pp("LDA", Op::Lda, AM::AbsoluteX, 4),
    pp("LDX", Op::Ldx, AM::AbsoluteY, 4),
    UNKNOWN,
    // 0xC0
    op("CPY", Op::Cpy, AM::Immediate, 2),
    op("CMP", Op::Cmp, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    op("CPY", Op::Cpy, AM::ZeroPage, 3),
    op("CMP", Op::Cmp, AM::ZeroPage, 3),
    op("DEC", Op::Dec, AM::ZeroPage, 5),
    UNKNOWN,
    op("INY", Op::Iny, AM::Implicit, 2),
    op("CMP", Op::Cmp, AM::Immediate, 2),
    op("DEX", Op::Dex, AM::Implicit, 2),
    UNKNOWN,
    op("CPY", Op::Cpy, AM::Absolute, 4),
    op("CMP", Op::Cmp, AM::Absolute, 4),
    op("DEC", Op::Dec, AM::Absolute, 6),
    UNKNOWN,
    // 0xD0
    op("BNE", Op::Bne, AM::Relative, 2),
    pp("CMP", Op::Cmp, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("CMP", Op::Cmp, AM::ZeroPageX, 4),
    op("DEC", Op::Dec, AM::ZeroPageX, 6),
    UNKNOWN,
    op("CLD", Op::Cld, AM::Implicit, 2),
    pp("CMP", Op::Cmp, AM::AbsoluteY, 4),
    op("NOP", Op::Nop, AM::Implicit, 2),
    UNKNOWN,
    UNKNOWN,
    pp("CMP", Op::Cmp, AM::AbsoluteX, 4),
    op("DEC", Op::Dec, AM::AbsoluteX, 7),
    UNKNOWN,
    // 0xE0
    op("CPX", Op::Cpx, AM::Immediate, 2),
    op("SBC", Op::Sbc, AM::IndirectX, 6),
    UNKNOWN,
    UNKNOWN,
    op("CPX", Op::Cpx, AM::ZeroPage, 3),
    op("SBC", Op::Sbc, AM::ZeroPage, 3),
    op("INC", Op::Inc, AM::ZeroPage, 5),
    UNKNOWN,
    op("INX", Op::Inx, AM::Implicit, 2),
    op("SBC", Op::Sbc, AM::Immediate, 2),
    op("NOP", Op::Nop, AM::Implicit, 2),
    UNKNOWN,
    op("CPX", Op::Cpx, AM::Absolute, 4),
    op("SBC", Op::Sbc, AM::Absolute, 4),
    op("INC", Op::Inc, AM::Absolute, 6),
    UNKNOWN,
    // 0xF0
    op("BEQ", Op::Beq, AM::Relative, 2),
    pp("SBC", Op::Sbc, AM::IndirectY, 5),
    UNKNOWN,
    UNKNOWN,
    UNKNOWN,
    op("SBC", Op::Sbc, AM::ZeroPageX, 4),
    op("INC", Op::Inc, AM::ZeroPageX, 6),
    UNKNOWN,
    op("SED", Op::Sed, AM::Implicit, 2),
    pp("SBC", Op::Sbc, AM::AbsoluteY, 4),
    op("NOP", Op::Nop, AM::Implicit, 2),
    UNKNOWN,
    UNKNOWN,
    pp("SBC", Op::Sbc, AM::AbsoluteX, 4),
    op("INC", Op::Inc, AM::AbsoluteX, 7),
    UNKNOWN,
];

/// Format an instruction for diagnostics.
///
/// Missing operand bytes are rendered as `0x00` so the formatter can be used
/// on a truncated prefix.
/// ```
/// use famicore::core::opcodes::format_opcode;
/// assert_eq!(format_opcode(0xA9, &[0x42]), "LDA #$42");
/// assert_eq!(format_opcode(0x6C, &[0xFF, 0x30]), "JMP ($30FF)");
/// ```
pub fn format_opcode(opcode: u8, operands: &[u8]) -> String {
    let entry = &OPCODES[opcode as usize];
    let b0 = operands.first().copied().unwrap_or(0);
    let b1 = operands.get(1).copied().unwrap_or(0);
    let abs = u16::from_le_bytes([b0, b1]);
    let m = entry.mnemonic;
    match entry.mode {
        AM::Implicit => m.to_string(),
        AM::Immediate => format!("{} #${:02X}", m, b0),
        AM::ZeroPage => format!("{} ${:02X}", m, b0),
        AM::ZeroPageX => format!("{} ${:02X},X", m, b0),
        AM::ZeroPageY => format!("{} ${:02X},Y", m, b0),
        AM::Absolute => format!("{} ${:04X}", m, abs),
        AM::AbsoluteX => format!("{} ${:04X},X", m, abs),
        AM::AbsoluteY => format!("{} ${:04X},Y", m, abs),
        AM::Relative => format!("{} *{:+}", m, b0 as i8),
        AM::Indirect => format!("{} (${:04X})", m, abs),
        AM::IndirectX => format!("{} (${:02X},X)", m, b0),
        AM::IndirectY => format!("{} (${:02X}),Y", m, b0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_entry_count() {
        // 151 documented opcodes, plus the aliased NOPs at $DA and $FA.
        let known = OPCODES.iter().filter(|o| !o.unknown).count();
        assert_eq!(known, 153);
    }

    #[test]
    fn test_well_known_entries() {
        let lda = &OPCODES[0xA9];
        assert_eq!(lda.mnemonic, "LDA");
        assert_eq!(lda.mode, AddressingMode::Immediate);
        assert_eq!(lda.cycles, 2);
        assert!(!lda.page_penalty);

        let lda_abs_x = &OPCODES[0xBD];
        assert_eq!(lda_abs_x.mode, AddressingMode::AbsoluteX);
        assert!(lda_abs_x.page_penalty);

        // Stores never pay the page-cross penalty.
        let sta_abs_x = &OPCODES[0x9D];
        assert_eq!(sta_abs_x.cycles, 5);
        assert!(!sta_abs_x.page_penalty);
    }

    #[test]
    fn test_unknown_entries_are_marked() {
        assert!(OPCODES[0x02].unknown);
        assert!(OPCODES[0xFF].unknown);
    }
}
