//! Minimal mnemonic lookup for the trace ring buffer.
//!
//! Diagnostic use only: produces a bare mnemonic, not operand-aware
//! disassembly. Register and immediate operands of `MOV`/ALU/`MVI`-style
//! opcodes are derived from the opcode byte itself, since they pack
//! directly into its bit fields.

const REG_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "M", "A"];
const ALU_NAMES: [&str; 8] = ["ADD", "ADC", "SUB", "SBB", "ANA", "XRA", "ORA", "CMP"];
const RP_NAMES: [&str; 4] = ["B", "D", "H", "SP"];
const CC_NAMES: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];

/// A bare mnemonic for `opcode`, with register operands spelled out where
/// they are encoded directly in the byte (e.g. `"MOV B,C"`, `"ADD D"`).
/// Immediate and address operands are omitted since the trace ring buffer
/// retains only the opcode byte, not its trailing bytes.
pub fn mnemonic(opcode: u8) -> String {
    match opcode {
        0x00 => "NOP".into(),
        0x76 => "HLT".into(),
        0x40..=0x7F => {
            let dst = REG_NAMES[((opcode >> 3) & 0x07) as usize];
            let src = REG_NAMES[(opcode & 0x07) as usize];
            format!("MOV {dst},{src}")
        }
        0x80..=0xBF => {
            let op = ALU_NAMES[((opcode >> 3) & 0x07) as usize];
            let src = REG_NAMES[(opcode & 0x07) as usize];
            format!("{op} {src}")
        }
        _ if opcode & 0xC7 == 0x06 => format!("MVI {},d8", REG_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xC7 == 0x04 => format!("INR {}", REG_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xC7 == 0x05 => format!("DCR {}", REG_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xCF == 0x01 => format!("LXI {},d16", RP_NAMES[((opcode >> 4) & 0x03) as usize]),
        _ if opcode & 0xCF == 0x03 => format!("INX {}", RP_NAMES[((opcode >> 4) & 0x03) as usize]),
        _ if opcode & 0xCF == 0x0B => format!("DCX {}", RP_NAMES[((opcode >> 4) & 0x03) as usize]),
        _ if opcode & 0xCF == 0x09 => format!("DAD {}", RP_NAMES[((opcode >> 4) & 0x03) as usize]),
        0x02 => "STAX B".into(),
        0x12 => "STAX D".into(),
        0x0A => "LDAX B".into(),
        0x1A => "LDAX D".into(),
        0x22 => "SHLD a16".into(),
        0x2A => "LHLD a16".into(),
        0x32 => "STA a16".into(),
        0x3A => "LDA a16".into(),
        0x07 => "RLC".into(),
        0x0F => "RRC".into(),
        0x17 => "RAL".into(),
        0x1F => "RAR".into(),
        0x27 => "DAA".into(),
        0x2F => "CMA".into(),
        0x37 => "STC".into(),
        0x3F => "CMC".into(),
        0xC6 => "ADI d8".into(),
        0xCE => "ACI d8".into(),
        0xD6 => "SUI d8".into(),
        0xDE => "SBI d8".into(),
        0xE6 => "ANI d8".into(),
        0xEE => "XRI d8".into(),
        0xF6 => "ORI d8".into(),
        0xFE => "CPI d8".into(),
        0xC5 => "PUSH B".into(),
        0xD5 => "PUSH D".into(),
        0xE5 => "PUSH H".into(),
        0xF5 => "PUSH PSW".into(),
        0xC1 => "POP B".into(),
        0xD1 => "POP D".into(),
        0xE1 => "POP H".into(),
        0xF1 => "POP PSW".into(),
        0xE3 => "XTHL".into(),
        0xE9 => "PCHL".into(),
        0xF9 => "SPHL".into(),
        0xEB => "XCHG".into(),
        0xC3 => "JMP a16".into(),
        0xCD => "CALL a16".into(),
        0xC9 => "RET".into(),
        0xF3 => "DI".into(),
        0xFB => "EI".into(),
        0xD3 => "OUT d8".into(),
        0xDB => "IN d8".into(),
        _ if opcode & 0xC7 == 0xC2 => format!("J{} a16", CC_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xC7 == 0xC4 => format!("C{} a16", CC_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xC7 == 0xC0 => format!("R{}", CC_NAMES[((opcode >> 3) & 0x07) as usize]),
        _ if opcode & 0xC7 == 0xC7 => format!("RST {}", (opcode >> 3) & 0x07),
        _ => format!("??? ({opcode:#04x})"),
    }
}
