//! The 256-way opcode dispatch for the Intel 8080 instruction set.
//!
//! A flat match on the opcode byte rather than a field-decomposed decoder:
//! the 8080 has no prefix bytes, so nothing is gained by splitting the
//! opcode into sub-fields the way a Z80-family decoder would.
//!
//! # References
//! - Intel 8080 Microcomputer Systems User's Manual

use super::flags;
use super::{Cpu, StepOutcome};
use crate::bus::Bus;
use crate::error::{EmulatorError, Result};
use crate::hypercall;
use log::warn;

/// Opcodes with no defined 8080 encoding. Real 8080 silicon quietly
/// executes most of these as `NOP`; this core instead treats every one of
/// them as a fatal condition so that guest code relying on undocumented
/// behaviour is caught rather than silently misbehaving.
const UNDEFINED_OPCODES: [u8; 12] = [
    0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD,
];

impl Cpu {
    pub(super) fn execute(&mut self, bus: &mut Bus, opcode: u8, pc_before: u16) -> Result<StepOutcome> {
        if UNDEFINED_OPCODES.contains(&opcode) {
            warn!("undefined opcode {opcode:#04x} at {pc_before:#06x}");
            return Err(EmulatorError::UndefinedOpcode { opcode, pc: pc_before });
        }

        match opcode {
            0x00 => {}

            // ---- MOV r,r' / HLT ----
            0x76 => {
                self.halted = true;
                return Ok(StepOutcome::Halted);
            }
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 0x07;
                let src = opcode & 0x07;
                let value = self.get_reg8(src, bus);
                self.set_reg8(dst, value, bus);
            }

            // ---- ALU A,r ----
            0x80..=0xBF => {
                let op = (opcode >> 3) & 0x07;
                let src = opcode & 0x07;
                let value = self.get_reg8(src, bus);
                self.alu_dispatch(op, value);
            }

            // ---- MVI r,data / INR r / DCR r ----
            _ if opcode & 0xC7 == 0x06 => {
                let reg = (opcode >> 3) & 0x07;
                let data = self.fetch_byte(bus);
                self.set_reg8(reg, data, bus);
            }
            _ if opcode & 0xC7 == 0x04 => {
                let reg = (opcode >> 3) & 0x07;
                let value = self.get_reg8(reg, bus);
                let result = self.alu_inr(value);
                self.set_reg8(reg, result, bus);
            }
            _ if opcode & 0xC7 == 0x05 => {
                let reg = (opcode >> 3) & 0x07;
                let value = self.get_reg8(reg, bus);
                let result = self.alu_dcr(value);
                self.set_reg8(reg, result, bus);
            }

            // ---- Immediate ALU ----
            0xC6 => {
                let data = self.fetch_byte(bus);
                self.alu_add(data, false);
            }
            0xCE => {
                let data = self.fetch_byte(bus);
                self.alu_add(data, true);
            }
            0xD6 => {
                let data = self.fetch_byte(bus);
                self.alu_sub(data, false);
            }
            0xDE => {
                let data = self.fetch_byte(bus);
                self.alu_sub(data, true);
            }
            0xE6 => {
                let data = self.fetch_byte(bus);
                self.alu_and(data);
            }
            0xEE => {
                let data = self.fetch_byte(bus);
                self.alu_xor(data);
            }
            0xF6 => {
                let data = self.fetch_byte(bus);
                self.alu_or(data);
            }
            0xFE => {
                let data = self.fetch_byte(bus);
                self.alu_cmp(data);
            }

            // ---- 16-bit register pair ops: LXI / INX / DCX / DAD ----
            _ if opcode & 0xCF == 0x01 => {
                let rp = (opcode >> 4) & 0x03;
                let data = self.fetch_word(bus);
                self.set_rp(rp, data);
            }
            _ if opcode & 0xCF == 0x03 => {
                let rp = (opcode >> 4) & 0x03;
                let value = self.get_rp(rp).wrapping_add(1);
                self.set_rp(rp, value);
            }
            _ if opcode & 0xCF == 0x0B => {
                let rp = (opcode >> 4) & 0x03;
                let value = self.get_rp(rp).wrapping_sub(1);
                self.set_rp(rp, value);
            }
            _ if opcode & 0xCF == 0x09 => {
                let rp = (opcode >> 4) & 0x03;
                self.alu_dad(rp);
            }

            // ---- LDAX / STAX (BC, DE only) ----
            0x02 => bus.write(self.bc(), self.a),
            0x12 => bus.write(self.de(), self.a),
            0x0A => self.a = bus.read(self.bc()),
            0x1A => self.a = bus.read(self.de()),

            // ---- Direct addressing ----
            0x22 => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.l);
                bus.write(addr.wrapping_add(1), self.h);
            }
            0x2A => {
                let addr = self.fetch_word(bus);
                self.l = bus.read(addr);
                self.h = bus.read(addr.wrapping_add(1));
            }
            0x32 => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.a);
            }
            0x3A => {
                let addr = self.fetch_word(bus);
                self.a = bus.read(addr);
            }

            // ---- Rotates, DAA, CMA, STC, CMC ----
            0x07 => self.rlc(),
            0x0F => self.rrc(),
            0x17 => self.ral(),
            0x1F => self.rar(),
            0x27 => self.alu_daa(),
            0x2F => self.a = !self.a,
            0x37 => self.set_flag(flags::C, true),
            0x3F => {
                let c = self.flag(flags::C);
                self.set_flag(flags::C, !c);
            }

            // ---- Stack, exchange ----
            0xC5 => self.push_word(bus, self.bc()),
            0xD5 => self.push_word(bus, self.de()),
            0xE5 => self.push_word(bus, self.hl()),
            0xF5 => {
                let psw = ((self.a as u16) << 8) | self.f as u16;
                self.push_word(bus, psw);
            }
            0xC1 => {
                let v = self.pop_word(bus);
                self.set_bc(v);
            }
            0xD1 => {
                let v = self.pop_word(bus);
                self.set_de(v);
            }
            0xE1 => {
                let v = self.pop_word(bus);
                self.set_hl(v);
            }
            0xF1 => {
                let v = self.pop_word(bus);
                self.a = (v >> 8) as u8;
                self.f = (v as u8 | flags::ALWAYS_ONE) & !flags::UNUSED_MASK;
            }
            0xE3 => {
                let stack_top = self.pop_word(bus);
                let hl = self.hl();
                self.push_word(bus, hl);
                self.set_hl(stack_top);
            }
            0xE9 => self.set_pc(bus, self.hl()),
            0xF9 => self.sp = self.hl(),
            0xEB => {
                std::mem::swap(&mut self.h, &mut self.d);
                std::mem::swap(&mut self.l, &mut self.e);
            }

            // ---- Unconditional control flow ----
            0xC3 => {
                let addr = self.fetch_word(bus);
                self.set_pc(bus, addr);
            }
            0xCD => {
                let addr = self.fetch_word(bus);
                let ret = self.pc;
                self.push_word(bus, ret);
                self.set_pc(bus, addr);
            }
            0xC9 => {
                let addr = self.pop_word(bus);
                self.set_pc(bus, addr);
            }

            // ---- Conditional control flow ----
            _ if opcode & 0xC7 == 0xC2 => {
                let cc = (opcode >> 3) & 0x07;
                let addr = self.fetch_word(bus);
                if self.check_cc(cc) {
                    self.set_pc(bus, addr);
                }
            }
            _ if opcode & 0xC7 == 0xC4 => {
                let cc = (opcode >> 3) & 0x07;
                let addr = self.fetch_word(bus);
                if self.check_cc(cc) {
                    let ret = self.pc;
                    self.push_word(bus, ret);
                    self.set_pc(bus, addr);
                }
            }
            _ if opcode & 0xC7 == 0xC0 => {
                let cc = (opcode >> 3) & 0x07;
                if self.check_cc(cc) {
                    let addr = self.pop_word(bus);
                    self.set_pc(bus, addr);
                }
            }

            // ---- RST n ----
            _ if opcode & 0xC7 == 0xC7 => {
                let n = (opcode >> 3) & 0x07;
                let ret = self.pc;
                self.push_word(bus, ret);
                self.set_pc(bus, (n as u16) * 8);
            }

            // ---- Interrupt enable (accepted, no architectural effect) ----
            0xF3 => self.interrupts_enabled = false,
            0xFB => self.interrupts_enabled = true,

            // ---- Hypercall shim ----
            0xD3 => {
                let function = self.fetch_byte(bus);
                hypercall::bios(self, bus, function)?;
            }
            0xDB => {
                let _port = self.fetch_byte(bus);
                hypercall::bdos(self, bus)?;
            }

            _ => {
                warn!("undefined opcode {opcode:#04x} at {pc_before:#06x}");
                return Err(EmulatorError::UndefinedOpcode { opcode, pc: pc_before });
            }
        }

        Ok(StepOutcome::Continue)
    }

    /// ALU op field from `0x80..=0xBF` / immediate-ALU opcodes: 0=ADD
    /// 1=ADC 2=SUB 3=SBB 4=ANA 5=XRA 6=ORA 7=CMP.
    fn alu_dispatch(&mut self, op: u8, value: u8) {
        match op {
            0 => self.alu_add(value, false),
            1 => self.alu_add(value, true),
            2 => self.alu_sub(value, false),
            3 => self.alu_sub(value, true),
            4 => self.alu_and(value),
            5 => self.alu_xor(value),
            6 => self.alu_or(value),
            7 => self.alu_cmp(value),
            _ => unreachable!("ALU op field is 3 bits"),
        }
    }
}
