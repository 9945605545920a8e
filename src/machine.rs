//! Top-level orchestrator: owns the CPU and bus, loads images, drives the
//! run loop, and reports why it stopped.

use crate::bus::Bus;
use crate::config::MachineConfig;
use crate::cpu::{Cpu, StepOutcome};
use crate::disasm;
use crate::error::{EmulatorError, Result};
use crate::host::{ConsoleIo, DiskStore};
use log::{error, info};

const HISTORY_SIZE: usize = 64;

/// One fetched instruction, retained for the trace ring buffer.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    pc: u16,
    opcode: u8,
}

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `HLT` executed; the CPU will not advance further without a reset.
    Halted,
    /// The caller-supplied instruction budget (if any) ran out. Exists for
    /// test harnesses and fuzzers bounding a run against guest code that
    /// may never halt; has no guest-visible effect.
    StepBudgetExhausted,
}

/// Owns one `Cpu` and one `Bus`, and is the unit of execution embedding
/// code interacts with.
pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    history: Vec<HistoryEntry>,
    history_head: usize,
}

impl Machine {
    /// Build a machine around the given firmware image, CCP/BDOS images,
    /// host collaborators, and configuration. The firmware image is
    /// copied into guest memory and the program counter set to its cold
    /// entry; the CCP/BDOS images are retained so `BOOT`/`WBOOT` can
    /// (re)install them without the host supplying them again.
    pub fn new(
        config: MachineConfig,
        firmware_image: &[u8],
        ccp_image: Vec<u8>,
        bdos_image: Vec<u8>,
        console: Box<dyn ConsoleIo>,
        disks: Vec<Box<dyn DiskStore>>,
    ) -> Result<Self> {
        if firmware_image.len() > 0x4000 {
            return Err(EmulatorError::ImageTooLarge {
                name: "firmware",
                size: firmware_image.len(),
                addr: config.firmware_load_addr,
            });
        }

        let firmware_load_addr = config.firmware_load_addr;
        let mut bus = Bus::new(config, console, disks, ccp_image, bdos_image);
        bus.memory.load_image(firmware_load_addr, firmware_image);

        let mut cpu = Cpu::new();
        cpu.set_pc(&mut bus, firmware_load_addr);

        Ok(Self {
            cpu,
            bus,
            history: Vec::with_capacity(HISTORY_SIZE),
            history_head: 0,
        })
    }

    /// Reset the register file and reposition the program counter at the
    /// firmware's cold entry. Guest memory (and any images `BOOT` has
    /// already installed) is left untouched.
    pub fn reset(&mut self) {
        let entry = self.bus.config.firmware_load_addr;
        self.cpu.reset();
        self.cpu.set_pc(&mut self.bus, entry);
        self.history.clear();
        self.history_head = 0;
    }

    /// Run until `HLT`, a fatal error, or (if `step_budget` is `Some`) the
    /// instruction budget is exhausted.
    pub fn run(&mut self, step_budget: Option<u64>) -> Result<StopReason> {
        let mut steps = 0u64;
        loop {
            if let Some(budget) = step_budget {
                if steps >= budget {
                    return Ok(StopReason::StepBudgetExhausted);
                }
            }

            let pc = self.cpu.pc;
            match self.cpu.step(&mut self.bus) {
                Ok(StepOutcome::Continue) => {
                    self.record_history(pc, self.cpu.opcode);
                    steps += 1;
                }
                Ok(StepOutcome::Halted) => {
                    info!("halted at {pc:#06x}");
                    return Ok(StopReason::Halted);
                }
                Err(err) => {
                    error!("fatal: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Run exactly one instruction, for callers that want fine-grained
    /// control (e.g. single-stepping under a debugger).
    pub fn step(&mut self) -> Result<StepOutcome> {
        let pc = self.cpu.pc;
        let outcome = self.cpu.step(&mut self.bus)?;
        self.record_history(pc, self.cpu.opcode);
        Ok(outcome)
    }

    fn record_history(&mut self, pc: u16, opcode: u8) {
        let entry = HistoryEntry { pc, opcode };
        if self.history.len() < HISTORY_SIZE {
            self.history.push(entry);
        } else {
            self.history[self.history_head] = entry;
        }
        self.history_head = (self.history_head + 1) % HISTORY_SIZE;
    }

    /// Read-only access to the CPU, for tests and embedding code that
    /// wants to inspect register state.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Read-only access to the bus, for tests that want to inspect disk
    /// controller state or peek at guest memory.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Render the trace ring buffer, oldest entry first, one mnemonic per
    /// line. For crash reports alongside a fatal `Err` from `run`.
    pub fn dump_history(&self) -> String {
        let mut out = String::new();
        let len = self.history.len();
        for i in 0..len {
            let idx = if len < HISTORY_SIZE {
                i
            } else {
                (self.history_head + i) % HISTORY_SIZE
            };
            let entry = self.history[idx];
            let mnemonic = disasm::mnemonic(entry.opcode);
            out.push_str(&format!("{:#06x}  {:#04x}  {}\n", entry.pc, entry.opcode, mnemonic));
        }
        out
    }

    /// Render the register/flag file as a human-readable multi-line
    /// string, for crash reports.
    pub fn dump_registers(&self) -> String {
        let cpu = &self.cpu;
        format!(
            "A={:02x} F={:02x} [{}{}{}{}{}]\nB={:02x} C={:02x}  D={:02x} E={:02x}  H={:02x} L={:02x}\nSP={:04x} PC={:04x}  bank={}  halted={}",
            cpu.a,
            cpu.f,
            if cpu.f & crate::cpu::flags::S != 0 { 'S' } else { '-' },
            if cpu.f & crate::cpu::flags::Z != 0 { 'Z' } else { '-' },
            if cpu.f & crate::cpu::flags::AC != 0 { 'A' } else { '-' },
            if cpu.f & crate::cpu::flags::P != 0 { 'P' } else { '-' },
            if cpu.f & crate::cpu::flags::C != 0 { 'C' } else { '-' },
            cpu.b,
            cpu.c,
            cpu.d,
            cpu.e,
            cpu.h,
            cpu.l,
            cpu.sp,
            cpu.pc,
            self.bus.memory.current_bank(),
            cpu.halted,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryDisk, ScriptedConsole};

    fn machine_with(firmware: &[u8]) -> Machine {
        Machine::new(
            MachineConfig::default(),
            firmware,
            vec![0xC9], // CCP stub: RET
            vec![0xC9], // BDOS stub: RET
            Box::new(ScriptedConsole::new(std::iter::empty())),
            vec![Box::new(MemoryDisk::new(vec![0; 128 * 26]))],
        )
        .unwrap()
    }

    #[test]
    fn new_machine_sets_pc_to_firmware_entry() {
        let m = machine_with(&[0x76]);
        assert_eq!(m.cpu().pc, MachineConfig::default().firmware_load_addr);
    }

    #[test]
    fn halt_stops_the_run_loop() {
        let mut m = machine_with(&[0x76]);
        let reason = m.run(None).unwrap();
        assert_eq!(reason, StopReason::Halted);
        assert!(m.cpu().halted);
    }

    #[test]
    fn undefined_opcode_is_fatal() {
        let mut m = machine_with(&[0xDD]);
        let err = m.run(None).unwrap_err();
        matches!(err, EmulatorError::UndefinedOpcode { .. });
    }

    #[test]
    fn step_budget_bounds_a_run_with_no_halt() {
        let mut m = machine_with(&[0x00, 0x00, 0x00, 0x00]);
        let reason = m.run(Some(2)).unwrap();
        assert_eq!(reason, StopReason::StepBudgetExhausted);
    }

    #[test]
    fn reset_reinitialises_registers_and_pc() {
        let mut m = machine_with(&[0x3E, 0xFF, 0x76]); // MVI A,0xFF; HLT
        m.run(None).unwrap();
        assert_eq!(m.cpu().a, 0xFF);
        m.reset();
        assert_eq!(m.cpu().a, 0);
        assert_eq!(m.cpu().pc, MachineConfig::default().firmware_load_addr);
        assert!(!m.cpu().halted);
    }

    #[test]
    fn history_records_fetched_opcodes() {
        let mut m = machine_with(&[0x00, 0x00, 0x76]);
        m.run(None).unwrap();
        let dump = m.dump_history();
        assert!(dump.contains("NOP"));
        assert!(dump.contains("HLT"));
    }
}
