//! 8080 CPU test suite, organized into:
//! - instructions.rs: instruction-family tests (data movement, ALU,
//!   control flow, stack)
//! - properties.rs: the universal properties and concrete end-to-end
//!   scenarios every instruction sequence must satisfy
//!
//! # References
//! - Intel 8080 Microcomputer Systems User's Manual

use super::*;
use crate::bus::Bus;
use crate::config::MachineConfig;
use crate::error::EmulatorError;
use crate::host::{MemoryDisk, ScriptedConsole};

mod properties;

/// A bus with no disk images and an empty console, for tests that only
/// exercise the register file and memory.
fn test_bus() -> Bus {
    Bus::new(
        MachineConfig::default(),
        Box::new(ScriptedConsole::new(std::iter::empty())),
        vec![Box::new(MemoryDisk::new(vec![0; 128 * 26]))],
        Vec::new(),
        Vec::new(),
    )
}

/// Load `program` at `cpu.pc` (default 0) and single-step `steps` times.
fn run(cpu: &mut Cpu, bus: &mut Bus, program: &[u8], steps: usize) {
    bus.memory.load_image(cpu.pc, program);
    for _ in 0..steps {
        cpu.step(bus).expect("instruction should not fault");
    }
}
