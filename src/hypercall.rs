//! BIOS and BDOS hypercall handlers trapped via `OUT imm8` / `IN imm8`.
//!
//! Grounded in the resident-firmware convention where the jump table entry
//! for BIOS function `f` lives at `firmware_load_addr + 3*f` and simply
//! contains the trap opcode for `f`; the emulator never parses that table,
//! it only needs the function number carried in the opcode's immediate.

use crate::bus::Bus;
use crate::cpu::flags;
use crate::cpu::Cpu;
use crate::error::{EmulatorError, Result};
use log::debug;

fn write_jmp(bus: &mut Bus, at: u16, target: u16) {
    let [lo, hi] = target.to_le_bytes();
    bus.write(at, 0xC3);
    bus.write(at.wrapping_add(1), lo);
    bus.write(at.wrapping_add(2), hi);
}

/// Dispatch BIOS function `function`, selected by the immediate operand of
/// the `OUT` hypercall opcode.
pub(crate) fn bios(cpu: &mut Cpu, bus: &mut Bus, function: u8) -> Result<()> {
    debug!(
        "bios function={function} drive={:?} track={} sector={}",
        bus.disk.drive, bus.disk.track, bus.disk.sector
    );
    match function {
        0 => boot(cpu, bus),
        1 => wboot(cpu, bus),
        2 => cpu.a = if bus.console_poll() { 0xFF } else { 0x00 },
        3 => {
            let mut byte = bus.console_read();
            if byte == 0x7F {
                byte = 0x08;
            }
            cpu.a = byte;
        }
        4 => bus.console_write(cpu.c),
        5 | 6 => {}
        7 => cpu.a = 0x1A,
        8 => {
            bus.disk.track = 0;
            cpu.c = 0;
        }
        9 => seldsk(cpu, bus),
        10 => bus.disk.track = u16::from_be_bytes([cpu.b, cpu.c]),
        11 => bus.disk.sector = cpu.c as u16,
        12 => {
            let addr = u16::from_be_bytes([cpu.b, cpu.c]);
            bus.disk.dma_addr = addr;
            cpu.h = (addr >> 8) as u8;
            cpu.l = addr as u8;
        }
        13 => disk_read(cpu, bus)?,
        14 => disk_write(cpu, bus)?,
        15 => cpu.a = 0xFF,
        16 => {
            cpu.a = cpu.c;
            cpu.h = cpu.b;
            cpu.l = cpu.c;
        }
        _ => return Err(EmulatorError::UnknownBiosFunction { function }),
    }
    Ok(())
}

/// Dispatch the BDOS hypercall selected by register `C`.
pub(crate) fn bdos(cpu: &mut Cpu, bus: &mut Bus) -> Result<()> {
    debug!("bdos function={}", cpu.c);
    match cpu.c {
        1 => {
            let mut byte = bus.console_read();
            if byte == 0x7F {
                byte = 0x08;
            }
            cpu.a = byte;
            cpu.l = byte;
            bus.console_write(byte);
        }
        2 => bus.console_write(cpu.e),
        6 => {
            if cpu.e == 0xFF {
                if bus.console_poll() {
                    let byte = bus.console_read();
                    cpu.a = byte;
                    cpu.l = byte;
                } else {
                    cpu.a = 0;
                    cpu.l = 0;
                }
            } else {
                bus.console_write(cpu.e);
            }
        }
        9 => {
            let mut addr = u16::from_be_bytes([cpu.d, cpu.e]);
            loop {
                let byte = bus.read(addr);
                if byte == b'$' {
                    break;
                }
                bus.console_write(byte);
                addr = addr.wrapping_add(1);
            }
        }
        _ => {
            let entry = bus.config.bdos_base.wrapping_add(bus.config.bdos_entry_offset);
            cpu.set_pc(bus, entry);
        }
    }
    Ok(())
}

fn boot(cpu: &mut Cpu, bus: &mut Bus) {
    let ccp = bus.ccp_image.clone();
    let bdos = bus.bdos_image.clone();
    bus.memory.load_image(bus.config.ccp_base, &ccp);
    bus.memory.load_image(bus.config.bdos_base, &bdos);

    let wboot_entry = bus.config.firmware_load_addr.wrapping_add(3);
    write_jmp(bus, 0x0000, wboot_entry);

    let bdos_entry = bus.config.bdos_base.wrapping_add(bus.config.bdos_entry_offset);
    write_jmp(bus, 0x0005, bdos_entry);
    bus.write(bdos_entry, 0xDB);
    bus.write(bdos_entry.wrapping_add(1), 0x00);
    bus.write(bdos_entry.wrapping_add(2), 0xC9);

    for &byte in b"64K CP/M 2.2 VERS B01\r\n" {
        bus.console_write(byte);
    }

    wboot(cpu, bus);
}

fn wboot(cpu: &mut Cpu, bus: &mut Bus) {
    let ccp = bus.ccp_image.clone();
    bus.memory.load_image(bus.config.ccp_base, &ccp);

    let drive = bus.disk.drive.unwrap_or(0);
    cpu.a = 0;
    cpu.b = 0;
    cpu.d = 0;
    cpu.e = 0;
    cpu.h = 0;
    cpu.l = 0;
    cpu.f = flags::RESET;
    cpu.c = drive;
    cpu.set_pc(bus, bus.config.ccp_base);
}

fn seldsk(cpu: &mut Cpu, bus: &mut Bus) {
    if cpu.c < bus.config.drive_count {
        bus.disk.drive = Some(cpu.c);
        let dpbase = bus.config.dpbase.wrapping_add(16 * cpu.c as u16);
        cpu.h = (dpbase >> 8) as u8;
        cpu.l = dpbase as u8;
    } else {
        bus.disk.drive = None;
        cpu.h = 0;
        cpu.l = 0;
    }
}

/// BIOS function 13 (READ). The reference firmware only ever checks the
/// outcome of the seek, not of the sector read itself, so every failure
/// here - a bad seek or a host-side read error - is reported to the guest
/// in `A` rather than treated as fatal.
fn disk_read(cpu: &mut Cpu, bus: &mut Bus) -> Result<()> {
    let offset = bus.config.sector_offset(bus.disk.track, bus.disk.sector);
    let dma = bus.disk.dma_addr;
    let drive = bus.disk.drive;
    match drive.and_then(|d| bus.drive(d)) {
        Some(disk) => {
            let mut buf = [0u8; 128];
            match disk.read_sector(offset, &mut buf) {
                Ok(()) => {
                    for (i, &byte) in buf.iter().enumerate() {
                        bus.write(dma.wrapping_add(i as u16), byte);
                    }
                    cpu.a = 0;
                }
                Err(_) => cpu.a = 1,
            }
        }
        None => cpu.a = 1,
    }
    Ok(())
}

/// BIOS function 14 (WRITE). A seek failure is guest-visible (`A = 1`);
/// a write failure past a successful seek is a host-side fault and is
/// fatal.
fn disk_write(cpu: &mut Cpu, bus: &mut Bus) -> Result<()> {
    let offset = bus.config.sector_offset(bus.disk.track, bus.disk.sector);
    let dma = bus.disk.dma_addr;
    let mut buf = [0u8; 128];
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = bus.read(dma.wrapping_add(i as u16));
    }
    let drive = bus.disk.drive;
    match drive.and_then(|d| bus.drive(d)) {
        Some(disk) => match disk.write_sector(offset, &buf) {
            Ok(()) => cpu.a = 0,
            Err(EmulatorError::DiskSeekFailed { .. }) => cpu.a = 1,
            Err(other) => return Err(other),
        },
        None => cpu.a = 1,
    }
    Ok(())
}
