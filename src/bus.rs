//! System bus: banked guest memory plus the host-services handle the
//! hypercall shim dispatches into.
//!
//! Every `OUT imm8` / `IN imm8` the instruction engine decodes is routed
//! through here rather than handled inline, the same way the teacher's
//! eZ80 core treats `OUT (n),A` / `IN A,(n)` as bus-mediated port access
//! instead of CPU-local state.

use crate::config::MachineConfig;
use crate::host::{ConsoleIo, DiskStore};
use crate::memory::BankedMemory;

/// Disk controller state the BIOS `SETTRK`/`SETSEC`/`SETDMA`/`SELDSK`
/// hypercalls mutate and `READ`/`WRITE` consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskController {
    /// Currently selected drive, `None` until `SELDSK` picks a valid one.
    pub drive: Option<u8>,
    /// Current track, set by `SETTRK`.
    pub track: u16,
    /// Current sector, set by `SETSEC`.
    pub sector: u16,
    /// Current DMA address, set by `SETDMA`.
    pub dma_addr: u16,
}

/// Banked guest memory plus the host collaborators the hypercall shim
/// calls into. Owned by the `Machine` orchestrator and borrowed for the
/// duration of a single `Cpu::step`.
pub struct Bus {
    /// The 64 KiB banked guest address space.
    pub memory: BankedMemory,
    /// Disk geometry and well-known guest addresses.
    pub config: MachineConfig,
    /// Disk controller register state.
    pub disk: DiskController,
    /// CCP image, reinstalled into guest memory on every `BOOT`/`WBOOT`.
    pub ccp_image: Vec<u8>,
    /// BDOS image, installed into guest memory on `BOOT`.
    pub bdos_image: Vec<u8>,
    console: Box<dyn ConsoleIo>,
    disks: Vec<Box<dyn DiskStore>>,
}

impl Bus {
    /// Build a bus around the given host collaborators, configuration, and
    /// the CCP/BDOS images `BOOT`/`WBOOT` (re)install on every (re)boot.
    pub fn new(
        config: MachineConfig,
        console: Box<dyn ConsoleIo>,
        disks: Vec<Box<dyn DiskStore>>,
        ccp_image: Vec<u8>,
        bdos_image: Vec<u8>,
    ) -> Self {
        Self {
            memory: BankedMemory::new(),
            config,
            disk: DiskController::default(),
            ccp_image,
            bdos_image,
            console,
            disks,
        }
    }

    /// Read a byte from guest memory.
    pub fn read(&self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    /// Write a byte to guest memory.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.memory.write(addr, value);
    }

    /// Diagnostic-only read, never mutates state.
    pub fn peek(&self, addr: u16) -> u8 {
        self.memory.peek(addr)
    }

    /// True if a host input byte is ready without blocking.
    pub fn console_poll(&mut self) -> bool {
        self.console.poll()
    }

    /// Block until a host input byte is available.
    pub fn console_read(&mut self) -> u8 {
        self.console.read_blocking()
    }

    /// Emit a byte to the host console.
    pub fn console_write(&mut self, byte: u8) {
        self.console.write(byte)
    }

    /// Drive `n`, if `n` names a drive this bus was configured with.
    pub fn drive(&mut self, n: u8) -> Option<&mut Box<dyn DiskStore>> {
        if n < self.config.drive_count {
            self.disks.get_mut(n as usize)
        } else {
            None
        }
    }
}
