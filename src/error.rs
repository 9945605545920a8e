//! Error types surfaced by the CPU core and the machine orchestrator.

use thiserror::Error;

/// Fatal conditions the core can report. Guest-observable failures (a bad
/// disk seek requested by the guest OS) are never represented here - they
/// are reported to the guest in register `A`, per the 8080 hypercall
/// contract, and never unwind the Rust call stack.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// The instruction engine fetched an opcode with no defined 8080
    /// encoding.
    #[error("undefined opcode {opcode:#04x} at {pc:#06x}")]
    UndefinedOpcode {
        /// The opcode byte that had no defined decoding.
        opcode: u8,
        /// Program counter at which the opcode was fetched.
        pc: u16,
    },

    /// `OUT imm8` selected a BIOS function number outside `0..=16`.
    #[error("unknown BIOS function {function}")]
    UnknownBiosFunction {
        /// The immediate operand of the `OUT` hypercall.
        function: u8,
    },

    /// The requested track/sector does not resolve to a valid offset on
    /// the drive (the disk analogue of `fseek` returning `EINVAL`).
    /// Reported to the guest in `A`, not fatal; `DiskStore` implementors
    /// return this instead of `DiskWriteFailed`/`DiskReadFailed` for an
    /// out-of-range seek.
    #[error("seek failed on drive {drive}: {reason}")]
    DiskSeekFailed {
        /// Drive number the seek targeted.
        drive: u8,
        /// Host-supplied description of the failure.
        reason: String,
    },

    /// A host-side disk write could not be completed once the seek
    /// succeeded (e.g. the backing medium is full or read-only). Fatal,
    /// unlike `DiskSeekFailed`.
    #[error("disk write failed on drive {drive}: {reason}")]
    DiskWriteFailed {
        /// Drive number the write targeted.
        drive: u8,
        /// Host-supplied description of the failure.
        reason: String,
    },

    /// A host-side disk read could not be completed once the seek
    /// succeeded. Unlike `DiskWriteFailed`, this is still reported to the
    /// guest in `A` rather than treated as fatal: the reference firmware
    /// never validates the outcome of a sector read, only of the seek
    /// that precedes it.
    #[error("disk read failed on drive {drive}: {reason}")]
    DiskReadFailed {
        /// Drive number the read targeted.
        drive: u8,
        /// Host-supplied description of the failure.
        reason: String,
    },

    /// The firmware/CCP/BDOS image supplied at startup does not fit in the
    /// address range reserved for it.
    #[error("image {name} ({size} bytes) does not fit at {addr:#06x}")]
    ImageTooLarge {
        /// Name of the oversized image, for diagnostics.
        name: &'static str,
        /// Size of the image in bytes.
        size: usize,
        /// Guest address the image was to be loaded at.
        addr: u16,
    },
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, EmulatorError>;
