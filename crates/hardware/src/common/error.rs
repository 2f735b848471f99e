//! Error taxonomy for the decoder, the memory target and the image loader.
//!
//! This module defines the three fault classes the core reports:
//! 1. **Decode faults:** an encoding outside the RV32I table (recoverable).
//! 2. **Bus faults:** a transaction or grant access that cannot be served
//!    (recoverable, no side effects).
//! 3. **Load faults:** a program image that cannot be trusted (fatal for
//!    initialization).

use std::io;
use std::path::PathBuf;

/// Instruction decode failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No RV32I instruction matches the opcode/funct3/funct7 combination.
    #[error("unrecognized instruction encoding {0:#010x}")]
    Unrecognized(u32),
}

/// Memory target fault.
///
/// Every variant is reported before any byte is read or written.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The access does not fit inside `[0, capacity)`.
    #[error("access of {len} bytes at {addr:#x} outside memory of {capacity} bytes")]
    OutOfRange {
        /// First byte address of the access.
        addr: u64,
        /// Number of bytes requested.
        len: u64,
        /// Memory capacity in bytes.
        capacity: u64,
    },

    /// A timed transaction moved zero bytes or more than the bus width.
    #[error("burst of {len} bytes not supported by a {width}-byte bus")]
    Burst {
        /// Number of bytes requested.
        len: usize,
        /// Bus width in bytes.
        width: usize,
    },

    /// The direct-access grant was invalidated by the target.
    #[error("direct access grant [{start:#x}, {end:#x}] has been revoked")]
    GrantRevoked {
        /// First byte covered by the grant.
        start: u64,
        /// Last byte covered by the grant.
        end: u64,
    },

    /// The access is not fully covered by the direct-access grant.
    #[error("access of {len} bytes at {addr:#x} outside grant [{start:#x}, {end:#x}]")]
    OutsideGrant {
        /// First byte address of the access.
        addr: u64,
        /// Number of bytes requested.
        len: u64,
        /// First byte covered by the grant.
        start: u64,
        /// Last byte covered by the grant.
        end: u64,
    },

    /// The target was configured without direct access.
    #[error("direct access is disabled on this target")]
    DirectAccessDisabled,

    /// The host could not allocate the backing storage.
    #[error("failed to allocate {size} bytes of backing storage")]
    Allocation {
        /// Requested size in bytes, saturated at `usize::MAX` when the
        /// configured word count overflows.
        size: usize,
    },
}

/// Program image load failure.
///
/// Memory is left untouched whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("failed to read image {}: {source}", path.display())]
    Io {
        /// Path of the image file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A record is structurally invalid.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number of the record.
        line: usize,
        /// What is wrong with the record.
        reason: String,
    },

    /// An Intel HEX record checksum does not match its contents.
    #[error("line {line}: checksum mismatch (record says {expected:#04x}, computed {computed:#04x})")]
    Checksum {
        /// 1-based line number of the record.
        line: usize,
        /// Checksum byte stored in the record.
        expected: u8,
        /// Checksum computed over the record.
        computed: u8,
    },

    /// A record places data outside the memory.
    #[error("line {line}: {len} bytes at {addr:#x} do not fit in memory of {capacity} bytes")]
    OutOfRange {
        /// 1-based line number of the record.
        line: usize,
        /// Target address of the record.
        addr: u64,
        /// Number of data bytes in the record.
        len: usize,
        /// Memory capacity in bytes.
        capacity: u64,
    },

    /// An Intel HEX image ended without its end-of-file record.
    #[error("image ends without an end-of-file record")]
    MissingEndOfFile,

    /// The memory target could not be created or written.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl LoadError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
