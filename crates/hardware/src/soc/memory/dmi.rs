//! Direct memory access grants.
//!
//! A [`DirectAccessGrant`] lets an initiator read and write a byte range of
//! the target's storage without issuing transactions. The target keeps a
//! `GrantRecord` for every grant it hands out; both sides share one
//! revocation flag. Once the target sets the flag, every access through the
//! grant fails with [`MemoryError::GrantRevoked`] and the holder must request
//! a new grant.
//!
//! A grant checks the flag while holding the storage lock, and the target
//! sets it before taking that lock for a conflicting write. An access that
//! passed the check therefore finishes before the write begins.
//!
//! Lifecycle: `Unissued -> Granted -> Invalidated`. There is no renewal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::buffer::SharedBuffer;
use crate::common::error::MemoryError;

/// Backward path notified when the target revokes a grant.
///
/// The call arrives after the grant's revocation flag is set, so a holder
/// that checks [`DirectAccessGrant::is_revoked`] from inside the callback
/// already sees `true`.
pub trait InvalidationListener: Send + Sync {
    /// The grant covering `[start, end]` (inclusive) is no longer valid.
    fn invalidate_direct_access(&self, start: u64, end: u64);
}

/// Lease over an inclusive byte range of the target's storage.
#[derive(Debug)]
pub struct DirectAccessGrant {
    start: u64,
    end: u64,
    latency: u64,
    buffer: SharedBuffer,
    revoked: Arc<AtomicBool>,
}

impl DirectAccessGrant {
    pub(super) fn issue(
        buffer: SharedBuffer,
        start: u64,
        end: u64,
        latency: u64,
    ) -> (Self, GrantRecord) {
        let revoked = Arc::new(AtomicBool::new(false));
        let record = GrantRecord {
            start,
            end,
            revoked: Arc::clone(&revoked),
        };
        let grant = Self {
            start,
            end,
            latency,
            buffer,
            revoked,
        };
        (grant, record)
    }

    /// First byte covered.
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Last byte covered (inclusive).
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Access latency the holder should model for each direct access.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// True once the target has invalidated this grant.
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// True if `[addr, addr + len)` lies inside the granted range.
    pub const fn contains(&self, addr: u64, len: u64) -> bool {
        if len == 0 {
            return addr >= self.start && addr <= self.end;
        }
        match addr.checked_add(len - 1) {
            Some(last) => addr >= self.start && last <= self.end,
            None => false,
        }
    }

    /// Must be called with the storage lock held.
    fn check(&self, addr: u64, len: usize) -> Result<(), MemoryError> {
        if self.is_revoked() {
            return Err(MemoryError::GrantRevoked {
                start: self.start,
                end: self.end,
            });
        }
        if !self.contains(addr, len as u64) {
            return Err(MemoryError::OutsideGrant {
                addr,
                len: len as u64,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Reads `out.len()` bytes at `addr` directly from storage.
    ///
    /// # Errors
    ///
    /// [`MemoryError::GrantRevoked`] after invalidation,
    /// [`MemoryError::OutsideGrant`] for an access not covered by the grant.
    pub fn read(&self, addr: u64, out: &mut [u8]) -> Result<(), MemoryError> {
        let storage = self.buffer.lock_read();
        self.check(addr, out.len())?;
        storage.read(addr, out)
    }

    /// Writes `data` at `addr` directly to storage.
    ///
    /// # Errors
    ///
    /// Same as [`DirectAccessGrant::read`].
    pub fn write(&self, addr: u64, data: &[u8]) -> Result<(), MemoryError> {
        let mut storage = self.buffer.lock_write();
        self.check(addr, data.len())?;
        storage.write(addr, data)
    }

    /// Reads a little-endian word.
    ///
    /// # Errors
    ///
    /// Same as [`DirectAccessGrant::read`].
    pub fn read_u32(&self, addr: u64) -> Result<u32, MemoryError> {
        let mut bytes = [0u8; 4];
        self.read(addr, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Writes a little-endian word.
    ///
    /// # Errors
    ///
    /// Same as [`DirectAccessGrant::read`].
    pub fn write_u32(&self, addr: u64, val: u32) -> Result<(), MemoryError> {
        self.write(addr, &val.to_le_bytes())
    }
}

/// Target-side bookkeeping for one outstanding grant.
#[derive(Debug)]
pub(super) struct GrantRecord {
    pub(super) start: u64,
    pub(super) end: u64,
    revoked: Arc<AtomicBool>,
}

impl GrantRecord {
    /// True if `[start, end]` shares at least one byte with this grant.
    pub(super) const fn overlaps(&self, start: u64, end: u64) -> bool {
        start <= self.end && self.start <= end
    }

    pub(super) fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    /// True once the holder has dropped its grant; the record can be
    /// forgotten without notifying anyone.
    pub(super) fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.revoked) == 1
    }
}
