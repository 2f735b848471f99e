//! Memory-mapped bus target.
//!
//! This module implements the simulated main memory. It provides:
//! 1. **Buffer:** Zeroed backing storage shared with direct-access grants.
//! 2. **Transactions:** Timed and debug loads/stores with bounds checking.
//! 3. **Direct access:** Grant/invalidate protocol for unmediated access.
//! 4. **Controller:** Latency model reported for timed transactions.
//! 5. **Loading:** Program images committed before simulation starts.

/// Zeroed backing storage shared between the target and its grants.
mod buffer;

/// Memory controller implementations for access latency modeling.
pub mod controller;

/// Direct-access grants and the invalidation backward path.
pub mod dmi;

/// Transaction and completion types.
pub mod transaction;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use self::buffer::SharedBuffer;
use self::controller::{MemoryController, SimpleController};
use self::dmi::GrantRecord;
use crate::common::error::{LoadError, MemoryError};
use crate::config::{Config, MemoryConfig};
use crate::isa::Instruction;
use crate::sim::loader::{self, Image, ImageFormat, LoadSummary};

pub use self::dmi::{DirectAccessGrant, InvalidationListener};
use self::transaction::Payload;
pub use self::transaction::{Command, Completion, Transaction};

/// Fixed-capacity memory serving transactions one at a time.
///
/// Every operation that can change memory takes `&mut self`, so transactions
/// against one target never interleave. Initiators on several threads share
/// a target through `Arc<Mutex<MemoryTarget>>`.
pub struct MemoryTarget {
    buffer: SharedBuffer,
    controller: Box<dyn MemoryController>,
    latency: u64,
    bus_width: usize,
    direct_access: bool,
    grants: Vec<GrantRecord>,
    listener: Option<Arc<dyn InvalidationListener>>,
}

impl MemoryTarget {
    /// Creates a zeroed memory with a fixed-latency controller.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Allocation`] if the backing storage cannot be created.
    pub fn new(config: &MemoryConfig) -> Result<Self, MemoryError> {
        Self::with_controller(config, Box::new(SimpleController::new(config.latency)))
    }

    /// Creates a zeroed memory that asks `controller` for timed latencies.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Allocation`] if the backing storage cannot be created,
    /// including a word count whose byte size overflows `usize`.
    pub fn with_controller(
        config: &MemoryConfig,
        controller: Box<dyn MemoryController>,
    ) -> Result<Self, MemoryError> {
        let size = config.size_bytes().ok_or(MemoryError::Allocation {
            size: config.size_words.saturating_mul(4),
        })?;
        let buffer = SharedBuffer::new(size)?;
        debug!(
            size = buffer.len(),
            latency = config.latency,
            bus_width = config.bus_width,
            direct_access = config.direct_access,
            "memory target created"
        );
        Ok(Self {
            buffer,
            controller,
            latency: config.latency,
            bus_width: config.bus_width,
            direct_access: config.direct_access,
            grants: Vec::new(),
            listener: None,
        })
    }

    /// Creates a memory and preloads it from an image file.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`]; no target is returned for an untrustworthy image.
    pub fn from_image(
        config: &MemoryConfig,
        path: impl AsRef<Path>,
        format: ImageFormat,
    ) -> Result<Self, LoadError> {
        let mut target = Self::new(config)?;
        let _ = target.load_image(path, format)?;
        Ok(target)
    }

    /// Creates a memory from a full configuration, loading its image if one
    /// is configured.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`].
    pub fn from_config(config: &Config) -> Result<Self, LoadError> {
        match &config.image {
            Some(image) => Self::from_image(&config.memory, &image.path, image.format),
            None => Ok(Self::new(&config.memory)?),
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Installs the backward path notified on every grant invalidation.
    pub fn set_invalidation_listener(&mut self, listener: Arc<dyn InvalidationListener>) {
        self.listener = Some(listener);
    }

    /// Serves one transaction to completion.
    ///
    /// Timed transactions must move between one byte and the bus width. A
    /// timed write invalidates every grant it overlaps before any byte
    /// changes. Debug transactions skip the width check, report zero latency
    /// and leave grants alone.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] or [`MemoryError::Burst`]; on error no
    /// byte of memory or payload is modified.
    pub fn transact(&mut self, trans: &mut Transaction<'_>) -> Result<Completion, MemoryError> {
        let addr = trans.address();
        let len = trans.len();

        let in_range = trans
            .last_address()
            .map_or(addr <= self.capacity() && len == 0, |last| {
                last < self.capacity()
            });
        if !in_range {
            debug!(addr, len, capacity = self.capacity(), "transaction out of range");
            return Err(MemoryError::OutOfRange {
                addr,
                len: len as u64,
                capacity: self.capacity(),
            });
        }

        if !trans.is_debug() && (len == 0 || len > self.bus_width) {
            debug!(addr, len, width = self.bus_width, "unsupported burst");
            return Err(MemoryError::Burst {
                len,
                width: self.bus_width,
            });
        }

        if trans.command() == Command::Write && !trans.is_debug() {
            if let Some(last) = trans.last_address() {
                let _ = self.revoke_overlapping(addr, last);
            }
        }

        match trans.payload_mut() {
            Payload::Read(out) => self.buffer.lock_read().read(addr, out)?,
            Payload::Write(data) => self.buffer.lock_write().write(addr, data)?,
        }

        let latency = if trans.is_debug() {
            0
        } else {
            self.controller.access_latency(addr, trans.command())
        };
        trace!(?trans, latency, "transaction complete");

        Ok(Completion {
            latency,
            bytes: len,
            dmi_allowed: self.direct_access && !trans.is_debug(),
        })
    }

    /// Timed little-endian word read.
    ///
    /// # Errors
    ///
    /// As [`MemoryTarget::transact`].
    pub fn read_u32(&mut self, addr: u64) -> Result<u32, MemoryError> {
        let mut bytes = [0u8; 4];
        let _ = self.transact(&mut Transaction::read(addr, &mut bytes))?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Timed little-endian word write.
    ///
    /// # Errors
    ///
    /// As [`MemoryTarget::transact`].
    pub fn write_u32(&mut self, addr: u64, val: u32) -> Result<(), MemoryError> {
        let bytes = val.to_le_bytes();
        let _ = self.transact(&mut Transaction::write(addr, &bytes))?;
        Ok(())
    }

    /// Fetches the instruction word at `pc`.
    ///
    /// # Errors
    ///
    /// As [`MemoryTarget::transact`].
    pub fn fetch(&mut self, pc: u64) -> Result<Instruction, MemoryError> {
        self.read_u32(pc).map(Instruction::new)
    }

    /// Untimed read of `out.len()` bytes for inspection.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`].
    pub fn debug_read(&mut self, addr: u64, out: &mut [u8]) -> Result<usize, MemoryError> {
        self.transact(&mut Transaction::read(addr, out).debug())
            .map(|done| done.bytes)
    }

    /// Untimed write of `data` for tooling; never invalidates grants.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`].
    pub fn debug_write(&mut self, addr: u64, data: &[u8]) -> Result<usize, MemoryError> {
        self.transact(&mut Transaction::write(addr, data).debug())
            .map(|done| done.bytes)
    }

    /// Grants direct access to the inclusive range `[start, end]`.
    ///
    /// Any outstanding grant overlapping the range is invalidated first.
    ///
    /// # Errors
    ///
    /// [`MemoryError::DirectAccessDisabled`] if the target was configured
    /// without direct access, [`MemoryError::OutOfRange`] if the range is
    /// empty or leaves memory; the caller falls back to
    /// [`MemoryTarget::transact`].
    pub fn request_direct_access(
        &mut self,
        start: u64,
        end: u64,
    ) -> Result<DirectAccessGrant, MemoryError> {
        if !self.direct_access {
            debug!(start, end, "direct access disabled");
            return Err(MemoryError::DirectAccessDisabled);
        }
        if start > end || end >= self.capacity() {
            debug!(start, end, "direct access denied");
            let len = if start > end {
                0
            } else {
                (end - start).saturating_add(1)
            };
            return Err(MemoryError::OutOfRange {
                addr: start,
                len,
                capacity: self.capacity(),
            });
        }

        let _ = self.revoke_overlapping(start, end);

        let (grant, record) =
            DirectAccessGrant::issue(self.buffer.clone(), start, end, self.latency);
        self.grants.push(record);
        debug!(start, end, outstanding = self.grants.len(), "direct access granted");
        Ok(grant)
    }

    /// Revokes every outstanding grant overlapping `[start, end]`.
    ///
    /// Returns the number of grants revoked.
    pub fn invalidate_direct_access(&mut self, start: u64, end: u64) -> usize {
        self.revoke_overlapping(start, end)
    }

    /// Number of grants issued, not yet revoked and still held.
    pub fn outstanding_grants(&self) -> usize {
        self.grants
            .iter()
            .filter(|record| !record.is_abandoned())
            .count()
    }

    /// Loads a program image, replacing the bytes it covers.
    ///
    /// The whole image is parsed and bounds-checked before the first byte is
    /// written, so on error memory keeps its previous contents. Outstanding
    /// grants are invalidated before the image is committed.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`].
    pub fn load_image(
        &mut self,
        path: impl AsRef<Path>,
        format: ImageFormat,
    ) -> Result<LoadSummary, LoadError> {
        let path = path.as_ref();
        let image = loader::read_image(path, format).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "program image rejected");
        })?;
        let summary = self.commit(&image)?;
        debug!(path = %path.display(), ?format, ?summary, "program image loaded");
        Ok(summary)
    }

    /// Loads a program image from text already in memory.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`] except [`LoadError::Io`].
    pub fn load_image_text(
        &mut self,
        text: &str,
        format: ImageFormat,
    ) -> Result<LoadSummary, LoadError> {
        let image = loader::parse_image(text, format)?;
        self.commit(&image)
    }

    fn commit(&mut self, image: &Image) -> Result<LoadSummary, LoadError> {
        image.check_fits(self.capacity())?;
        if let Some(last) = self.capacity().checked_sub(1) {
            let _ = self.revoke_overlapping(0, last);
        }
        let mut storage = self.buffer.lock_write();
        for segment in &image.segments {
            storage.write(segment.addr, &segment.data)?;
        }
        Ok(image.summary())
    }

    /// Revokes held grants overlapping `[start, end]` and forgets every
    /// abandoned record along the way. Returns the number of held grants
    /// revoked.
    fn revoke_overlapping(&mut self, start: u64, end: u64) -> usize {
        let listener = self.listener.clone();
        let mut revoked = 0;

        self.grants.retain(|record| {
            if record.is_abandoned() {
                return false;
            }
            if !record.overlaps(start, end) {
                return true;
            }
            record.revoke();
            revoked += 1;
            debug!(start = record.start, end = record.end, "direct access invalidated");
            if let Some(listener) = &listener {
                listener.invalidate_direct_access(record.start, record.end);
            }
            false
        });

        revoked
    }
}

impl fmt::Debug for MemoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTarget")
            .field("capacity", &self.buffer.len())
            .field("latency", &self.latency)
            .field("bus_width", &self.bus_width)
            .field("direct_access", &self.direct_access)
            .field("grants", &self.outstanding_grants())
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
