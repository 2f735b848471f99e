//! Load/store transactions against the memory target.
//!
//! A [`Transaction`] borrows the initiator's payload for the duration of one
//! [`MemoryTarget::transact`](super::MemoryTarget::transact) call. Its length
//! is the payload length; reads fill a mutable buffer, writes drain a shared
//! one.

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Copy from memory into the payload.
    Read,
    /// Copy from the payload into memory.
    Write,
}

/// Borrowed data of a transaction; the variant fixes the direction.
#[derive(Debug)]
pub(super) enum Payload<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

/// One load or store request.
#[derive(Debug)]
pub struct Transaction<'a> {
    address: u64,
    payload: Payload<'a>,
    debug: bool,
}

impl<'a> Transaction<'a> {
    /// Timed read of `out.len()` bytes at `address` into `out`.
    pub fn read(address: u64, out: &'a mut [u8]) -> Self {
        Self {
            address,
            payload: Payload::Read(out),
            debug: false,
        }
    }

    /// Timed write of `data` at `address`.
    pub fn write(address: u64, data: &'a [u8]) -> Self {
        Self {
            address,
            payload: Payload::Write(data),
            debug: false,
        }
    }

    /// Marks the transaction as a debug access: untimed, any length, and
    /// never disturbs outstanding direct-access grants.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Direction of the transaction.
    pub const fn command(&self) -> Command {
        match self.payload {
            Payload::Read(_) => Command::Read,
            Payload::Write(_) => Command::Write,
        }
    }

    /// First byte address.
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// Number of bytes to move.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for debug accesses.
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// The payload bytes: the read buffer as it stands, or the write data.
    pub fn data(&self) -> &[u8] {
        match &self.payload {
            Payload::Read(out) => &**out,
            Payload::Write(data) => &**data,
        }
    }

    pub(super) fn payload_mut(&mut self) -> &mut Payload<'a> {
        &mut self.payload
    }

    /// Last byte address touched, `None` for an empty payload or one that
    /// would wrap the address space.
    pub(super) fn last_address(&self) -> Option<u64> {
        let len = self.len() as u64;
        len.checked_sub(1)
            .and_then(|span| self.address.checked_add(span))
    }
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Time the access took; zero for debug transactions.
    pub latency: u64,
    /// Bytes moved.
    pub bytes: usize,
    /// The initiator may request a direct-access grant for this address
    /// instead of issuing further transactions. False when the target has
    /// direct access disabled, and for debug transactions.
    pub dmi_allowed: bool,
}
