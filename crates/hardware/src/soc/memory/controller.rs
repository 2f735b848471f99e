//! Memory controller latency models.
//!
//! The target asks its controller how long each timed transaction takes and
//! reports that figure back to the initiator for scheduling. Debug
//! transactions never consult the controller.

use super::transaction::Command;

/// Trait for memory controller implementations that report access latency.
///
/// Implementors must be `Send + Sync` so the target can be shared between
/// initiators behind a lock.
pub trait MemoryController: Send + Sync {
    /// Returns the latency of one timed access.
    ///
    /// # Arguments
    ///
    /// * `addr` - First byte address of the access.
    /// * `command` - Direction of the access.
    fn access_latency(&mut self, addr: u64, command: Command) -> u64;
}

/// Fixed-latency controller; every access takes the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller that reports `latency` for every access.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }

    /// The constant latency reported by this controller.
    pub const fn latency(&self) -> u64 {
        self.latency
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64, _command: Command) -> u64 {
        self.latency
    }
}
