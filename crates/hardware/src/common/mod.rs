//! Common types shared by the decoder, the memory target and the loader.
//!
//! Currently this is the error taxonomy: decode faults, bus faults and
//! image load faults.

/// Error types for decoding, memory transactions and image loading.
pub mod error;

pub use error::{DecodeError, LoadError, MemoryError};
