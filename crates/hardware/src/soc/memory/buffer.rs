//! Backing storage for the memory target.
//!
//! [`MemoryBuffer`] owns one zero-initialized allocation with bounds-checked
//! copy-in/copy-out. Reads take `&self` and writes take `&mut self`, so the
//! borrow checker keeps copies from overlapping. The target and every
//! outstanding direct-access grant reach the same buffer through a
//! [`SharedBuffer`], whose lock is held for the whole of each copy.
//!
//! On Unix the allocation is an anonymous `mmap`, which the OS hands back
//! already zeroed; elsewhere it is a leaked `Vec`.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::error::MemoryError;

/// Raw byte storage.
pub(crate) struct MemoryBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer uniquely owns its allocation, which has no thread
// affinity.
unsafe impl Send for MemoryBuffer {}
// SAFETY: `&self` methods only read the allocation; every write goes through
// `&mut self`.
unsafe impl Sync for MemoryBuffer {}

impl MemoryBuffer {
    /// Allocates `size` zeroed bytes.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Allocation`] when `size` is zero or the host refuses the
    /// mapping.
    pub(crate) fn new(size: usize) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::Allocation { size });
        }

        #[cfg(unix)]
        {
            // SAFETY: anonymous private mapping with no address hint; the
            // result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                return Err(MemoryError::Allocation { size });
            }

            Ok(Self {
                ptr: ptr.cast::<u8>(),
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size].into_boxed_slice();
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }

    /// Size of the buffer in bytes.
    pub(crate) const fn len(&self) -> usize {
        self.size
    }

    /// Validates `[offset, offset + len)` and returns `offset` as an index.
    fn span(&self, offset: u64, len: usize) -> Result<usize, MemoryError> {
        let fits = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(len).map(|end| (start, end)))
            .filter(|&(_, end)| end <= self.size);

        match fits {
            Some((start, _)) => Ok(start),
            None => Err(MemoryError::OutOfRange {
                addr: offset,
                len: len as u64,
                capacity: self.size as u64,
            }),
        }
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if any byte lies past the end; `out` is
    /// left untouched.
    pub(crate) fn read(&self, offset: u64, out: &mut [u8]) -> Result<(), MemoryError> {
        let start = self.span(offset, out.len())?;
        // SAFETY: `span` proved `start + out.len() <= size`, and `out` is a
        // distinct Rust allocation, so the ranges cannot overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.add(start), out.as_mut_ptr(), out.len());
        }
        Ok(())
    }

    /// Copies `data` into the buffer starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if any byte lies past the end; nothing is
    /// written.
    pub(crate) fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), MemoryError> {
        let start = self.span(offset, data.len())?;
        // SAFETY: as in `read`, the destination range is in bounds, and
        // `&mut self` excludes any concurrent copy.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(start), data.len());
        }
        Ok(())
    }
}

impl Drop for MemoryBuffer {
    fn drop(&mut self) {
        release(self.ptr, self.size, self.is_mmap);
    }
}

#[cfg(unix)]
fn release(ptr: *mut u8, size: usize, is_mmap: bool) {
    if is_mmap {
        // SAFETY: `ptr`/`size` are exactly what `mmap` returned in `new`.
        let _ = unsafe { libc::munmap(ptr.cast::<libc::c_void>(), size) };
    }
}

#[cfg(not(unix))]
fn release(ptr: *mut u8, size: usize, is_mmap: bool) {
    if !is_mmap {
        // SAFETY: rebuilds the boxed slice leaked in `new`.
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, size)) });
    }
}

impl fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("size", &self.size)
            .field("is_mmap", &self.is_mmap)
            .finish_non_exhaustive()
    }
}

/// Storage shared by a target and its grants.
///
/// Every copy runs under the lock, so a grant access either completes before
/// a target write starts or observes the revocation that preceded it.
#[derive(Clone)]
pub(crate) struct SharedBuffer {
    inner: Arc<RwLock<MemoryBuffer>>,
    size: usize,
}

impl SharedBuffer {
    pub(crate) fn new(size: usize) -> Result<Self, MemoryError> {
        Ok(Self {
            inner: Arc::new(RwLock::new(MemoryBuffer::new(size)?)),
            size,
        })
    }

    /// Size in bytes; fixed at allocation.
    pub(crate) const fn len(&self) -> usize {
        self.size
    }

    // A panic mid-copy leaves plain bytes behind, so poisoning is ignored.
    pub(crate) fn lock_read(&self) -> RwLockReadGuard<'_, MemoryBuffer> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_write(&self) -> RwLockWriteGuard<'_, MemoryBuffer> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
