//! Owned working memory for derivations
//!
//! Every buffer a derivation touches is a [`WorkBuffer`]: heap-allocated with
//! a fallible reservation, zero-initialised, and zeroized and handed back to
//! its [`BufferSource`] when dropped. Early returns and panics therefore
//! release memory the same way a successful call does.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use zeroize::Zeroize;

use crate::{Result, ScryptError};

/// Accounting hook consulted before working memory is allocated
///
/// `reserve` is called with the byte size of each buffer before the
/// allocation is attempted; `release` is called with the same size once the
/// buffer is dropped or the allocation itself failed.
pub trait BufferSource: Send + Sync {
    /// Admit a buffer of `bytes`
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::AllocationFailure`] to refuse the buffer.
    fn reserve(&self, bytes: usize) -> Result<()>;

    /// Return `bytes` previously admitted by [`reserve`](BufferSource::reserve)
    fn release(&self, bytes: usize);
}

/// Allocates straight from the global allocator with no accounting
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBuffers;

impl BufferSource for SystemBuffers {
    fn reserve(&self, _bytes: usize) -> Result<()> {
        Ok(())
    }

    fn release(&self, _bytes: usize) {}
}

/// Byte budget shared by concurrent derivations
///
/// Wrap in an `Arc` and give the same budget to every
/// [`ScryptKdf`](crate::ScryptKdf) that should draw from it; a derivation
/// that would push the total over the limit fails with
/// [`ScryptError::AllocationFailure`] instead of exhausting system memory.
#[derive(Debug)]
pub struct MemoryBudget {
    limit: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl MemoryBudget {
    /// Budget of `limit` bytes
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Configured limit in bytes
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently reserved
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest reservation seen so far
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

impl BufferSource for MemoryBudget {
    fn reserve(&self, bytes: usize) -> Result<()> {
        let previous = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current
                    .checked_add(bytes)
                    .filter(|total| *total <= self.limit)
            })
            .map_err(|_| ScryptError::allocation_failure(bytes))?;
        self.peak.fetch_max(previous + bytes, Ordering::AcqRel);
        Ok(())
    }

    fn release(&self, bytes: usize) {
        self.in_use.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Heap buffer owned by one derivation
pub struct WorkBuffer<'a, T: Zeroize + Copy + Default> {
    data: Vec<T>,
    bytes: usize,
    source: &'a dyn BufferSource,
}

impl<'a, T: Zeroize + Copy + Default> WorkBuffer<'a, T> {
    /// Acquire `len` zeroed elements from `source`
    ///
    /// # Errors
    ///
    /// - [`ScryptError::InvalidParameter`] if the byte size overflows `usize`
    /// - [`ScryptError::AllocationFailure`] if the source refuses the request
    ///   or the allocator cannot provide it
    pub fn acquire(source: &'a dyn BufferSource, len: usize) -> Result<Self> {
        let bytes = len.checked_mul(size_of::<T>()).ok_or_else(|| {
            ScryptError::invalid_parameter(format!(
                "buffer of {len} elements exceeds the address space"
            ))
        })?;
        source.reserve(bytes)?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            source.release(bytes);
            return Err(ScryptError::allocation_failure(bytes));
        }
        data.resize(len, T::default());

        Ok(Self {
            data,
            bytes,
            source,
        })
    }

    /// Size of the buffer in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes
    }

    /// Move the contents out, releasing the reservation
    ///
    /// Used for the derived key, which belongs to the caller after return.
    pub(crate) fn into_vec(mut self) -> Vec<T> {
        std::mem::take(&mut self.data)
    }
}

impl<T: Zeroize + Copy + Default> Deref for WorkBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T: Zeroize + Copy + Default> DerefMut for WorkBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Zeroize + Copy + Default> Drop for WorkBuffer<'_, T> {
    fn drop(&mut self) {
        self.data.zeroize();
        self.source.release(self.bytes);
    }
}
