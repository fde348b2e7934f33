use core::ffi::c_char;
use core::mem;
use core::ptr::{self, NonNull};

use super::PoolAllocator;
use crate::error::ParseError;

/// A NUL-terminated byte string owned by a pool block.
///
/// Frees itself on drop, so a half-built result unwinds cleanly when a
/// later allocation fails. `into_raw` hands ownership to the boundary.
pub struct PoolCStr<'p> {
    ptr: NonNull<u8>,
    pool: &'p dyn PoolAllocator,
}

impl<'p> PoolCStr<'p> {
    /// Copy `bytes` into a fresh pool block and append the terminator.
    ///
    /// `bytes` must not contain NUL; the parser rejects such input before
    /// anything reaches this point.
    pub fn copy_from(pool: &'p dyn PoolAllocator, bytes: &[u8]) -> Result<Self, ParseError> {
        debug_assert!(!bytes.contains(&0));

        let size = bytes
            .len()
            .checked_add(1)
            .ok_or(ParseError::AllocationFailure)?;
        let ptr = NonNull::new(pool.allocate(size)).ok_or(ParseError::AllocationFailure)?;

        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            ptr.as_ptr().add(bytes.len()).write(0);
        }

        Ok(Self { ptr, pool })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr() as *const c_char
    }

    /// Give up ownership. The caller is now responsible for freeing the
    /// block on the same pool.
    pub fn into_raw(self) -> *const c_char {
        let raw = self.as_ptr();
        mem::forget(self);
        raw
    }
}

impl Drop for PoolCStr<'_> {
    fn drop(&mut self) {
        unsafe { self.pool.free(self.ptr.as_ptr()) };
    }
}
