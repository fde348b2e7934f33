//! Boundary values handed to the C++ loader.
//!
//! Layout rules the loader relies on:
//! - every string is NUL-terminated and pool-owned; only `default_os` may be null
//! - the entry array carries `len` and `capacity`; an empty array is a
//!   dangling (aligned, non-null) pointer with capacity 0 and owns nothing
//! - nothing points into the input buffer
//!
//! Values are move-only and have no `Drop`: they leave this crate by value
//! and come back by value for teardown (see `teardown`).

mod teardown;
mod wide;

use core::ffi::{c_char, CStr};
use core::mem::{self, align_of, size_of};
use core::ptr::{self, NonNull};
use core::slice;

use static_assertions::const_assert_eq;

use crate::bridge::{PoolAllocator, PoolCStr};
use crate::error::ParseError;
use crate::parser::{BootEntry, Options};

pub use wide::display_name_utf16;

/// One boot entry as the loader sees it.
#[must_use = "entries own pool memory; destroy them"]
#[repr(C)]
#[derive(Debug)]
pub struct OperatingSystem {
    display_name: *const c_char,
    system_path: *const c_char,
    options: *const c_char,
}

const_assert_eq!(size_of::<OperatingSystem>(), 3 * size_of::<usize>());

/// Boot policy plus the entry array.
#[must_use = "leaks pool memory unless destroyed"]
#[repr(C)]
#[derive(Debug)]
pub struct QuibbleOptions {
    timeout: u64,
    /// Nullable.
    default_os: *const c_char,
    operating_systems: *mut OperatingSystem,
    operating_systems_len: usize,
    operating_systems_capacity: usize,
    /// Index of the entry `default_os` resolves to, `SIZE_MAX` when none does.
    default_index: usize,
}

const_assert_eq!(size_of::<QuibbleOptions>(), 8 + 5 * size_of::<usize>());

/// `default_index` value when `DefaultOS` is absent or matches no entry.
/// cbindgen:ignore
pub const NO_DEFAULT: usize = usize::MAX;

impl OperatingSystem {
    fn from_entry(entry: &BootEntry<'_>, pool: &dyn PoolAllocator) -> Result<Self, ParseError> {
        let display_name = PoolCStr::copy_from(pool, entry.display_name.as_bytes())?;
        let system_path = PoolCStr::copy_from(pool, entry.system_path.as_bytes())?;
        let options = PoolCStr::copy_from(pool, entry.options.as_bytes())?;

        Ok(Self {
            display_name: display_name.into_raw(),
            system_path: system_path.into_raw(),
            options: options.into_raw(),
        })
    }

    pub fn display_name(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.display_name) }
    }

    pub fn system_path(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.system_path) }
    }

    /// Loader options, possibly empty.
    pub fn options(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.options) }
    }

    /// The three owned pointers, for identity checks.
    pub fn as_ptrs(&self) -> [*const c_char; 3] {
        [self.display_name, self.system_path, self.options]
    }
}

impl QuibbleOptions {
    /// Copy a parse result into pool-owned boundary values.
    ///
    /// If the pool runs dry part-way through, everything allocated so far is
    /// released before `AllocationFailure` is returned.
    pub fn from_options(
        options: &Options<'_>,
        pool: &dyn PoolAllocator,
    ) -> Result<Self, ParseError> {
        let default_os = match options.default_os {
            Some(name) => Some(PoolCStr::copy_from(pool, name.as_bytes())?),
            None => None,
        };

        let mut entries = EntryArray::with_capacity(pool, options.operating_systems.len())?;
        for entry in &options.operating_systems {
            entries.push(OperatingSystem::from_entry(entry, pool)?);
        }

        let (operating_systems, len, capacity) = entries.into_raw_parts();
        Ok(Self {
            timeout: options.timeout,
            default_os: default_os.map_or(ptr::null(), PoolCStr::into_raw),
            operating_systems,
            operating_systems_len: len,
            operating_systems_capacity: capacity,
            default_index: options.default_index().unwrap_or(NO_DEFAULT),
        })
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn default_os(&self) -> Option<&CStr> {
        if self.default_os.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(self.default_os) })
        }
    }

    /// Position of the entry `DefaultOS` names, matched by display name
    /// first and by section key second.
    pub fn default_index(&self) -> Option<usize> {
        (self.default_index != NO_DEFAULT).then_some(self.default_index)
    }

    pub fn default_entry(&self) -> Option<&OperatingSystem> {
        self.entries().get(self.default_index()?)
    }

    pub fn entries(&self) -> &[OperatingSystem] {
        unsafe { slice::from_raw_parts(self.operating_systems, self.operating_systems_len) }
    }

    pub fn len(&self) -> usize {
        self.operating_systems_len
    }

    pub fn is_empty(&self) -> bool {
        self.operating_systems_len == 0
    }

    pub fn capacity(&self) -> usize {
        self.operating_systems_capacity
    }
}

/// Entry array under construction. Dropping it destroys the entries
/// written so far and frees the backing block.
struct EntryArray<'p> {
    ptr: NonNull<OperatingSystem>,
    len: usize,
    capacity: usize,
    pool: &'p dyn PoolAllocator,
}

impl<'p> EntryArray<'p> {
    fn with_capacity(pool: &'p dyn PoolAllocator, capacity: usize) -> Result<Self, ParseError> {
        if capacity == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len: 0,
                capacity: 0,
                pool,
            });
        }

        let bytes = capacity
            .checked_mul(size_of::<OperatingSystem>())
            .ok_or(ParseError::AllocationFailure)?;
        let raw = NonNull::new(pool.allocate(bytes)).ok_or(ParseError::AllocationFailure)?;

        if raw.as_ptr() as usize % align_of::<OperatingSystem>() != 0 {
            unsafe { pool.free(raw.as_ptr()) };
            return Err(ParseError::AllocationFailure);
        }

        Ok(Self {
            ptr: raw.cast(),
            len: 0,
            capacity,
            pool,
        })
    }

    fn push(&mut self, entry: OperatingSystem) {
        debug_assert!(self.len < self.capacity);
        unsafe { self.ptr.as_ptr().add(self.len).write(entry) };
        self.len += 1;
    }

    fn into_raw_parts(self) -> (*mut OperatingSystem, usize, usize) {
        let parts = (self.ptr.as_ptr(), self.len, self.capacity);
        mem::forget(self);
        parts
    }
}

impl Drop for EntryArray<'_> {
    fn drop(&mut self) {
        unsafe {
            for i in 0..self.len {
                self.ptr.as_ptr().add(i).read().destroy(self.pool);
            }
            if self.capacity > 0 {
                self.pool.free(self.ptr.as_ptr().cast());
            }
        }
    }
}
