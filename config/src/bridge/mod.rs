/// Allocator bridge. One pool behind every allocation on both sides.
///
/// A boot-stage image has exactly one real heap: the firmware pool. The
/// C++ loader redirects `operator new`/`delete` to `quibble_malloc` and
/// `quibble_free`, Rust's global allocator is [`BridgeAlloc`], and the
/// boundary values are built directly on the installed pool. Memory can
/// therefore be released by whichever side ends up owning it.
///
/// Contract (identical to ANSI malloc/free, minus realloc):
/// - `allocate(n)` returns null on exhaustion, never aborts
/// - `free(NULL)` is a no-op
/// - returned blocks are at least `POOL_ALIGN` aligned
use core::alloc::{GlobalAlloc, Layout};
use core::fmt;
use core::ptr;

use spin::Once;

mod pool_cstr;

#[cfg(any(test, feature = "test-mock-pool"))]
pub mod mock_pool;

pub use pool_cstr::PoolCStr;

/// Alignment guaranteed by every pool block (UEFI AllocatePool gives 8).
pub const POOL_ALIGN: usize = 8;

/// A size-less malloc/free pair.
pub trait PoolAllocator: Sync {
    /// Allocate `size` bytes, or return null if the pool is exhausted.
    fn allocate(&self, size: usize) -> *mut u8;

    /// Release a block returned by `allocate`. Null is ignored.
    ///
    /// # Safety
    /// `ptr` must be null or a live block from this same pool.
    unsafe fn free(&self, ptr: *mut u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    AlreadyInstalled,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::AlreadyInstalled => write!(f, "pool allocator already installed"),
        }
    }
}

/// The process-wide pool. Written once at startup.
static POOL: Once<&'static dyn PoolAllocator> = Once::new();

/// Install the pool every component allocates from.
///
/// Must happen before the first allocation; a second call is rejected so
/// blocks never outlive the pool that produced them.
pub fn install(pool: &'static dyn PoolAllocator) -> Result<(), BridgeError> {
    let mut fresh = false;
    POOL.call_once(|| {
        fresh = true;
        pool
    });
    if fresh {
        Ok(())
    } else {
        Err(BridgeError::AlreadyInstalled)
    }
}

/// The installed pool, if any.
pub fn installed() -> Option<&'static dyn PoolAllocator> {
    POOL.get().copied()
}

/// Allocate from the installed pool. Null when exhausted or not installed.
pub fn allocate(size: usize) -> *mut u8 {
    match installed() {
        Some(pool) => pool.allocate(size),
        None => ptr::null_mut(),
    }
}

/// Free a block from the installed pool.
///
/// # Safety
/// `ptr` must be null or a live block returned by [`allocate`].
pub unsafe fn free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    if let Some(pool) = installed() {
        unsafe { pool.free(ptr) };
    }
}

/// Handle to whatever pool is installed, usable where a `&dyn PoolAllocator`
/// is expected (the foreign entry points).
pub struct InstalledPool;

impl PoolAllocator for InstalledPool {
    fn allocate(&self, size: usize) -> *mut u8 {
        allocate(size)
    }

    unsafe fn free(&self, ptr: *mut u8) {
        unsafe { free(ptr) }
    }
}

/// `GlobalAlloc` over the bridge, so `alloc::` collections share the pool.
///
/// The pool API takes no size or alignment on free. Layouts up to
/// `POOL_ALIGN` map 1:1 onto pool blocks. Over-aligned layouts get
/// `align` extra bytes, and the raw pool pointer is stored in the word
/// immediately before the returned block.
pub struct BridgeAlloc;

unsafe impl GlobalAlloc for BridgeAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let size = layout.size().max(1);
        let align = layout.align();

        if align <= POOL_ALIGN {
            return allocate(size);
        }

        let total = match size.checked_add(align) {
            Some(t) => t,
            None => return ptr::null_mut(),
        };
        let raw = allocate(total);
        if raw.is_null() {
            return ptr::null_mut();
        }

        // raw is POOL_ALIGN aligned, so the gap is at least one word.
        let offset = align - (raw as usize & (align - 1));
        unsafe {
            let aligned = raw.add(offset);
            (aligned as *mut *mut u8).sub(1).write(raw);
            aligned
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.align() <= POOL_ALIGN {
            unsafe { free(ptr) };
        } else {
            unsafe {
                let raw = (ptr as *mut *mut u8).sub(1).read();
                free(raw);
            }
        }
    }
}
