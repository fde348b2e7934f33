/// Instrumented pool for testing.
///
/// Backs every block with the global allocator and keeps a ledger of live
/// blocks, so tests can check that a teardown returns the pool to its
/// baseline and that nothing is freed twice. Enabled with the
/// `test-mock-pool` feature outside of unit tests.
use alloc::alloc::{alloc, dealloc, Layout};
use alloc::vec::Vec;
use core::ptr;

use spin::Mutex;

use super::{PoolAllocator, POOL_ALIGN};

struct PoolState {
    /// (address, size) of every live block.
    live: Vec<(usize, usize)>,
    total_allocs: u64,
    total_frees: u64,
    /// Remaining successful allocations before the pool reports exhaustion.
    budget: Option<usize>,
}

/// Pool that counts allocations and can simulate exhaustion.
pub struct CountingPool {
    state: Mutex<PoolState>,
}

impl CountingPool {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                live: Vec::new(),
                total_allocs: 0,
                total_frees: 0,
                budget: None,
            }),
        }
    }

    /// Let the next `n` allocations succeed, then return null.
    pub fn fail_after(&self, n: usize) {
        self.state.lock().budget = Some(n);
    }

    /// Stop simulating exhaustion.
    pub fn unlimited(&self) {
        self.state.lock().budget = None;
    }

    /// Blocks allocated and not yet freed.
    pub fn outstanding(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Bytes held by outstanding blocks.
    pub fn outstanding_bytes(&self) -> usize {
        self.state.lock().live.iter().map(|&(_, size)| size).sum()
    }

    /// Successful allocations since creation (for test verification).
    pub fn total_allocations(&self) -> u64 {
        self.state.lock().total_allocs
    }

    pub fn total_frees(&self) -> u64 {
        self.state.lock().total_frees
    }

    /// Whether `ptr` is a live block of this pool.
    pub fn is_live(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        self.state.lock().live.iter().any(|&(a, _)| a == addr)
    }

    fn layout(size: usize) -> Layout {
        // Only reachable with sizes that already fit in memory.
        Layout::from_size_align(size.max(1), POOL_ALIGN).unwrap_or(Layout::new::<u64>())
    }
}

impl Default for CountingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolAllocator for CountingPool {
    fn allocate(&self, size: usize) -> *mut u8 {
        let mut state = self.state.lock();

        match state.budget {
            Some(0) => return ptr::null_mut(),
            Some(n) => state.budget = Some(n - 1),
            None => {}
        }

        if size > isize::MAX as usize - POOL_ALIGN {
            return ptr::null_mut();
        }

        let block = unsafe { alloc(Self::layout(size)) };
        if block.is_null() {
            return ptr::null_mut();
        }

        state.live.push((block as usize, size));
        state.total_allocs += 1;
        block
    }

    unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        let mut state = self.state.lock();
        let addr = ptr as usize;
        let index = match state.live.iter().position(|&(a, _)| a == addr) {
            Some(i) => i,
            None => panic!("free of {:p}: not a live block (double free?)", ptr),
        };

        let (_, size) = state.live.swap_remove(index);
        state.total_frees += 1;
        unsafe { dealloc(ptr, Self::layout(size)) };
    }
}

impl Drop for CountingPool {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for &(addr, size) in state.live.iter() {
            unsafe { dealloc(addr as *mut u8, Self::layout(size)) };
        }
        state.live.clear();
    }
}

/// Pool installed process-wide for tests that go through the global bridge.
#[cfg(test)]
pub(crate) static SHARED: CountingPool = CountingPool::new();

#[cfg(test)]
static SHARED_LOCK: Mutex<()> = Mutex::new(());

/// Install [`SHARED`] (first caller wins) and hold it exclusively, so
/// outstanding counts are not disturbed by tests running in parallel.
#[cfg(test)]
pub(crate) fn lock_shared() -> spin::MutexGuard<'static, ()> {
    let _ = super::install(&SHARED);
    let guard = SHARED_LOCK.lock();
    SHARED.unlimited();
    guard
}
