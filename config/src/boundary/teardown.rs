/// Teardown protocol.
///
/// Each value goes `Parsed -> Destroyed` exactly once. On the Rust side
/// `destroy` consumes `self`, so a second call does not compile. Across
/// the C boundary it is the caller's obligation: a destroyed value carries
/// no liveness flag, and destroying it again is a double free.
///
/// Two disciplines, never mixed for the same entry:
/// - destroy the aggregate, which destroys every entry still in it
/// - `take_entry` an entry out, destroy it on its own, then destroy the
///   (now smaller) aggregate
use core::ptr;

use super::{OperatingSystem, QuibbleOptions, NO_DEFAULT};
use crate::bridge::PoolAllocator;

impl OperatingSystem {
    /// Free the three strings. The slot holding the entry owns nothing.
    ///
    /// # Safety
    /// `self` must come from `QuibbleOptions::from_options` or `take_entry`
    /// on `pool`, and must not have been destroyed through another copy.
    pub unsafe fn destroy(self, pool: &dyn PoolAllocator) {
        unsafe {
            pool.free(self.display_name as *mut u8);
            pool.free(self.system_path as *mut u8);
            pool.free(self.options as *mut u8);
        }
    }
}

impl QuibbleOptions {
    /// Free `default_os`, every entry still in the array, then the array.
    ///
    /// The aggregate itself is returned by value, so there is no block for
    /// it to free.
    ///
    /// # Safety
    /// `self` must come from `from_options` on `pool` and must not have
    /// been destroyed through another copy.
    pub unsafe fn destroy(self, pool: &dyn PoolAllocator) {
        unsafe {
            pool.free(self.default_os as *mut u8);

            for i in 0..self.operating_systems_len {
                self.operating_systems.add(i).read().destroy(pool);
            }

            if self.operating_systems_capacity > 0 {
                pool.free(self.operating_systems.cast());
            }
        }
    }

    /// Move entry `index` out, shifting the tail down. The aggregate no
    /// longer refers to the returned entry's strings, and `default_index`
    /// follows the entry it pointed at (or becomes `NO_DEFAULT` if that
    /// entry was the one taken).
    pub fn take_entry(&mut self, index: usize) -> Option<OperatingSystem> {
        if index >= self.operating_systems_len {
            return None;
        }

        if self.default_index == index {
            self.default_index = NO_DEFAULT;
        } else if self.default_index != NO_DEFAULT && self.default_index > index {
            self.default_index -= 1;
        }

        unsafe {
            let slot = self.operating_systems.add(index);
            let taken = slot.read();
            ptr::copy(slot.add(1), slot, self.operating_systems_len - index - 1);
            self.operating_systems_len -= 1;
            Some(taken)
        }
    }
}
