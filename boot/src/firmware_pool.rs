//! `PoolAllocator` over UEFI boot services `AllocatePool`/`FreePool`.
//!
//! Boot services must be live: this is only installed from
//! `quibble_rs_init`, after the system table is known, and is not usable
//! after `ExitBootServices`.

use core::ptr::{self, NonNull};

use quibble_config::PoolAllocator;
use uefi::boot::{self, MemoryType};

/// Pool blocks are tagged `LOADER_DATA`, same as the loader's own heap.
pub struct FirmwarePool;

impl PoolAllocator for FirmwarePool {
    fn allocate(&self, size: usize) -> *mut u8 {
        match boot::allocate_pool(MemoryType::LOADER_DATA, size) {
            Ok(block) => block.as_ptr(),
            Err(err) => {
                log::debug!("AllocatePool({}) failed: {:?}", size, err.status());
                ptr::null_mut()
            }
        }
    }

    unsafe fn free(&self, ptr: *mut u8) {
        let Some(block) = NonNull::new(ptr) else {
            return;
        };
        if let Err(err) = unsafe { boot::free_pool(block) } {
            log::warn!("FreePool({:p}) failed: {:?}", ptr, err.status());
        }
    }
}

pub static FIRMWARE_POOL: FirmwarePool = FirmwarePool;
