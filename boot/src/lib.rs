//! Static library linked into the Quibble loader.
//!
//! Re-exports every `quibble_*` symbol from `quibble-config` and adds the
//! firmware side: the UEFI pool behind the allocator bridge, Rust's global
//! allocator, the console logger and the panic handler.
//!
//! The loader must call `quibble_rs_init` before anything else, including
//! its own `operator new`.
#![no_std]

mod firmware_pool;

use core::ffi::c_void;
use core::panic::PanicInfo;

use quibble_config::{bridge, BridgeAlloc};
use spin::Once;
use uefi::Handle;

pub use quibble_config::ffi::*;

use firmware_pool::FIRMWARE_POOL;

/// Rust heap: the same firmware pool the loader uses.
#[global_allocator]
static GLOBAL: BridgeAlloc = BridgeAlloc;

static INIT: Once<bool> = Once::new();

/// Bind to the firmware and install the pool. Safe to call again; later
/// calls return the first result.
///
/// # Safety
/// `image` and `system_table` must be the values the firmware passed to the
/// loader's entry point, and boot services must not have been exited.
#[no_mangle]
pub unsafe extern "C" fn quibble_rs_init(image: *mut c_void, system_table: *mut c_void) -> bool {
    if system_table.is_null() {
        return false;
    }
    let Some(image) = (unsafe { Handle::from_ptr(image) }) else {
        return false;
    };

    *INIT.call_once(|| unsafe { bring_up(image, system_table) })
}

unsafe fn bring_up(image: Handle, system_table: *mut c_void) -> bool {
    unsafe {
        uefi::table::set_system_table(system_table.cast());
        uefi::boot::set_image_handle(image);
    }

    // No logger yet; the loader only sees `false`.
    if bridge::install(&FIRMWARE_POOL).is_err() {
        return false;
    }

    // Without a console the log macros are no-ops; parsing still works.
    if uefi::helpers::init().is_ok() {
        log::info!("quibble: firmware pool installed");
    }
    true
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("quibble: panic: {}", info);
    loop {
        core::hint::spin_loop();
    }
}
