//! C exports consumed by the Quibble loader (see `boot/include/quibble_rs.h`).
//!
//! Everything here allocates through the installed pool. Errors cross as
//! [`QuibbleStatus`] codes; `out` parameters are written only on success.

use core::ffi::{c_char, c_void, CStr};
use core::ptr;
use core::slice;

use static_assertions::const_assert_eq;

use crate::boundary::{display_name_utf16, OperatingSystem, QuibbleOptions};
use crate::bridge::{self, InstalledPool};
use crate::error::ParseError;
use crate::parser::ParseFlags;

/// Result code of the parse entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuibbleStatus {
    Ok = 0,
    MalformedEncoding = 1,
    MissingRequiredField = 2,
    InvalidNumericField = 3,
    AllocationFailure = 4,
    /// Null `out`, or null `data` with a non-zero length.
    InvalidArgument = 5,
}

impl From<ParseError> for QuibbleStatus {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MalformedEncoding { .. } => QuibbleStatus::MalformedEncoding,
            ParseError::MissingRequiredField { .. } => QuibbleStatus::MissingRequiredField,
            ParseError::InvalidNumericField { .. } => QuibbleStatus::InvalidNumericField,
            ParseError::AllocationFailure => QuibbleStatus::AllocationFailure,
            // Never fatal on its own; reported as the closest input error.
            ParseError::UnrecognizedLine => QuibbleStatus::MalformedEncoding,
        }
    }
}

/// `quibble_parse_options_ex` flag: fail on an absent or invalid `TimeOut`.
pub const QUIBBLE_REQUIRE_TIMEOUT: u32 = 1 << 0;

const_assert_eq!(QUIBBLE_REQUIRE_TIMEOUT, ParseFlags::REQUIRE_TIMEOUT.bits());

impl QuibbleStatus {
    /// Status for a raw code coming back from C.
    pub fn from_raw(code: u32) -> Option<Self> {
        Some(match code {
            0 => QuibbleStatus::Ok,
            1 => QuibbleStatus::MalformedEncoding,
            2 => QuibbleStatus::MissingRequiredField,
            3 => QuibbleStatus::InvalidNumericField,
            4 => QuibbleStatus::AllocationFailure,
            5 => QuibbleStatus::InvalidArgument,
            _ => return None,
        })
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            QuibbleStatus::Ok => c"ok",
            QuibbleStatus::MalformedEncoding => c"malformed text encoding",
            QuibbleStatus::MissingRequiredField => c"missing required field",
            QuibbleStatus::InvalidNumericField => c"invalid numeric field",
            QuibbleStatus::AllocationFailure => c"out of pool memory",
            QuibbleStatus::InvalidArgument => c"invalid argument",
        }
    }
}

// ---- allocator ----

/// `operator new` target for the C++ side.
#[no_mangle]
pub extern "C" fn quibble_malloc(size: usize) -> *mut c_void {
    bridge::allocate(size).cast()
}

/// `operator delete` target for the C++ side.
///
/// # Safety
/// `ptr` must be null or come from `quibble_malloc` (or any other export
/// documented as pool-allocated) and not have been freed yet.
#[no_mangle]
pub unsafe extern "C" fn quibble_free(ptr: *mut c_void) {
    unsafe { bridge::free(ptr.cast()) }
}

// ---- parsing ----

/// Parse `freeldr.ini` with the build's default policy.
///
/// # Safety
/// `data` must be valid for `len` bytes (or null with `len == 0`), and
/// `out` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn quibble_parse_options(
    data: *const u8,
    len: usize,
    out: *mut QuibbleOptions,
) -> QuibbleStatus {
    unsafe { parse_with(data, len, ParseFlags::default_policy(), out) }
}

/// Parse with explicit policy flags. Unknown bits are ignored.
///
/// # Safety
/// Same as [`quibble_parse_options`].
#[no_mangle]
pub unsafe extern "C" fn quibble_parse_options_ex(
    data: *const u8,
    len: usize,
    flags: u32,
    out: *mut QuibbleOptions,
) -> QuibbleStatus {
    unsafe { parse_with(data, len, ParseFlags::from_bits_truncate(flags), out) }
}

unsafe fn parse_with(
    data: *const u8,
    len: usize,
    flags: ParseFlags,
    out: *mut QuibbleOptions,
) -> QuibbleStatus {
    if out.is_null() || (data.is_null() && len != 0) {
        log::warn!("quibble_parse_options: invalid argument");
        return QuibbleStatus::InvalidArgument;
    }

    let bytes: &[u8] = if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(data, len) }
    };

    match crate::parse_into(&InstalledPool, bytes, flags) {
        Ok(options) => {
            unsafe { out.write(options) };
            QuibbleStatus::Ok
        }
        Err(err) => {
            log::debug!("quibble_parse_options: {}", err);
            err.into()
        }
    }
}

// ---- teardown ----

/// Release an aggregate and every entry still in it.
///
/// # Safety
/// `options` must come from a successful parse and be destroyed only once.
#[no_mangle]
pub unsafe extern "C" fn quibble_options_destroy(options: QuibbleOptions) {
    unsafe { options.destroy(&InstalledPool) }
}

/// Release an entry previously moved out with `quibble_options_take_entry`.
///
/// # Safety
/// `os` must come from `quibble_options_take_entry` and be destroyed only once.
#[no_mangle]
pub unsafe extern "C" fn operating_system_destroy(os: OperatingSystem) {
    unsafe { os.destroy(&InstalledPool) }
}

/// Move entry `index` out of `options` into `*out`. Later entries shift
/// down by one. Returns false, writing nothing, when `index` is out of range.
///
/// # Safety
/// `options` must be null or a live aggregate; `out` null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn quibble_options_take_entry(
    options: *mut QuibbleOptions,
    index: usize,
    out: *mut OperatingSystem,
) -> bool {
    if options.is_null() || out.is_null() {
        return false;
    }

    match unsafe { (*options).take_entry(index) } {
        Some(entry) => {
            unsafe { out.write(entry) };
            true
        }
        None => false,
    }
}

// ---- legacy ----

/// UTF-16 copy of the display name, released with `quibble_free`.
/// Null on exhaustion or a null `os`.
///
/// # Safety
/// `os` must be null or point at a live entry.
#[no_mangle]
pub unsafe extern "C" fn quibble_display_name_utf16(os: *const OperatingSystem) -> *mut u16 {
    let Some(os) = (unsafe { os.as_ref() }) else {
        return ptr::null_mut();
    };

    match display_name_utf16(os, &InstalledPool) {
        Ok(wide) => wide.as_ptr(),
        Err(err) => {
            log::debug!("quibble_display_name_utf16: {}", err);
            ptr::null_mut()
        }
    }
}

/// Static description of a status code. Never null, never freed; codes this
/// build does not know map to "unknown status".
#[no_mangle]
pub extern "C" fn quibble_status_string(status: u32) -> *const c_char {
    QuibbleStatus::from_raw(status)
        .map_or(c"unknown status", QuibbleStatus::as_cstr)
        .as_ptr()
}
