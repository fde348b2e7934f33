/// UTF-16 display names for older loader builds.
///
/// Earlier loader revisions kept a `CHAR16` copy of every display name for
/// the firmware text console. The boundary struct no longer carries one;
/// callers that still need it ask for a copy and release it with
/// `quibble_free`.
use core::iter;
use core::mem::size_of;
use core::ptr::NonNull;

use super::OperatingSystem;
use crate::bridge::PoolAllocator;
use crate::error::ParseError;

/// NUL-terminated UTF-16 copy of `entry`'s display name, allocated on `pool`.
pub fn display_name_utf16(
    entry: &OperatingSystem,
    pool: &dyn PoolAllocator,
) -> Result<NonNull<u16>, ParseError> {
    let name = entry
        .display_name()
        .to_str()
        .map_err(|e| ParseError::MalformedEncoding {
            offset: e.valid_up_to(),
        })?;

    let units = name.encode_utf16().count() + 1;
    let bytes = units
        .checked_mul(size_of::<u16>())
        .ok_or(ParseError::AllocationFailure)?;
    let wide = NonNull::new(pool.allocate(bytes))
        .ok_or(ParseError::AllocationFailure)?
        .cast::<u16>();

    for (i, unit) in name.encode_utf16().chain(iter::once(0)).enumerate() {
        unsafe { wide.as_ptr().add(i).write(unit) };
    }

    Ok(wide)
}
