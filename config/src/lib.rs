//! Quibble boot configuration core.
//!
//! Turns the raw `freeldr.ini` bytes read by the C++ loader into a
//! `QuibbleOptions` value the loader can walk without knowing anything
//! about Rust, and tears that value down again on request.
//!
//! Every byte handed across the boundary comes from the single pool
//! installed in [`bridge`], so the host can free what we allocated and
//! vice versa.
#![no_std]

extern crate alloc;

pub mod boundary;
pub mod bridge;
pub mod error;
pub mod ffi;
pub mod parser;

pub use boundary::{OperatingSystem, QuibbleOptions, NO_DEFAULT};
pub use bridge::{BridgeAlloc, BridgeError, PoolAllocator};
pub use error::{Diagnostic, Field, ParseError};
pub use parser::{parse, ParseFlags, Parsed};

/// Parse `bytes` and flatten the result into pool-owned boundary values.
///
/// On success the returned value owns every string it points at and must be
/// released exactly once with [`QuibbleOptions::destroy`] on the same pool.
/// On failure nothing is left allocated in `pool`.
pub fn parse_into(
    pool: &dyn PoolAllocator,
    bytes: &[u8],
    flags: ParseFlags,
) -> Result<QuibbleOptions, ParseError> {
    let parsed = parser::parse(bytes, flags)?;
    QuibbleOptions::from_options(&parsed.options, pool)
}
