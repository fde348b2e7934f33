//! Configuration parser.
//!
//! Two layers:
//! - `ini`: splits the text into sections and `key=value` properties
//! - `options`: applies FreeLoader semantics (`[FREELOADER]` policy,
//!   `[Operating Systems]` listing, per-entry sections)
//!
//! The result borrows from the input buffer; it lives only until it has
//! been flattened into pool-owned boundary values.

pub mod ini;
pub mod options;

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::error::{Diagnostic, ParseError};

pub use ini::{Document, Property, Section};
pub use options::{BootEntry, Options, DEFAULT_TIMEOUT};

bitflags! {
    /// Parse policy, passed across the boundary as a `u32`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u32 {
        /// An absent or invalid `TimeOut` fails the parse instead of
        /// falling back to `DEFAULT_TIMEOUT`.
        const REQUIRE_TIMEOUT = 1 << 0;
    }
}

impl ParseFlags {
    /// Policy used by `quibble_parse_options`.
    pub fn default_policy() -> Self {
        if cfg!(feature = "strict-timeout") {
            ParseFlags::REQUIRE_TIMEOUT
        } else {
            ParseFlags::empty()
        }
    }
}

/// A successful parse: the options plus every non-fatal finding.
#[derive(Debug)]
pub struct Parsed<'a> {
    pub options: Options<'a>,
    pub diagnostics: Vec<Diagnostic<'a>>,
}

/// Parse a raw configuration buffer.
pub fn parse(bytes: &[u8], flags: ParseFlags) -> Result<Parsed<'_>, ParseError> {
    let text = decode(bytes)?;

    let mut diagnostics = Vec::new();
    let document = Document::parse(text, &mut diagnostics)?;
    let options = Options::from_document(&document, flags, &mut diagnostics)?;

    log::debug!("parsed options: {:?}", options);
    Ok(Parsed { options, diagnostics })
}

/// Validate the buffer as UTF-8 text without NUL bytes.
///
/// Output strings are NUL-terminated, so an embedded NUL would silently
/// truncate a boot path; it is rejected like any other encoding error.
pub fn decode(bytes: &[u8]) -> Result<&str, ParseError> {
    let text = core::str::from_utf8(bytes).map_err(|e| ParseError::MalformedEncoding {
        offset: e.valid_up_to(),
    })?;

    if let Some(offset) = bytes.iter().position(|&b| b == 0) {
        return Err(ParseError::MalformedEncoding { offset });
    }

    Ok(text)
}

/// Push that reports an exhausted heap instead of aborting.
pub(crate) fn try_push<T>(vec: &mut Vec<T>, item: T) -> Result<(), ParseError> {
    vec.try_reserve(1).map_err(|_| ParseError::AllocationFailure)?;
    vec.push(item);
    Ok(())
}

/// Log a non-fatal finding and keep it for the caller.
pub(crate) fn report<'a>(
    diagnostics: &mut Vec<Diagnostic<'a>>,
    diagnostic: Diagnostic<'a>,
) -> Result<(), ParseError> {
    log::warn!("config: {}", diagnostic);
    try_push(diagnostics, diagnostic)
}

#[cfg(test)]
mod tests;
