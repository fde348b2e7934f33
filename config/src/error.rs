/// Parse errors and non-fatal diagnostics.
///
/// Which variants are fatal depends on where they occur: an encoding or
/// allocation failure always aborts the parse, a missing field only drops
/// the entry it belongs to, and a bad `TimeOut` falls back to the default
/// unless the caller asked for `REQUIRE_TIMEOUT`.
use core::fmt;

/// A configuration field the parser validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DisplayName,
    SystemPath,
    Timeout,
}

impl Field {
    /// Key spelling as it appears in `freeldr.ini`.
    pub fn key(&self) -> &'static str {
        match self {
            Field::DisplayName => "display name",
            Field::SystemPath => "SystemPath",
            Field::Timeout => "TimeOut",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Input is not valid UTF-8, or contains a NUL byte.
    MalformedEncoding { offset: usize },
    /// An entry lacks a display name or a system path.
    MissingRequiredField { field: Field },
    /// A numeric field is not an unsigned base-10 number that fits in u64.
    InvalidNumericField { field: Field },
    /// The pool returned null while building the result.
    AllocationFailure,
    /// A line that is neither a comment, a section header nor `key=value`.
    UnrecognizedLine,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedEncoding { offset } => {
                write!(f, "malformed text encoding at byte {}", offset)
            }
            ParseError::MissingRequiredField { field } => {
                write!(f, "missing required field: {}", field.key())
            }
            ParseError::InvalidNumericField { field } => {
                write!(f, "invalid numeric value for {}", field.key())
            }
            ParseError::AllocationFailure => write!(f, "out of pool memory"),
            ParseError::UnrecognizedLine => write!(f, "unrecognized line"),
        }
    }
}

/// A non-fatal finding recorded while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic<'a> {
    /// 1-based line number in the input.
    pub line: usize,
    /// Section the finding belongs to, if any.
    pub section: Option<&'a str>,
    pub error: ParseError,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "line {} [{}]: {}", self.line, section, self.error),
            None => write!(f, "line {}: {}", self.line, self.error),
        }
    }
}
