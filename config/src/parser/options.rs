/// FreeLoader semantics on top of the INI document.
///
/// ```text
/// [FREELOADER]
/// DefaultOS=ReactOS
/// TimeOut=5
///
/// [Operating Systems]
/// ; key = entry section, value = display name
/// ReactOS="ReactOS"
/// ReactOS_Debug="ReactOS (Debug)"
///
/// [ReactOS]
/// SystemPath=multi(0)disk(0)rdisk(0)partition(1)\ReactOS
/// Options=/NOSERIAL
/// ```
use alloc::vec::Vec;

use super::ini::{Document, Property, Section};
use super::{report, try_push, ParseFlags};
use crate::error::{Diagnostic, Field, ParseError};

/// Selection timeout used when `TimeOut` is absent or unusable.
pub const DEFAULT_TIMEOUT: u64 = 10;

pub const FREELOADER_SECTION: &str = "FREELOADER";
pub const OPERATING_SYSTEMS_SECTION: &str = "Operating Systems";

pub const TIMEOUT_KEY: &str = "TimeOut";
pub const DEFAULT_OS_KEY: &str = "DefaultOS";
pub const SYSTEM_PATH_KEY: &str = "SystemPath";
pub const OPTIONS_KEY: &str = "Options";

/// One validated boot entry, borrowing from the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootEntry<'a> {
    /// Key in `[Operating Systems]`, i.e. the entry's own section name.
    pub section: &'a str,
    pub display_name: &'a str,
    pub system_path: &'a str,
    /// Empty when the section has no `Options` key.
    pub options: &'a str,
}

/// Boot policy plus entries, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options<'a> {
    pub timeout: u64,
    /// Verbatim `DefaultOS`, even when it matches no entry.
    pub default_os: Option<&'a str>,
    pub operating_systems: Vec<BootEntry<'a>>,
}

impl<'a> Options<'a> {
    pub fn from_document(
        doc: &Document<'a>,
        flags: ParseFlags,
        diagnostics: &mut Vec<Diagnostic<'a>>,
    ) -> Result<Self, ParseError> {
        let timeout = Self::timeout(doc, flags, diagnostics)?;

        let default_os = policy_property(doc, DEFAULT_OS_KEY)
            .map(|(_, p)| p.value)
            .filter(|v| !v.is_empty());

        let mut operating_systems = Vec::new();
        if let Some(listing) = doc.section(OPERATING_SYSTEMS_SECTION) {
            for listed in listing.properties() {
                match entry_from_listing(doc, listed) {
                    Ok(entry) => try_push(&mut operating_systems, entry)?,
                    Err(diagnostic) => report(diagnostics, diagnostic)?,
                }
            }
        }

        Ok(Self {
            timeout,
            default_os,
            operating_systems,
        })
    }

    fn timeout(
        doc: &Document<'a>,
        flags: ParseFlags,
        diagnostics: &mut Vec<Diagnostic<'a>>,
    ) -> Result<u64, ParseError> {
        let required = flags.contains(ParseFlags::REQUIRE_TIMEOUT);

        let (section, property) = match policy_property(doc, TIMEOUT_KEY) {
            Some(found) => found,
            None if required => {
                return Err(ParseError::MissingRequiredField {
                    field: Field::Timeout,
                })
            }
            None => return Ok(DEFAULT_TIMEOUT),
        };

        if let Some(timeout) = parse_decimal_u64(property.value) {
            return Ok(timeout);
        }

        let error = ParseError::InvalidNumericField {
            field: Field::Timeout,
        };
        if required {
            return Err(error);
        }

        report(
            diagnostics,
            Diagnostic {
                line: property.line,
                section: section.name,
                error,
            },
        )?;
        Ok(DEFAULT_TIMEOUT)
    }

    /// Index of the entry `default_os` names: the first entry whose display
    /// name matches, else the first whose section key matches.
    pub fn default_index(&self) -> Option<usize> {
        let name = self.default_os?;
        self.operating_systems
            .iter()
            .position(|e| e.display_name.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.operating_systems
                    .iter()
                    .position(|e| e.section.eq_ignore_ascii_case(name))
            })
    }
}

/// Look up a policy key in `[FREELOADER]`, then among the global keys.
fn policy_property<'d, 'a>(
    doc: &'d Document<'a>,
    key: &str,
) -> Option<(&'d Section<'a>, &'d Property<'a>)> {
    doc.section(FREELOADER_SECTION)
        .and_then(|s| s.property(key).map(|p| (s, p)))
        .or_else(|| {
            let global = doc.global();
            global.property(key).map(|p| (global, p))
        })
}

/// Resolve one `[Operating Systems]` line into a complete entry.
fn entry_from_listing<'a>(
    doc: &Document<'a>,
    listed: &Property<'a>,
) -> Result<BootEntry<'a>, Diagnostic<'a>> {
    let missing = |line, section, field| Diagnostic {
        line,
        section: Some(section),
        error: ParseError::MissingRequiredField { field },
    };

    if listed.value.is_empty() {
        return Err(missing(listed.line, listed.key, Field::DisplayName));
    }

    let section = doc
        .section(listed.key)
        .ok_or_else(|| missing(listed.line, listed.key, Field::SystemPath))?;

    let system_path = section
        .get(SYSTEM_PATH_KEY)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing(section.line, listed.key, Field::SystemPath))?;

    Ok(BootEntry {
        section: listed.key,
        display_name: listed.value,
        system_path,
        options: section.get(OPTIONS_KEY).unwrap_or(""),
    })
}

/// Unsigned base-10 only: no sign, no spaces, no radix prefix.
pub fn parse_decimal_u64(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }

    let mut value: u64 = 0;
    for b in text.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(value)
}
