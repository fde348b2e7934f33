/// Line-oriented INI reader for `freeldr.ini`.
///
/// Grammar (one construct per line, surrounding whitespace ignored):
/// ```text
/// ; comment            # comment
/// [Section Name]
/// Key = value          Key="quoted value"
/// ```
/// Keys before the first header go to the global section. Names compare
/// ASCII case-insensitively, duplicates are kept and lookups return the
/// first one. No escapes and no inline comments: values reach the loader
/// verbatim. Nothing here copies text; every name and value borrows the
/// input.
use alloc::vec::Vec;

use super::{report, try_push};
use crate::error::{Diagnostic, ParseError};

/// One `key=value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property<'a> {
    pub key: &'a str,
    pub value: &'a str,
    /// 1-based line number.
    pub line: usize,
}

#[derive(Debug)]
pub struct Section<'a> {
    /// `None` for the global section.
    pub name: Option<&'a str>,
    /// Line of the header (0 for the global section).
    pub line: usize,
    properties: Vec<Property<'a>>,
}

impl<'a> Section<'a> {
    fn new(name: Option<&'a str>, line: usize) -> Self {
        Self {
            name,
            line,
            properties: Vec::new(),
        }
    }

    /// Properties in document order.
    pub fn properties(&self) -> &[Property<'a>] {
        &self.properties
    }

    /// First property named `key`.
    pub fn property(&self, key: &str) -> Option<&Property<'a>> {
        self.properties
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
    }

    /// Value of the first property named `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.property(key).map(|p| p.value)
    }
}

/// Where properties currently go.
#[derive(Clone, Copy)]
enum Target {
    Section(usize),
    /// After a broken header: drop properties until the next good one.
    Discard,
}

#[derive(Debug)]
pub struct Document<'a> {
    /// `sections[0]` is always the global section.
    sections: Vec<Section<'a>>,
}

impl<'a> Document<'a> {
    /// Split `text` into sections. Unrecognized lines are reported in
    /// `diagnostics` and skipped.
    pub fn parse(
        text: &'a str,
        diagnostics: &mut Vec<Diagnostic<'a>>,
    ) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut sections = Vec::new();
        try_push(&mut sections, Section::new(None, 0))?;
        let mut target = Target::Section(0);

        for (index, raw) in text.split('\n').enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                match rest.find(']') {
                    Some(end) => {
                        let name = rest[..end].trim();
                        try_push(&mut sections, Section::new(Some(name), line_no))?;
                        target = Target::Section(sections.len() - 1);
                    }
                    None => {
                        report(
                            diagnostics,
                            Diagnostic {
                                line: line_no,
                                section: None,
                                error: ParseError::UnrecognizedLine,
                            },
                        )?;
                        target = Target::Discard;
                    }
                }
                continue;
            }

            let section = match target {
                Target::Section(i) => &mut sections[i],
                Target::Discard => continue,
            };

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    let property = Property {
                        key: key.trim(),
                        value: unquote(value.trim()),
                        line: line_no,
                    };
                    try_push(&mut section.properties, property)?;
                }
                _ => {
                    let name = section.name;
                    report(
                        diagnostics,
                        Diagnostic {
                            line: line_no,
                            section: name,
                            error: ParseError::UnrecognizedLine,
                        },
                    )?;
                }
            }
        }

        Ok(Self { sections })
    }

    /// Keys that appear before the first header.
    pub fn global(&self) -> &Section<'a> {
        &self.sections[0]
    }

    /// First section called `name`.
    pub fn section(&self, name: &str) -> Option<&Section<'a>> {
        self.sections[1..]
            .iter()
            .find(|s| s.name.is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Named sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &Section<'a>> {
        self.sections[1..].iter()
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
