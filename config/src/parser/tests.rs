/// Unit tests for the parser: INI lexing, FreeLoader semantics, encoding
/// and policy handling. Pure in-memory, no pool involved.
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::options::parse_decimal_u64;
use super::*;
use crate::error::Field;

const FREELDR_INI: &str = "\
[FREELOADER]
DefaultOS=ReactOS_Debug
TimeOut=5

[Display]
TitleText=ReactOS Boot Manager

[Operating Systems]
ReactOS=\"ReactOS\"
ReactOS_Debug=\"ReactOS (Debug)\"
Windows=\"Windows Server 2003\"

[ReactOS]
BootType=Windows2003
SystemPath=multi(0)disk(0)rdisk(0)partition(1)\\ReactOS
Options=/MININT

[ReactOS_Debug]
SystemPath=multi(0)disk(0)rdisk(0)partition(1)\\ReactOS
Options=/DEBUG /DEBUGPORT=COM1 /BAUDRATE=115200 /SOS

[Windows]
SystemPath=multi(0)disk(0)rdisk(1)partition(1)\\WINDOWS
";

fn parse_ok(text: &str) -> Parsed<'_> {
    parse(text.as_bytes(), ParseFlags::empty()).unwrap()
}

// ---- INI layer ----

#[test]
fn ini_sections_and_properties() {
    let mut diags = Vec::new();
    let doc = Document::parse("a=1\n[One]\nx = 2\n[Two]\ny=\"3\"\n", &mut diags).unwrap();

    assert!(diags.is_empty());
    assert_eq!(doc.global().get("a"), Some("1"));
    assert_eq!(doc.section("one").unwrap().get("X"), Some("2"));
    assert_eq!(doc.section("TWO").unwrap().get("y"), Some("3"));
    assert_eq!(doc.sections().count(), 2);
}

#[test]
fn ini_comments_blank_lines_and_crlf() {
    let mut diags = Vec::new();
    let text = "; leading comment\r\n\r\n[S]\r\n# another\r\nk=v\r\n";
    let doc = Document::parse(text, &mut diags).unwrap();

    assert!(diags.is_empty());
    let s = doc.section("S").unwrap();
    assert_eq!(s.properties().len(), 1);
    assert_eq!(s.get("k"), Some("v"));
}

#[test]
fn ini_value_split_at_first_equals() {
    let mut diags = Vec::new();
    let doc = Document::parse("[S]\nOptions=/DEBUGPORT=COM1 /X=Y\n", &mut diags).unwrap();
    assert_eq!(doc.section("S").unwrap().get("Options"), Some("/DEBUGPORT=COM1 /X=Y"));
}

#[test]
fn ini_values_are_verbatim() {
    let mut diags = Vec::new();
    let doc = Document::parse("[S]\nA=x ; not a comment\nB=\"\"\nC=\"half\n", &mut diags).unwrap();
    let s = doc.section("S").unwrap();
    assert_eq!(s.get("A"), Some("x ; not a comment"));
    assert_eq!(s.get("B"), Some(""));
    assert_eq!(s.get("C"), Some("\"half"));
}

#[test]
fn ini_duplicate_keys_first_wins() {
    let mut diags = Vec::new();
    let doc = Document::parse("[S]\nk=first\nk=second\n", &mut diags).unwrap();
    let s = doc.section("S").unwrap();
    assert_eq!(s.get("k"), Some("first"));
    assert_eq!(s.properties().len(), 2);
}

#[test]
fn ini_unrecognized_lines_are_reported_and_skipped() {
    let mut diags = Vec::new();
    let doc = Document::parse("[S]\nnot a property\n=novalue\nk=v\n", &mut diags).unwrap();

    assert_eq!(doc.section("S").unwrap().properties().len(), 1);
    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].line, 2);
    assert_eq!(diags[0].section, Some("S"));
    assert_eq!(diags[0].error, ParseError::UnrecognizedLine);
    assert_eq!(diags[1].line, 3);
}

#[test]
fn ini_broken_header_discards_until_next_section() {
    let mut diags = Vec::new();
    let doc = Document::parse("[Good]\na=1\n[Broken\nb=2\n[Next]\nc=3\n", &mut diags).unwrap();

    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].line, 3);
    assert_eq!(doc.section("Good").unwrap().properties().len(), 1);
    assert!(doc.section("Good").unwrap().get("b").is_none());
    assert_eq!(doc.section("Next").unwrap().get("c"), Some("3"));
}

#[test]
fn ini_skips_byte_order_mark() {
    let mut diags = Vec::new();
    let doc = Document::parse("\u{feff}[S]\nk=v\n", &mut diags).unwrap();
    assert_eq!(doc.section("S").unwrap().get("k"), Some("v"));
}

// ---- Encoding ----

#[test]
fn malformed_utf8_fails_whole_parse() {
    let bytes = b"[FREELOADER]\nTimeOut=5\n\xff\xfe\n";
    let err = parse(bytes, ParseFlags::empty()).unwrap_err();
    assert_eq!(err, ParseError::MalformedEncoding { offset: 23 });
}

#[test]
fn truncated_multibyte_sequence_fails() {
    let bytes = b"[S]\nk=caf\xc3";
    assert!(matches!(
        parse(bytes, ParseFlags::empty()),
        Err(ParseError::MalformedEncoding { offset: 9 })
    ));
}

#[test]
fn embedded_nul_fails_whole_parse() {
    let bytes = b"[S]\nk=a\0b\n";
    assert_eq!(
        parse(bytes, ParseFlags::empty()).unwrap_err(),
        ParseError::MalformedEncoding { offset: 7 }
    );
}

#[test]
fn non_ascii_utf8_is_accepted() {
    let text = "[Operating Systems]\nOS=\"Système ☃\"\n[OS]\nSystemPath=multi(0)\n";
    let parsed = parse_ok(text);
    assert_eq!(parsed.options.operating_systems[0].display_name, "Système ☃");
}

// ---- FreeLoader semantics ----

#[test]
fn freeldr_ini_full_document() {
    let parsed = parse_ok(FREELDR_INI);
    let opts = &parsed.options;

    assert!(parsed.diagnostics.is_empty());
    assert_eq!(opts.timeout, 5);
    assert_eq!(opts.default_os, Some("ReactOS_Debug"));
    assert_eq!(opts.operating_systems.len(), 3);

    let first = &opts.operating_systems[0];
    assert_eq!(first.section, "ReactOS");
    assert_eq!(first.display_name, "ReactOS");
    assert_eq!(first.system_path, "multi(0)disk(0)rdisk(0)partition(1)\\ReactOS");
    assert_eq!(first.options, "/MININT");

    let debug = &opts.operating_systems[1];
    assert_eq!(debug.display_name, "ReactOS (Debug)");
    assert_eq!(debug.options, "/DEBUG /DEBUGPORT=COM1 /BAUDRATE=115200 /SOS");

    // No Options key: empty, not absent.
    assert_eq!(opts.operating_systems[2].options, "");
}

#[test]
fn entries_keep_document_order() {
    let mut text = String::from("[Operating Systems]\n");
    for i in 0..12 {
        text.push_str(&format!("os{}=\"Entry {}\"\n", i, i));
    }
    for i in (0..12).rev() {
        text.push_str(&format!("[os{}]\nSystemPath=path{}\n", i, i));
    }

    let parsed = parse_ok(&text);
    let names: Vec<&str> = parsed
        .options
        .operating_systems
        .iter()
        .map(|e| e.display_name)
        .collect();
    let expected: Vec<String> = (0..12).map(|i| format!("Entry {}", i)).collect();
    assert_eq!(names, expected);
}

#[test]
fn entry_without_system_path_is_dropped() {
    let text = "\
[Operating Systems]
A=\"Alpha\"
B=\"Beta\"
C=\"Gamma\"
[A]
SystemPath=pa
[B]
Options=/NOPATH
[C]
SystemPath=pc
";
    let parsed = parse_ok(text);
    let entries = &parsed.options.operating_systems;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].display_name, "Alpha");
    assert_eq!(entries[1].display_name, "Gamma");

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(
        parsed.diagnostics[0].error,
        ParseError::MissingRequiredField {
            field: Field::SystemPath
        }
    );
    assert_eq!(parsed.diagnostics[0].section, Some("B"));
    assert_eq!(parsed.diagnostics[0].line, 7);
}

#[test]
fn entry_with_missing_section_or_empty_name_is_dropped() {
    let text = "\
[Operating Systems]
Ghost=\"No Section\"
Nameless=
Real=\"Real\"
[Nameless]
SystemPath=p
[Real]
SystemPath=multi(0)
SystemPath=ignored
";
    let parsed = parse_ok(text);
    assert_eq!(parsed.options.operating_systems.len(), 1);
    assert_eq!(parsed.options.operating_systems[0].system_path, "multi(0)");

    let errors: Vec<ParseError> = parsed.diagnostics.iter().map(|d| d.error).collect();
    assert_eq!(
        errors,
        [
            ParseError::MissingRequiredField {
                field: Field::SystemPath
            },
            ParseError::MissingRequiredField {
                field: Field::DisplayName
            },
        ]
    );
}

#[test]
fn empty_system_path_counts_as_missing() {
    let parsed = parse_ok("[Operating Systems]\nX=\"X\"\n[X]\nSystemPath=\n");
    assert!(parsed.options.operating_systems.is_empty());
    assert_eq!(parsed.diagnostics.len(), 1);
}

#[test]
fn duplicate_display_names_are_kept() {
    let text =
        "[Operating Systems]\nA=\"Same\"\nB=\"Same\"\n[A]\nSystemPath=a\n[B]\nSystemPath=b\n";
    let parsed = parse_ok(text);
    assert_eq!(parsed.options.operating_systems.len(), 2);
    // First match wins.
    let mut opts = parsed.options.clone();
    opts.default_os = Some("Same");
    assert_eq!(opts.default_index(), Some(0));
}

#[test]
fn unknown_sections_and_keys_are_ignored() {
    let text = "[Display]\nTitleText=x\n[FREELOADER]\nShowTime=Yes\nTimeOut=3\n";
    let parsed = parse_ok(text);
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(parsed.options.timeout, 3);
    assert!(parsed.options.operating_systems.is_empty());
}

#[test]
fn empty_document_is_valid() {
    let parsed = parse(b"", ParseFlags::empty()).unwrap();
    assert_eq!(parsed.options.timeout, DEFAULT_TIMEOUT);
    assert_eq!(parsed.options.default_os, None);
    assert!(parsed.options.operating_systems.is_empty());
}

// ---- Policy: DefaultOS ----

#[test]
fn unmatched_default_os_is_preserved() {
    let text = "[FREELOADER]\nDefaultOS=Nowhere\n[Operating Systems]\nA=\"A\"\n[A]\nSystemPath=a\n";
    let parsed = parse_ok(text);
    assert_eq!(parsed.options.default_os, Some("Nowhere"));
    assert_eq!(parsed.options.default_index(), None);
}

#[test]
fn default_os_resolves_display_name_then_section() {
    let parsed = parse_ok(FREELDR_INI);
    // DefaultOS=ReactOS_Debug is a section key, not a display name.
    assert_eq!(parsed.options.default_index(), Some(1));

    let mut opts = parsed.options.clone();
    opts.default_os = Some("windows server 2003");
    let index = opts.default_index().unwrap();
    assert_eq!(opts.operating_systems[index].section, "Windows");
}

#[test]
fn duplicate_default_os_first_wins() {
    let parsed = parse_ok("[FREELOADER]\nDefaultOS=One\nDefaultOS=Two\n");
    assert_eq!(parsed.options.default_os, Some("One"));
}

#[test]
fn empty_default_os_is_absent() {
    let parsed = parse_ok("[FREELOADER]\nDefaultOS=\n");
    assert_eq!(parsed.options.default_os, None);
}

#[test]
fn policy_keys_fall_back_to_global_section() {
    let parsed = parse_ok("TimeOut=0\nDefaultOS=\"A\"\n[Operating Systems]\n");
    assert_eq!(parsed.options.timeout, 0);
    assert_eq!(parsed.options.default_os, Some("A"));

    let parsed = parse_ok("TimeOut=1\n[FREELOADER]\nTimeOut=2\n");
    assert_eq!(parsed.options.timeout, 2);
}

// ---- Policy: TimeOut ----

#[test]
fn absent_timeout_uses_default() {
    let parsed = parse_ok("[FREELOADER]\nDefaultOS=x\n");
    assert_eq!(parsed.options.timeout, DEFAULT_TIMEOUT);
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn invalid_timeout_falls_back_with_diagnostic() {
    let text = "[FREELOADER]\nTimeOut=abc\n[Operating Systems]\nA=\"A\"\n[A]\nSystemPath=a\n";
    let parsed = parse_ok(text);

    assert_eq!(parsed.options.timeout, DEFAULT_TIMEOUT);
    assert_eq!(parsed.options.operating_systems.len(), 1);
    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(
        parsed.diagnostics[0].error,
        ParseError::InvalidNumericField {
            field: Field::Timeout
        }
    );
    assert_eq!(parsed.diagnostics[0].line, 2);
    assert_eq!(parsed.diagnostics[0].section, Some("FREELOADER"));
}

#[test]
fn overflowing_timeout_falls_back() {
    let parsed = parse_ok("[FREELOADER]\nTimeOut=18446744073709551616\n");
    assert_eq!(parsed.options.timeout, DEFAULT_TIMEOUT);
    assert_eq!(parsed.diagnostics.len(), 1);

    let parsed = parse_ok("[FREELOADER]\nTimeOut=18446744073709551615\n");
    assert_eq!(parsed.options.timeout, u64::MAX);
}

#[test]
fn decimal_parser_rejects_signs_and_spaces() {
    assert_eq!(parse_decimal_u64("0"), Some(0));
    assert_eq!(parse_decimal_u64("007"), Some(7));
    assert_eq!(parse_decimal_u64("30"), Some(30));
    assert_eq!(parse_decimal_u64(""), None);
    assert_eq!(parse_decimal_u64("+5"), None);
    assert_eq!(parse_decimal_u64("-1"), None);
    assert_eq!(parse_decimal_u64("1 0"), None);
    assert_eq!(parse_decimal_u64("0x10"), None);
    assert_eq!(parse_decimal_u64("５"), None);
}

#[test]
fn required_timeout_invalid_is_fatal() {
    let err = parse(b"[FREELOADER]\nTimeOut=abc\n", ParseFlags::REQUIRE_TIMEOUT).unwrap_err();
    assert_eq!(
        err,
        ParseError::InvalidNumericField {
            field: Field::Timeout
        }
    );
}

#[test]
fn required_timeout_absent_is_fatal() {
    let err = parse(b"[FREELOADER]\n", ParseFlags::REQUIRE_TIMEOUT).unwrap_err();
    assert_eq!(
        err,
        ParseError::MissingRequiredField {
            field: Field::Timeout
        }
    );
}

#[test]
fn required_timeout_present_parses() {
    let parsed = parse(b"[FREELOADER]\nTimeOut=0\n", ParseFlags::REQUIRE_TIMEOUT).unwrap();
    assert_eq!(parsed.options.timeout, 0);
}

#[test]
fn unknown_flag_bits_are_ignored() {
    let flags = ParseFlags::from_bits_truncate(0xFFFF_FFFE);
    assert!(flags.is_empty());
}

#[test]
fn diagnostic_display_mentions_line_and_section() {
    let parsed = parse_ok("[FREELOADER]\nTimeOut=soon\n");
    let text = format!("{}", parsed.diagnostics[0]);
    assert_eq!(text, "line 2 [FREELOADER]: invalid numeric value for TimeOut");
}

#[test]
fn comment_lines_inside_the_listing_are_skipped() {
    let text = "[Operating Systems]\n\
                ; key = entry section, value = display name\n\
                ReactOS=\"ReactOS\"\n\
                [ReactOS]\n\
                SystemPath=x\n";
    let parsed = parse_ok(text);
    assert_eq!(parsed.options.operating_systems.len(), 1);
    assert_eq!(parsed.options.operating_systems[0].display_name, "ReactOS");
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn trailing_semicolon_text_stays_in_the_value() {
    let parsed = parse_ok("[Operating Systems]\nR=\"ReactOS\" ; note\n[R]\nSystemPath=x\n");
    assert_eq!(
        parsed.options.operating_systems[0].display_name,
        "\"ReactOS\" ; note"
    );
}
