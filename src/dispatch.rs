//! C4: the string→template dispatcher.
//!
//! Given a raw byte string and the quote token a configuration reader
//! recorded for it, decides which `Tmpl` kind it becomes.

use crate::attrref::{parse_attr_ref_full, ParseOpts};
use crate::dictionary::Dictionary;
use crate::error::{TmplError, TmplResult};
use crate::value::{DataTmpl, DatumValue, ListRef, Quote, RequestRef, Tmpl};

/// Build a template from a quoted source string.
pub fn string_to_tmpl(
    raw: &str,
    quote: Quote,
    default_request: RequestRef,
    default_list: ListRef,
    do_unescape: bool,
    dict: &dyn Dictionary,
) -> TmplResult<Tmpl> {
    let tmpl = string_to_tmpl_inner(raw, quote, default_request, default_list, do_unescape, dict)?;
    if cfg!(debug_assertions) {
        crate::verify::verify(&tmpl);
    }
    Ok(tmpl)
}

fn string_to_tmpl_inner(
    raw: &str,
    quote: Quote,
    default_request: RequestRef,
    default_list: ListRef,
    do_unescape: bool,
    dict: &dyn Dictionary,
) -> TmplResult<Tmpl> {
    match quote {
        Quote::Bare => bare_to_tmpl(raw, default_request, default_list, do_unescape, dict),
        Quote::Single => Ok(Tmpl::unparsed(maybe_unescape(raw, do_unescape), Quote::Single)),
        Quote::Double => {
            let name = maybe_unescape(raw, do_unescape);
            if contains_percent(&name) {
                Ok(Tmpl::Xlat(crate::value::Literal { name, quote: Quote::Double }))
            } else {
                Ok(Tmpl::unparsed(name, Quote::Double))
            }
        }
        Quote::Back => Ok(Tmpl::exec(maybe_unescape(raw, do_unescape))),
        Quote::Slash => Ok(Tmpl::regex(raw.to_string())),
        Quote::Invalid => Err(TmplError::InvariantViolation("string_to_tmpl called with Quote::Invalid".into())),
    }
}

fn bare_to_tmpl(
    raw: &str,
    default_request: RequestRef,
    default_list: ListRef,
    do_unescape: bool,
    dict: &dyn Dictionary,
) -> TmplResult<Tmpl> {
    if looks_like_hex_literal(raw) {
        let octets = parse_hex_literal(raw)?;
        return Tmpl::from_data(DatumValue::Octets(octets), raw.to_string(), Quote::Bare);
    }

    let allow_undefined = raw.starts_with('&');
    let opts = ParseOpts {
        default_request,
        default_list,
        allow_unknown: true,
        allow_undefined,
    };
    match parse_attr_ref_full(raw, &opts, dict) {
        Ok(tmpl) => Ok(tmpl),
        Err(_) => Ok(Tmpl::unparsed(maybe_unescape(raw, do_unescape), Quote::Bare)),
    }
}

/// The original commits to the hex branch on the `0x` prefix alone ("no
/// attribute names start with 0x, and if they did, the user can just use the
/// explicit `&` prefix") and hard-errors on anything malformed past that
/// point — it does not fall back to treating `0xzz` as a literal.
fn looks_like_hex_literal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with("0x")
}

fn parse_hex_literal(s: &str) -> TmplResult<Vec<u8>> {
    let payload = &s[2..];
    if payload.is_empty() {
        return Err(TmplError::Parse { offset: s.len() as isize, reason: "zero-length hex string is invalid".into() });
    }
    if payload.len() % 2 != 0 {
        return Err(TmplError::Parse { offset: s.len() as isize, reason: "hex string has odd length".into() });
    }
    let mut out = Vec::with_capacity(payload.len() / 2);
    for (i, pair) in payload.as_bytes().chunks(2).enumerate() {
        let digit = |b: u8| (b as char).to_digit(16);
        match (digit(pair[0]), digit(pair[1])) {
            (Some(hi), Some(lo)) => out.push(((hi << 4) | lo) as u8),
            _ => {
                return Err(TmplError::Parse {
                    offset: (2 + i * 2) as isize,
                    reason: "hex string contains a non-hex character".into(),
                })
            }
        }
    }
    Ok(out)
}

fn contains_percent(s: &str) -> bool {
    s.as_bytes().iter().enumerate().any(|(i, &b)| b == b'%' && (i == 0 || s.as_bytes()[i - 1] != b'\\'))
}

fn maybe_unescape(s: &str, do_unescape: bool) -> String {
    if !do_unescape {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StaticDictionary;

    fn dict() -> StaticDictionary {
        StaticDictionary::with_defaults()
    }

    #[test]
    fn hex_literal_becomes_octets() {
        let d = dict();
        let t = string_to_tmpl("0xdeadbeef", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        match t {
            Tmpl::Data(DataTmpl { value: DatumValue::Octets(b), .. }) => {
                assert_eq!(b, vec![0xde, 0xad, 0xbe, 0xef]);
            }
            other => panic!("expected Data(Octets), got {other:?}"),
        }
    }

    #[test]
    fn bare_attribute_reference_is_recognised() {
        let d = dict();
        let t = string_to_tmpl("&request:User-Name", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        assert!(matches!(t, Tmpl::Attr(_)));
    }

    #[test]
    fn bare_literal_falls_back_to_unparsed() {
        let d = dict();
        let t = string_to_tmpl("hello-world", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        match t {
            Tmpl::Unparsed(l) => assert_eq!(l.name, "hello-world"),
            other => panic!("expected Unparsed, got {other:?}"),
        }
    }

    #[test]
    fn double_quoted_with_percent_is_xlat() {
        let d = dict();
        let t = string_to_tmpl("hello %{User-Name}", Quote::Double, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        match t {
            Tmpl::Xlat(l) => assert_eq!(l.name, "hello %{User-Name}"),
            other => panic!("expected Xlat, got {other:?}"),
        }
    }

    #[test]
    fn double_quoted_without_percent_is_unparsed() {
        let d = dict();
        let t = string_to_tmpl("hello world", Quote::Double, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        assert!(matches!(t, Tmpl::Unparsed(_)));
    }

    #[test]
    fn back_quoted_is_exec() {
        let d = dict();
        let t = string_to_tmpl("/bin/echo hi", Quote::Back, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        assert!(matches!(t, Tmpl::Exec(_)));
    }

    #[test]
    fn slash_quoted_is_regex() {
        let d = dict();
        let t = string_to_tmpl("^foo.*bar$", Quote::Slash, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        assert!(matches!(t, Tmpl::Regex(_)));
    }

    #[test]
    fn any_0x_prefix_commits_to_the_hex_branch() {
        assert!(looks_like_hex_literal("0xabc"));
        assert!(looks_like_hex_literal("0xabcd"));
        assert!(looks_like_hex_literal("0x"));
    }

    #[test]
    fn odd_length_hex_payload_is_a_parse_error() {
        let d = dict();
        let err = string_to_tmpl("0xabc", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap_err();
        assert!(matches!(err, TmplError::Parse { .. }));
    }

    #[test]
    fn zero_length_hex_payload_is_a_parse_error() {
        let d = dict();
        let err = string_to_tmpl("0x", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap_err();
        assert!(matches!(err, TmplError::Parse { .. }));
    }

    #[test]
    fn non_hex_character_in_payload_is_a_parse_error() {
        let d = dict();
        let err = string_to_tmpl("0xdeadbeeg", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap_err();
        match err {
            TmplError::Parse { offset, .. } => assert_eq!(offset, 8),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn single_zero_byte_hex_literal_parses() {
        let d = dict();
        let t = string_to_tmpl("0x00", Quote::Bare, RequestRef::Current, ListRef::Request, false, &d).unwrap();
        match t {
            Tmpl::Data(DataTmpl { value: DatumValue::Octets(b), .. }) => assert_eq!(b, vec![0u8]),
            other => panic!("expected Data(Octets), got {other:?}"),
        }
    }
}
