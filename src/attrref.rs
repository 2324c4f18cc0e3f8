//! C2: the attribute-reference grammar.
//!
//! `request_ref. list_ref: name [:tag] [index]`, with an optional leading
//! `&`, OID fallback (`Attr-1.2.3.4`), and undefined-attribute capture. A
//! hand-rolled scanner rather than a `nom` combinator tree: nom's error
//! model is built around `nom::Err<E>` over the remaining input, not the
//! signed "bytes consumed vs. failing byte position" convention this
//! grammar's callers expect, and threading an explicit `Dictionary` lookup
//! mid-parse doesn't fit a pure combinator shape cleanly either.

use crate::dictionary::{parse_oid, Dictionary};
use crate::error::{TmplError, TmplResult};
use crate::qualifier::{parse_list_name, parse_request_name};
use crate::value::{
    AttrTmpl, DictAttrRef, ListRef, ListTmpl, Num, RequestRef, Tag, Tmpl, UndefinedTmpl,
    MAX_INSTANCE_INDEX, MAX_TAG_VALUE, MAX_UNDEFINED_NAME,
};

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Parse options threaded through a single attribute-ref parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseOpts {
    pub default_request: RequestRef,
    pub default_list: ListRef,
    pub allow_unknown: bool,
    pub allow_undefined: bool,
}

impl Default for ParseOpts {
    fn default() -> Self {
        Self {
            default_request: RequestRef::Current,
            default_list: ListRef::Request,
            allow_unknown: false,
            allow_undefined: false,
        }
    }
}

/// Parse a prefix of `input` as an attribute reference. On success, returns
/// the number of bytes consumed and the resulting template; trailing bytes
/// (if any) are left for the caller, matching the "substr" surface from the
/// external-interfaces section. Use [`parse_attr_ref_full`] to additionally
/// reject trailing garbage.
pub fn parse_attr_ref(input: &str, opts: &ParseOpts, dict: &dyn Dictionary) -> TmplResult<(usize, Tmpl)> {
    let result = parse_attr_ref_inner(input, opts, dict)?;
    if cfg!(debug_assertions) {
        crate::verify::verify(&result.1);
    }
    Ok(result)
}

fn parse_attr_ref_inner(input: &str, opts: &ParseOpts, dict: &dyn Dictionary) -> TmplResult<(usize, Tmpl)> {
    let mut pos = 0usize;
    let mut s = input;

    if let Some(rest) = s.strip_prefix('&') {
        s = rest;
        pos += 1;
    }

    let (consumed, request_ref) = parse_request_name(s, opts.default_request);
    if request_ref == RequestRef::Unknown {
        return Err(TmplError::Parse { offset: pos as isize, reason: "unknown request qualifier".into() });
    }
    pos += consumed;
    s = &s[consumed..];

    let (consumed, list_ref) = parse_list_name(s, opts.default_list);
    if list_ref == ListRef::Unknown {
        return Err(TmplError::Parse { offset: pos as isize, reason: "unknown list qualifier".into() });
    }
    pos += consumed;
    s = &s[consumed..];

    if s.is_empty() || s.starts_with('[') {
        let (idx_len, num) = parse_index(s)?;
        pos += idx_len;
        return Ok((pos, Tmpl::List(ListTmpl { request_ref, list_ref, num })));
    }

    let name_len = s.as_bytes().iter().take_while(|&&b| is_attr_name_char(b)).count();
    let name = &s[..name_len];

    if let Some(known) = dict.lookup_by_name(name) {
        pos += name_len;
        s = &s[name_len..];
        let (tag_len, tag) = parse_tag(s, &known)?;
        pos += tag_len;
        s = &s[tag_len..];
        let (idx_len, num) = parse_index(s)?;
        pos += idx_len;
        return Ok((
            pos,
            Tmpl::Attr(AttrTmpl {
                name: name.to_string(),
                request_ref,
                list_ref,
                tag,
                num,
                dict_attr: DictAttrRef::Known(known),
                auto_converted: false,
            }),
        ));
    }

    if let Some(oid) = parse_oid(name) {
        if let Some(known) = dict.lookup_by_oid(&oid) {
            pos += name_len;
            s = &s[name_len..];
            let (tag_len, tag) = parse_tag(s, &known)?;
            pos += tag_len;
            s = &s[tag_len..];
            let (idx_len, num) = parse_index(s)?;
            pos += idx_len;
            return Ok((
                pos,
                Tmpl::Attr(AttrTmpl {
                    name: known.name.clone(),
                    request_ref,
                    list_ref,
                    tag,
                    num,
                    dict_attr: DictAttrRef::Known(known),
                    auto_converted: true,
                }),
            ));
        }

        if opts.allow_unknown {
            pos += name_len;
            s = &s[name_len..];
            let unknown = dict.define_unknown(name, &oid);
            let (idx_len, num) = parse_index(s)?;
            pos += idx_len;
            return Ok((
                pos,
                Tmpl::Attr(AttrTmpl {
                    name: name.to_string(),
                    request_ref,
                    list_ref,
                    tag: Tag::Any,
                    num,
                    dict_attr: DictAttrRef::Unknown(unknown),
                    auto_converted: false,
                }),
            ));
        }
    }

    if opts.allow_undefined {
        if name.len() > MAX_UNDEFINED_NAME {
            return Err(TmplError::NameTooLong { cap: MAX_UNDEFINED_NAME });
        }
        pos += name_len;
        s = &s[name_len..];
        let (idx_len, num) = parse_index(s)?;
        pos += idx_len;
        return Ok((
            pos,
            Tmpl::AttrUndefined(UndefinedTmpl {
                name: name.to_string(),
                request_ref,
                list_ref,
                num,
            }),
        ));
    }

    Err(TmplError::UnknownAttr { name: name.to_string() })
}

/// Like [`parse_attr_ref`] but errors if any input remains after the parse.
pub fn parse_attr_ref_full(input: &str, opts: &ParseOpts, dict: &dyn Dictionary) -> TmplResult<Tmpl> {
    let (consumed, tmpl) = parse_attr_ref(input, opts, dict)?;
    if consumed != input.len() {
        return Err(TmplError::Parse {
            offset: consumed as isize,
            reason: format!("unexpected text after {}", type_name(&tmpl)),
        });
    }
    Ok(tmpl)
}

fn type_name(tmpl: &Tmpl) -> &'static str {
    match tmpl {
        Tmpl::Attr(_) => "attribute reference",
        Tmpl::AttrUndefined(_) => "undefined attribute reference",
        Tmpl::List(_) => "list reference",
        _ => "template",
    }
}

fn parse_tag(s: &str, known: &crate::dictionary::DictAttr) -> TmplResult<(usize, Tag)> {
    // No `:tag` suffix at all defaults to `Any` (match any tag), not `None`
    // (match only untagged pairs) — the original sets `attr.tag = TAG_ANY`
    // before ever looking for a `:digits` suffix.
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b':') {
        return Ok((0, Tag::Any));
    }
    let rest = &bytes[1..];
    let digit_len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digit_len == 0 {
        return Ok((0, Tag::Any));
    }
    if !known.has_tag {
        return Err(TmplError::Parse { offset: 0, reason: format!("'{}' is not a tagged attribute", known.name) });
    }
    let digits = std::str::from_utf8(&rest[..digit_len]).expect("ascii digits are valid utf8");
    let value: u32 = digits.parse().expect("ascii digits parse as u32");
    if value > MAX_TAG_VALUE as u32 {
        return Err(TmplError::Parse { offset: 1, reason: format!("tag {value} exceeds maximum of {MAX_TAG_VALUE}") });
    }
    Ok((1 + digit_len, Tag::Value(value as u8)))
}

fn parse_index(s: &str) -> TmplResult<(usize, Num)> {
    if !s.starts_with('[') {
        return Ok((0, Num::Any));
    }
    let bytes = s.as_bytes();
    let close = bytes.iter().position(|&b| b == b']').ok_or(TmplError::Parse {
        offset: 0,
        reason: "missing closing ']'".into(),
    })?;
    let body = &s[1..close];
    let num = match body {
        "*" => Num::All,
        "#" => Num::Count,
        "n" => Num::Last,
        digits => {
            let value: u32 = digits.parse().map_err(|_| TmplError::Parse {
                offset: 1,
                reason: format!("invalid instance selector '{body}'"),
            })?;
            if value > MAX_INSTANCE_INDEX {
                return Err(TmplError::Parse {
                    offset: 1,
                    reason: format!("instance index {value} exceeds maximum of {MAX_INSTANCE_INDEX}"),
                });
            }
            Num::Index(value)
        }
    };
    Ok((close + 1, num))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StaticDictionary;

    fn dict() -> StaticDictionary {
        StaticDictionary::with_defaults()
    }

    #[test]
    fn plain_request_attribute() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (consumed, tmpl) = parse_attr_ref("&request:User-Name", &opts, &d).unwrap();
        assert_eq!(consumed, "&request:User-Name".len());
        match tmpl {
            Tmpl::Attr(a) => {
                assert_eq!(a.request_ref, RequestRef::Current);
                assert_eq!(a.list_ref, ListRef::Request);
                assert_eq!(a.name, "User-Name");
                assert_eq!(a.num, Num::Any);
            }
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn reply_with_index() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref("&reply:Framed-IP-Address[0]", &opts, &d).unwrap();
        match tmpl {
            Tmpl::Attr(a) => {
                assert_eq!(a.list_ref, ListRef::Reply);
                assert_eq!(a.num, Num::Index(0));
            }
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn tag_on_tagged_attribute() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref("&control:Tunnel-Password:3", &opts, &d).unwrap();
        match tmpl {
            Tmpl::Attr(a) => assert_eq!(a.tag, Tag::Value(3)),
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn tag_on_untagged_attribute_is_error() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let err = parse_attr_ref("&control:User-Name:3", &opts, &d).unwrap_err();
        assert!(matches!(err, TmplError::Parse { .. }));
    }

    #[test]
    fn outer_request_qualifier() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref("&outer.request:User-Name", &opts, &d).unwrap();
        match tmpl {
            Tmpl::Attr(a) => assert_eq!(a.request_ref, RequestRef::Outer),
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn bare_list_reference() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref_full("&proxy-reply:", &opts, &d).unwrap();
        match tmpl {
            Tmpl::List(l) => assert_eq!(l.list_ref, ListRef::ProxyReply),
            other => panic!("expected List, got {other:?}"),
        }
    }

    #[test]
    fn undefined_attribute_captured_when_allowed() {
        let d = dict();
        let opts = ParseOpts { allow_undefined: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref_full("&Some-Unknown-Attr", &opts, &d).unwrap();
        match tmpl {
            Tmpl::AttrUndefined(u) => assert_eq!(u.name, "Some-Unknown-Attr"),
            other => panic!("expected AttrUndefined, got {other:?}"),
        }
    }

    #[test]
    fn undefined_attribute_rejected_when_disallowed() {
        let d = dict();
        let opts = ParseOpts::default();
        let err = parse_attr_ref_full("&Some-Unknown-Attr", &opts, &d).unwrap_err();
        assert!(matches!(err, TmplError::UnknownAttr { .. }));
    }

    #[test]
    fn oid_fallback_auto_converts_to_known_name() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref_full("&Attr-1", &opts, &d).unwrap();
        match tmpl {
            Tmpl::Attr(a) => {
                assert!(a.auto_converted);
                assert_eq!(a.name, "User-Name");
            }
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn unknown_oid_embeds_self_owned_descriptor() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        let (_, tmpl) = parse_attr_ref_full("&Attr-26.9999.1", &opts, &d).unwrap();
        match tmpl {
            Tmpl::Attr(a) => assert!(a.dict_attr.is_unknown()),
            other => panic!("expected Attr, got {other:?}"),
        }
    }

    #[test]
    fn trailing_garbage_is_rejected_by_full_parse() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        assert!(parse_attr_ref_full("&request:User-Name extra", &opts, &d).is_err());
    }

    #[test]
    fn index_1001_is_rejected_1000_accepted() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        assert!(parse_attr_ref_full("&reply:Framed-IP-Address[1000]", &opts, &d).is_ok());
        assert!(parse_attr_ref_full("&reply:Framed-IP-Address[1001]", &opts, &d).is_err());
    }

    #[test]
    fn tag_32_is_rejected_31_accepted() {
        let d = dict();
        let opts = ParseOpts { allow_unknown: true, ..Default::default() };
        assert!(parse_attr_ref_full("&control:Tunnel-Password:31", &opts, &d).is_ok());
        assert!(parse_attr_ref_full("&control:Tunnel-Password:32", &opts, &d).is_err());
    }
}
