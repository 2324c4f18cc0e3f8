//! C1: the request/list qualifier lexer.
//!
//! Both scanners share the original's signed-offset convention internally
//! (zero means "nothing matched, caller keeps the default") but the public
//! surface stays plain `(usize, Enum)` tuples — the negative-offset trick is
//! only worth its keep at the top of the attribute-ref parser in
//! [`crate::attrref`], where it becomes a `TmplError::Parse { offset, .. }`.

use crate::value::{ListRef, RequestRef};

fn is_request_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn is_list_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

/// Scan a leading `outer.` / `current.` / `parent.` / `proxy.` qualifier.
/// Returns `(0, default)` if there's no `.`-delimited prefix at all, and
/// `(0, Unknown)` if there is one but it doesn't match a known keyword.
pub fn parse_request_name(s: &str, default: RequestRef) -> (usize, RequestRef) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_request_char(bytes[i]) {
        i += 1;
    }
    if i == 0 || i >= bytes.len() || bytes[i] != b'.' {
        return (0, default);
    }
    match &s[..i] {
        "outer" => (i + 1, RequestRef::Outer),
        "current" => (i + 1, RequestRef::Current),
        "parent" => (i + 1, RequestRef::Parent),
        "proxy" => (i + 1, RequestRef::Proxy),
        _ => (0, RequestRef::Unknown),
    }
}

/// Scan a leading list qualifier (`request:`, `reply:`, `coa-reply:`, ...).
///
/// Applies the tag-vs-list discriminator at the `:` delimiter: if the bytes
/// after `:` are all decimal digits followed by a non-list-char (or end of
/// string), this is a `:tag` on a bare attribute, not a list qualifier, and
/// the scan backs off to `(0, default)` without consuming anything.
pub fn parse_list_name(s: &str, default: ListRef) -> (usize, ListRef) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_list_char(bytes[i]) {
        i += 1;
    }
    if i == 0 {
        return (0, default);
    }
    if i >= bytes.len() {
        return match lookup_list(&s[..i]) {
            Some(l) => (i, l),
            None => (0, default),
        };
    }
    if bytes[i] != b':' {
        return (0, default);
    }
    let rest = &bytes[i + 1..];
    let mut digits = 0;
    while digits < rest.len() && rest[digits].is_ascii_digit() {
        digits += 1;
    }
    let looks_like_tag = digits > 0 && (digits == rest.len() || !is_list_char(rest[digits]));
    if looks_like_tag {
        return (0, default);
    }
    match lookup_list(&s[..i]) {
        Some(l) => (i + 1, l),
        None => (0, ListRef::Unknown),
    }
}

fn lookup_list(word: &str) -> Option<ListRef> {
    Some(match word {
        "request" => ListRef::Request,
        "reply" => ListRef::Reply,
        "control" | "config" => ListRef::Control,
        "session-state" => ListRef::State,
        "proxy-request" => ListRef::ProxyRequest,
        "proxy-reply" => ListRef::ProxyReply,
        "coa" => ListRef::Coa,
        "coa-reply" => ListRef::CoaReply,
        "disconnect" => ListRef::Dm,
        "disconnect-reply" => ListRef::DmReply,
        _ => return None,
    })
}

/// The canonical keyword for a `RequestRef`, used by the pretty-printer.
/// `Current`/`Unknown` have no canonical prefix — the printer omits
/// `current.` entirely, matching the original's "don't add &current." rule.
pub fn request_ref_name(r: RequestRef) -> Option<&'static str> {
    Some(match r {
        RequestRef::Current | RequestRef::Unknown => return None,
        RequestRef::Parent => "parent",
        RequestRef::Outer => "outer",
        RequestRef::Proxy => "proxy",
    })
}

/// The canonical keyword for a `ListRef`, used by the pretty-printer. Always
/// the primary spelling (`control`, never its `config` alias).
pub fn list_ref_name(l: ListRef) -> &'static str {
    match l {
        ListRef::Request => "request",
        ListRef::Reply => "reply",
        ListRef::Control => "control",
        ListRef::State => "session-state",
        ListRef::ProxyRequest => "proxy-request",
        ListRef::ProxyReply => "proxy-reply",
        ListRef::Coa => "coa",
        ListRef::CoaReply => "coa-reply",
        ListRef::Dm => "disconnect",
        ListRef::DmReply => "disconnect-reply",
        ListRef::Unknown => "unknown",
    }
}
