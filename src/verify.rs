//! C8: the invariant verifier.
//!
//! The original's `tmpl_verify` walks a `vp_tmpl_t`'s union and asserts the
//! bytes outside the active variant are all zero (`CHECK_ZEROED`), plus a
//! handful of kind-specific checks, aborting the process on any violation.
//! An enum makes cross-variant aliasing unrepresentable, so `CHECK_ZEROED`
//! has no counterpart here — what's left is exactly the checks that survive
//! the type system: name/quote coherence, tag/index bounds, and the
//! self-ownership rule for unknown attributes. `verify` panics rather than
//! returning `Result`, matching the original's "this is a consistency gate,
//! not an error channel" design (§7).

use crate::value::{DictAttrRef, MAX_INSTANCE_INDEX, MAX_TAG_VALUE, MAX_UNDEFINED_NAME};
use crate::value::{Num, Quote, Tag, Tmpl};

/// Assert every structural invariant §3 places on `tmpl`. Call at every
/// mutating entry point and resolver call when debug assertions are on;
/// a violation here means a bug in this crate, not bad caller input, so it
/// panics instead of returning an error.
pub fn verify(tmpl: &Tmpl) {
    verify_name_quote_coherence(tmpl);

    match tmpl {
        Tmpl::Null => {}
        Tmpl::Unparsed(_) => {}
        Tmpl::Xlat(_) | Tmpl::XlatCompiled(_) => {}
        Tmpl::Exec(_) => {}
        Tmpl::Regex(l) => {
            assert!(matches!(l.quote, Quote::Bare | Quote::Slash), "Regex template has an implausible quote: {:?}", l.quote);
        }
        Tmpl::RegexCompiled(c) => {
            assert!(!c.source.is_empty(), "RegexCompiled must retain its source even once compiled");
        }
        Tmpl::List(l) => {
            verify_num(l.num);
        }
        Tmpl::AttrUndefined(u) => {
            assert!(
                u.name.len() <= MAX_UNDEFINED_NAME,
                "AttrUndefined name '{}' exceeds the {}-byte cap",
                u.name,
                MAX_UNDEFINED_NAME
            );
            verify_num(u.num);
        }
        Tmpl::Attr(a) => {
            verify_tag(a.tag);
            verify_num(a.num);
            match &a.dict_attr {
                DictAttrRef::Unknown(d) => {
                    assert!(d.is_unknown, "DictAttrRef::Unknown wraps a descriptor with is_unknown = false");
                }
                DictAttrRef::Known(d) => {
                    assert!(!d.is_unknown, "DictAttrRef::Known wraps a descriptor with is_unknown = true");
                    if let Tag::Value(_) = a.tag {
                        assert!(d.has_tag, "concrete tag set on an attribute whose dict_attr.has_tag is false");
                    }
                }
            }
        }
        Tmpl::Data(d) => {
            let dt = d.value.data_type();
            assert!(
                !matches!(dt, crate::value::DatumType::Tlv | crate::value::DatumType::Invalid),
                "Data(TLV) / Data(Invalid) must never survive construction, got {dt:?}"
            );
        }
    }
}

fn verify_name_quote_coherence(tmpl: &Tmpl) {
    match (tmpl.name(), tmpl.quote()) {
        (None, Quote::Invalid) => {}
        (None, other) => panic!("template with no name carries quote {other:?}, expected Invalid"),
        (Some(name), Quote::Invalid) => panic!("template named '{name}' carries Quote::Invalid"),
        (Some(_), _) => {}
    }
}

fn verify_tag(tag: Tag) {
    if let Tag::Value(v) = tag {
        assert!(v <= MAX_TAG_VALUE, "tag {v} exceeds the maximum of {MAX_TAG_VALUE}");
    }
}

fn verify_num(num: Num) {
    if let Num::Index(v) = num {
        assert!(v <= MAX_INSTANCE_INDEX, "instance index {v} exceeds the maximum of {MAX_INSTANCE_INDEX}");
    }
}
