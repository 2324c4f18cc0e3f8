//! C7: the expansion/cast engine.
//!
//! `expand()`/`to_typed()` turn a template into bytes or a typed value
//! against a live request; `cast_in_place()`/`cast_to_pair()` convert
//! between datum types; `define_unknown()`/`define_undefined()` promote a
//! template's dictionary binding. The external collaborators (`exec`,
//! `xlat`) are modeled as traits so the engine can be exercised without a
//! real shell or expression expander.

use std::borrow::Cow;

use crate::cursor::cursor_init;
use crate::dictionary::{DictAttr, Dictionary};
use crate::error::{TmplError, TmplResult};
use crate::request::{Pair, Request};
use crate::value::{DataTmpl, DatumType, DatumValue, DictAttrRef, Quote, Tmpl};

/// Runs an `Exec` template's source as an external program. Implementations
/// must honor `timeout_ms` and must not invoke a shell.
pub trait ExecRunner: Send + Sync {
    fn run(&self, command: &str, timeout_ms: u64) -> TmplResult<Vec<u8>>;
}

/// Expands an `Xlat`/`XlatCompiled` template's `%{...}` source against a
/// request.
pub trait XlatExpander: Send + Sync {
    fn expand(&self, source: &str, req: &Request) -> TmplResult<Vec<u8>>;
}

/// Bundles the external collaborators `expand`/`to_typed` need.
pub struct ExpandCtx<'a> {
    pub dict: &'a dyn Dictionary,
    pub exec: &'a dyn ExecRunner,
    pub xlat: &'a dyn XlatExpander,
    pub exec_timeout_ms: u64,
}

/// Expand a template to its byte representation. `String`/`Octets` pairs and
/// data are returned borrowed where possible; everything else is
/// pretty-printed into an owned buffer.
pub fn expand<'r>(req: &'r Request, tmpl: &'r Tmpl, ctx: &ExpandCtx) -> TmplResult<Cow<'r, [u8]>> {
    match tmpl {
        Tmpl::Unparsed(l) => Ok(Cow::Borrowed(l.name.as_bytes())),
        Tmpl::Exec(l) => ctx
            .exec
            .run(&l.name, ctx.exec_timeout_ms)
            .map(Cow::Owned)
            .map_err(|e| TmplError::ExecFailed(e.to_string())),
        Tmpl::Xlat(l) => ctx
            .xlat
            .expand(&l.name, req)
            .map(Cow::Owned)
            .map_err(|e| TmplError::XlatFailed(e.to_string())),
        Tmpl::XlatCompiled(c) => ctx
            .xlat
            .expand(&c.source, req)
            .map(Cow::Owned)
            .map_err(|e| TmplError::XlatFailed(e.to_string())),
        Tmpl::Attr(a) => {
            let (_, pair) = cursor_init(req, tmpl)?;
            let pair = pair.ok_or(TmplError::NoMatch)?;
            let _ = a;
            Ok(match &pair.value {
                DatumValue::String(s) => Cow::Borrowed(s.as_bytes()),
                DatumValue::Octets(b) => Cow::Borrowed(b.as_slice()),
                other => Cow::Owned(other.as_bytes().into_owned()),
            })
        }
        Tmpl::Data(d) => Ok(match &d.value {
            DatumValue::String(s) => Cow::Borrowed(s.as_bytes()),
            DatumValue::Octets(b) => Cow::Borrowed(b.as_slice()),
            other => Cow::Owned(other.as_bytes().into_owned()),
        }),
        Tmpl::List(_) | Tmpl::Regex(_) | Tmpl::AttrUndefined(_) | Tmpl::RegexCompiled(_) | Tmpl::Null => {
            Err(TmplError::InvariantViolation(format!("{tmpl:?} can never be expanded")))
        }
    }
}

/// Expand and then cast the result to a declared datum type.
pub fn to_typed(req: &Request, tmpl: &Tmpl, ctx: &ExpandCtx, dst_type: DatumType) -> TmplResult<DatumValue> {
    let bytes = expand(req, tmpl, ctx)?;
    cast_bytes(&bytes, dst_type)
}

fn cast_bytes(bytes: &[u8], dst_type: DatumType) -> TmplResult<DatumValue> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| TmplError::Parse { offset: 0, reason: format!("not valid utf-8: {e}") })?;
    cast_str(text, dst_type)
}

fn cast_str(text: &str, dst_type: DatumType) -> TmplResult<DatumValue> {
    Ok(match dst_type {
        DatumType::String => DatumValue::String(text.to_string()),
        DatumType::Octets => DatumValue::Octets(text.as_bytes().to_vec()),
        DatumType::Integer => DatumValue::Integer(
            text.parse()
                .map_err(|_| TmplError::Parse { offset: 0, reason: format!("'{text}' is not an integer") })?,
        ),
        DatumType::Decimal => DatumValue::Decimal(
            text.parse()
                .map_err(|_| TmplError::Parse { offset: 0, reason: format!("'{text}' is not a decimal") })?,
        ),
        DatumType::Date => DatumValue::Date(
            chrono::DateTime::parse_from_rfc3339(text)
                .map(|d| d.with_timezone(&chrono::Utc))
                .map_err(|_| TmplError::Parse { offset: 0, reason: format!("'{text}' is not an RFC3339 date") })?,
        ),
        DatumType::Boolean => DatumValue::Boolean(
            text.parse()
                .map_err(|_| TmplError::Parse { offset: 0, reason: format!("'{text}' is not a boolean") })?,
        ),
        DatumType::Tlv | DatumType::Invalid => {
            return Err(TmplError::InvariantViolation("cannot cast to Tlv/Invalid".into()))
        }
    })
}

/// Cast a template's value type in place. `Unparsed` becomes `Data`;
/// `Data(src)` becomes `Data(dst)`. Idempotent: casting `Data(T)` to `T`
/// again is a no-op.
pub fn cast_in_place(tmpl: &mut Tmpl, dst_type: DatumType) -> TmplResult<()> {
    match tmpl {
        Tmpl::Unparsed(l) => {
            let value = cast_str(&l.name, dst_type)?;
            let name = l.name.clone();
            let quote = l.quote;
            *tmpl = Tmpl::from_data(value, name, quote)?;
        }
        Tmpl::Data(d) => {
            if d.value.data_type() == dst_type {
                return Ok(());
            }
            let text = match &d.value {
                DatumValue::String(s) => s.clone(),
                other => String::from_utf8_lossy(&other.as_bytes()).into_owned(),
            };
            d.value = cast_str(&text, dst_type)?;
        }
        other => return Err(TmplError::InvariantViolation(format!("cast_in_place requires Unparsed or Data, got {other:?}"))),
    }
    if cfg!(debug_assertions) {
        crate::verify::verify(tmpl);
    }
    Ok(())
}

/// Expand a template and parse the result into a fresh [`Pair`] for
/// `cast_da`. The caller pushes the returned pair into the list obtained
/// from [`crate::resolver::resolve_alloc_ctx`].
pub fn cast_to_pair(req: &Request, tmpl: &Tmpl, cast_da: &DictAttr, ctx: &ExpandCtx) -> TmplResult<Pair> {
    let value = match tmpl {
        Tmpl::Data(d) => d.value.clone(),
        _ => {
            let bytes = expand(req, tmpl, ctx)?;
            cast_bytes(&bytes, cast_da.data_type)?
        }
    };
    Ok(Pair::new(cast_da.clone(), None, value))
}

/// Promote `Attr(unknown)` to a real dictionary entry. Idempotent: calling
/// this twice on an already-known attribute is a no-op.
pub fn define_unknown(tmpl: &mut Tmpl, dict: &dyn Dictionary) -> TmplResult<()> {
    let Tmpl::Attr(a) = tmpl else {
        return Err(TmplError::InvariantViolation("define_unknown requires Attr".into()));
    };
    let DictAttrRef::Unknown(descriptor) = &a.dict_attr else {
        return Ok(());
    };
    let mut promoted = descriptor.clone();
    promoted.is_unknown = false;
    dict.insert(promoted.clone())?;
    a.dict_attr = DictAttrRef::Known(promoted);
    tracing::warn!(name = %a.name, "promoted unknown attribute into the dictionary");
    if cfg!(debug_assertions) {
        crate::verify::verify(tmpl);
    }
    Ok(())
}

/// Promote `AttrUndefined` to `Attr(known)`. Fails if the dictionary already
/// holds the same name with an incompatible type or tag flag.
pub fn define_undefined(tmpl: &mut Tmpl, dict: &dyn Dictionary, data_type: DatumType, has_tag: bool) -> TmplResult<()> {
    let Tmpl::AttrUndefined(u) = tmpl else {
        return Err(TmplError::InvariantViolation("define_undefined requires AttrUndefined".into()));
    };
    let resolved = match dict.lookup_by_name(&u.name) {
        Some(existing) => {
            if existing.data_type != data_type || existing.has_tag != has_tag {
                return Err(TmplError::TypeMismatch { name: u.name.clone() });
            }
            existing
        }
        None => {
            let fresh = DictAttr {
                name: u.name.clone(),
                vendor: 0,
                attr: 0,
                data_type,
                has_tag,
                is_unknown: false,
            };
            dict.insert(fresh.clone())?;
            fresh
        }
    };
    *tmpl = Tmpl::Attr(crate::value::AttrTmpl {
        name: u.name.clone(),
        request_ref: u.request_ref,
        list_ref: u.list_ref,
        tag: crate::value::Tag::Any,
        num: u.num,
        dict_attr: DictAttrRef::Known(resolved),
        auto_converted: false,
    });
    tracing::warn!("promoted undefined attribute into the dictionary");
    if cfg!(debug_assertions) {
        crate::verify::verify(tmpl);
    }
    Ok(())
}
