//! tmpl-engine: the typed attribute-reference template engine.
//!
//! A `Tmpl` ([`value::Tmpl`]) is a parsed, self-describing value standing in
//! for one of: a literal string, an unexpanded expression, a reference to
//! one or more attribute instances in a structured request, a reference to
//! an entire attribute list, a regex, a shell-executable string, or a fully
//! typed immediate datum. Policy rules carry templates on their left- and
//! right-hand sides; at evaluation time a template is dereferenced,
//! expanded, iterated, cast, or copied to produce concrete attribute
//! values.
//!
//! Module map, leaves first:
//! - [`qualifier`] (C1) — the `request.`/`list:` prefix lexer.
//! - [`attrref`] (C2) — the full attribute-reference grammar.
//! - [`value`] (C3) — the `Tmpl` tagged variant and its supporting enums.
//! - [`dispatch`] (C4) — chooses a `Tmpl` kind from a quoted source string.
//! - [`resolver`] (C5) — maps qualifiers onto a live request graph.
//! - [`cursor`] (C6) — iterates the pairs a template denotes.
//! - [`expand`] (C7) — expansion, casting, and dictionary promotion.
//! - [`verify`] (C8) — the debug-mode structural invariant checker.
//! - [`dictionary`] (C9) — the attribute-dictionary collaborator trait plus
//!   an in-memory stand-in implementation.
//! - [`request`] (C10) — the request graph `resolver`/`cursor` operate over.
//! - [`config`] / [`error`] / [`display`] — the ambient stack: tunables,
//!   the crate-local error taxonomy, and pretty-printing.

pub mod attrref;
pub mod config;
pub mod cursor;
pub mod dictionary;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod expand;
pub mod qualifier;
pub mod request;
pub mod resolver;
pub mod value;
pub mod verify;

pub use config::{ConfigLoader, EngineConfig};
pub use dictionary::{DictAttr, Dictionary, StaticDictionary};
pub use error::{TmplError, TmplResult};
pub use request::{Packet, Pair, PairList, Request};
pub use value::{
    AttrTmpl, CompiledRegex, CompiledXlat, DataTmpl, DatumType, DatumValue, DictAttrRef, ListRef,
    ListTmpl, Literal, Num, Quote, RequestRef, Tag, Tmpl, UndefinedTmpl,
};
