//! C6: the cursor.
//!
//! Iterates the pairs a `Tmpl::Attr`/`Tmpl::List` denotes. `Any`/`Last`/an
//! integer index are single-shot: `cursor_init` returns the one match and
//! `next` always returns `None` afterward. `All`/`Count` are multi-shot:
//! `cursor_init` returns the first match and leaves the cursor positioned to
//! yield the rest through `next`.

use crate::error::{TmplError, TmplResult};
use crate::request::{Pair, PairList, Request};
use crate::resolver::{resolve_list, resolve_request};
use crate::value::{DictAttrRef, Num, Tag, Tmpl};

pub struct Cursor<'r> {
    list: &'r PairList,
    matches: Vec<usize>,
    pos: usize,
    multi: bool,
}

impl<'r> Cursor<'r> {
    /// Advance to the next match. Only yields results for `All`/`Count`
    /// selectors; every other selector is single-shot and always returns
    /// `None` here.
    pub fn next(&mut self) -> Option<&'r Pair> {
        if !self.multi {
            return None;
        }
        let idx = *self.matches.get(self.pos)?;
        self.pos += 1;
        Some(&self.list[idx])
    }

    /// Total number of matches found at initialisation time, regardless of
    /// how many have been consumed via `next` so far.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

fn tag_matches(selector: Tag, pair_tag: Option<u8>) -> bool {
    match selector {
        Tag::Any => true,
        Tag::None => pair_tag.is_none(),
        Tag::Value(t) => pair_tag == Some(t),
    }
}

fn pick(matches: &[usize], num: Num) -> TmplResult<(Option<usize>, usize, bool)> {
    Ok(match num {
        Num::Any => (matches.first().copied(), 0, false),
        Num::Last => (matches.last().copied(), 0, false),
        Num::Index(k) => (matches.get(k as usize).copied(), 0, false),
        Num::All | Num::Count => {
            if matches.is_empty() {
                (None, 0, true)
            } else {
                (Some(matches[0]), 1, true)
            }
        }
    })
}

/// Initialise a cursor over the list/request a template addresses, and
/// return the first match (if any).
pub fn cursor_init<'r>(req: &'r Request, tmpl: &Tmpl) -> TmplResult<(Cursor<'r>, Option<&'r Pair>)> {
    if cfg!(debug_assertions) {
        crate::verify::verify(tmpl);
    }
    match tmpl {
        Tmpl::Attr(a) => {
            let resolved = resolve_request(req, a.request_ref)?;
            let list = resolve_list(resolved, a.list_ref)?;
            let dict_attr = a.dict_attr.as_dict_attr();
            let matches: Vec<usize> = list
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.dict_attr.vendor == dict_attr.vendor
                        && p.dict_attr.attr == dict_attr.attr
                        && tag_matches(a.tag, p.tag)
                })
                .map(|(i, _)| i)
                .collect();
            let (first, pos, multi) = pick(&matches, a.num)?;
            let cursor = Cursor { list, matches, pos, multi };
            let first_pair = first.map(|i| &list[i]);
            if first_pair.is_none() && !matches!(a.dict_attr, DictAttrRef::Unknown(_)) {
                return Err(TmplError::NoMatch);
            }
            Ok((cursor, first_pair))
        }
        Tmpl::List(l) => {
            let resolved = resolve_request(req, l.request_ref)?;
            let list = resolve_list(resolved, l.list_ref)?;
            let matches: Vec<usize> = (0..list.len()).collect();
            let (first, pos, multi) = pick(&matches, l.num)?;
            let cursor = Cursor { list, matches, pos, multi };
            let first_pair = first.map(|i| &list[i]);
            Ok((cursor, first_pair))
        }
        other => Err(TmplError::InvariantViolation(format!("cursor_init requires Attr or List, got {other:?}"))),
    }
}
