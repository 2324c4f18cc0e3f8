//! The request graph that the resolver and cursor operate over.
//!
//! Mirrors the slice of the original's `REQUEST` struct that `tmpl.c` actually
//! touches: the top-level packet/reply, control and session-state lists, and
//! optional parent/outer/proxy/coa/dm links. CHAP, crypt, and realm fields are
//! out of scope (see the purpose-and-scope notes).

use crate::dictionary::DictAttr;
use crate::value::DatumValue;

/// RFC 5176 packet codes, needed only to gate `Coa`/`Dm` list resolution.
pub const DISCONNECT_REQUEST: u32 = 40;
pub const COA_REQUEST: u32 = 43;

/// One attribute instance: a dictionary handle, an optional tag, and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub dict_attr: DictAttr,
    pub tag: Option<u8>,
    pub value: DatumValue,
}

impl Pair {
    pub fn new(dict_attr: DictAttr, tag: Option<u8>, value: DatumValue) -> Self {
        Self { dict_attr, tag, value }
    }
}

/// An insertion-ordered attribute list. A `Vec` rather than an intrusive
/// linked list — cursor semantics over stable indices give the same
/// "insertion order, stable at match time" contract without the ownership
/// headaches of a hand-rolled linked structure in safe Rust.
pub type PairList = Vec<Pair>;

/// A request or reply packet: a numeric code plus its two lists.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    pub code: u32,
    pub request: PairList,
    pub reply: PairList,
}

/// A single node in the request graph.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub control: PairList,
    pub state: PairList,
    pub packet: Packet,
    pub parent: Option<Box<Request>>,
    pub outer: Option<Box<Request>>,
    pub proxy: Option<Box<Request>>,
    pub coa: Option<Box<Request>>,
    pub dm: Option<Box<Request>>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy(mut self, proxy: Request) -> Self {
        self.proxy = Some(Box::new(proxy));
        self
    }

    pub fn with_parent(mut self, parent: Request) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn with_coa(mut self, coa: Request) -> Self {
        self.coa = Some(Box::new(coa));
        self
    }

    pub fn with_dm(mut self, dm: Request) -> Self {
        self.dm = Some(Box::new(dm));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_has_empty_lists() {
        let r = Request::new();
        assert!(r.control.is_empty());
        assert!(r.packet.request.is_empty());
        assert!(r.parent.is_none());
    }

    #[test]
    fn builder_methods_nest_sub_requests() {
        let mut coa_proxy = Request::new();
        coa_proxy.packet.code = COA_REQUEST;
        let coa = Request::new().with_proxy(coa_proxy);
        let req = Request::new().with_coa(coa);
        assert_eq!(req.coa.as_ref().unwrap().proxy.as_ref().unwrap().packet.code, COA_REQUEST);
    }
}
