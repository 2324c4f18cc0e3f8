//! C5: the list/request resolver.
//!
//! Maps `RequestRef`/`ListRef` qualifiers onto concrete spots in a
//! [`Request`] graph. Read access (used by the cursor and the expansion
//! engine) takes shared references; allocation (used by `cast_to_pair`)
//! needs a mutable path to push a freshly-created pair into the right list.
//!
//! `Coa`/`Dm` lists are conditional on the sub-request's packet code — when
//! the precondition fails the list is *absent*, surfaced here as `NoList`,
//! the same error a caller sees for any other missing list. This folds the
//! original's "return NULL, don't error" behavior into the one error
//! channel the Rust API already needs for "attribute list just isn't here".

use crate::error::{TmplError, TmplResult};
use crate::request::{Packet, PairList, Request, COA_REQUEST, DISCONNECT_REQUEST};
use crate::value::{ListRef, RequestRef};

/// Follow a `RequestRef` to the request it addresses.
///
/// `Outer` falls back to `Parent` when there's no explicit `outer` link —
/// the two links coincide for a single-level proxy/CoA graph, which is all
/// the original ever builds; see the open-question note on this in the
/// design notes for why they're kept as distinct fields regardless.
pub fn resolve_request(req: &Request, r: RequestRef) -> TmplResult<&Request> {
    match r {
        RequestRef::Current | RequestRef::Unknown => Ok(req),
        RequestRef::Parent => req.parent.as_deref().ok_or(TmplError::NoContext("parent")),
        RequestRef::Outer => req
            .outer
            .as_deref()
            .or(req.parent.as_deref())
            .ok_or(TmplError::NoContext("outer")),
        RequestRef::Proxy => req.proxy.as_deref().ok_or(TmplError::NoContext("proxy")),
    }
}

fn resolve_request_mut(req: &mut Request, r: RequestRef) -> TmplResult<&mut Request> {
    match r {
        RequestRef::Current | RequestRef::Unknown => Ok(req),
        RequestRef::Parent => req.parent.as_deref_mut().ok_or(TmplError::NoContext("parent")),
        RequestRef::Outer => {
            if req.outer.is_some() {
                Ok(req.outer.as_deref_mut().expect("checked is_some"))
            } else {
                req.parent.as_deref_mut().ok_or(TmplError::NoContext("outer"))
            }
        }
        RequestRef::Proxy => req.proxy.as_deref_mut().ok_or(TmplError::NoContext("proxy")),
    }
}

/// Resolve a list qualifier to its attribute list on the given (already
/// request-resolved) request.
pub fn resolve_list(req: &Request, list: ListRef) -> TmplResult<&PairList> {
    match list {
        ListRef::Request => Ok(&req.packet.request),
        ListRef::Reply => Ok(&req.packet.reply),
        ListRef::Control => Ok(&req.control),
        ListRef::State => Ok(&req.state),
        ListRef::ProxyRequest => req.proxy.as_deref().map(|p| &p.packet.request).ok_or(TmplError::NoList),
        ListRef::ProxyReply => req.proxy.as_deref().map(|p| &p.packet.reply).ok_or(TmplError::NoList),
        ListRef::Coa => coa_packet(req, COA_REQUEST).map(|p| &p.request),
        ListRef::CoaReply => coa_packet(req, COA_REQUEST).map(|p| &p.reply),
        ListRef::Dm => dm_packet(req, DISCONNECT_REQUEST).map(|p| &p.request),
        ListRef::DmReply => dm_packet(req, DISCONNECT_REQUEST).map(|p| &p.reply),
        ListRef::Unknown => Err(TmplError::NoList),
    }
}

/// The mutable counterpart of [`resolve_list`], used only to allocate a new
/// pair into the resolved list (`cast_to_pair`). This is also the engine's
/// "allocation context": in this Rust rendering the arena a new attribute is
/// created in *is* the `Vec` it's pushed into, since packet/reply own their
/// own storage outright.
pub fn resolve_alloc_ctx<'r>(req: &'r mut Request, request_ref: RequestRef, list: ListRef) -> TmplResult<&'r mut PairList> {
    let resolved = resolve_request_mut(req, request_ref)?;
    match list {
        ListRef::Request => Ok(&mut resolved.packet.request),
        ListRef::Reply => Ok(&mut resolved.packet.reply),
        ListRef::Control => Ok(&mut resolved.control),
        ListRef::State => Ok(&mut resolved.state),
        ListRef::ProxyRequest => resolved.proxy.as_deref_mut().map(|p| &mut p.packet.request).ok_or(TmplError::NoList),
        ListRef::ProxyReply => resolved.proxy.as_deref_mut().map(|p| &mut p.packet.reply).ok_or(TmplError::NoList),
        ListRef::Coa => coa_packet_mut(resolved, COA_REQUEST).map(|p| &mut p.request),
        ListRef::CoaReply => coa_packet_mut(resolved, COA_REQUEST).map(|p| &mut p.reply),
        ListRef::Dm => dm_packet_mut(resolved, DISCONNECT_REQUEST).map(|p| &mut p.request),
        ListRef::DmReply => dm_packet_mut(resolved, DISCONNECT_REQUEST).map(|p| &mut p.reply),
        ListRef::Unknown => Err(TmplError::NoList),
    }
}

/// The packet (not list) a qualifier addresses, used for packet-identity
/// operations (transport addressing, Id allocation) rather than attribute
/// iteration. `Control`/`State` are request-scoped, not packet-scoped, and
/// return `None`.
pub fn resolve_packet(req: &Request, list: ListRef) -> Option<&Packet> {
    match list {
        ListRef::Request | ListRef::Reply => Some(&req.packet),
        ListRef::ProxyRequest | ListRef::ProxyReply => req.proxy.as_deref().map(|p| &p.packet),
        ListRef::Coa | ListRef::CoaReply => coa_packet(req, COA_REQUEST).ok(),
        ListRef::Dm | ListRef::DmReply => dm_packet(req, DISCONNECT_REQUEST).ok(),
        ListRef::Control | ListRef::State | ListRef::Unknown => None,
    }
}

fn coa_packet(req: &Request, required_code: u32) -> TmplResult<&Packet> {
    let coa = req.coa.as_deref().ok_or(TmplError::NoList)?;
    let proxy = coa.proxy.as_deref().ok_or(TmplError::NoList)?;
    if proxy.packet.code != required_code {
        return Err(TmplError::NoList);
    }
    Ok(&proxy.packet)
}

fn dm_packet(req: &Request, required_code: u32) -> TmplResult<&Packet> {
    let dm = req.dm.as_deref().ok_or(TmplError::NoList)?;
    let proxy = dm.proxy.as_deref().ok_or(TmplError::NoList)?;
    if proxy.packet.code != required_code {
        return Err(TmplError::NoList);
    }
    Ok(&proxy.packet)
}

fn coa_packet_mut(req: &mut Request, required_code: u32) -> TmplResult<&mut Packet> {
    let coa = req.coa.as_deref_mut().ok_or(TmplError::NoList)?;
    let proxy = coa.proxy.as_deref_mut().ok_or(TmplError::NoList)?;
    if proxy.packet.code != required_code {
        return Err(TmplError::NoList);
    }
    Ok(&mut proxy.packet)
}

fn dm_packet_mut(req: &mut Request, required_code: u32) -> TmplResult<&mut Packet> {
    let dm = req.dm.as_deref_mut().ok_or(TmplError::NoList)?;
    let proxy = dm.proxy.as_deref_mut().ok_or(TmplError::NoList)?;
    if proxy.packet.code != required_code {
        return Err(TmplError::NoList);
    }
    Ok(&mut proxy.packet)
}
