//! `capa_neg_calc`: computes the negotiated capability set from the locally
//! announced and peer-received capability sets, per spec §4.2. No module in
//! the retrieval pack implements two-sided AND-negotiation (the teacher's
//! `BgpCap` only aggregates a flat TLV list); this is authored against the
//! spec text using the per-AFI bookkeeping shape demonstrated by
//! `CapAfiMap`/`CapAfi{sent,rcvd}` in the wider BGP example code.

use serde::{Deserialize, Serialize};

use crate::codec::afi::{Afi, AfiSafi, AfiSafis, Safi};
use crate::codec::caps::bgp_cap::BgpCap;
use crate::codec::caps::role::Role;
use crate::codec::notification::OpenError;

/// Local policy for the Role capability, resolved in SPEC_FULL §9.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RolePolicy {
    #[default]
    Disabled,
    Advertise,
    Enforce { local_role: Role },
}

/// What to do with a peer's Graceful-Restart Forward indication for one
/// AFI/SAFI that this engine currently considers "Restarting" for that
/// peer, per spec §4.2 and §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrAction {
    PreserveRestarting,
    Flush,
}

#[derive(Debug, Clone, Default)]
pub struct NegotiationResult {
    pub negotiated: BgpCap,
    /// send/receive add-path bits per AFI, aggregated into a single u8
    /// (bit0=receive, bit1=send) as spec §4.2 describes ("aggregate bits
    /// into index 0").
    pub addpath: AfiSafis<u8>,
    pub gr_actions: Vec<(AfiSafi, GrAction)>,
    pub role_error: Option<OpenError>,
}

pub const ADDPATH_RECEIVE: u8 = 0b01;
pub const ADDPATH_SEND: u8 = 0b10;

/// Computes the negotiated set. `currently_restarting` is the set of
/// AFI/SAFI this peer is presently marked Restarting for (see
/// `restart.rs`); it is read-only input here, the caller applies
/// `gr_actions` back onto the peer's restart bookkeeping.
pub fn capa_neg_calc(
    local: &BgpCap,
    peer: &BgpCap,
    role_policy: RolePolicy,
    currently_restarting: &[AfiSafi],
) -> NegotiationResult {
    let mut result = NegotiationResult::default();

    result.negotiated.refresh = local.refresh && peer.refresh;
    result.negotiated.enhanced_refresh = local.enhanced_refresh && peer.enhanced_refresh;
    result.negotiated.as4 = match (local.as4, peer.as4) {
        (Some(l), Some(_)) => Some(l),
        _ => None,
    };

    // MP: per-AFI AND; default to IPv4 unicast if the peer advertised none.
    if peer.has_no_mp() {
        result
            .negotiated
            .mp
            .insert(AfiSafi::IPV4_UNICAST, crate::codec::caps::mp::CapMultiProtocol::new(Afi::Ip, Safi::Unicast));
    } else {
        for (key, mp) in local.mp.iter() {
            if peer.mp.has(key) {
                result.negotiated.mp.insert(*key, *mp);
            }
        }
    }

    // Graceful restart: adopt the peer's flag set wholesale (spec: "adopt
    // the peer's flag set"), then decide per-AFI preserve/flush for AFIs we
    // currently consider Restarting.
    result.negotiated.restart_state = peer.restart_state;
    result.negotiated.restart_time = peer.restart_time;
    for (key, v) in peer.restart.iter() {
        result.negotiated.restart.insert(*key, *v);
    }
    for key in currently_restarting {
        let peer_forwards = peer
            .restart
            .get(key)
            .map(|v| v.forwarding_preserved())
            .unwrap_or(false);
        let action = if peer_forwards {
            GrAction::PreserveRestarting
        } else {
            GrAction::Flush
        };
        result.gr_actions.push((*key, action));
    }

    // Add-Path: RECV iff we advertised RECV and peer advertised SEND, and
    // symmetrically for SEND; aggregate into one u8 per AFI.
    for (key, local_sr) in local.addpath.iter() {
        let peer_sr = peer.addpath.get(key).copied().unwrap_or(0);
        let local_recv = local_sr & ADDPATH_RECEIVE != 0;
        let local_send = local_sr & ADDPATH_SEND != 0;
        let peer_send = peer_sr & ADDPATH_SEND != 0;
        let peer_recv = peer_sr & ADDPATH_RECEIVE != 0;
        let mut bits = 0u8;
        if local_recv && peer_send {
            bits |= ADDPATH_RECEIVE;
        }
        if local_send && peer_recv {
            bits |= ADDPATH_SEND;
        }
        if bits != 0 {
            result.addpath.insert(*key, bits);
        }
    }

    // Role: RFC 9234 compatibility matrix.
    match role_policy {
        RolePolicy::Disabled => {}
        RolePolicy::Advertise => {
            if let (Some(local_role), Some(peer_role)) = (local.role, peer.role) {
                if !local_role.role.is_compatible_with(peer_role.role) {
                    result.role_error = Some(OpenError::RoleMismatch);
                }
            }
        }
        RolePolicy::Enforce { local_role } => match peer.role {
            Some(peer_role) if local_role.is_compatible_with(peer_role.role) => {}
            _ => result.role_error = Some(OpenError::RoleMismatch),
        },
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::caps::role::CapRole;

    fn cap_with_mp() -> BgpCap {
        let mut c = BgpCap::new();
        c.mp.insert(
            AfiSafi::IPV4_UNICAST,
            crate::codec::caps::mp::CapMultiProtocol::new(Afi::Ip, Safi::Unicast),
        );
        c.refresh = true;
        c.as4 = Some(crate::codec::caps::as4::CapAs4 { asn: 65001 });
        c
    }

    #[test]
    fn negotiates_common_capabilities() {
        let local = cap_with_mp();
        let peer = cap_with_mp();
        let result = capa_neg_calc(&local, &peer, RolePolicy::Disabled, &[]);
        assert!(result.negotiated.refresh);
        assert!(result.negotiated.as4.is_some());
        assert!(result.negotiated.mp.has(&AfiSafi::IPV4_UNICAST));
    }

    #[test]
    fn no_peer_mp_defaults_to_ipv4_unicast() {
        let local = cap_with_mp();
        let peer = BgpCap::new();
        let result = capa_neg_calc(&local, &peer, RolePolicy::Disabled, &[]);
        assert!(result.negotiated.mp.has(&AfiSafi::IPV4_UNICAST));
    }

    #[test]
    fn role_mismatch_detected() {
        let mut local = BgpCap::new();
        local.role = Some(CapRole::new(Role::Provider));
        let mut peer = BgpCap::new();
        peer.role = Some(CapRole::new(Role::Provider));
        let result = capa_neg_calc(
            &local,
            &peer,
            RolePolicy::Enforce {
                local_role: Role::Provider,
            },
            &[],
        );
        assert_eq!(result.role_error, Some(OpenError::RoleMismatch));
    }

    #[test]
    fn enforce_without_peer_role_is_mismatch() {
        let mut local = BgpCap::new();
        local.role = Some(CapRole::new(Role::Provider));
        let peer = BgpCap::new();
        let result = capa_neg_calc(
            &local,
            &peer,
            RolePolicy::Enforce {
                local_role: Role::Provider,
            },
            &[],
        );
        assert_eq!(result.role_error, Some(OpenError::RoleMismatch));
    }
}
