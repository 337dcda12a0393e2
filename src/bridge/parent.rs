//! Parent-process bridge message catalogue, SPEC_FULL §6. The parent
//! process (privilege-separation bootstrap, chroot, signal handling) is
//! out of scope; this is the engine's half of the contract.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Tags for the 1-byte envelope header, SPEC_FULL §6.1.
#[repr(u8)]
pub enum ParentTag {
    SocketConn = 1,
    SocketConnCtl = 2,
    ReconfConf = 3,
    ReconfPeer = 4,
    ReconfListener = 5,
    ReconfCtrl = 6,
    ReconfDrain = 7,
    ReconfDone = 8,
    SessionDependOn = 9,
    MrtOpen = 10,
    MrtReopen = 11,
    MrtClose = 12,
    PfKeyReload = 13,
    Demote = 14,
}

/// An already-`accept`ed fd handed down by the parent for a configured
/// listener, SPEC_FULL §3.2 — the parent owns the privileged bind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConn {
    pub listener_id: u32,
    pub local_addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConnCtl {
    pub ok: bool,
}

/// Wire-shaped peer config for reconfiguration, decoupled from the engine's
/// internal `fsm::peer::PeerConfig` so the bridge contract doesn't shift
/// every time an internal field is renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfigWire {
    pub peer_id: u32,
    pub remote_addr: IpAddr,
    pub peer_as: u32,
    pub descriptor: String,
    pub passive: bool,
    pub configured_holdtime: u16,
    pub connect_retry_secs: u64,
    pub min_holdtime: u16,
    pub ebgp_multihop: Option<u8>,
    pub gtsm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfConf {
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfPeer {
    pub generation: u64,
    pub peer: PeerConfigWire,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfListener {
    pub generation: u64,
    pub listener_id: u32,
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfCtrl {
    pub generation: u64,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfDrain {
    pub generation: u64,
    /// peer ids present in the previous generation but absent from this
    /// one; the engine tears these down once the new generation is live.
    pub retired_peer_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfDone {
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDependOn {
    pub peer_id: u32,
    pub depends_on_peer_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrtOpen {
    pub sink_id: u32,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrtSinkId {
    pub sink_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfKeyReload {
    pub peer_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demote {
    pub peer_id: u32,
    pub demoted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconf_peer_round_trips_through_json() {
        let msg = ReconfPeer {
            generation: 3,
            peer: PeerConfigWire {
                peer_id: 1,
                remote_addr: IpAddr::from([192, 0, 2, 1]),
                peer_as: 65001,
                descriptor: "peer-1".into(),
                passive: false,
                configured_holdtime: 90,
                connect_retry_secs: 120,
                min_holdtime: 3,
                ebgp_multihop: Some(2),
                gtsm: true,
            },
        };
        let json = serde_json::to_vec(&msg).unwrap();
        let back: ReconfPeer = serde_json::from_slice(&json).unwrap();
        assert_eq!(back.generation, 3);
        assert_eq!(back.peer.peer_as, 65001);
    }
}
