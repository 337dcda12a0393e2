//! Configuration model, SPEC_FULL §3.1. No direct teacher precedent exists
//! (the teacher's `zebra/src/config/*` runs a YANG-schema/gRPC CLI store
//! for a whole-router surface well beyond this engine — see the Trim notes
//! in `DESIGN.md`); this is authored against the Peer data model in the
//! spec directly, cross-checked against
//! `examples/zebra-rs-zebra-rs/zebra-rs/src/bgp/peer.rs`'s field naming.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::codec::afi::AfiSafi;
use crate::codec::caps::RolePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub peer_id: u32,
    pub remote_addr: IpAddr,
    pub peer_as: u32,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub template_id: Option<u32>,
    #[serde(default)]
    pub passive: bool,
    #[serde(default = "default_holdtime")]
    pub configured_holdtime: u16,
    #[serde(default = "default_connect_retry")]
    pub connect_retry_secs: u64,
    #[serde(default = "default_min_holdtime")]
    pub min_holdtime: u16,
    #[serde(default)]
    pub ebgp_multihop: Option<u8>,
    #[serde(default)]
    pub gtsm: bool,
    #[serde(default)]
    pub role_policy: RolePolicy,
    #[serde(default = "default_announce")]
    pub announce: Vec<AfiSafi>,
}

fn default_holdtime() -> u16 {
    90
}
fn default_connect_retry() -> u64 {
    120
}
fn default_min_holdtime() -> u16 {
    3
}
fn default_announce() -> Vec<AfiSafi> {
    vec![AfiSafi::IPV4_UNICAST]
}

/// One configured listener and what to do with it across a reload,
/// SPEC_FULL §3.1's "address and reconf-action tag".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconfAction {
    /// Bind unconditionally changed across generations.
    Keep,
    Add,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub listener_id: u32,
    pub bind_addr: SocketAddr,
    pub reconf_action: ReconfAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: u64,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
    #[serde(default)]
    pub control_socket: Option<String>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn peer(&self, peer_id: u32) -> Option<&PeerConfig> {
        self.peers.iter().find(|p| p.peer_id == peer_id)
    }
}

/// Holds the live and not-yet-applied configuration generations, spec
/// §3.1: `RECONF_DONE` swaps `pending` into `active` atomically between
/// `Engine::tick`'s steps 1 and 2, never mid-tick.
#[derive(Debug, Default)]
pub struct ConfigState {
    pub active: Config,
    pub pending: Option<Config>,
}

impl ConfigState {
    pub fn new(active: Config) -> Self {
        ConfigState {
            active,
            pending: None,
        }
    }

    pub fn stage(&mut self, pending: Config) {
        self.pending = Some(pending);
    }

    /// Applies the staged generation, returning the ids of peers present
    /// in the outgoing generation but absent from the incoming one — the
    /// caller tears these down (`bridge::parent::ReconfDrain`).
    pub fn commit(&mut self) -> Option<Vec<u32>> {
        let pending = self.pending.take()?;
        let retired: Vec<u32> = self
            .active
            .peers
            .iter()
            .map(|p| p.peer_id)
            .filter(|id| !pending.peers.iter().any(|p| p.peer_id == *id))
            .collect();
        self.active = pending;
        Some(retired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let toml = r#"
            generation = 1

            [[peers]]
            peer_id = 1
            remote_addr = "192.0.2.1"
            peer_as = 65001
        "#;
        let cfg = Config::from_toml_str(toml).unwrap();
        assert_eq!(cfg.peers.len(), 1);
        assert_eq!(cfg.peers[0].configured_holdtime, 90);
        assert_eq!(cfg.peers[0].announce, vec![AfiSafi::IPV4_UNICAST]);
    }

    #[test]
    fn commit_reports_retired_peers() {
        let mut active = Config::default();
        active.peers.push(PeerConfig {
            peer_id: 1,
            remote_addr: IpAddr::from([192, 0, 2, 1]),
            peer_as: 65001,
            descriptor: String::new(),
            template: false,
            template_id: None,
            passive: false,
            configured_holdtime: 90,
            connect_retry_secs: 120,
            min_holdtime: 3,
            ebgp_multihop: None,
            gtsm: false,
            role_policy: RolePolicy::Disabled,
            announce: default_announce(),
        });
        let mut state = ConfigState::new(active);
        state.stage(Config::default());
        let retired = state.commit().unwrap();
        assert_eq!(retired, vec![1]);
        assert!(state.active.peers.is_empty());
    }
}
