use std::net::IpAddr;
use std::time::Instant;

use bytes::BytesMut;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::codec::afi::AfiSafi;
use crate::codec::caps::{BgpCap, RolePolicy};
use crate::codec::header::BGP_MAX_MESSAGE_LEN;
use crate::fsm::state::State;
use crate::restart::GracefulRestart;
use crate::timer::TimerSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Handles for the tasks driving one live TCP connection. The reader and
/// writer tasks never touch `Peer` state directly — they only move bytes
/// and hand events back over `Engine`'s channel, per spec §5 ("no data
/// structure is shared with another thread").
pub struct PeerConnection {
    pub direction: Direction,
    pub local_addr: IpAddr,
    pub writer_tx: mpsc::UnboundedSender<BytesMut>,
    pub reader_task: JoinHandle<()>,
    pub writer_task: JoinHandle<()>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeerCounters {
    pub open_tx: u64,
    pub open_rx: u64,
    pub update_tx: u64,
    pub update_rx: u64,
    pub notification_tx: u64,
    pub notification_rx: u64,
    pub keepalive_tx: u64,
    pub keepalive_rx: u64,
    pub route_refresh_tx: u64,
    pub route_refresh_rx: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PeerStats {
    pub counters: PeerCounters,
    pub last_read: Option<Instant>,
    pub last_write: Option<Instant>,
    pub last_sent_errcode: Option<(u8, u8)>,
    pub last_recv_errcode: Option<(u8, u8)>,
    pub last_shutdown_reason: Option<String>,
}

/// Addresses learned on establishment (spec §3): the Design Note's
/// "IPv6 alternate address selection picks the first non-link-local,
/// non-site-local IPv4 on the same interface (and vice versa)" quirk is
/// preserved as-is in whatever populates `local_alt`; this struct just
/// carries the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearnedAddresses {
    pub local: Option<IpAddr>,
    pub local_alt: Option<IpAddr>,
    pub remote: Option<IpAddr>,
    pub if_scope_id: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub remote_addr: IpAddr,
    pub peer_as: u32,
    pub descriptor: String,
    pub template: bool,
    pub template_id: Option<u32>,
    pub passive: bool,
    pub configured_holdtime: u16,
    pub connect_retry_secs: u64,
    pub min_holdtime: u16,
    pub ebgp_multihop: Option<u8>,
    pub gtsm: bool,
    pub role_policy: RolePolicy,
    pub announce: Vec<AfiSafi>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            remote_addr: IpAddr::from([0, 0, 0, 0]),
            peer_as: 0,
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
            announce: vec![AfiSafi::IPV4_UNICAST],
        }
    }
}

/// Default ceiling for the IdleHold exponential backoff (SPEC_FULL §9.1).
pub const MAX_IDLE_HOLD: u64 = 600;
pub const INITIAL_IDLE_HOLD: u64 = 5;

/// The central per-session entity, spec §3. `id` is the B-tree key the
/// engine's peer map is ordered by; cloned template peers get ids from a
/// reserved dynamic range (see `engine.rs`).
pub struct Peer {
    pub id: u32,
    pub local_as: u32,
    pub router_id: std::net::Ipv4Addr,
    pub config: PeerConfig,

    pub state: State,
    pub prev_state: State,
    pub error_count: u32,

    pub conn: Option<PeerConnection>,
    pub connect_task: Option<JoinHandle<()>>,
    pub read_buf: Option<BytesMut>,
    pub write_queue_len: usize,
    pub throttled: bool,

    pub timers: TimerSet,

    pub negotiated_holdtime: u16,
    pub negotiated_keepalive: u16,
    pub idle_hold_interval: u64,

    pub cap_local: BgpCap,
    pub cap_peer: BgpCap,
    pub cap_negotiated: BgpCap,

    pub stats: PeerStats,
    pub addrs: LearnedAddresses,
    pub gr: GracefulRestart,

    pub rpending: bool,
}

impl Peer {
    pub fn new(id: u32, local_as: u32, router_id: std::net::Ipv4Addr, config: PeerConfig) -> Self {
        Peer {
            id,
            local_as,
            router_id,
            config,
            state: State::None,
            prev_state: State::None,
            error_count: 0,
            conn: None,
            connect_task: None,
            read_buf: None,
            write_queue_len: 0,
            throttled: false,
            timers: TimerSet::new(),
            negotiated_holdtime: 0,
            negotiated_keepalive: 0,
            idle_hold_interval: INITIAL_IDLE_HOLD,
            cap_local: BgpCap::new(),
            cap_peer: BgpCap::new(),
            cap_negotiated: BgpCap::new(),
            stats: PeerStats::default(),
            addrs: LearnedAddresses::default(),
            gr: GracefulRestart::new(),
            rpending: false,
        }
    }

    pub fn is_passive(&self) -> bool {
        self.config.passive || self.config.template
    }

    pub fn has_connection(&self) -> bool {
        self.conn.is_some()
    }

    pub fn allocate_buffers(&mut self) {
        if self.read_buf.is_none() {
            self.read_buf = Some(BytesMut::with_capacity(BGP_MAX_MESSAGE_LEN));
        }
    }

    pub fn clear_buffers(&mut self) {
        self.read_buf = None;
        self.write_queue_len = 0;
    }

    /// Doubles the IdleHold backoff up to half the configured ceiling, per
    /// spec §7. Capability-negotiation errors must call `halve_idle_hold`
    /// instead (spec Design Note: "be generous during capability probing").
    pub fn double_idle_hold(&mut self) {
        self.error_count += 1;
        self.idle_hold_interval = (self.idle_hold_interval * 2).min(MAX_IDLE_HOLD / 2);
    }

    /// Source quirk preserved as-is (Design Note §9): after an
    /// "unsupported optional parameter" NOTIFICATION the IdleHold is halved
    /// rather than doubled.
    pub fn halve_idle_hold(&mut self) {
        self.idle_hold_interval = (self.idle_hold_interval / 2).max(1);
    }

    pub fn reset_idle_hold(&mut self) {
        self.error_count = 0;
        self.idle_hold_interval = INITIAL_IDLE_HOLD;
    }

    pub fn negotiated_afi_safis(&self) -> Vec<AfiSafi> {
        self.cap_negotiated.mp.iter().map(|(k, _)| *k).collect()
    }
}
