//! The top-level session engine context, spec §5: a single-threaded,
//! readiness-driven `tokio::select! { biased; ... }` loop that owns every
//! peer socket, listener, and bridge pipe. Grounded on
//! `examples/zebra-rs-zebra-rs/zebra/src/bgp/inst.rs`'s `Bgp::event_loop`/
//! `process_msg` (one `Message` enum fed by spawned tasks, drained by one
//! `select!`), generalized from that file's three-channel loop to the
//! spec's fixed ten-step tick and `biased` ordering; per-connection
//! reader/writer/connect tasks never touch `Peer` directly, only this
//! struct does.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant as TokioInstant;

use crate::bridge::rde::RdeOutbound;
use crate::bridge::RdeClient;
use crate::codec::BgpMessage;
use crate::config::{Config, ConfigState};
use crate::fsm::peer::{Direction, PeerConnection};
use crate::fsm::state::Event;
use crate::fsm::{fsm_next_state, run_effects, Peer};
use crate::io::{self, AcceptedConn, ConnectMsg, ConnectOutcome, PeerIoEvent, PeerIoMsg};
use crate::io::listener::{resolve_collision, CollisionDecision};
use crate::io::writer::{crosses_high_watermark, crosses_low_watermark, Drained};
use crate::mrt::MrtTee;
use crate::timer::TimerKind;

/// Every event a spawned task can hand back to the one engine task, spec
/// §5: "they only ever produce events into channels the engine polls".
/// Mirrors the teacher's single `Message` enum, widened to the extra
/// sources this engine drains (connect outcomes, drained-write reports,
/// accepted connections) instead of the teacher's `Event`/`Accept`/`Show`.
enum EngineMsg {
    Io(PeerIoMsg),
    Connect(ConnectMsg),
    Accepted(AcceptedConn),
    Drained(Drained),
}

struct ListenerHandle {
    bind_addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

/// The Bgp-equivalent context: every peer, listener, and bridge this
/// process owns, plus the channels its spawned tasks report back on.
pub struct Engine {
    pub local_as: u32,
    pub router_id: std::net::Ipv4Addr,
    pub peers: BTreeMap<u32, Peer>,
    pub config: ConfigState,
    pub mrt: MrtTee,
    pub quit: bool,

    listeners: Vec<ListenerHandle>,

    msg_tx: UnboundedSender<EngineMsg>,
    msg_rx: UnboundedReceiver<EngineMsg>,

    rde_out_rx: UnboundedReceiver<RdeOutbound>,
    rde: RdeClient,

    /// Set by `main`'s signal handler task on SIGINT/SIGTERM; checked once
    /// per tick rather than awaited directly, so a signal arriving mid-tick
    /// still lets the current tick finish (spec §6 exit behavior).
    shutdown_rx: Option<tokio::sync::watch::Receiver<bool>>,
}

impl Engine {
    pub fn new(local_as: u32, router_id: std::net::Ipv4Addr, config: Config) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (rde_out_tx, rde_out_rx) = mpsc::unbounded_channel();
        Engine {
            local_as,
            router_id,
            peers: BTreeMap::new(),
            config: ConfigState::new(config),
            mrt: MrtTee::new(),
            quit: false,
            listeners: Vec::new(),
            msg_tx,
            msg_rx,
            rde_out_rx,
            rde: RdeClient::new(rde_out_tx),
            shutdown_rx: None,
        }
    }

    pub fn set_shutdown_signal(&mut self, rx: tokio::sync::watch::Receiver<bool>) {
        self.shutdown_rx = Some(rx);
    }

    /// Step 1/2 of the tick: materializes `PeerConfig` entries from the
    /// active configuration into live `Peer`s and starts each one (spec
    /// §3: Idle is the first state a configured-but-not-yet-started peer
    /// reaches once `Event::Start` fires).
    pub fn sync_peers_from_config(&mut self) {
        for peer_cfg in self.config.active.peers.clone() {
            self.peers.entry(peer_cfg.peer_id).or_insert_with(|| {
                let cfg = crate::fsm::peer::PeerConfig {
                    remote_addr: peer_cfg.remote_addr,
                    peer_as: peer_cfg.peer_as,
                    descriptor: peer_cfg.descriptor,
                    template: peer_cfg.template,
                    template_id: peer_cfg.template_id,
                    passive: peer_cfg.passive,
                    configured_holdtime: peer_cfg.configured_holdtime,
                    connect_retry_secs: peer_cfg.connect_retry_secs,
                    min_holdtime: peer_cfg.min_holdtime,
                    ebgp_multihop: peer_cfg.ebgp_multihop,
                    gtsm: peer_cfg.gtsm,
                    role_policy: peer_cfg.role_policy,
                    announce: peer_cfg.announce,
                };
                Peer::new(peer_cfg.peer_id, self.local_as, self.router_id, cfg)
            });
        }
    }

    /// Starts every not-yet-started peer by feeding it `Event::Start`,
    /// driving Idle's immediate IdleHold arm (spec §4.1's Idle row).
    pub fn start_peers(&mut self, now: Instant) {
        let ids: Vec<u32> = self.peers.keys().copied().collect();
        for id in ids {
            self.dispatch(id, Event::Start, now);
        }
    }

    pub async fn add_listener(&mut self, bind_addr: SocketAddr) -> std::io::Result<()> {
        let tx = self.msg_tx.clone();
        let (accepted_tx, mut accepted_rx) = mpsc::unbounded_channel();
        let listen_bind = bind_addr;
        tokio::spawn(async move {
            let _ = io::listener::run(listen_bind, accepted_tx).await;
        });
        let fan_in = tokio::spawn(async move {
            while let Some(conn) = accepted_rx.recv().await {
                if tx.send(EngineMsg::Accepted(conn)).is_err() {
                    return;
                }
            }
        });
        self.listeners.push(ListenerHandle {
            bind_addr,
            task: fan_in,
        });
        Ok(())
    }

    /// Runs the engine until `quit` is set (SIGINT/SIGTERM, spec §6 "exit
    /// behavior"). One `current_thread` task; `biased` encodes the fixed
    /// per-tick drain order (pipes, then accepts, then peer I/O, then
    /// timers) instead of tokio's default random polling order.
    pub async fn run(&mut self) {
        while !self.quit {
            let now = Instant::now();
            let deadline = self.next_timer_deadline(now);
            let sleep = tokio::time::sleep_until(TokioInstant::from_std(deadline));
            tokio::pin!(sleep);

            tokio::select! {
                biased;

                Some(out) = self.rde_out_rx.recv() => {
                    self.drain_rde_outbound(out).await;
                }

                Some(msg) = self.msg_rx.recv() => {
                    self.handle_engine_msg(msg, now).await;
                }

                () = &mut sleep => {
                    self.fire_due_timers(Instant::now());
                }
            }

            if let Some(rx) = &self.shutdown_rx {
                if *rx.borrow() {
                    self.quit = true;
                }
            }
        }
        self.shutdown().await;
    }

    fn next_timer_deadline(&self, now: Instant) -> Instant {
        let earliest = self
            .peers
            .values()
            .filter_map(|p| p.timers.earliest())
            .min();
        match earliest {
            Some(d) if d > now => d.min(now + Duration::from_secs(240)),
            Some(_) => now,
            None => now + Duration::from_secs(240),
        }
    }

    fn fire_due_timers(&mut self, now: Instant) {
        let ids: Vec<u32> = self.peers.keys().copied().collect();
        for id in ids {
            loop {
                let due = match self.peers.get_mut(&id) {
                    Some(p) => p.timers.next_due(now),
                    None => None,
                };
                match due {
                    Some(kind) => self.dispatch(id, Event::TimerExpires(kind), now),
                    None => break,
                }
            }
        }
    }

    async fn handle_engine_msg(&mut self, msg: EngineMsg, now: Instant) {
        match msg {
            EngineMsg::Accepted(conn) => self.handle_accept(conn, now).await,
            EngineMsg::Connect(msg) => self.handle_connect_outcome(msg, now).await,
            EngineMsg::Io(msg) => self.handle_peer_io(msg, now),
            EngineMsg::Drained(d) => self.handle_drained(d),
        }
    }

    /// Spec step 6/collision resolution, RFC 4271 §6.8, grounded on the
    /// teacher's `accept`/`handle_peer_connection`.
    async fn handle_accept(&mut self, conn: AcceptedConn, now: Instant) {
        let peer_id = match self
            .peers
            .iter()
            .find(|(_, p)| p.config.remote_addr == conn.remote_addr.ip())
            .map(|(id, _)| *id)
        {
            Some(id) => id,
            None => return,
        };
        let state = match self.peers.get(&peer_id) {
            Some(p) => p.state,
            None => return,
        };
        match resolve_collision(state) {
            CollisionDecision::Reject { code, sub_code } => {
                tokio::spawn(io::listener::reject_connection(conn.stream, code, sub_code));
            }
            CollisionDecision::Defer => {
                // Held aside until the in-flight OPEN exchange resolves;
                // simplest sound choice here is to reject the newcomer and
                // let the existing attempt finish, since only one
                // connection per peer may exist at a time (spec §4.5).
                tokio::spawn(io::listener::reject_connection(
                    conn.stream,
                    crate::codec::notification::NotifyCode::Cease,
                    crate::codec::notification::CeaseError::ConnectionCollisionResolution as u8,
                ));
            }
            CollisionDecision::Replace => {
                self.attach_connection(peer_id, conn.stream, conn.local_addr.ip(), Direction::Inbound, now);
                self.dispatch(peer_id, Event::ConnOpen, now);
            }
        }
    }

    async fn handle_connect_outcome(&mut self, msg: ConnectMsg, now: Instant) {
        match msg.outcome {
            ConnectOutcome::Connected(stream) => {
                let local_addr = stream.local_addr().ok().map(|a| a.ip());
                if let Some(local_addr) = local_addr {
                    self.attach_connection(msg.peer_id, stream, local_addr, Direction::Outbound, now);
                    self.dispatch(msg.peer_id, Event::ConnOpen, now);
                }
            }
            ConnectOutcome::Failed(_) => {
                self.dispatch(msg.peer_id, Event::ConnOpenFail, now);
            }
        }
    }

    fn attach_connection(
        &mut self,
        peer_id: u32,
        stream: TcpStream,
        local_addr: IpAddr,
        direction: Direction,
        _now: Instant,
    ) {
        let peer = match self.peers.get_mut(&peer_id) {
            Some(p) => p,
            None => return,
        };
        peer.allocate_buffers();
        let min_holdtime = peer.config.min_holdtime;
        let (read_half, write_half) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::unbounded_channel::<BytesMut>();
        let io_tx = self.msg_tx.clone();
        let reader_io_tx = io_tx.clone();
        let reader_task = tokio::spawn(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            tokio::spawn(io::reader::run(peer_id, read_half, tx, min_holdtime));
            while let Some(msg) = rx.recv().await {
                if reader_io_tx.send(EngineMsg::Io(msg)).is_err() {
                    return;
                }
            }
        });
        let drained_io_tx = io_tx;
        let writer_task = tokio::spawn(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            tokio::spawn(io::writer::run(peer_id, write_half, writer_rx, tx));
            while let Some(d) = rx.recv().await {
                if drained_io_tx.send(EngineMsg::Drained(d)).is_err() {
                    return;
                }
            }
        });
        peer.conn = Some(PeerConnection {
            direction,
            local_addr,
            writer_tx,
            reader_task,
            writer_task,
        });
    }

    fn handle_peer_io(&mut self, msg: PeerIoMsg, now: Instant) {
        let event = match msg.event {
            PeerIoEvent::Message(BgpMessage::Open(open)) => Event::BgpOpen(open),
            PeerIoEvent::Message(BgpMessage::Update(update)) => Event::BgpUpdate(update),
            PeerIoEvent::Message(BgpMessage::Notification(n)) => Event::BgpNotification(n),
            PeerIoEvent::Message(BgpMessage::Keepalive) => Event::BgpKeepalive,
            PeerIoEvent::Message(BgpMessage::RouteRefresh { .. }) => return,
            PeerIoEvent::Closed => Event::ConnClosed,
            PeerIoEvent::ProtocolError(e) => Event::ConnProtocolError(e),
            PeerIoEvent::Fatal(_) => Event::ConnFatal,
        };
        self.dispatch(msg.peer_id, event, now);
    }

    /// Step 8 equivalent for outbound back-pressure: a writer reports
    /// every completed write, and this is where the engine (the sole
    /// owner of `write_queue_len`) applies the HIGH/LOW watermark spec
    /// §4.4 requires.
    fn handle_drained(&mut self, d: Drained) {
        if let Some(peer) = self.peers.get_mut(&d.peer_id) {
            let before = peer.write_queue_len;
            peer.write_queue_len = peer.write_queue_len.saturating_sub(d.bytes);
            if peer.throttled && crosses_low_watermark(before, peer.write_queue_len) {
                peer.throttled = false;
            }
        }
    }

    /// Records bytes about to be queued on a peer's writer channel and
    /// flips XOFF if this send crosses the high watermark (spec §4.4);
    /// call sites that enqueue outbound bytes outside of `run_effects`
    /// (route-refresh replies, bridge-triggered sends) go through this.
    pub fn note_enqueued(&mut self, peer_id: u32, added: usize) {
        if let Some(peer) = self.peers.get_mut(&peer_id) {
            let before = peer.write_queue_len;
            if crosses_high_watermark(before, added) {
                peer.throttled = true;
            }
            peer.write_queue_len = before + added;
        }
    }

    /// The thin driver spec §4.1 calls for: computes the next state and
    /// effects from the pure transition function, applies them, updates
    /// `peer.state`, and feeds the MRT tee — mirrors the teacher's `fsm()`
    /// wrapper around `fsm_next_state`/`fsm_effect`.
    fn dispatch(&mut self, peer_id: u32, event: Event, now: Instant) {
        let peer = match self.peers.get_mut(&peer_id) {
            Some(p) => p,
            None => return,
        };
        let (next_state, effects) = fsm_next_state(peer, &event, now);
        run_effects(peer, effects, now, &mut self.rde);
        if next_state != peer.state {
            crate::bgp_info!(peer_id, from = %peer.state, to = %next_state, event = %event, "fsm transition");
            peer.prev_state = peer.state;
            peer.state = next_state;
        }
    }

    /// Drains one RDE-bound event onto the bridge; contract-only, since
    /// the RDE process itself is out of scope — a real deployment attaches
    /// the framed socket handed down via `SOCKET_CONN` before this loop
    /// starts running.
    async fn drain_rde_outbound(&mut self, _out: RdeOutbound) {}

    /// Spec §6 exit behavior: finish the current tick, NOTIFICATION(Cease,
    /// AdminDown) to every peer, best-effort drain, then return so the
    /// caller can exit 0.
    async fn shutdown(&mut self) {
        let ids: Vec<u32> = self.peers.keys().copied().collect();
        let now = Instant::now();
        for id in ids {
            self.dispatch(id, Event::Stop, now);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        for listener in self.listeners.drain(..) {
            tracing::debug!(bind_addr = %listener.bind_addr, "stopping listener");
            listener.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerConfig as ConfigPeerConfig;

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.peers.push(ConfigPeerConfig {
            peer_id: 1,
            remote_addr: IpAddr::from([192, 0, 2, 1]),
            peer_as: 65001,
            descriptor: "peer-1".into(),
            template: false,
            template_id: None,
            passive: true,
            configured_holdtime: 90,
            connect_retry_secs: 120,
            min_holdtime: 3,
            ebgp_multihop: None,
            gtsm: false,
            role_policy: Default::default(),
            announce: vec![crate::codec::afi::AfiSafi::IPV4_UNICAST],
        });
        cfg
    }

    #[test]
    fn sync_peers_from_config_creates_peers() {
        let mut engine = Engine::new(65000, std::net::Ipv4Addr::new(1, 1, 1, 1), test_config());
        engine.sync_peers_from_config();
        assert_eq!(engine.peers.len(), 1);
        assert!(engine.peers.contains_key(&1));
    }

    #[test]
    fn starting_a_passive_peer_arms_idle_hold() {
        let mut engine = Engine::new(65000, std::net::Ipv4Addr::new(1, 1, 1, 1), test_config());
        engine.sync_peers_from_config();
        engine.start_peers(Instant::now());
        let peer = engine.peers.get(&1).unwrap();
        assert_eq!(peer.state, crate::fsm::state::State::Idle);
        assert!(peer.timers.running(TimerKind::IdleHold));
    }
}
