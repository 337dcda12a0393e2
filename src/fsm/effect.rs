//! `run_effects`: applies the side effects `transition::fsm_next_state`
//! returns to the mutable `Peer` and a sink for bridge-bound events.
//! Grounded on `examples/zebra-rs-zebra-rs/zebra-rs/src/bgp/peer.rs`'s
//! `fsm_effect`. The bridge (`rde`/`parent`) isn't wired up yet when this
//! module is exercised in isolation, so effects that must cross the
//! process boundary go through the small `EffectSink` trait instead of a
//! concrete bridge type — `bridge::rde::RdeClient` implements it.

use std::time::Instant;

use bytes::BytesMut;

use crate::codec::caps::BgpCap;
use crate::codec::{OpenPacket, UpdatePacket};
use crate::fsm::peer::{Peer, INITIAL_IDLE_HOLD};
use crate::fsm::state::FsmEffect;

/// Everything beyond "mutate this peer" that an effect can require: telling
/// the RDE a session went up/down or forwarding an UPDATE to it. Kept
/// trait-based so the FSM doesn't need to know about the bridge's framing.
pub trait EffectSink {
    fn forward_update(&mut self, peer_id: u32, update: UpdatePacket);
    fn session_up(&mut self, peer_id: u32, negotiated: &BgpCap);
    fn session_down(&mut self, peer_id: u32);
}

/// A sink that drops everything, for tests and for engine bring-up before
/// the bridge exists.
pub struct NullSink;

impl EffectSink for NullSink {
    fn forward_update(&mut self, _peer_id: u32, _update: UpdatePacket) {}
    fn session_up(&mut self, _peer_id: u32, _negotiated: &BgpCap) {}
    fn session_down(&mut self, _peer_id: u32) {}
}

fn build_open(peer: &Peer) -> OpenPacket {
    let asn = if peer.local_as > u16::MAX as u32 {
        crate::codec::open::AS_TRANS as u32
    } else {
        peer.local_as
    };
    OpenPacket::new(
        asn as u16,
        peer.config.configured_holdtime,
        peer.router_id,
        peer.cap_local.clone(),
    )
}

fn send(peer: &Peer, buf: BytesMut) {
    if let Some(conn) = &peer.conn {
        let _ = conn.writer_tx.send(buf);
    }
}

pub fn run_effects(peer: &mut Peer, effects: Vec<FsmEffect>, now: Instant, sink: &mut dyn EffectSink) {
    for effect in effects {
        match effect {
            FsmEffect::SendOpen => {
                let open = build_open(peer);
                send(peer, open.encode());
                peer.stats.counters.open_tx += 1;
            }
            FsmEffect::SendKeepalive => {
                send(peer, crate::codec::keepalive::encode());
                peer.stats.counters.keepalive_tx += 1;
            }
            FsmEffect::SendNotification(n) => {
                peer.stats.last_sent_errcode = Some((n.code, n.sub_code));
                peer.stats.counters.notification_tx += 1;
                send(peer, n.encode());
            }
            FsmEffect::InitiateConnect => {
                // Actually dialing is the job of `io::connect`, which owns
                // the socket and reports back ConnOpen/ConnOpenFail; there
                // is nothing for the effect runner itself to do.
            }
            FsmEffect::CloseConnection => {
                peer.conn = None;
                peer.clear_buffers();
            }
            FsmEffect::ArmTimer { kind, seconds } => peer.timers.set(kind, now, seconds),
            FsmEffect::DisarmTimer(kind) => peer.timers.stop(kind),
            FsmEffect::StoreNegotiated { holdtime, caps } => {
                peer.negotiated_holdtime = holdtime;
                peer.cap_negotiated = caps;
            }
            FsmEffect::SessionUp => sink.session_up(peer.id, &peer.cap_negotiated),
            FsmEffect::SessionDown => sink.session_down(peer.id),
            FsmEffect::ForwardUpdate(update) => {
                peer.stats.counters.update_rx += 1;
                sink.forward_update(peer.id, *update);
            }
            FsmEffect::GracefulRestartEnter => {}
            FsmEffect::GracefulRestartExit => peer.reset_idle_hold(),
            FsmEffect::StaleRestartingAfi(afi) => {
                let actions = peer.gr.on_connection_lost(&[afi]);
                let _ = actions;
            }
            FsmEffect::FlushRestartingAfi(afi) => {
                peer.gr.on_restarted(&afi);
            }
            FsmEffect::IdleHoldBackoffDouble => peer.double_idle_hold(),
            FsmEffect::IdleHoldBackoffHalve => peer.halve_idle_hold(),
            FsmEffect::IdleHoldReset => peer.idle_hold_interval = INITIAL_IDLE_HOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::peer::PeerConfig;
    use std::net::Ipv4Addr;

    #[test]
    fn arm_timer_effect_sets_deadline() {
        let mut peer = Peer::new(1, 65000, Ipv4Addr::new(1, 1, 1, 1), PeerConfig::default());
        let mut sink = NullSink;
        let now = Instant::now();
        run_effects(
            &mut peer,
            vec![FsmEffect::ArmTimer {
                kind: crate::timer::TimerKind::Hold,
                seconds: 90,
            }],
            now,
            &mut sink,
        );
        assert!(peer.timers.running(crate::timer::TimerKind::Hold));
    }

    #[test]
    fn idle_hold_backoff_effects_adjust_interval() {
        let mut peer = Peer::new(1, 65000, Ipv4Addr::new(1, 1, 1, 1), PeerConfig::default());
        let mut sink = NullSink;
        let before = peer.idle_hold_interval;
        run_effects(
            &mut peer,
            vec![FsmEffect::IdleHoldBackoffDouble],
            Instant::now(),
            &mut sink,
        );
        assert!(peer.idle_hold_interval >= before);
    }
}
