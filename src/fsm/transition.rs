//! Pure FSM transition function, RFC 4271 §8 plus the capability
//! negotiation and graceful-restart hooks spec §4 layers on top. Grounded
//! directly on the `fsm_next_state`/`FsmEffect` pure-transition shape in
//! `examples/zebra-rs-zebra-rs/zebra-rs/src/bgp/peer.rs`; per-state handlers
//! are the teacher's `fsm_start`/`fsm_bgp_open`/`fsm_holdtimer_expires`/etc.
//! generalized to return effects instead of performing I/O.

use std::time::Instant;

use crate::codec::caps::{capa_neg_calc, NegotiationResult};
use crate::codec::error::CodecError;
use crate::codec::notification::{FsmSubError, NotifyCode, OpenError};
use crate::codec::NotificationPacket;
use crate::fsm::peer::Peer;
use crate::fsm::state::{Event, FsmEffect, State};
use crate::timer::TimerKind;

/// Keepalive interval is a third of the negotiated holdtime, RFC 4271 §4.4.
fn keepalive_interval(negotiated_holdtime: u16) -> u64 {
    (negotiated_holdtime / 3) as u64
}

fn notify(code: NotifyCode, sub_code: u8) -> FsmEffect {
    FsmEffect::SendNotification(NotificationPacket::new(code, sub_code, vec![]))
}

/// Builds the NOTIFICATION a header/message decode failure requires
/// (spec §4.2, §7): the code/sub-code pair comes straight off the
/// `CodecError` the reader reported, rather than a generic catch-all.
fn notify_for_protocol_error(err: &CodecError) -> FsmEffect {
    let (code, sub_code) = err.notify_code();
    FsmEffect::SendNotification(NotificationPacket {
        code,
        sub_code,
        data: vec![],
    })
}

/// Computes the next state and the effects the caller's effect runner must
/// perform. Does not mutate `peer` itself — `effect::run_effects` is the
/// only place peer state changes, keeping this function a pure, testable
/// lookup (Design Note §9).
pub fn fsm_next_state(peer: &Peer, event: &Event, now: Instant) -> (State, Vec<FsmEffect>) {
    match peer.state {
        State::None => fsm_none(peer, event),
        State::Idle => fsm_idle(peer, event),
        State::Connect => fsm_connect(peer, event),
        State::Active => fsm_active(peer, event),
        State::OpenSent => fsm_open_sent(peer, event),
        State::OpenConfirm => fsm_open_confirm(peer, event, now),
        State::Established => fsm_established(peer, event, now),
    }
}

fn fsm_none(peer: &Peer, event: &Event) -> (State, Vec<FsmEffect>) {
    match event {
        Event::Start => (
            State::Idle,
            vec![FsmEffect::ArmTimer {
                kind: TimerKind::IdleHold,
                seconds: peer.idle_hold_interval,
            }],
        ),
        _ => (State::None, vec![]),
    }
}

fn fsm_idle(peer: &Peer, event: &Event) -> (State, Vec<FsmEffect>) {
    match event {
        Event::Start => (
            State::Idle,
            vec![FsmEffect::ArmTimer {
                kind: TimerKind::IdleHold,
                seconds: peer.idle_hold_interval,
            }],
        ),
        Event::TimerExpires(TimerKind::IdleHold) => {
            if peer.is_passive() {
                (State::Active, vec![])
            } else {
                (
                    State::Connect,
                    vec![
                        FsmEffect::InitiateConnect,
                        FsmEffect::ArmTimer {
                            kind: TimerKind::ConnectRetry,
                            seconds: peer.config.connect_retry_secs,
                        },
                    ],
                )
            }
        }
        Event::Stop => (State::Idle, vec![FsmEffect::DisarmTimer(TimerKind::IdleHold)]),
        _ => (State::Idle, vec![]),
    }
}

fn fsm_connect(peer: &Peer, event: &Event) -> (State, Vec<FsmEffect>) {
    match event {
        Event::ConnOpen => (
            State::OpenSent,
            vec![
                FsmEffect::DisarmTimer(TimerKind::ConnectRetry),
                FsmEffect::SendOpen,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Hold,
                    seconds: 240,
                },
            ],
        ),
        Event::ConnOpenFail => (
            State::Active,
            vec![FsmEffect::ArmTimer {
                kind: TimerKind::ConnectRetry,
                seconds: peer.config.connect_retry_secs,
            }],
        ),
        Event::TimerExpires(TimerKind::ConnectRetry) => (
            State::Connect,
            vec![
                FsmEffect::InitiateConnect,
                FsmEffect::ArmTimer {
                    kind: TimerKind::ConnectRetry,
                    seconds: peer.config.connect_retry_secs,
                },
            ],
        ),
        Event::Stop => (
            State::Idle,
            vec![FsmEffect::CloseConnection, FsmEffect::DisarmTimer(TimerKind::ConnectRetry)],
        ),
        _ => (State::Connect, vec![]),
    }
}

fn fsm_active(peer: &Peer, event: &Event) -> (State, Vec<FsmEffect>) {
    match event {
        Event::ConnOpen => (
            State::OpenSent,
            vec![
                FsmEffect::DisarmTimer(TimerKind::ConnectRetry),
                FsmEffect::SendOpen,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Hold,
                    seconds: 240,
                },
            ],
        ),
        Event::ConnOpenFail => (
            State::Active,
            vec![FsmEffect::ArmTimer {
                kind: TimerKind::ConnectRetry,
                seconds: peer.config.connect_retry_secs,
            }],
        ),
        Event::TimerExpires(TimerKind::ConnectRetry) => (
            State::Connect,
            vec![FsmEffect::InitiateConnect],
        ),
        Event::Stop => (State::Idle, vec![FsmEffect::CloseConnection]),
        _ => (State::Active, vec![]),
    }
}

fn fsm_open_sent(peer: &Peer, event: &Event) -> (State, Vec<FsmEffect>) {
    match event {
        Event::BgpOpen(open) => {
            let NegotiationResult {
                negotiated,
                gr_actions,
                role_error,
                ..
            } = capa_neg_calc(
                &peer.cap_local,
                &open.caps,
                peer.config.role_policy,
                &peer.gr.restarting_afis(),
            );

            if let Some(open_error) = role_error {
                return (
                    State::Idle,
                    vec![
                        notify(NotifyCode::Open, open_error as u8),
                        FsmEffect::CloseConnection,
                        FsmEffect::IdleHoldBackoffDouble,
                    ],
                );
            }

            let negotiated_holdtime = peer.config.configured_holdtime.min(open.hold_time);
            let enter_graceful_restart = negotiated.restart_state;
            let mut effects = vec![
                FsmEffect::StoreNegotiated {
                    holdtime: negotiated_holdtime,
                    caps: negotiated,
                },
                FsmEffect::DisarmTimer(TimerKind::Hold),
                FsmEffect::SendKeepalive,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Hold,
                    seconds: negotiated_holdtime as u64,
                },
            ];
            if negotiated_holdtime > 0 {
                effects.push(FsmEffect::ArmTimer {
                    kind: TimerKind::Keepalive,
                    seconds: keepalive_interval(negotiated_holdtime),
                });
            }
            if enter_graceful_restart {
                effects.push(FsmEffect::GracefulRestartEnter);
            }
            for (afi, action) in gr_actions {
                match action {
                    crate::codec::caps::GrAction::PreserveRestarting => {
                        effects.push(FsmEffect::StaleRestartingAfi(afi))
                    }
                    crate::codec::caps::GrAction::Flush => {
                        effects.push(FsmEffect::FlushRestartingAfi(afi))
                    }
                }
            }
            (State::OpenConfirm, effects)
        }
        Event::TimerExpires(TimerKind::Hold) => (
            State::Idle,
            vec![
                notify(NotifyCode::HoldTimerExpired, 0),
                FsmEffect::CloseConnection,
                FsmEffect::IdleHoldBackoffDouble,
            ],
        ),
        Event::BgpNotification(n) if n.code == OpenError::UnsupportedOptionalParameter as u8 => (
            State::Idle,
            vec![FsmEffect::CloseConnection, FsmEffect::IdleHoldBackoffHalve],
        ),
        Event::ConnProtocolError(err) => (
            State::Idle,
            vec![
                notify_for_protocol_error(err),
                FsmEffect::CloseConnection,
                FsmEffect::IdleHoldBackoffDouble,
            ],
        ),
        Event::BgpNotification(_) | Event::ConnClosed | Event::ConnFatal | Event::ConnOpenFail => (
            State::Idle,
            vec![FsmEffect::CloseConnection, FsmEffect::IdleHoldBackoffDouble],
        ),
        Event::Stop => (
            State::Idle,
            vec![
                notify(NotifyCode::Cease, crate::codec::notification::CeaseError::AdministrativeShutdown as u8),
                FsmEffect::CloseConnection,
            ],
        ),
        _ => (State::OpenSent, vec![]),
    }
}

fn fsm_open_confirm(peer: &Peer, event: &Event, _now: Instant) -> (State, Vec<FsmEffect>) {
    match event {
        Event::BgpKeepalive => (
            State::Established,
            vec![
                FsmEffect::SessionUp,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Hold,
                    seconds: peer.negotiated_holdtime as u64,
                },
            ],
        ),
        Event::TimerExpires(TimerKind::Keepalive) => (
            State::OpenConfirm,
            vec![
                FsmEffect::SendKeepalive,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Keepalive,
                    seconds: keepalive_interval(peer.negotiated_holdtime),
                },
            ],
        ),
        Event::TimerExpires(TimerKind::Hold) => (
            State::Idle,
            vec![
                notify(NotifyCode::HoldTimerExpired, 0),
                FsmEffect::CloseConnection,
                FsmEffect::IdleHoldBackoffDouble,
            ],
        ),
        Event::ConnProtocolError(err) => (
            State::Idle,
            vec![
                notify_for_protocol_error(err),
                FsmEffect::CloseConnection,
                FsmEffect::IdleHoldBackoffDouble,
            ],
        ),
        Event::BgpNotification(_) | Event::ConnClosed | Event::ConnFatal => (
            State::Idle,
            vec![FsmEffect::CloseConnection, FsmEffect::IdleHoldBackoffDouble],
        ),
        Event::BgpOpen(_) => (
            State::Idle,
            vec![
                notify(NotifyCode::Fsm, FsmSubError::UnexpectedMessageInOpenConfirm as u8),
                FsmEffect::CloseConnection,
            ],
        ),
        Event::Stop => (
            State::Idle,
            vec![
                notify(NotifyCode::Cease, crate::codec::notification::CeaseError::AdministrativeShutdown as u8),
                FsmEffect::CloseConnection,
            ],
        ),
        _ => (State::OpenConfirm, vec![]),
    }
}

fn fsm_established(peer: &Peer, event: &Event, _now: Instant) -> (State, Vec<FsmEffect>) {
    match event {
        Event::BgpUpdate(update) => (
            State::Established,
            vec![
                FsmEffect::ForwardUpdate(update.clone()),
                FsmEffect::ArmTimer {
                    kind: TimerKind::Hold,
                    seconds: peer.negotiated_holdtime as u64,
                },
            ],
        ),
        Event::BgpKeepalive => (
            State::Established,
            vec![FsmEffect::ArmTimer {
                kind: TimerKind::Hold,
                seconds: peer.negotiated_holdtime as u64,
            }],
        ),
        Event::TimerExpires(TimerKind::Keepalive) => (
            State::Established,
            vec![
                FsmEffect::SendKeepalive,
                FsmEffect::ArmTimer {
                    kind: TimerKind::Keepalive,
                    seconds: keepalive_interval(peer.negotiated_holdtime),
                },
            ],
        ),
        Event::TimerExpires(TimerKind::Hold) => (
            State::Idle,
            connection_lost_effects(peer, Some(notify(NotifyCode::HoldTimerExpired, 0))),
        ),
        Event::ConnProtocolError(err) => (
            State::Idle,
            connection_lost_effects(peer, Some(notify_for_protocol_error(err))),
        ),
        Event::BgpNotification(_) | Event::ConnClosed | Event::ConnFatal => {
            (State::Idle, connection_lost_effects(peer, None))
        }
        Event::Stop => {
            let mut effects = vec![notify(
                NotifyCode::Cease,
                crate::codec::notification::CeaseError::AdministrativeShutdown as u8,
            )];
            effects.extend(connection_lost_effects(peer, None));
            (State::Idle, effects)
        }
        _ => (State::Established, vec![]),
    }
}

/// Shared teardown for Established -> Idle: close the socket, mark
/// Restarting for every negotiated AFI the peer's Graceful-Restart
/// capability covers (spec §4.7), or flush immediately if GR wasn't
/// negotiated for that AFI, and tell RDE the session is down.
fn connection_lost_effects(peer: &Peer, leading: Option<FsmEffect>) -> Vec<FsmEffect> {
    let mut effects = Vec::new();
    if let Some(e) = leading {
        effects.push(e);
    }
    effects.push(FsmEffect::CloseConnection);
    effects.push(FsmEffect::SessionDown);
    if peer.cap_negotiated.restart_state {
        effects.push(FsmEffect::GracefulRestartEnter);
        effects.push(FsmEffect::ArmTimer {
            kind: TimerKind::RestartTimeout,
            seconds: peer.gr.peer_timeout as u64,
        });
        for afi in peer.negotiated_afi_safis() {
            if peer.cap_negotiated.restart.has(&afi) {
                effects.push(FsmEffect::StaleRestartingAfi(afi));
            } else {
                effects.push(FsmEffect::FlushRestartingAfi(afi));
            }
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::effect::run_effects;
    use crate::fsm::peer::PeerConfig;
    use std::net::Ipv4Addr;

    fn test_peer(state: State) -> Peer {
        let mut peer = Peer::new(1, 65000, Ipv4Addr::new(1, 1, 1, 1), PeerConfig::default());
        peer.state = state;
        peer
    }

    #[test]
    fn idle_hold_expiry_moves_active_peer_to_connect() {
        let peer = test_peer(State::Idle);
        let (next, effects) = fsm_next_state(&peer, &Event::TimerExpires(TimerKind::IdleHold), Instant::now());
        assert_eq!(next, State::Connect);
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::InitiateConnect)));
    }

    #[test]
    fn idle_hold_expiry_moves_passive_peer_to_active() {
        let mut peer = test_peer(State::Idle);
        peer.config.passive = true;
        let (next, _) = fsm_next_state(&peer, &Event::TimerExpires(TimerKind::IdleHold), Instant::now());
        assert_eq!(next, State::Active);
    }

    #[test]
    fn conn_open_in_connect_sends_open_and_moves_to_open_sent() {
        let peer = test_peer(State::Connect);
        let (next, effects) = fsm_next_state(&peer, &Event::ConnOpen, Instant::now());
        assert_eq!(next, State::OpenSent);
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::SendOpen)));
    }

    #[test]
    fn keepalive_in_open_confirm_moves_to_established() {
        let peer = test_peer(State::OpenConfirm);
        let (next, effects) = fsm_next_state(&peer, &Event::BgpKeepalive, Instant::now());
        assert_eq!(next, State::Established);
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::SessionUp)));
    }

    #[test]
    fn hold_timer_expiry_in_established_tears_down() {
        let mut peer = test_peer(State::Established);
        peer.negotiated_holdtime = 90;
        let (next, effects) = fsm_next_state(&peer, &Event::TimerExpires(TimerKind::Hold), Instant::now());
        assert_eq!(next, State::Idle);
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::SessionDown)));
    }

    fn open_with_holdtime(hold_time: u16) -> crate::codec::OpenPacket {
        let mut caps = crate::codec::caps::BgpCap::new();
        caps.mp.insert(
            crate::codec::afi::AfiSafi::IPV4_UNICAST,
            crate::codec::caps::mp::CapMultiProtocol::new(
                crate::codec::afi::Afi::Ip,
                crate::codec::afi::Safi::Unicast,
            ),
        );
        crate::codec::OpenPacket::new(65001, hold_time, Ipv4Addr::new(192, 0, 2, 1), caps)
    }

    #[test]
    fn bgp_open_in_open_sent_stores_negotiated_holdtime_and_caps() {
        let mut peer = test_peer(State::OpenSent);
        peer.config.configured_holdtime = 90;
        peer.cap_local.mp.insert(
            crate::codec::afi::AfiSafi::IPV4_UNICAST,
            crate::codec::caps::mp::CapMultiProtocol::new(
                crate::codec::afi::Afi::Ip,
                crate::codec::afi::Safi::Unicast,
            ),
        );
        let open = open_with_holdtime(90);
        let (next, effects) =
            fsm_next_state(&peer, &Event::BgpOpen(Box::new(open)), Instant::now());
        assert_eq!(next, State::OpenConfirm);
        let stored = effects.iter().find_map(|e| match e {
            FsmEffect::StoreNegotiated { holdtime, caps } => Some((*holdtime, caps.clone())),
            _ => None,
        });
        let (holdtime, caps) = stored.expect("BgpOpen must emit StoreNegotiated");
        assert_eq!(holdtime, 90);
        assert!(caps.mp.has(&crate::codec::afi::AfiSafi::IPV4_UNICAST));

        run_effects(&mut peer, effects, Instant::now(), &mut crate::fsm::effect::NullSink);
        assert_eq!(peer.negotiated_holdtime, 90);
        assert!(peer.cap_negotiated.mp.has(&crate::codec::afi::AfiSafi::IPV4_UNICAST));
    }

    #[test]
    fn established_with_negotiated_caps_carries_them_into_connection_lost_effects() {
        let mut peer = test_peer(State::Established);
        peer.negotiated_holdtime = 90;
        peer.cap_negotiated.restart_state = true;
        peer.cap_negotiated.mp.insert(
            crate::codec::afi::AfiSafi::IPV4_UNICAST,
            crate::codec::caps::mp::CapMultiProtocol::new(
                crate::codec::afi::Afi::Ip,
                crate::codec::afi::Safi::Unicast,
            ),
        );
        let (next, effects) = fsm_next_state(&peer, &Event::ConnClosed, Instant::now());
        assert_eq!(next, State::Idle);
        assert!(effects
            .iter()
            .any(|e| matches!(e, FsmEffect::StaleRestartingAfi(_) | FsmEffect::FlushRestartingAfi(_))));
    }

    #[test]
    fn bad_marker_in_open_sent_sends_header_notification() {
        let peer = test_peer(State::OpenSent);
        let err = CodecError::Header(crate::codec::notification::HeaderError::ConnectionNotSynced);
        let (next, effects) = fsm_next_state(&peer, &Event::ConnProtocolError(err), Instant::now());
        assert_eq!(next, State::Idle);
        let sent = effects.iter().find_map(|e| match e {
            FsmEffect::SendNotification(n) => Some((n.code, n.sub_code)),
            _ => None,
        });
        assert_eq!(
            sent,
            Some((
                NotifyCode::Header as u8,
                crate::codec::notification::HeaderError::ConnectionNotSynced as u8
            ))
        );
    }

    #[test]
    fn protocol_error_in_established_tears_down_with_notification() {
        let mut peer = test_peer(State::Established);
        peer.negotiated_holdtime = 90;
        let err = CodecError::Header(crate::codec::notification::HeaderError::BadMessageLength);
        let (next, effects) = fsm_next_state(&peer, &Event::ConnProtocolError(err), Instant::now());
        assert_eq!(next, State::Idle);
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::SendNotification(_))));
        assert!(effects.iter().any(|e| matches!(e, FsmEffect::SessionDown)));
    }
}
