use std::fmt;

use crate::codec::afi::AfiSafi;
use crate::codec::caps::BgpCap;
use crate::codec::error::CodecError;
use crate::codec::OpenPacket;
use crate::codec::NotificationPacket;
use crate::codec::UpdatePacket;
use crate::timer::TimerKind;

/// RFC 4271 §8 session states, with the spec's "None" pre-init state added
/// ahead of Idle for peers not yet started (spec §3 lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    None,
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

impl State {
    pub fn is_established(&self) -> bool {
        matches!(self, State::Established)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Events the FSM reacts to (spec §4.1 table plus the timer-expiry and
/// connection-lifecycle events every transition needs).
#[derive(Debug, Clone)]
pub enum Event {
    Start,
    Stop,
    ConnOpen,
    ConnOpenFail,
    ConnFatal,
    /// A header or message failed to decode; carries the error the
    /// matching NOTIFICATION is built from (spec §4.2, §7).
    ConnProtocolError(CodecError),
    ConnClosed,
    TimerExpires(TimerKind),
    BgpOpen(Box<OpenPacket>),
    BgpUpdate(Box<UpdatePacket>),
    BgpNotification(NotificationPacket),
    BgpKeepalive,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TimerExpires(k) => write!(f, "TimerExpires({k:?})"),
            Event::BgpOpen(_) => write!(f, "BgpOpen"),
            Event::BgpUpdate(_) => write!(f, "BgpUpdate"),
            Event::BgpNotification(_) => write!(f, "BgpNotification"),
            Event::ConnProtocolError(e) => write!(f, "ConnProtocolError({e})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Side effects the pure transition function asks the effect runner to
/// perform (Design Note §9: "a pure function ... plus an effect runner").
#[derive(Debug, Clone)]
pub enum FsmEffect {
    SendOpen,
    SendKeepalive,
    SendNotification(NotificationPacket),
    InitiateConnect,
    CloseConnection,
    ArmTimer { kind: TimerKind, seconds: u64 },
    DisarmTimer(TimerKind),
    /// Persists the result of `capa_neg_calc` onto the peer before it
    /// leaves OpenSent, so OpenConfirm/Established's Hold/Keepalive arming
    /// and `SessionUp`/graceful-restart bookkeeping see the real negotiated
    /// values rather than `Peer::new`'s zero/empty defaults.
    StoreNegotiated { holdtime: u16, caps: BgpCap },
    SessionUp,
    SessionDown,
    ForwardUpdate(Box<UpdatePacket>),
    GracefulRestartEnter,
    GracefulRestartExit,
    StaleRestartingAfi(AfiSafi),
    FlushRestartingAfi(AfiSafi),
    IdleHoldBackoffDouble,
    IdleHoldBackoffHalve,
    IdleHoldReset,
}
