//! Inbound accept loop and collision resolution, RFC 4271 §6.8. Grounded on
//! `examples/zebra-rs-zebra-rs/zebra-rs/src/bgp/peer.rs`'s
//! `accept`/`handle_peer_connection`/`reject_connection` — the clearest
//! collision-resolution precedent in the pack.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;

use crate::codec::notification::{CeaseError, NotifyCode};
use crate::codec::NotificationPacket;
use crate::fsm::state::State;
use crate::io::AcceptedConn;

pub async fn run(bind_addr: SocketAddr, tx: UnboundedSender<AcceptedConn>) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let local_addr = stream.local_addr()?;
        if tx
            .send(AcceptedConn {
                stream,
                remote_addr,
                local_addr,
            })
            .is_err()
        {
            return Ok(());
        }
    }
}

/// What to do with a freshly accepted inbound connection given the
/// existing peer's current FSM state (spec §4.5). The decision never
/// depends on anything but the state, so it's a pure lookup the engine
/// calls before touching the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDecision {
    /// No session to collide with yet, or the existing attempt loses:
    /// attach the new connection and drive it as if freshly connected.
    Replace,
    /// Hold the new connection aside until the in-flight OPEN exchange
    /// resolves collision per RFC 4271 §6.8 (both sides sent OPEN already).
    Defer,
    /// A session is already further along: reject the new connection with
    /// a NOTIFICATION.
    Reject { code: NotifyCode, sub_code: u8 },
}

pub fn resolve_collision(state: State) -> CollisionDecision {
    match state {
        State::None | State::Idle | State::Connect | State::Active => CollisionDecision::Replace,
        State::OpenSent => CollisionDecision::Defer,
        State::OpenConfirm => CollisionDecision::Reject {
            code: NotifyCode::Cease,
            sub_code: CeaseError::ConnectionCollisionResolution as u8,
        },
        State::Established => CollisionDecision::Reject {
            code: NotifyCode::Cease,
            sub_code: CeaseError::ConnectionRejected as u8,
        },
    }
}

/// Sends a NOTIFICATION and closes a rejected connection, bounded by a
/// timeout so an unresponsive peer can't hold the fd open indefinitely.
pub async fn reject_connection(mut stream: TcpStream, code: NotifyCode, sub_code: u8) {
    let notification = NotificationPacket::new(code, sub_code, vec![]);
    let buf = notification.encode();
    let _ = timeout(Duration::from_secs(5), async {
        let _ = stream.write_all(&buf).await;
        let _ = stream.shutdown().await;
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_peer_replaces_connection() {
        assert_eq!(resolve_collision(State::Idle), CollisionDecision::Replace);
    }

    #[test]
    fn open_sent_defers() {
        assert_eq!(resolve_collision(State::OpenSent), CollisionDecision::Defer);
    }

    #[test]
    fn established_rejects() {
        assert!(matches!(
            resolve_collision(State::Established),
            CollisionDecision::Reject { .. }
        ));
    }
}
