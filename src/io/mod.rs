pub mod connect;
pub mod listener;
pub mod reader;
pub mod writer;

use crate::codec::BgpMessage;

/// What a reader task reports back to the engine about one connection.
/// Reader/writer tasks never touch `Peer` directly (spec §5) — they only
/// produce these and let the engine's single task fold them into FSM
/// events.
#[derive(Debug)]
pub enum PeerIoEvent {
    Message(BgpMessage),
    /// The peer closed its end, or a read returned 0 bytes.
    Closed,
    /// A header or message failed to decode; the connection is no longer
    /// usable, and the FSM must send the matching NOTIFICATION (spec §4.2).
    ProtocolError(crate::codec::error::CodecError),
    /// A fatal I/O error (not a protocol violation) on the connection.
    Fatal(String),
}

#[derive(Debug)]
pub struct PeerIoMsg {
    pub peer_id: u32,
    pub event: PeerIoEvent,
}

/// What the outbound non-blocking connect attempt reports back.
#[derive(Debug)]
pub enum ConnectOutcome {
    Connected(tokio::net::TcpStream),
    Failed(String),
}

#[derive(Debug)]
pub struct ConnectMsg {
    pub peer_id: u32,
    pub outcome: ConnectOutcome,
}

/// A freshly accepted inbound connection, handed to the engine so it can
/// run collision resolution (spec §4.5) before attaching it to a `Peer`.
pub struct AcceptedConn {
    pub stream: tokio::net::TcpStream,
    pub remote_addr: std::net::SocketAddr,
    pub local_addr: std::net::SocketAddr,
}
