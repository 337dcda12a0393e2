//! Process-boundary bridges, SPEC_FULL §6: framed connections to the
//! Route Decision Engine and the parent process, plus the control-socket
//! message catalogue. All three collaborators are externally specified
//! and out of scope; this module only owns the engine's half of the wire
//! contract and the one shared framing layer they ride on.

pub mod control;
pub mod framing;
pub mod parent;
pub mod rde;

use thiserror::Error;

pub use framing::{decode_json, encode_envelope, encode_raw_envelope, length_codec, split_envelope};
pub use rde::{RdeClient, RdeOutbound};

/// Frames larger than this are refused rather than buffered without bound;
/// the only bridge payload expected to approach it is a raw UPDATE body,
/// already capped by `codec::BGP_MAX_MESSAGE_LEN`.
pub const MAX_BRIDGE_FRAME_LEN: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bridge frame decode error: {0}")]
    Decode(String),

    #[error("bridge peer disconnected")]
    Disconnected,
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Decode(e.to_string())
    }
}
