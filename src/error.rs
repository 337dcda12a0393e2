use thiserror::Error;

use crate::bridge::BridgeError;
use crate::codec::error::CodecError;
use crate::fsm::FsmError;

/// Top-level error type for the session engine. Protocol-violation and
/// peer-initiated errors never reach here — the FSM absorbs those and drives
/// the peer back to `Idle`. What's left is the "fatal: abort the process"
/// row of the error handling table: internal invariant violations and
/// bridge/codec failures that indicate something the engine cannot recover
/// from on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("fsm error: {0}")]
    Fsm(#[from] FsmError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
