pub mod effect;
pub mod peer;
pub mod state;
pub mod transition;

pub use effect::{run_effects, EffectSink, NullSink};
pub use peer::{Direction, Peer, PeerConfig};
pub use state::{Event, FsmEffect, State};
pub use transition::fsm_next_state;

use thiserror::Error;

/// Errors the FSM layer itself cannot absorb by driving the peer back to
/// `Idle` — these indicate an invariant violation in the engine's own
/// bookkeeping rather than anything the peer on the wire did.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("event {event} received for peer {peer_id} with no active connection")]
    NoActiveConnection { peer_id: u32, event: String },

    #[error("unknown peer id {0}")]
    UnknownPeer(u32),
}
