//! Control-socket request/response catalogue, SPEC_FULL §6.2. The control
//! socket listener itself lives outside this engine (Non-goals); this is
//! the contract its requests and the engine's responses share, framed
//! through the same length-delimited codec as the other bridges.

use serde::{Deserialize, Serialize};

use crate::codec::afi::AfiSafi;
use crate::fsm::State;

#[repr(u8)]
pub enum ControlTag {
    Request = 1,
    Response = 2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ControlRequest {
    ShowNeighbor { peer_id: Option<u32> },
    ClearNeighbor { peer_id: u32, hard: bool },
    RefreshNeighbor { peer_id: u32, afi_safi: AfiSafi },
    ShowListeners,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborSummary {
    pub peer_id: u32,
    pub descriptor: String,
    pub state: ControlState,
    pub peer_as: u32,
    pub established_transitions: u64,
}

/// `fsm::State` itself has no serde impl — the wire shape is intentionally
/// a flat copy so control clients never need the FSM crate's internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlState {
    None,
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

impl From<State> for ControlState {
    fn from(s: State) -> Self {
        match s {
            State::None => ControlState::None,
            State::Idle => ControlState::Idle,
            State::Connect => ControlState::Connect,
            State::Active => ControlState::Active,
            State::OpenSent => ControlState::OpenSent,
            State::OpenConfirm => ControlState::OpenConfirm,
            State::Established => ControlState::Established,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ControlResponse {
    Neighbors(Vec<NeighborSummary>),
    Listeners(Vec<ListenerSummary>),
    Ok,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSummary {
    pub listener_id: u32,
    pub bind_addr: std::net::SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_maps_to_wire_state() {
        assert_eq!(ControlState::from(State::Established), ControlState::Established);
    }

    #[test]
    fn request_round_trips_through_json() {
        let req = ControlRequest::ClearNeighbor { peer_id: 4, hard: true };
        let json = serde_json::to_vec(&req).unwrap();
        let back: ControlRequest = serde_json::from_slice(&json).unwrap();
        match back {
            ControlRequest::ClearNeighbor { peer_id, hard } => {
                assert_eq!(peer_id, 4);
                assert!(hard);
            }
            _ => panic!("wrong variant"),
        }
    }
}
