use bytes::{BufMut, BytesMut};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// BGP Role, RFC 9234 §4.1: code 9, 1-byte value from the role registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Provider,
    RouteServer,
    RouteServerClient,
    Customer,
    Peer,
    Unknown(u8),
}

impl From<u8> for Role {
    fn from(v: u8) -> Self {
        match v {
            0 => Role::Provider,
            1 => Role::RouteServer,
            2 => Role::RouteServerClient,
            3 => Role::Customer,
            4 => Role::Peer,
            v => Role::Unknown(v),
        }
    }
}

impl From<Role> for u8 {
    fn from(r: Role) -> u8 {
        match r {
            Role::Provider => 0,
            Role::RouteServer => 1,
            Role::RouteServerClient => 2,
            Role::Customer => 3,
            Role::Peer => 4,
            Role::Unknown(v) => v,
        }
    }
}

impl Role {
    /// The RFC 9234 §4.2 compatibility matrix: the role the peer must
    /// advertise for the session to be considered consistent.
    pub fn expected_peer_role(&self) -> Option<Role> {
        match self {
            Role::Provider => Some(Role::Customer),
            Role::Customer => Some(Role::Provider),
            Role::Peer => Some(Role::Peer),
            Role::RouteServer => Some(Role::RouteServerClient),
            Role::RouteServerClient => Some(Role::RouteServer),
            Role::Unknown(_) => None,
        }
    }

    pub fn is_compatible_with(&self, peer: Role) -> bool {
        self.expected_peer_role() == Some(peer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapRole {
    pub role: Role,
}

impl CapRole {
    pub fn new(role: Role) -> Self {
        CapRole { role }
    }

    pub fn parse(value: &[u8]) -> Option<Self> {
        if value.len() != 1 {
            return None;
        }
        Some(CapRole {
            role: Role::from(value[0]),
        })
    }
}

impl CapEmit for CapRole {
    fn code(&self) -> CapCode {
        CapCode::Role
    }

    fn len(&self) -> u8 {
        1
    }

    fn emit_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.role.into());
    }
}

impl fmt::Display for CapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({:?})", self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_customer_compatible() {
        assert!(Role::Provider.is_compatible_with(Role::Customer));
        assert!(Role::Customer.is_compatible_with(Role::Provider));
    }

    #[test]
    fn provider_provider_incompatible() {
        assert!(!Role::Provider.is_compatible_with(Role::Provider));
    }

    #[test]
    fn peer_peer_compatible() {
        assert!(Role::Peer.is_compatible_with(Role::Peer));
    }
}
