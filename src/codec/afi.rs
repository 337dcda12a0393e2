use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Address Family Identifier, RFC 4760.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Afi {
    Ip,
    Ip6,
    Unknown(u16),
}

impl From<u16> for Afi {
    fn from(v: u16) -> Self {
        match v {
            1 => Afi::Ip,
            2 => Afi::Ip6,
            v => Afi::Unknown(v),
        }
    }
}

impl From<Afi> for u16 {
    fn from(a: Afi) -> u16 {
        match a {
            Afi::Ip => 1,
            Afi::Ip6 => 2,
            Afi::Unknown(v) => v,
        }
    }
}

impl fmt::Display for Afi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Afi::Ip => write!(f, "IPv4"),
            Afi::Ip6 => write!(f, "IPv6"),
            Afi::Unknown(v) => write!(f, "Afi({v})"),
        }
    }
}

/// Subsequent Address Family Identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Safi {
    Unicast,
    Multicast,
    MplsVpn,
    Unknown(u8),
}

impl From<u8> for Safi {
    fn from(v: u8) -> Self {
        match v {
            1 => Safi::Unicast,
            2 => Safi::Multicast,
            128 => Safi::MplsVpn,
            v => Safi::Unknown(v),
        }
    }
}

impl From<Safi> for u8 {
    fn from(s: Safi) -> u8 {
        match s {
            Safi::Unicast => 1,
            Safi::Multicast => 2,
            Safi::MplsVpn => 128,
            Safi::Unknown(v) => v,
        }
    }
}

impl fmt::Display for Safi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Safi::Unicast => write!(f, "unicast"),
            Safi::Multicast => write!(f, "multicast"),
            Safi::MplsVpn => write!(f, "mpls-vpn"),
            Safi::Unknown(v) => write!(f, "safi({v})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AfiSafi {
    pub afi: Afi,
    pub safi: Safi,
}

impl AfiSafi {
    pub const fn new(afi: Afi, safi: Safi) -> Self {
        AfiSafi { afi, safi }
    }

    pub const IPV4_UNICAST: AfiSafi = AfiSafi::new(Afi::Ip, Safi::Unicast);
}

impl fmt::Display for AfiSafi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.afi, self.safi)
    }
}

/// A small ordered map keyed by AFI/SAFI, used throughout the capability and
/// graceful-restart bookkeeping code instead of a `Vec` scan.
#[derive(Debug, Clone, Default)]
pub struct AfiSafis<T>(pub BTreeMap<AfiSafi, T>);

impl<T> AfiSafis<T> {
    pub fn new() -> Self {
        AfiSafis(BTreeMap::new())
    }

    pub fn insert(&mut self, key: AfiSafi, value: T) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &AfiSafi) -> Option<&T> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &AfiSafi) -> Option<&mut T> {
        self.0.get_mut(key)
    }

    pub fn has(&self, key: &AfiSafi) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &AfiSafi) -> Option<T> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AfiSafi, &T)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AfiSafi> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
