use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

use crate::codec::afi::{Afi, Safi};
use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// Multi-Protocol Extensions capability, RFC 4760: code 1, 4 bytes of value
/// (AFI, reserved, SAFI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapMultiProtocol {
    pub afi: Afi,
    pub safi: Safi,
}

impl CapMultiProtocol {
    pub fn new(afi: Afi, safi: Safi) -> Self {
        CapMultiProtocol { afi, safi }
    }

    pub fn parse(mut value: &[u8]) -> Option<Self> {
        if value.len() != 4 {
            return None;
        }
        let afi = Afi::from(value.get_u16());
        let _reserved = value.get_u8();
        let safi = Safi::from(value.get_u8());
        Some(CapMultiProtocol { afi, safi })
    }
}

impl CapEmit for CapMultiProtocol {
    fn code(&self) -> CapCode {
        CapCode::MultiProtocol
    }

    fn len(&self) -> u8 {
        4
    }

    fn emit_value(&self, buf: &mut BytesMut) {
        buf.put_u16(self.afi.into());
        buf.put_u8(0);
        buf.put_u8(self.safi.into());
    }
}

impl fmt::Display for CapMultiProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MP({}/{})", self.afi, self.safi)
    }
}
