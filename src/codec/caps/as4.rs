use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// 4-byte AS number capability, RFC 6793: code 65, 4 bytes of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapAs4 {
    pub asn: u32,
}

impl CapAs4 {
    pub fn parse(mut value: &[u8]) -> Option<Self> {
        if value.len() != 4 {
            return None;
        }
        Some(CapAs4 {
            asn: value.get_u32(),
        })
    }
}

impl CapEmit for CapAs4 {
    fn code(&self) -> CapCode {
        CapCode::As4
    }

    fn len(&self) -> u8 {
        4
    }

    fn emit_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.asn);
    }
}

impl fmt::Display for CapAs4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS4({})", self.asn)
    }
}
