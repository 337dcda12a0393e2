use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

use crate::codec::afi::{Afi, Safi};
use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// Send/Receive indicator carried in each Add-Path capability entry,
/// RFC 7911 §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPathSendReceive {
    Receive,
    Send,
    SendReceive,
    Unknown(u8),
}

impl AddPathSendReceive {
    pub fn is_receive(&self) -> bool {
        matches!(self, AddPathSendReceive::Receive | AddPathSendReceive::SendReceive)
    }

    pub fn is_send(&self) -> bool {
        matches!(self, AddPathSendReceive::Send | AddPathSendReceive::SendReceive)
    }
}

impl From<u8> for AddPathSendReceive {
    fn from(v: u8) -> Self {
        match v {
            1 => AddPathSendReceive::Receive,
            2 => AddPathSendReceive::Send,
            3 => AddPathSendReceive::SendReceive,
            v => AddPathSendReceive::Unknown(v),
        }
    }
}

impl From<AddPathSendReceive> for u8 {
    fn from(v: AddPathSendReceive) -> u8 {
        match v {
            AddPathSendReceive::Receive => 1,
            AddPathSendReceive::Send => 2,
            AddPathSendReceive::SendReceive => 3,
            AddPathSendReceive::Unknown(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddPathValue {
    pub afi: Afi,
    pub safi: Safi,
    pub send_receive: AddPathSendReceive,
}

/// Add-Path capability, RFC 7911: code 69, zero or more 4-byte entries
/// (AFI, SAFI, send/receive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapAddPath {
    pub values: Vec<AddPathValue>,
}

impl CapAddPath {
    pub fn new(afi: Afi, safi: Safi, send_receive: u8) -> Self {
        CapAddPath {
            values: vec![AddPathValue {
                afi,
                safi,
                send_receive: send_receive.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn parse(mut value: &[u8]) -> Option<Self> {
        if value.len() % 4 != 0 {
            return None;
        }
        let mut values = Vec::new();
        while value.len() >= 4 {
            let afi = Afi::from(value.get_u16());
            let safi = Safi::from(value.get_u8());
            let send_receive = AddPathSendReceive::from(value.get_u8());
            values.push(AddPathValue {
                afi,
                safi,
                send_receive,
            });
        }
        Some(CapAddPath { values })
    }
}

impl CapEmit for CapAddPath {
    fn code(&self) -> CapCode {
        CapCode::AddPath
    }

    fn len(&self) -> u8 {
        (self.values.len() * 4) as u8
    }

    fn emit_value(&self, buf: &mut BytesMut) {
        for v in &self.values {
            buf.put_u16(v.afi.into());
            buf.put_u8(v.safi.into());
            buf.put_u8(v.send_receive.into());
        }
    }
}

impl fmt::Display for CapAddPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddPath({} entries)", self.values.len())
    }
}
