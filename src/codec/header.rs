use bytes::{BufMut, BytesMut};
use nom::number::streaming::{be_u16, be_u8};

use crate::codec::error::CodecError;
use crate::codec::notification::HeaderError;

/// 16-byte all-ones marker required by RFC 4271 §4.1 (authentication is not
/// negotiated by this engine, so the marker is always all-ones on the wire).
pub const BGP_MARKER: [u8; 16] = [0xff; 16];

pub const BGP_HEADER_LEN: usize = 19;
pub const BGP_MAX_MESSAGE_LEN: usize = 4096;

pub const BGP_OPEN_MIN_LEN: usize = 29;
pub const BGP_NOTIFICATION_MIN_LEN: usize = 21;
pub const BGP_UPDATE_MIN_LEN: usize = 23;
pub const BGP_KEEPALIVE_LEN: usize = 19;
pub const BGP_ROUTE_REFRESH_MIN_LEN: usize = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgpType {
    Open,
    Update,
    Notification,
    Keepalive,
    RouteRefresh,
}

impl TryFrom<u8> for BgpType {
    type Error = CodecError;

    fn try_from(v: u8) -> Result<Self, CodecError> {
        match v {
            1 => Ok(BgpType::Open),
            2 => Ok(BgpType::Update),
            3 => Ok(BgpType::Notification),
            4 => Ok(BgpType::Keepalive),
            5 => Ok(BgpType::RouteRefresh),
            _ => Err(CodecError::Header(HeaderError::BadMessageType)),
        }
    }
}

impl From<BgpType> for u8 {
    fn from(t: BgpType) -> u8 {
        match t {
            BgpType::Open => 1,
            BgpType::Update => 2,
            BgpType::Notification => 3,
            BgpType::Keepalive => 4,
            BgpType::RouteRefresh => 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BgpHeader {
    pub length: u16,
    pub typ: BgpType,
}

impl BgpHeader {
    pub fn new(typ: BgpType, length: u16) -> Self {
        BgpHeader { length, typ }
    }

    /// Reads only the 19-byte header, validating marker, type, and the
    /// per-type length bound from spec §4.2. `input` must already contain at
    /// least `BGP_HEADER_LEN` bytes.
    pub fn parse(input: &[u8]) -> Result<BgpHeader, CodecError> {
        if input.len() < BGP_HEADER_LEN {
            return Err(CodecError::Incomplete {
                needed: BGP_HEADER_LEN,
                have: input.len(),
            });
        }
        if input[0..16] != BGP_MARKER {
            return Err(CodecError::Header(HeaderError::ConnectionNotSynced));
        }
        let (rest, length) =
            be_u16::<_, nom::error::Error<&[u8]>>(&input[16..18]).map_err(CodecError::from)?;
        let (_, typ_byte) = be_u8::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
        let typ = BgpType::try_from(typ_byte)?;

        let min_len = match typ {
            BgpType::Open => BGP_OPEN_MIN_LEN,
            BgpType::Notification => BGP_NOTIFICATION_MIN_LEN,
            BgpType::Update => BGP_UPDATE_MIN_LEN,
            BgpType::Keepalive => BGP_KEEPALIVE_LEN,
            BgpType::RouteRefresh => BGP_ROUTE_REFRESH_MIN_LEN,
        };
        if (length as usize) < min_len || length as usize > BGP_MAX_MESSAGE_LEN {
            return Err(CodecError::Header(HeaderError::BadMessageLength));
        }
        if typ == BgpType::Keepalive && length as usize != BGP_KEEPALIVE_LEN {
            return Err(CodecError::Header(HeaderError::BadMessageLength));
        }

        Ok(BgpHeader { length, typ })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&BGP_MARKER);
        buf.put_u16(self.length);
        buf.put_u8(self.typ.into());
    }
}

/// Peeks the 2-byte length field at offset 16 without consuming anything.
/// Returns 0 (meaning "not enough buffered yet") if fewer than 18 bytes are
/// available, mirroring the teacher's `peek_bgp_length`.
pub fn peek_bgp_length(buf: &[u8]) -> usize {
    if buf.len() < 18 {
        return 0;
    }
    u16::from_be_bytes([buf[16], buf[17]]) as usize
}
