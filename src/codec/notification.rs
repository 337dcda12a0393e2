use bytes::{BufMut, BytesMut};
use std::fmt;

use crate::codec::error::CodecError;
use crate::codec::header::{BgpHeader, BgpType, BGP_HEADER_LEN};

/// RFC 4271 §6 top-level NOTIFICATION error codes, plus RFC 7313 (route
/// refresh) and RFC 9234 (role, carried as an Open sub-code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifyCode {
    Header = 1,
    Open = 2,
    Update = 3,
    HoldTimerExpired = 4,
    Fsm = 5,
    Cease = 6,
    RouteRefresh = 7,
    SendHoldTimerExpired = 8,
}

impl TryFrom<u8> for NotifyCode {
    type Error = ();
    fn try_from(v: u8) -> Result<Self, ()> {
        Ok(match v {
            1 => NotifyCode::Header,
            2 => NotifyCode::Open,
            3 => NotifyCode::Update,
            4 => NotifyCode::HoldTimerExpired,
            5 => NotifyCode::Fsm,
            6 => NotifyCode::Cease,
            7 => NotifyCode::RouteRefresh,
            8 => NotifyCode::SendHoldTimerExpired,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HeaderError {
    ConnectionNotSynced = 1,
    BadMessageLength = 2,
    BadMessageType = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpenError {
    UnsupportedVersionNumber = 1,
    BadPeerAs = 2,
    BadBgpIdentifier = 3,
    UnsupportedOptionalParameter = 4,
    UnacceptableHoldTime = 6,
    UnsupportedCapability = 7,
    RoleMismatch = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateError {
    MalformedAttributeList = 1,
    UnrecognizedWellKnownAttribute = 2,
    MissingWellKnownAttribute = 3,
    AttributeFlagsError = 4,
    AttributeLengthError = 5,
    InvalidOriginAttribute = 6,
    InvalidNexthopAttribute = 8,
    OptionalAttributeError = 9,
    InvalidNetworkField = 10,
    MalformedAsPath = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FsmSubError {
    UnexpectedMessageInOpenSent = 1,
    UnexpectedMessageInOpenConfirm = 2,
    UnexpectedMessageInEstablished = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CeaseError {
    MaximumNumberOfPrefixesReached = 1,
    AdministrativeShutdown = 2,
    PeerDeConfigured = 3,
    AdministrativeReset = 4,
    ConnectionRejected = 5,
    OtherConfigurationChange = 6,
    ConnectionCollisionResolution = 7,
    OutOfResources = 8,
}

/// A decoded or to-be-encoded NOTIFICATION, RFC 4271 §4.5.
#[derive(Debug, Clone)]
pub struct NotificationPacket {
    pub code: u8,
    pub sub_code: u8,
    pub data: Vec<u8>,
}

/// Administrative shutdown/reset notifications may carry a UTF-8 reason
/// string (<=128 bytes) with a leading length byte, per spec §4.8.
pub const MAX_SHUTDOWN_REASON_LEN: usize = 128;

impl NotificationPacket {
    pub fn new(code: NotifyCode, sub_code: u8, data: Vec<u8>) -> Self {
        let max_data = crate::codec::header::BGP_MAX_MESSAGE_LEN - BGP_HEADER_LEN - 2;
        let mut data = data;
        data.truncate(max_data);
        NotificationPacket {
            code: code as u8,
            sub_code,
            data,
        }
    }

    pub fn with_shutdown_reason(code: NotifyCode, sub_code: u8, reason: &str) -> Self {
        let mut bytes = reason.as_bytes().to_vec();
        bytes.truncate(MAX_SHUTDOWN_REASON_LEN);
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.push(bytes.len() as u8);
        data.extend_from_slice(&bytes);
        NotificationPacket::new(code, sub_code, data)
    }

    pub fn encode(&self) -> BytesMut {
        let length = (BGP_HEADER_LEN + 2 + self.data.len()) as u16;
        let header = BgpHeader::new(BgpType::Notification, length);
        let mut buf = BytesMut::with_capacity(length as usize);
        header.encode(&mut buf);
        buf.put_u8(self.code);
        buf.put_u8(self.sub_code);
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Parses the body that follows a header already validated by
    /// [`BgpHeader::parse`]. `body` is the full message (header included).
    pub fn parse(body: &[u8], header: &BgpHeader) -> Result<NotificationPacket, CodecError> {
        let data_len = header.length as usize - BGP_HEADER_LEN - 2;
        if body.len() < BGP_HEADER_LEN + 2 + data_len {
            return Err(CodecError::Incomplete {
                needed: BGP_HEADER_LEN + 2 + data_len,
                have: body.len(),
            });
        }
        let code = body[BGP_HEADER_LEN];
        let sub_code = body[BGP_HEADER_LEN + 1];
        let data = body[BGP_HEADER_LEN + 2..BGP_HEADER_LEN + 2 + data_len].to_vec();
        Ok(NotificationPacket {
            code,
            sub_code,
            data,
        })
    }
}

impl fmt::Display for NotificationPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NOTIFICATION code={} sub={} len={}",
            self.code,
            self.sub_code,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let n = NotificationPacket::new(NotifyCode::HoldTimerExpired, 0, vec![]);
        let buf = n.encode();
        let header = BgpHeader::parse(&buf).unwrap();
        let decoded = NotificationPacket::parse(&buf, &header).unwrap();
        assert_eq!(decoded.code, NotifyCode::HoldTimerExpired as u8);
        assert_eq!(decoded.sub_code, 0);
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn oversize_data_is_truncated() {
        let huge = vec![0xAB; 8192];
        let n = NotificationPacket::new(NotifyCode::Cease, CeaseError::AdministrativeReset as u8, huge);
        let buf = n.encode();
        assert!(buf.len() <= crate::codec::header::BGP_MAX_MESSAGE_LEN);
    }
}
