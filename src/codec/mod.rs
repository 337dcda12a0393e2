pub mod afi;
pub mod caps;
pub mod error;
pub mod header;
pub mod keepalive;
pub mod notification;
pub mod open;
pub mod update;

pub use header::{BgpHeader, BgpType, BGP_HEADER_LEN, BGP_MAX_MESSAGE_LEN};
pub use notification::NotificationPacket;
pub use open::OpenPacket;
pub use update::UpdatePacket;

/// A decoded BGP message, dispatched on by the message pump (spec §4.3).
#[derive(Debug, Clone)]
pub enum BgpMessage {
    Open(Box<OpenPacket>),
    Update(Box<UpdatePacket>),
    Notification(NotificationPacket),
    Keepalive,
    RouteRefresh { afi: afi::Afi, safi: afi::Safi },
}

impl BgpMessage {
    /// Parses one complete message (header included) given that at least
    /// `header.length` bytes of `body` are already available. `min_holdtime`
    /// is threaded through to the OPEN parser.
    pub fn parse(body: &[u8], header: &BgpHeader, min_holdtime: u16) -> Result<BgpMessage, error::CodecError> {
        match header.typ {
            BgpType::Open => Ok(BgpMessage::Open(Box::new(OpenPacket::parse(
                body,
                header,
                min_holdtime,
            )?))),
            BgpType::Update => Ok(BgpMessage::Update(Box::new(UpdatePacket::parse(
                body, header,
            )?))),
            BgpType::Notification => Ok(BgpMessage::Notification(NotificationPacket::parse(
                body, header,
            )?)),
            BgpType::Keepalive => Ok(BgpMessage::Keepalive),
            BgpType::RouteRefresh => {
                let msg = &body[BGP_HEADER_LEN..header.length as usize];
                if msg.len() < 4 {
                    return Err(error::CodecError::Header(
                        crate::codec::notification::HeaderError::BadMessageLength,
                    ));
                }
                let afi = afi::Afi::from(u16::from_be_bytes([msg[0], msg[1]]));
                let safi = afi::Safi::from(msg[3]);
                Ok(BgpMessage::RouteRefresh { afi, safi })
            }
        }
    }
}
