use bytes::{BufMut, BytesMut};

use crate::codec::error::CodecError;
use crate::codec::header::{BgpHeader, BgpType, BGP_HEADER_LEN};
use crate::codec::notification::UpdateError;

/// An UPDATE message, framed but not attribute-parsed: per the Non-goal
/// ("attribute parsing beyond what is needed to frame an UPDATE for the
/// RDE"), this engine only validates that the three length-prefixed
/// sections RFC 4271 §4.3 defines are internally consistent, then forwards
/// the whole body to the RDE verbatim.
#[derive(Debug, Clone)]
pub struct UpdatePacket {
    pub withdrawn_routes: Vec<u8>,
    pub path_attributes: Vec<u8>,
    pub nlri: Vec<u8>,
}

impl UpdatePacket {
    pub fn encode(&self) -> BytesMut {
        let body_len = 2 + self.withdrawn_routes.len() + 2 + self.path_attributes.len() + self.nlri.len();
        let length = (BGP_HEADER_LEN + body_len) as u16;
        let header = BgpHeader::new(BgpType::Update, length);
        let mut buf = BytesMut::with_capacity(length as usize);
        header.encode(&mut buf);
        buf.put_u16(self.withdrawn_routes.len() as u16);
        buf.extend_from_slice(&self.withdrawn_routes);
        buf.put_u16(self.path_attributes.len() as u16);
        buf.extend_from_slice(&self.path_attributes);
        buf.extend_from_slice(&self.nlri);
        buf
    }

    /// Validates and slices the three sections out of a full message
    /// (header included) whose header was already validated by
    /// [`BgpHeader::parse`]. This is the only "parsing" the Non-goal
    /// permits: the contents of `path_attributes` are opaque.
    pub fn parse(body: &[u8], header: &BgpHeader) -> Result<UpdatePacket, CodecError> {
        let msg_len = header.length as usize;
        if body.len() < msg_len {
            return Err(CodecError::Incomplete {
                needed: msg_len,
                have: body.len(),
            });
        }
        let msg = &body[BGP_HEADER_LEN..msg_len];
        if msg.len() < 2 {
            return Err(CodecError::Update(UpdateError::MalformedAttributeList));
        }
        let withdrawn_len = u16::from_be_bytes([msg[0], msg[1]]) as usize;
        if msg.len() < 2 + withdrawn_len + 2 {
            return Err(CodecError::Update(UpdateError::MalformedAttributeList));
        }
        let withdrawn_routes = msg[2..2 + withdrawn_len].to_vec();
        let rest = &msg[2 + withdrawn_len..];
        let attr_len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
        if rest.len() < 2 + attr_len {
            return Err(CodecError::Update(UpdateError::MalformedAttributeList));
        }
        let path_attributes = rest[2..2 + attr_len].to_vec();
        let nlri = rest[2 + attr_len..].to_vec();

        Ok(UpdatePacket {
            withdrawn_routes,
            path_attributes,
            nlri,
        })
    }

    /// True for an End-of-RIB marker (RFC 4724): an UPDATE with no
    /// withdrawn routes, no path attributes, and no NLRI.
    pub fn is_end_of_rib(&self) -> bool {
        self.withdrawn_routes.is_empty() && self.path_attributes.is_empty() && self.nlri.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let u = UpdatePacket {
            withdrawn_routes: vec![],
            path_attributes: vec![1, 2, 3],
            nlri: vec![24, 192, 0, 2],
        };
        let buf = u.encode();
        assert_eq!(buf.len(), BGP_HEADER_LEN + u.withdrawn_routes.len() + 2 + u.path_attributes.len() + 2 + u.nlri.len());
        let header = BgpHeader::parse(&buf).unwrap();
        let decoded = UpdatePacket::parse(&buf, &header).unwrap();
        assert_eq!(decoded.path_attributes, vec![1, 2, 3]);
        assert_eq!(decoded.nlri, vec![24, 192, 0, 2]);
    }

    #[test]
    fn end_of_rib_detected() {
        let u = UpdatePacket {
            withdrawn_routes: vec![],
            path_attributes: vec![],
            nlri: vec![],
        };
        assert!(u.is_end_of_rib());
    }

    #[test]
    fn inconsistent_lengths_rejected() {
        let mut body = BytesMut::new();
        let header = BgpHeader::new(BgpType::Update, 21);
        header.encode(&mut body);
        body.put_u16(10); // claims 10 bytes of withdrawn routes, none follow
        let err = UpdatePacket::parse(&body, &header).unwrap_err();
        assert_eq!(err, CodecError::Update(UpdateError::MalformedAttributeList));
    }
}
