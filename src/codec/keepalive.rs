use bytes::BytesMut;

use crate::codec::header::{BgpHeader, BgpType, BGP_HEADER_LEN};

/// KEEPALIVE is header-only: no body, fixed length 19.
pub fn encode() -> BytesMut {
    let header = BgpHeader::new(BgpType::Keepalive, BGP_HEADER_LEN as u16);
    let mut buf = BytesMut::with_capacity(BGP_HEADER_LEN);
    header.encode(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_is_exactly_header_length() {
        let buf = encode();
        assert_eq!(buf.len(), BGP_HEADER_LEN);
    }
}
