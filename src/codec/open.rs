use bytes::{BufMut, BytesMut};
use nom::number::streaming::{be_u16, be_u32, be_u8};
use std::fmt;
use std::net::Ipv4Addr;

use crate::codec::caps::bgp_cap::{parse_one, BgpCap};
use crate::codec::error::CodecError;
use crate::codec::header::{BgpHeader, BgpType, BGP_HEADER_LEN};
use crate::codec::notification::OpenError;

pub const BGP_VERSION: u8 = 4;
/// RFC 6793 AS_TRANS: placeholder 2-byte ASN used when the local AS needs
/// 4 bytes and the peer may not understand the As4 capability.
pub const AS_TRANS: u16 = 23456;

/// Sentinel used by RFC 9072's extended optional-parameters encoding: a
/// regular (type, length) optional parameter of type 255 and length 255
/// signals that what follows is a 2-byte non-ext-op-type then a 2-byte
/// extended length, rather than the regular 1-byte length.
const EXTENDED_OPT_PARAM_SENTINEL: u8 = 255;
/// Threshold above which the regular 1-byte optparamlen can no longer
/// represent the block and the encoder must switch to extended form.
const EXTENDED_OPT_PARAM_THRESHOLD: usize = 253;

#[derive(Debug, Clone)]
pub struct OpenPacket {
    pub version: u8,
    pub asn: u16,
    pub hold_time: u16,
    pub bgp_id: Ipv4Addr,
    pub caps: BgpCap,
}

impl OpenPacket {
    pub fn new(asn: u16, hold_time: u16, bgp_id: Ipv4Addr, caps: BgpCap) -> Self {
        OpenPacket {
            version: BGP_VERSION,
            asn,
            hold_time,
            bgp_id,
            caps,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut params = BytesMut::new();
        self.caps.emit(&mut params);
        let param_len = params.len();

        let (opt_param_len_byte, extended) = if param_len > EXTENDED_OPT_PARAM_THRESHOLD {
            (EXTENDED_OPT_PARAM_SENTINEL, true)
        } else {
            (param_len as u8, false)
        };

        let body_len = if extended {
            29 + 4 + param_len // +1 sentinel +1 non_ext_type +2 ext_len
        } else {
            29 + param_len
        };
        let length = body_len as u16;

        let mut buf = BytesMut::with_capacity(length as usize);
        let header = BgpHeader::new(BgpType::Open, length);
        header.encode(&mut buf);
        buf.put_u8(self.version);
        buf.put_u16(self.asn);
        buf.put_u16(self.hold_time);
        buf.put_slice(&self.bgp_id.octets());
        buf.put_u8(opt_param_len_byte);
        if extended {
            // RFC 9072: one extended optional parameter wrapping the whole
            // capability block as a single type=2-equivalent blob is not
            // how capabilities nest; instead the extended form repeats the
            // sentinel framing around the *first* (and only, in this
            // engine) capability optional parameter's type+length.
            buf.put_u8(EXTENDED_OPT_PARAM_SENTINEL);
            buf.put_u16(param_len as u16);
        }
        buf.extend_from_slice(&params);
        buf
    }

    /// Parses the body following a header already validated by
    /// [`BgpHeader::parse`]. `min_holdtime` is the locally configured
    /// minimum acceptable holdtime used for the spec §4.2 OPEN-sub check.
    pub fn parse(body: &[u8], header: &BgpHeader, min_holdtime: u16) -> Result<OpenPacket, CodecError> {
        if body.len() < header.length as usize {
            return Err(CodecError::Incomplete {
                needed: header.length as usize,
                have: body.len(),
            });
        }
        let msg = &body[BGP_HEADER_LEN..header.length as usize];
        if msg.len() < 10 {
            return Err(CodecError::Open(OpenError::BadBgpIdentifier));
        }
        let (rest, version) =
            be_u8::<_, nom::error::Error<&[u8]>>(msg).map_err(CodecError::from)?;
        if version != BGP_VERSION {
            return Err(CodecError::Open(OpenError::UnsupportedVersionNumber));
        }
        let (rest, asn) = be_u16::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
        if asn == 0 {
            return Err(CodecError::Open(OpenError::BadPeerAs));
        }
        let (rest, hold_time) =
            be_u16::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
        if hold_time > 0 && hold_time < min_holdtime {
            return Err(CodecError::Open(OpenError::UnacceptableHoldTime));
        }
        let (rest, bgp_id_raw) =
            be_u32::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
        if bgp_id_raw == 0 {
            return Err(CodecError::Open(OpenError::BadBgpIdentifier));
        }
        let bgp_id = Ipv4Addr::from(bgp_id_raw);

        if rest.is_empty() {
            return Err(CodecError::Open(OpenError::BadBgpIdentifier));
        }
        let (rest, opt_param_len) =
            be_u8::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;

        let params = if opt_param_len as usize == EXTENDED_OPT_PARAM_SENTINEL as usize {
            if rest.len() < 3 {
                return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
            }
            let (rest, _non_ext_type) =
                be_u8::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
            let (rest, ext_len) =
                be_u16::<_, nom::error::Error<&[u8]>>(rest).map_err(CodecError::from)?;
            if rest.len() < ext_len as usize {
                return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
            }
            &rest[..ext_len as usize]
        } else {
            if rest.len() < opt_param_len as usize {
                return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
            }
            &rest[..opt_param_len as usize]
        };

        let tlvs = parse_opt_params(params)?;
        let caps = BgpCap::from_tlvs(tlvs);

        Ok(OpenPacket {
            version,
            asn,
            hold_time,
            bgp_id,
            caps,
        })
    }
}

/// Walks the optional-parameters block. Each entry is a (type, length,
/// value) TLV; type 2 is "Capability", which itself wraps one or more
/// capability TLVs. Any other optional-parameter type is unsupported by
/// this engine (spec §4.2: unknown opt-param type -> NOTIFICATION).
fn parse_opt_params(mut input: &[u8]) -> Result<Vec<crate::codec::caps::bgp_cap::DecodedCap>, CodecError> {
    const CAPABILITY_OPT_PARAM_TYPE: u8 = 2;
    let mut tlvs = Vec::new();
    while !input.is_empty() {
        if input.len() < 2 {
            return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
        }
        let typ = input[0];
        let len = input[1] as usize;
        if input.len() < 2 + len {
            return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
        }
        if typ != CAPABILITY_OPT_PARAM_TYPE {
            return Err(CodecError::Open(OpenError::UnsupportedOptionalParameter));
        }
        let mut cap_block = &input[2..2 + len];
        while !cap_block.is_empty() {
            match parse_one(cap_block) {
                Some((decoded, consumed)) => {
                    tlvs.push(decoded);
                    cap_block = &cap_block[consumed..];
                }
                None => break,
            }
        }
        input = &input[2 + len..];
    }
    Ok(tlvs)
}

impl fmt::Display for OpenPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OPEN version={} asn={} hold={} id={} {}",
            self.version, self.asn, self.hold_time, self.bgp_id, self.caps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::caps::bgp_cap::default_mp;

    #[test]
    fn encode_decode_round_trips() {
        let mut caps = BgpCap::new();
        caps.mp = default_mp();
        caps.refresh = true;
        caps.as4 = Some(crate::codec::caps::as4::CapAs4 { asn: 65001 });
        let open = OpenPacket::new(65001, 90, Ipv4Addr::new(10, 0, 0, 1), caps);
        let buf = open.encode();
        let header = BgpHeader::parse(&buf).unwrap();
        let decoded = OpenPacket::parse(&buf, &header, 3).unwrap();
        assert_eq!(decoded.asn, 65001);
        assert_eq!(decoded.hold_time, 90);
        assert_eq!(decoded.bgp_id, Ipv4Addr::new(10, 0, 0, 1));
        assert!(decoded.caps.refresh);
        assert!(decoded.caps.as4.is_some());
    }

    #[test]
    fn holdtime_below_minimum_rejected() {
        let caps = BgpCap::new();
        let open = OpenPacket::new(65001, 1, Ipv4Addr::new(10, 0, 0, 1), caps);
        let buf = open.encode();
        let header = BgpHeader::parse(&buf).unwrap();
        let err = OpenPacket::parse(&buf, &header, 3).unwrap_err();
        assert_eq!(err, CodecError::Open(OpenError::UnacceptableHoldTime));
    }

    #[test]
    fn holdtime_zero_accepted() {
        let caps = BgpCap::new();
        let open = OpenPacket::new(65001, 0, Ipv4Addr::new(10, 0, 0, 1), caps);
        let buf = open.encode();
        let header = BgpHeader::parse(&buf).unwrap();
        let decoded = OpenPacket::parse(&buf, &header, 3).unwrap();
        assert_eq!(decoded.hold_time, 0);
    }

    #[test]
    fn extended_opt_params_round_trip() {
        let mut caps = BgpCap::new();
        // force a large MP set so the opt-params block exceeds the
        // non-extended threshold.
        for i in 0..70u16 {
            caps.mp.insert(
                crate::codec::afi::AfiSafi::new(
                    crate::codec::afi::Afi::Unknown(i),
                    crate::codec::afi::Safi::Unicast,
                ),
                crate::codec::caps::mp::CapMultiProtocol::new(
                    crate::codec::afi::Afi::Unknown(i),
                    crate::codec::afi::Safi::Unicast,
                ),
            );
        }
        let open = OpenPacket::new(65001, 90, Ipv4Addr::new(10, 0, 0, 1), caps);
        let buf = open.encode();
        assert_eq!(buf[19 + 9], EXTENDED_OPT_PARAM_SENTINEL);
        let header = BgpHeader::parse(&buf).unwrap();
        let decoded = OpenPacket::parse(&buf, &header, 3).unwrap();
        assert_eq!(decoded.caps.mp.len(), 70);
    }
}
