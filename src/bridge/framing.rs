//! Bridge wire format, SPEC_FULL §6.1: `tokio_util::codec::LengthDelimitedCodec`
//! (4-byte big-endian length prefix) carrying a small hand-rolled tag+payload
//! envelope — a 1-byte message-type tag followed by a `serde_json` payload,
//! except for UPDATE frames, whose payload is the raw wire bytes so the RDE
//! bridge never pays a serialization cost on the data-plane path.
//!
//! Framing itself is grounded on the `FramedRead`/`FramedWrite` +
//! `tokio_util::codec` idiom demonstrated by
//! `e947cd32_myzhang1029-pabgp__src-session.rs.rs`'s `Feeder`; using the
//! crate's own `LengthDelimitedCodec` rather than hand-rolling the length
//! prefix is the more idiomatic `tokio-util` usage the pack's dependency
//! table already commits to.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::codec::LengthDelimitedCodec;

pub use tokio_util::codec::Framed;

/// Builds the `LengthDelimitedCodec` every bridge channel frames through,
/// per SPEC_FULL §6.1's 4-byte length prefix.
pub fn length_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .max_frame_length(max_frame_len)
        .big_endian()
        .new_codec()
}

/// Encodes `tag` + JSON(payload) into one length-delimited frame body.
pub fn encode_envelope<T: Serialize>(tag: u8, payload: &T) -> io::Result<Bytes> {
    let json = serde_json::to_vec(payload).map_err(io::Error::other)?;
    let mut buf = BytesMut::with_capacity(1 + json.len());
    buf.put_u8(tag);
    buf.extend_from_slice(&json);
    Ok(buf.freeze())
}

/// Encodes a raw UPDATE-style frame: tag + opaque bytes, no JSON.
pub fn encode_raw_envelope(tag: u8, raw: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + raw.len());
    buf.put_u8(tag);
    buf.extend_from_slice(raw);
    buf.freeze()
}

/// Splits one decoded frame into its tag and remaining payload bytes.
pub fn split_envelope(mut frame: BytesMut) -> io::Result<(u8, BytesMut)> {
    if frame.is_empty() {
        return Err(io::Error::other("empty bridge frame"));
    }
    let tag = frame[0];
    frame.advance(1);
    Ok((tag, frame))
}

pub fn decode_json<T: DeserializeOwned>(payload: &[u8]) -> io::Result<T> {
    serde_json::from_slice(payload).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn envelope_round_trips() {
        let bytes = encode_envelope(7, &Ping { n: 42 }).unwrap();
        let (tag, payload) = split_envelope(BytesMut::from(&bytes[..])).unwrap();
        assert_eq!(tag, 7);
        let decoded: Ping = decode_json(&payload).unwrap();
        assert_eq!(decoded, Ping { n: 42 });
    }

    #[test]
    fn raw_envelope_carries_opaque_bytes() {
        let bytes = encode_raw_envelope(9, &[1, 2, 3]);
        let (tag, payload) = split_envelope(BytesMut::from(&bytes[..])).unwrap();
        assert_eq!(tag, 9);
        assert_eq!(&payload[..], &[1, 2, 3]);
    }
}
