//! RDE bridge message catalogue, SPEC_FULL §6. The RDE process itself is
//! out of scope (Non-goals); this module is the engine's half of the
//! contract — the enums plus a thin client over one framed connection.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::codec::afi::AfiSafi;
use crate::codec::caps::BgpCap;
use crate::codec::notification::{NotifyCode, UpdateError};

/// Tags for the 1-byte envelope header, SPEC_FULL §6.1. Stable across
/// engine versions since the RDE may be upgraded independently.
#[repr(u8)]
pub enum RdeTag {
    SessionAdd = 1,
    SessionUp = 2,
    SessionDown = 3,
    Update = 4,
    UpdateErr = 5,
    SessionStale = 6,
    SessionNoGrace = 7,
    SessionFlush = 8,
    SessionRestarted = 9,
    Refresh = 10,
    Xon = 11,
    Xoff = 12,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAdd {
    pub peer_id: u32,
    pub peer_as: u32,
    pub remote_addr: IpAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUp {
    pub peer_id: u32,
    pub negotiated: BgpCapWire,
    pub local_addr: IpAddr,
    pub remote_addr: IpAddr,
}

/// `BgpCap` itself isn't `Serialize`/`Deserialize` (it carries capability
/// value types grounded purely in wire codec needs); the bridge only needs
/// to tell the RDE which AFI/SAFI pairs and flags were negotiated, not the
/// full capability struct, so this is a deliberately thinner wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BgpCapWire {
    pub afi_safis: Vec<AfiSafi>,
    pub as4: bool,
    pub refresh: bool,
    pub restart_state: bool,
    pub add_path: Vec<(AfiSafi, u8)>,
}

impl From<&BgpCap> for BgpCapWire {
    fn from(cap: &BgpCap) -> Self {
        BgpCapWire {
            afi_safis: cap.mp.iter().map(|(k, _)| *k).collect(),
            as4: cap.as4.is_some(),
            refresh: cap.refresh,
            restart_state: cap.restart_state,
            add_path: cap.addpath.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDown {
    pub peer_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateErr {
    pub peer_id: u32,
    pub code: NotifyCode,
    pub sub_code: UpdateError,
}

impl serde::Serialize for NotifyCode {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(*self as u8)
    }
}
impl<'de> serde::Deserialize<'de> for NotifyCode {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        NotifyCode::try_from(v).map_err(|_| serde::de::Error::custom("bad notify code"))
    }
}
impl serde::Serialize for UpdateError {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(*self as u8)
    }
}
impl<'de> serde::Deserialize<'de> for UpdateError {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        Ok(match v {
            1 => UpdateError::MalformedAttributeList,
            2 => UpdateError::UnrecognizedWellKnownAttribute,
            3 => UpdateError::MissingWellKnownAttribute,
            4 => UpdateError::AttributeFlagsError,
            5 => UpdateError::AttributeLengthError,
            6 => UpdateError::InvalidOriginAttribute,
            8 => UpdateError::InvalidNexthopAttribute,
            9 => UpdateError::OptionalAttributeError,
            10 => UpdateError::InvalidNetworkField,
            11 => UpdateError::MalformedAsPath,
            _ => return Err(serde::de::Error::custom("bad update sub-code")),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionGr {
    pub peer_id: u32,
    pub afi_safi: AfiSafi,
}

/// A handle the effect runner uses to push RDE-bound events without
/// knowing about the framing layer underneath; `bridge::run` owns the
/// actual socket and drains the other end of this channel.
#[derive(Clone)]
pub struct RdeClient {
    tx: UnboundedSender<RdeOutbound>,
}

#[derive(Debug)]
pub enum RdeOutbound {
    SessionUp(SessionUp),
    SessionDown(SessionDown),
    Update { peer_id: u32, body: bytes::Bytes },
    UpdateErr(UpdateErr),
    SessionGr { tag: u8, msg: SessionGr },
}

impl RdeClient {
    pub fn new(tx: UnboundedSender<RdeOutbound>) -> Self {
        RdeClient { tx }
    }
}

impl crate::fsm::EffectSink for RdeClient {
    fn forward_update(&mut self, peer_id: u32, update: crate::codec::UpdatePacket) {
        let body = update.encode().freeze();
        let _ = self.tx.send(RdeOutbound::Update { peer_id, body });
    }

    fn session_up(&mut self, peer_id: u32, negotiated: &BgpCap) {
        let _ = self.tx.send(RdeOutbound::SessionUp(SessionUp {
            peer_id,
            negotiated: BgpCapWire::from(negotiated),
            local_addr: IpAddr::from([0, 0, 0, 0]),
            remote_addr: IpAddr::from([0, 0, 0, 0]),
        }));
    }

    fn session_down(&mut self, peer_id: u32) {
        let _ = self.tx.send(RdeOutbound::SessionDown(SessionDown { peer_id }));
    }
}
