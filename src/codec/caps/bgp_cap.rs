use bytes::BytesMut;
use std::fmt;

use crate::codec::afi::{Afi, AfiSafi, AfiSafis, Safi};
use crate::codec::caps::addpath::CapAddPath;
use crate::codec::caps::as4::CapAs4;
use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::graceful::{CapRestart, RestartValue};
use crate::codec::caps::mp::CapMultiProtocol;
use crate::codec::caps::refresh::{CapEnhancedRefresh, CapRefresh};
use crate::codec::caps::role::CapRole;
use crate::codec::caps::typ::CapCode;

/// The aggregate capability set announced by, or received from, one side of
/// a session. Unlike a flat TLV list this collapses repeated MP/Restart/
/// Add-Path entries into per-AFI maps, which is what every later stage
/// (negotiation, the outbound OPEN encoder) actually wants to index by.
#[derive(Debug, Clone, Default)]
pub struct BgpCap {
    pub mp: AfiSafis<CapMultiProtocol>,
    pub refresh: bool,
    pub enhanced_refresh: bool,
    pub as4: Option<CapAs4>,
    pub role: Option<CapRole>,
    pub restart: AfiSafis<RestartValue>,
    pub restart_state: bool,
    pub restart_time: u16,
    pub addpath: AfiSafis<u8>,
}

impl BgpCap {
    pub fn new() -> Self {
        BgpCap::default()
    }

    /// Parses a flat sequence of decoded capability TLVs (as produced while
    /// walking the OPEN optional-parameters block) into the aggregate form.
    pub fn from_tlvs(tlvs: Vec<DecodedCap>) -> Self {
        let mut cap = BgpCap::new();
        for tlv in tlvs {
            match tlv {
                DecodedCap::MultiProtocol(mp) => {
                    cap.mp.insert(AfiSafi::new(mp.afi, mp.safi), mp);
                }
                DecodedCap::Refresh => cap.refresh = true,
                DecodedCap::EnhancedRefresh => cap.enhanced_refresh = true,
                DecodedCap::As4(a) => cap.as4 = Some(a),
                DecodedCap::Role(r) => cap.role = Some(r),
                DecodedCap::Restart(r) => {
                    cap.restart_state = r.restart_state;
                    cap.restart_time = r.restart_time;
                    for v in r.values {
                        cap.restart.insert(AfiSafi::new(v.afi, v.safi), v);
                    }
                }
                DecodedCap::AddPath(a) => {
                    for v in a.values {
                        cap.addpath
                            .insert(AfiSafi::new(v.afi, v.safi), v.send_receive.into());
                    }
                }
                DecodedCap::Unknown { .. } => {}
            }
        }
        cap
    }

    pub fn emit(&self, buf: &mut BytesMut) {
        for (_, mp) in self.mp.iter() {
            mp.emit(buf, false);
        }
        if self.refresh {
            CapRefresh.emit(buf, false);
        }
        if self.enhanced_refresh {
            CapEnhancedRefresh.emit(buf, false);
        }
        if let Some(as4) = &self.as4 {
            as4.emit(buf, false);
        }
        if let Some(role) = &self.role {
            role.emit(buf, false);
        }
        if !self.restart.is_empty() || self.restart_state {
            let restart = CapRestart {
                restart_time: self.restart_time,
                restart_state: self.restart_state,
                values: self.restart.iter().map(|(_, v)| *v).collect(),
            };
            restart.emit(buf, false);
        }
        if !self.addpath.is_empty() {
            let values: Vec<_> = self
                .addpath
                .iter()
                .map(|(k, sr)| crate::codec::caps::addpath::AddPathValue {
                    afi: k.afi,
                    safi: k.safi,
                    send_receive: (*sr).into(),
                })
                .collect();
            let addpath = CapAddPath { values };
            addpath.emit(buf, false);
        }
    }

    /// True if the peer indicated no MP capability at all (legacy IPv4
    /// unicast-only peer) per spec §4.2: "if peer advertised no MP, default
    /// negotiated to {IPv4 unicast}".
    pub fn has_no_mp(&self) -> bool {
        self.mp.is_empty()
    }
}

impl fmt::Display for BgpCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BgpCap(mp={}, refresh={}, as4={}, role={:?})",
            self.mp.len(),
            self.refresh,
            self.as4.is_some(),
            self.role
        )
    }
}

/// One decoded capability TLV, produced by walking the OPEN opt-params.
#[derive(Debug, Clone)]
pub enum DecodedCap {
    MultiProtocol(CapMultiProtocol),
    Refresh,
    EnhancedRefresh,
    As4(CapAs4),
    Role(CapRole),
    Restart(CapRestart),
    AddPath(CapAddPath),
    Unknown { code: u8, data: Vec<u8> },
}

/// Parses one capability TLV (code + length + value) starting at `input`,
/// returning the decoded capability and the number of bytes consumed.
/// Capabilities with a malformed value for their code are reported as
/// `Unknown` rather than aborting the whole walk — spec §4.2: "bad length
/// per capability are individually ignored or reject as specified by each
/// capability".
pub fn parse_one(input: &[u8]) -> Option<(DecodedCap, usize)> {
    if input.len() < 2 {
        return None;
    }
    let code = input[0];
    let len = input[1] as usize;
    if input.len() < 2 + len {
        return None;
    }
    let value = &input[2..2 + len];
    let consumed = 2 + len;
    let decoded = match CapCode::from(code) {
        CapCode::MultiProtocol => CapMultiProtocol::parse(value)
            .map(DecodedCap::MultiProtocol)
            .unwrap_or(DecodedCap::Unknown {
                code,
                data: value.to_vec(),
            }),
        CapCode::RouteRefresh => DecodedCap::Refresh,
        CapCode::EnhancedRouteRefresh => DecodedCap::EnhancedRefresh,
        CapCode::As4 => CapAs4::parse(value)
            .map(DecodedCap::As4)
            .unwrap_or(DecodedCap::Unknown {
                code,
                data: value.to_vec(),
            }),
        CapCode::Role => CapRole::parse(value)
            .map(DecodedCap::Role)
            .unwrap_or(DecodedCap::Unknown {
                code,
                data: value.to_vec(),
            }),
        CapCode::GracefulRestart => CapRestart::parse(value)
            .map(DecodedCap::Restart)
            .unwrap_or(DecodedCap::Unknown {
                code,
                data: value.to_vec(),
            }),
        CapCode::AddPath => CapAddPath::parse(value)
            .map(DecodedCap::AddPath)
            .unwrap_or(DecodedCap::Unknown {
                code,
                data: value.to_vec(),
            }),
        _ => DecodedCap::Unknown {
            code,
            data: value.to_vec(),
        },
    };
    Some((decoded, consumed))
}

/// Default announced set: IPv4 unicast only, as the Peer data model's
/// default `PeerConfig` always includes it.
pub fn default_mp() -> AfiSafis<CapMultiProtocol> {
    let mut mp = AfiSafis::new();
    mp.insert(
        AfiSafi::IPV4_UNICAST,
        CapMultiProtocol::new(Afi::Ip, Safi::Unicast),
    );
    mp
}
