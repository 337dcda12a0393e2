use bitfield_struct::bitfield;
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

use crate::codec::afi::{Afi, Safi};
use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// The 2-byte Restart-Flags/Restart-Time header of the Graceful Restart
/// capability, RFC 4724 §3: bit 0 = Restart State (R), bit 1 = Notification
/// (N, RFC 9072 erratum), then 2 reserved bits, then a 12-bit restart time
/// in seconds.
#[bitfield(u16)]
pub struct RestartFlagTime {
    #[bits(12)]
    pub restart_time: u16,
    #[bits(2)]
    __reserved: u16,
    pub n_flag: bool,
    pub r_flag: bool,
}

/// The 1-byte per-AFI Forwarding-State bit (bit 0) that follows each
/// AFI/SAFI entry.
#[bitfield(u8)]
pub struct RestartFlags {
    #[bits(7)]
    __reserved: u8,
    pub p_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartValue {
    pub flag_time: RestartFlagTime,
    pub afi: Afi,
    pub safi: Safi,
    pub flags: RestartFlags,
}

impl RestartValue {
    pub fn new(restart_time: u16, afi: Afi, safi: Safi) -> Self {
        RestartValue {
            flag_time: RestartFlagTime::new().with_restart_time(restart_time),
            afi,
            safi,
            flags: RestartFlags::new(),
        }
    }

    pub fn forwarding_preserved(&self) -> bool {
        self.flags.p_flag()
    }
}

/// Graceful Restart capability, RFC 4724: code 64, 2-byte header then
/// zero or more 4-byte AFI/SAFI entries each followed by a 1-byte flags
/// byte. Length 2 (EoR-only, no per-AFI entries) and length 2+6*n are the
/// only valid shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapRestart {
    pub restart_time: u16,
    pub restart_state: bool,
    pub values: Vec<RestartValue>,
}

impl CapRestart {
    pub fn parse(mut value: &[u8]) -> Option<Self> {
        if value.len() < 2 {
            return None;
        }
        if (value.len() - 2) % 6 != 0 {
            // spec §8 boundary: len=5 (2 + 3, not a multiple of 6) is rejected.
            return None;
        }
        let flag_time = RestartFlagTime::from_bits(value.get_u16());
        let mut values = Vec::new();
        while value.len() >= 6 {
            let afi = Afi::from(value.get_u16());
            let safi = Safi::from(value.get_u8());
            let flags = RestartFlags::from_bits(value.get_u8());
            values.push(RestartValue {
                flag_time,
                afi,
                safi,
                flags,
            });
        }
        Some(CapRestart {
            restart_time: flag_time.restart_time(),
            restart_state: flag_time.r_flag(),
            values,
        })
    }
}

impl CapEmit for CapRestart {
    fn code(&self) -> CapCode {
        CapCode::GracefulRestart
    }

    fn len(&self) -> u8 {
        (2 + self.values.len() * 6) as u8
    }

    fn emit_value(&self, buf: &mut BytesMut) {
        let header = RestartFlagTime::new()
            .with_restart_time(self.restart_time)
            .with_r_flag(self.restart_state);
        buf.put_u16(header.into_bits());
        for v in &self.values {
            buf.put_u16(v.afi.into());
            buf.put_u8(v.safi.into());
            buf.put_u8(v.flags.into_bits());
        }
    }
}

impl fmt::Display for CapRestart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GracefulRestart(time={}, R={}, {} afi/safi)",
            self.restart_time,
            self.restart_state,
            self.values.len()
        )
    }
}
