use std::fmt;

/// BGP Capability Code registry, RFC 5492 and successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CapCode {
    MultiProtocol,
    RouteRefresh,
    ExtendedNextHop,
    ExtendedMessage,
    Role,
    GracefulRestart,
    As4,
    DynamicCapability,
    AddPath,
    EnhancedRouteRefresh,
    Llgr,
    Fqdn,
    SoftwareVersion,
    PathLimit,
    Unknown(u8),
}

impl From<u8> for CapCode {
    fn from(v: u8) -> Self {
        match v {
            1 => CapCode::MultiProtocol,
            2 => CapCode::RouteRefresh,
            5 => CapCode::ExtendedNextHop,
            6 => CapCode::ExtendedMessage,
            9 => CapCode::Role,
            64 => CapCode::GracefulRestart,
            65 => CapCode::As4,
            67 => CapCode::DynamicCapability,
            69 => CapCode::AddPath,
            70 => CapCode::EnhancedRouteRefresh,
            71 => CapCode::Llgr,
            73 => CapCode::Fqdn,
            75 => CapCode::SoftwareVersion,
            76 => CapCode::PathLimit,
            v => CapCode::Unknown(v),
        }
    }
}

impl From<CapCode> for u8 {
    fn from(c: CapCode) -> u8 {
        match c {
            CapCode::MultiProtocol => 1,
            CapCode::RouteRefresh => 2,
            CapCode::ExtendedNextHop => 5,
            CapCode::ExtendedMessage => 6,
            CapCode::Role => 9,
            CapCode::GracefulRestart => 64,
            CapCode::As4 => 65,
            CapCode::DynamicCapability => 67,
            CapCode::AddPath => 69,
            CapCode::EnhancedRouteRefresh => 70,
            CapCode::Llgr => 71,
            CapCode::Fqdn => 73,
            CapCode::SoftwareVersion => 75,
            CapCode::PathLimit => 76,
            CapCode::Unknown(v) => v,
        }
    }
}

impl fmt::Display for CapCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
