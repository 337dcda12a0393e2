use std::fmt;

use crate::codec::caps::emit::CapEmit;
use crate::codec::caps::typ::CapCode;

/// Route Refresh capability, RFC 2918: code 2, empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapRefresh;

impl CapEmit for CapRefresh {
    fn code(&self) -> CapCode {
        CapCode::RouteRefresh
    }
}

impl fmt::Display for CapRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteRefresh")
    }
}

/// Enhanced Route Refresh capability, RFC 7313: code 70, empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapEnhancedRefresh;

impl CapEmit for CapEnhancedRefresh {
    fn code(&self) -> CapCode {
        CapCode::EnhancedRouteRefresh
    }
}

impl fmt::Display for CapEnhancedRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnhancedRouteRefresh")
    }
}
