pub mod addpath;
pub mod as4;
pub mod bgp_cap;
pub mod emit;
pub mod graceful;
pub mod mp;
pub mod negotiate;
pub mod refresh;
pub mod role;
pub mod typ;

pub use bgp_cap::BgpCap;
pub use emit::CapEmit;
pub use negotiate::{capa_neg_calc, GrAction, NegotiationResult, RolePolicy};
pub use typ::CapCode;
