//! Thin wrappers over `tracing` that keep `proto="bgp"` and the peer identity
//! on every session-engine log line, the same shape the wider BGP code in
//! this family uses for its own `bgp_info!`/`bgp_warn!` macros.

#[macro_export]
macro_rules! bgp_info {
    ($peer:expr, $($arg:tt)*) => {
        tracing::info!(proto = "bgp", peer = %$peer, $($arg)*)
    };
}

#[macro_export]
macro_rules! bgp_warn {
    ($peer:expr, $($arg:tt)*) => {
        tracing::warn!(proto = "bgp", peer = %$peer, $($arg)*)
    };
}

#[macro_export]
macro_rules! bgp_error {
    ($peer:expr, $($arg:tt)*) => {
        tracing::error!(proto = "bgp", peer = %$peer, $($arg)*)
    };
}

#[macro_export]
macro_rules! bgp_debug {
    ($peer:expr, $($arg:tt)*) => {
        tracing::debug!(proto = "bgp", peer = %$peer, $($arg)*)
    };
}
