//! Per-AFI/SAFI graceful-restart bookkeeping, RFC 4724 (spec §3, §4.7). No
//! module in the retrieval pack implements this state machine directly —
//! only the wire shape of the capability
//! (`codec::caps::graceful::RestartValue`) exists as precedent — so this is
//! authored from the spec text, reusing that wire shape where it already
//! fits (the `Present`/`Forward` flags mirror the capability's own
//! `RestartFlags`).

use crate::codec::afi::{AfiSafi, AfiSafis};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AfiGrState {
    /// The peer advertised this AFI/SAFI in its Graceful-Restart capability.
    pub present: bool,
    /// The peer's per-AFI Forwarding-State (P) bit: it can preserve
    /// forwarding state across a restart for this AFI.
    pub forward: bool,
    /// The peer itself previously requested restart (R bit) — informational
    /// only, not used to drive local bookkeeping.
    pub restart: bool,
    /// This engine currently considers the AFI to be in a restart window
    /// (STALE emitted, RestartTimeout armed, RDE has not yet signalled
    /// RESTARTED).
    pub restarting: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GracefulRestart {
    pub per_afi: AfiSafis<AfiGrState>,
    /// Peer-advertised restart timeout (seconds), used to arm
    /// `TimerKind::RestartTimeout` on entry.
    pub peer_timeout: u16,
}

/// What the FSM must tell the RDE for one AFI when a peer connection is
/// lost, per spec §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartAction {
    Stale,
    NoGrace,
}

impl GracefulRestart {
    pub fn new() -> Self {
        GracefulRestart::default()
    }

    /// Computes, for each AFI the session had negotiated MP for, whether to
    /// mark it Restarting (emit STALE) or flush immediately (emit NOGRACE),
    /// and applies the `restarting` flag as a side effect. `negotiated_mp`
    /// is every AFI/SAFI the session had negotiated before the drop.
    pub fn on_connection_lost(&mut self, negotiated_mp: &[AfiSafi]) -> Vec<(AfiSafi, RestartAction)> {
        let mut actions = Vec::new();
        for key in negotiated_mp {
            let present = self.per_afi.get(key).map(|s| s.present).unwrap_or(false);
            if present {
                if let Some(state) = self.per_afi.get_mut(key) {
                    state.restarting = true;
                }
                actions.push((*key, RestartAction::Stale));
            } else {
                actions.push((*key, RestartAction::NoGrace));
            }
        }
        actions
    }

    pub fn any_restarting(&self) -> bool {
        self.per_afi.iter().any(|(_, s)| s.restarting)
    }

    pub fn restarting_afis(&self) -> Vec<AfiSafi> {
        self.per_afi
            .iter()
            .filter(|(_, s)| s.restarting)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Called when the RDE signals SESSION_RESTARTED for an AFI: clears the
    /// Restarting mark.
    pub fn on_restarted(&mut self, afi: &AfiSafi) {
        if let Some(state) = self.per_afi.get_mut(afi) {
            state.restarting = false;
        }
    }

    /// Called when RestartTimeout fires before SESSION_RESTARTED arrived:
    /// flush whatever AFIs are still Restarting.
    pub fn on_timeout(&mut self) -> Vec<AfiSafi> {
        let still_restarting = self.restarting_afis();
        for key in &still_restarting {
            if let Some(state) = self.per_afi.get_mut(key) {
                state.restarting = false;
            }
        }
        still_restarting
    }

    /// Per spec §4.7: "set the Restart-Indication bit iff no AFI is
    /// currently Restarting".
    pub fn outbound_restart_indication(&self) -> bool {
        !self.any_restarting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::afi::{Afi, Safi};

    #[test]
    fn present_afi_goes_stale_and_restarting() {
        let mut gr = GracefulRestart::new();
        gr.per_afi.insert(
            AfiSafi::IPV4_UNICAST,
            AfiGrState {
                present: true,
                forward: true,
                restart: false,
                restarting: false,
            },
        );
        let actions = gr.on_connection_lost(&[AfiSafi::IPV4_UNICAST]);
        assert_eq!(actions, vec![(AfiSafi::IPV4_UNICAST, RestartAction::Stale)]);
        assert!(gr.any_restarting());
    }

    #[test]
    fn absent_afi_goes_nograce() {
        let mut gr = GracefulRestart::new();
        let key = AfiSafi::new(Afi::Ip6, Safi::Unicast);
        let actions = gr.on_connection_lost(&[key]);
        assert_eq!(actions, vec![(key, RestartAction::NoGrace)]);
        assert!(!gr.any_restarting());
    }

    #[test]
    fn timeout_flushes_remaining() {
        let mut gr = GracefulRestart::new();
        gr.per_afi.insert(
            AfiSafi::IPV4_UNICAST,
            AfiGrState {
                present: true,
                forward: true,
                restart: false,
                restarting: true,
            },
        );
        let flushed = gr.on_timeout();
        assert_eq!(flushed, vec![AfiSafi::IPV4_UNICAST]);
        assert!(!gr.any_restarting());
    }

    #[test]
    fn restart_indication_clear_when_nothing_restarting() {
        let gr = GracefulRestart::new();
        assert!(gr.outbound_restart_indication());
    }
}
