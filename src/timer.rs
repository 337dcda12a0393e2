//! Per-peer fixed 8-slot timer set (spec §3/§4.6/Design Note §9): "a
//! per-peer small fixed-size array of 8 optional deadlines suffices; no
//! need for a general heap." Firing mechanics (the actual task that sleeps
//! and wakes the engine) are grounded on the teacher's `Timer` in
//! `examples/zebra-rs-zebra-rs/zebra/src/bgp/task.rs`; the 8 named slots
//! replace its ad hoc per-purpose timer fields.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerKind {
    Hold,
    SendHold,
    Keepalive,
    ConnectRetry,
    IdleHold,
    IdleHoldReset,
    CarpUndemote,
    RestartTimeout,
}

impl TimerKind {
    pub const ALL: [TimerKind; 8] = [
        TimerKind::Hold,
        TimerKind::SendHold,
        TimerKind::Keepalive,
        TimerKind::ConnectRetry,
        TimerKind::IdleHold,
        TimerKind::IdleHoldReset,
        TimerKind::CarpUndemote,
        TimerKind::RestartTimeout,
    ];

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Fixed-size per-peer set of named deadlines. `Absent` (`None`) means
/// disarmed, matching the data model's "Absent key = disarmed".
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerSet {
    deadlines: [Option<Instant>; 8],
}

impl TimerSet {
    pub fn new() -> Self {
        TimerSet::default()
    }

    pub fn set(&mut self, kind: TimerKind, now: Instant, seconds_from_now: u64) {
        self.deadlines[kind.index()] = Some(now + Duration::from_secs(seconds_from_now));
    }

    pub fn stop(&mut self, kind: TimerKind) {
        self.deadlines[kind.index()] = None;
    }

    pub fn stop_all_except(&mut self, keep: &[TimerKind]) {
        for kind in TimerKind::ALL {
            if !keep.contains(&kind) {
                self.stop(kind);
            }
        }
    }

    pub fn running(&self, kind: TimerKind) -> bool {
        self.deadlines[kind.index()].is_some()
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.deadlines[kind.index()]
    }

    /// Returns the earliest-armed timer whose deadline is `<= now`,
    /// disarming it so expiry is delivered exactly once, per spec §4.6.
    pub fn next_due(&mut self, now: Instant) -> Option<TimerKind> {
        let due = TimerKind::ALL
            .into_iter()
            .filter_map(|k| self.deadlines[k.index()].map(|d| (k, d)))
            .filter(|(_, d)| *d <= now)
            .min_by_key(|(_, d)| *d);
        if let Some((kind, _)) = due {
            self.stop(kind);
            Some(kind)
        } else {
            None
        }
    }

    /// The minimum deadline across all armed timers, used by the I/O loop
    /// to size its poll timeout (spec §4.6, capped at 240s by the caller).
    pub fn earliest(&self) -> Option<Instant> {
        self.deadlines.iter().filter_map(|d| *d).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_expire_delivers_once() {
        let mut t = TimerSet::new();
        let now = Instant::now();
        t.set(TimerKind::Hold, now, 0);
        let later = now + Duration::from_millis(1);
        assert_eq!(t.next_due(later), Some(TimerKind::Hold));
        assert_eq!(t.next_due(later), None);
    }

    #[test]
    fn stop_all_except_preserves_idle_hold() {
        let mut t = TimerSet::new();
        let now = Instant::now();
        t.set(TimerKind::Hold, now, 10);
        t.set(TimerKind::IdleHold, now, 5);
        t.stop_all_except(&[TimerKind::IdleHold]);
        assert!(!t.running(TimerKind::Hold));
        assert!(t.running(TimerKind::IdleHold));
    }
}
