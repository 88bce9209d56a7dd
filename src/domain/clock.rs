//! Per-action cooldown clock.
//!
//! Each action kind carries its own last-invoked timestamp. Executors stamp
//! the clock immediately before their suspending network call and once more
//! after completion, so an overlapping tick cannot re-fire the same action
//! kind while a prior call is still in flight, however long it takes.

use std::time::{Duration, Instant};

/// The four mutually exclusive corrective actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Swap,
    Settle,
    Cancel,
    Place,
}

impl ActionKind {
    pub const ALL: [Self; 4] = [Self::Swap, Self::Settle, Self::Cancel, Self::Place];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Settle => "settle",
            Self::Cancel => "cancel",
            Self::Place => "place",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Swap => 0,
            Self::Settle => 1,
            Self::Cancel => 2,
            Self::Place => 3,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default minimum interval between invocations of the same action kind.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Monotonic last-invocation timestamps per action kind.
#[derive(Debug, Clone)]
pub struct ActionClock {
    cooldown: Duration,
    stamps: [Option<Instant>; 4],
}

impl ActionClock {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            stamps: [None; 4],
        }
    }

    /// True when `kind` has never fired or its cooldown window has elapsed.
    pub fn ready(&self, kind: ActionKind) -> bool {
        self.ready_at(kind, Instant::now())
    }

    /// Record an invocation of `kind` at the current instant.
    pub fn stamp(&mut self, kind: ActionKind) {
        self.stamp_at(kind, Instant::now());
    }

    pub fn ready_at(&self, kind: ActionKind, now: Instant) -> bool {
        match self.stamps[kind.index()] {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        }
    }

    /// Timestamps never move backwards, even if callers race.
    pub fn stamp_at(&mut self, kind: ActionKind, now: Instant) {
        let slot = &mut self.stamps[kind.index()];
        match slot {
            Some(last) if *last >= now => {}
            _ => *slot = Some(now),
        }
    }
}

impl Default for ActionClock {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_clock_is_ready_for_every_kind() {
        let clock = ActionClock::default();
        for kind in ActionKind::ALL {
            assert!(clock.ready(kind));
        }
    }

    #[test]
    fn test_stamp_blocks_within_window_and_releases_after() {
        let mut clock = ActionClock::new(Duration::from_secs(10));
        let t0 = Instant::now();
        clock.stamp_at(ActionKind::Place, t0);

        assert!(!clock.ready_at(ActionKind::Place, t0 + Duration::from_secs(5)));
        assert!(clock.ready_at(ActionKind::Place, t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut clock = ActionClock::new(Duration::from_secs(10));
        let t0 = Instant::now();
        clock.stamp_at(ActionKind::Swap, t0);

        assert!(!clock.ready_at(ActionKind::Swap, t0));
        assert!(clock.ready_at(ActionKind::Settle, t0));
        assert!(clock.ready_at(ActionKind::Cancel, t0));
    }

    #[test]
    fn test_stamps_are_monotonic() {
        let mut clock = ActionClock::new(Duration::from_secs(10));
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(3);
        clock.stamp_at(ActionKind::Cancel, t1);
        // A stale stamp must not rewind the clock.
        clock.stamp_at(ActionKind::Cancel, t0);
        assert!(!clock.ready_at(ActionKind::Cancel, t1 + Duration::from_secs(9)));
        assert!(clock.ready_at(ActionKind::Cancel, t1 + Duration::from_secs(10)));
    }
}
