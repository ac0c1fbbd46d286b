use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::models::TimedSlot;
use crate::utils::format::format_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPrayer {
    pub slot: TimedSlot,
    /// Every slot of the day has passed and `slot` is the first entry of
    /// today's list standing in for tomorrow's. Callers that need the real
    /// time should look up tomorrow's table.
    pub rolled_over: bool,
}

/// First slot whose `HH:MM` is strictly later than `now`'s. Past the last
/// slot, falls back to the first one flagged as `rolled_over`.
pub fn resolve_next(slots: &[TimedSlot], now: NaiveTime) -> Option<NextPrayer> {
    let now_hhmm = format_time(now);
    // zero-padded 24h strings order the same way as the times
    if let Some(slot) = slots.iter().find(|s| format_time(s.time) > now_hhmm) {
        return Some(NextPrayer { slot: *slot, rolled_over: false });
    }
    slots.first().map(|slot| NextPrayer { slot: *slot, rolled_over: true })
}

/// Next wall-clock instant at which `target` occurs, today or tomorrow.
pub fn next_occurrence(target: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(target);
    if today <= now {
        today + Duration::days(1)
    } else {
        today
    }
}

/// Time left until `target`; a target at or before `now` means tomorrow.
pub fn countdown(target: NaiveTime, now: NaiveDateTime) -> Duration {
    next_occurrence(target, now) - now
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Waiting,
    Fired,
}

/// One-shot "prayer time reached" detector for a ticking countdown.
/// Fires at most once per target; only a new target re-arms it.
#[derive(Debug, Clone)]
pub struct CountdownTrigger {
    target: Option<NaiveTime>,
    fire_at: Option<NaiveDateTime>,
    state: TriggerState,
}

impl Default for CountdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTrigger {
    pub fn new() -> Self {
        Self {
            target: None,
            fire_at: None,
            state: TriggerState::Waiting,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn target(&self) -> Option<NaiveTime> {
        self.target
    }

    /// Point the trigger at `target`. Returns true if that changed anything;
    /// the same target leaves a fired trigger fired.
    pub fn retarget(&mut self, target: NaiveTime, now: NaiveDateTime) -> bool {
        if self.target == Some(target) {
            return false;
        }
        self.target = Some(target);
        self.fire_at = Some(next_occurrence(target, now));
        self.state = TriggerState::Waiting;
        true
    }

    /// Advance the clock. Returns true exactly once, when the target is reached.
    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        match (self.state, self.fire_at) {
            (TriggerState::Waiting, Some(at)) if now >= at => {
                self.state = TriggerState::Fired;
                true
            }
            _ => false,
        }
    }
}
