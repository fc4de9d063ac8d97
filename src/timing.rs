//! Wall-clock timing for sessions.
//!
//! Elapsed and remaining time are always derived from the recorded start
//! instant, never accumulated per tick, so a late or coalesced tick cannot
//! drift the countdown. The tick period only controls how often the display
//! is refreshed.

use std::time::{Duration, Instant};

use crate::scoring::CHARS_PER_WORD;

/// Refresh period of the running session, finer than one second so the
/// countdown stays smooth.
pub const TICK_RATE_MS: u64 = 100;

/// A running session finishes after this long without input.
pub const INACTIVITY_LIMIT: Duration = Duration::from_secs(10);

/// Whole seconds between `start` and `now`, floored.
pub fn elapsed_secs(start: Instant, now: Instant) -> u64 {
    now.saturating_duration_since(start).as_secs()
}

/// Seconds left on the clock. Negative or zero means the time is up.
pub fn remaining_secs(duration_secs: u64, elapsed_secs: u64) -> i64 {
    duration_secs as i64 - elapsed_secs as i64
}

/// Live words per minute using sub-second elapsed time.
pub fn live_wpm(correct_chars: usize, start: Instant, now: Instant) -> u32 {
    let millis = now.saturating_duration_since(start).as_secs_f64() * 1000.0;
    if millis <= 0.0 {
        return 0;
    }
    ((correct_chars as f64 / CHARS_PER_WORD) / (millis / 60_000.0)).round() as u32
}

/// `"{s}s"` under a minute, `"{m}:{ss}"` otherwise.
pub fn format_time(secs: u64) -> String {
    if secs < 60 {
        return format!("{secs}s");
    }
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Tick,
    Watchdog,
}

/// Identifier of an armed task. Ids are never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub kind: TimerKind,
    pub deadline: Instant,
    /// Repeating tasks re-arm themselves one period after firing.
    pub period: Option<Duration>,
}

/// Owns the two timer slots of a session.
///
/// Arming a slot replaces whatever was armed there before, and cancelling
/// drops it. A fired periodic task is re-armed one period after its own
/// deadline, or one period after `now` if the loop fell further behind.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    tick: Option<ScheduledTask>,
    watchdog: Option<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<ScheduledTask> {
        match kind {
            TimerKind::Tick => &mut self.tick,
            TimerKind::Watchdog => &mut self.watchdog,
        }
    }

    pub fn arm(
        &mut self,
        kind: TimerKind,
        deadline: Instant,
        period: Option<Duration>,
    ) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        *self.slot_mut(kind) = Some(ScheduledTask {
            id,
            kind,
            deadline,
            period,
        });
        id
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        *self.slot_mut(kind) = None;
    }

    pub fn cancel_all(&mut self) {
        self.tick = None;
        self.watchdog = None;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Tick => self.tick.is_some(),
            TimerKind::Watchdog => self.watchdog.is_some(),
        }
    }

    pub fn has_armed(&self) -> bool {
        self.tick.is_some() || self.watchdog.is_some()
    }

    pub fn task(&self, kind: TimerKind) -> Option<&ScheduledTask> {
        match kind {
            TimerKind::Tick => self.tick.as_ref(),
            TimerKind::Watchdog => self.watchdog.as_ref(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.tick, self.watchdog]
            .iter()
            .flatten()
            .map(|t| t.deadline)
            .min()
    }

    /// Remove and return the earliest task due at `now`. Periodic tasks are
    /// re-armed under a fresh id before being returned.
    pub fn pop_due(&mut self, now: Instant) -> Option<ScheduledTask> {
        let due = [self.tick, self.watchdog]
            .into_iter()
            .flatten()
            .filter(|t| t.deadline <= now)
            .min_by_key(|t| (t.deadline, t.id))?;

        self.cancel(due.kind);
        if let Some(period) = due.period {
            let mut next = due.deadline + period;
            if next <= now {
                next = now + period;
            }
            self.arm(due.kind, next, Some(period));
        }
        Some(due)
    }
}
