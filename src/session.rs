//! The typing session state machine.
//!
//! A [`Session`] is created `Idle` for one passage, moves to `Running` on the
//! first accepted input and to `Finished` on completion, timeout or
//! inactivity. It is never restarted: the next attempt gets a new `Session`.
//!
//! All transitions happen inside three entry points, [`Session::handle_input`],
//! [`Session::on_tick`] and [`Session::on_inactivity`], and each returns the
//! [`SessionEvent`]s it produced. Timers are plain deadlines in the session's
//! own [`Scheduler`]; the event loop asks for [`Session::next_deadline`] and
//! calls [`Session::poll`] once it has passed.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Category, Size};
use crate::config::SessionConfig;
use crate::diff::{classify, CharResult, Classification};
use crate::passage::Passage;
use crate::scoring;
use crate::timing::{self, Scheduler, TimerKind, INACTIVITY_LIMIT, TICK_RATE_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[strum(serialize = "completed")]
    Completed,
    #[strum(serialize = "time up")]
    TimedOut,
    #[strum(serialize = "inactive")]
    Inactive,
}

/// Final score of a session, produced exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: f64,
    pub elapsed_secs: u64,
    pub category: Category,
    pub size: Size,
    pub timestamp: DateTime<Local>,
    pub reason: FinishReason,
}

/// Everything a presenter needs to draw a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: SessionState,
    pub results: Vec<CharResult>,
    pub cursor: usize,
    pub correct: usize,
    pub total_typed: usize,
    pub wpm: u32,
    pub accuracy: f64,
    pub remaining_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Progress(Snapshot),
    Finished(SessionResult),
}

/// Receives session state changes, e.g. to redraw.
pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    passage: Passage,
    state: SessionState,
    started_at: Option<Instant>,
    classification: Classification,
    scheduler: Scheduler,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(passage: Passage, config: SessionConfig) -> Self {
        Self {
            classification: Classification::empty(&passage),
            config,
            passage,
            state: SessionState::Idle,
            started_at: None,
            scheduler: Scheduler::new(),
            result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn typed_len(&self) -> usize {
        self.classification.total_typed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn has_armed_timers(&self) -> bool {
        self.scheduler.has_armed()
    }

    /// Drop every armed timer. Called before the session is replaced.
    pub fn cancel_timers(&mut self) {
        self.scheduler.cancel_all();
    }

    fn start(&mut self, now: Instant) {
        self.state = SessionState::Running;
        self.started_at = Some(now);
        let period = Duration::from_millis(TICK_RATE_MS);
        self.scheduler.arm(TimerKind::Tick, now + period, Some(period));
        self.scheduler
            .arm(TimerKind::Watchdog, now + INACTIVITY_LIMIT, None);
        info!(
            category = %self.config.category(),
            size = %self.config.size(),
            duration_secs = self.config.duration_secs(),
            passage_len = self.passage.len(),
            "session started"
        );
    }

    /// Feed the full current input buffer.
    ///
    /// Starts the session on the first call, re-diffs the whole buffer and
    /// re-arms the inactivity watchdog. Input after the session finished, or
    /// for an empty passage, is ignored and produces no events. Input arriving
    /// once the duration is used up finishes the session as timed out.
    pub fn handle_input(&mut self, typed: &str, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.state {
            SessionState::Finished => {
                debug!("ignoring input after session finished");
                return events;
            }
            SessionState::Idle if self.passage.is_empty() => {
                debug!("ignoring input for an empty passage");
                return events;
            }
            SessionState::Idle => {
                self.start(now);
                events.push(SessionEvent::Started);
            }
            SessionState::Running => {
                if self.time_is_up(now) {
                    events.push(SessionEvent::Finished(
                        self.finish(now, FinishReason::TimedOut),
                    ));
                    return events;
                }
            }
        }

        self.classification = classify(&self.passage, typed);
        self.scheduler
            .arm(TimerKind::Watchdog, now + INACTIVITY_LIMIT, None);

        events.push(SessionEvent::Progress(self.snapshot(now)));
        if self.classification.is_complete() {
            events.push(SessionEvent::Finished(
                self.finish(now, FinishReason::Completed),
            ));
        }
        events
    }

    fn time_is_up(&self, now: Instant) -> bool {
        self.started_at.is_some_and(|started_at| {
            let elapsed = timing::elapsed_secs(started_at, now);
            timing::remaining_secs(self.config.duration_secs(), elapsed) <= 0
        })
    }

    /// Periodic refresh; finishes the session once the configured duration
    /// has elapsed.
    pub fn on_tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        if self.time_is_up(now) {
            return vec![SessionEvent::Finished(
                self.finish(now, FinishReason::TimedOut),
            )];
        }
        vec![SessionEvent::Progress(self.snapshot(now))]
    }

    /// The watchdog fired: no input for [`INACTIVITY_LIMIT`].
    pub fn on_inactivity(&mut self, now: Instant) -> Vec<SessionEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        vec![SessionEvent::Finished(
            self.finish(now, FinishReason::Inactive),
        )]
    }

    /// Fire every timer due at `now`, earliest first. The watchdog is
    /// evaluated at its own deadline so a late loop does not inflate the
    /// elapsed time.
    pub fn poll(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now) {
            match task.kind {
                TimerKind::Tick => events.extend(self.on_tick(now)),
                TimerKind::Watchdog => events.extend(self.on_inactivity(task.deadline)),
            }
            if self.is_finished() {
                break;
            }
        }
        events
    }

    fn finish(&mut self, now: Instant, reason: FinishReason) -> SessionResult {
        self.scheduler.cancel_all();
        self.state = SessionState::Finished;

        let started_at = self.started_at.unwrap_or(now);
        let final_elapsed =
            timing::elapsed_secs(started_at, now).min(self.config.duration_secs());
        let (correct, total) = self.classification.prefix_counts();

        let result = SessionResult {
            wpm: scoring::wpm(correct, final_elapsed as f64),
            accuracy: scoring::accuracy(correct, total),
            elapsed_secs: final_elapsed,
            category: self.config.category(),
            size: self.config.size(),
            timestamp: Local::now(),
            reason,
        };
        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            elapsed_secs = result.elapsed_secs,
            %reason,
            "session finished"
        );
        self.result = Some(result.clone());
        result
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let duration = self.config.duration_secs();
        match (self.state, self.started_at, &self.result) {
            (SessionState::Finished, _, Some(result)) => {
                duration.saturating_sub(result.elapsed_secs)
            }
            (_, Some(started_at), _) => {
                timing::remaining_secs(duration, timing::elapsed_secs(started_at, now)).max(0)
                    as u64
            }
            _ => duration,
        }
    }

    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let c = &self.classification;
        let (wpm, accuracy) = match (&self.result, self.started_at) {
            (Some(result), _) => (result.wpm, result.accuracy),
            (None, Some(started_at)) => (
                timing::live_wpm(c.correct, started_at, now),
                scoring::accuracy(c.correct, c.total_typed),
            ),
            (None, None) => (0, scoring::accuracy(0, 0)),
        };

        Snapshot {
            state: self.state,
            results: c.results.clone(),
            cursor: c.cursor,
            correct: c.correct,
            total_typed: c.total_typed,
            wpm,
            accuracy,
            remaining_secs: self.remaining_secs(now),
        }
    }
}
