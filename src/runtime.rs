use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum KeypaceEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait KeypaceEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<KeypaceEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<KeypaceEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => KeypaceEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => KeypaceEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeypaceEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KeypaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<KeypaceEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<KeypaceEvent>) -> Self {
        Self { rx }
    }
}

impl KeypaceEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KeypaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: KeypaceEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: KeypaceEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval, and no later than `deadline`, for the
    /// next event. Returns Tick on timeout, so a session timer is never
    /// serviced late by more than the wakeup latency.
    pub fn step_until(&self, deadline: Option<Instant>) -> KeypaceEvent {
        let interval = self.ticker.interval();
        let timeout = deadline
            .map(|d| d.saturating_duration_since(Instant::now()).min(interval))
            .unwrap_or(interval);
        self.wait(timeout)
    }

    fn wait(&self, timeout: Duration) -> KeypaceEvent {
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                KeypaceEvent::Tick
            }
        }
    }
}
