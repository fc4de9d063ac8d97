//! Controller tying a [`Session`] to its collaborators.
//!
//! `App` owns the current session, the input buffer and the settings, and is
//! the only place a session gets replaced. Passage text comes from a
//! [`PassageSource`], finished results go to a [`ResultSink`], and every
//! session event is forwarded to the registered [`SessionObserver`]s.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use tracing::debug;

use crate::catalog::{Category, PassageSource, Size};
use crate::config::{next_duration, SessionConfig};
use crate::error::ConfigError;
use crate::history::{trend, ResultSink, Trend, MAX_HISTORY};
use crate::passage::Passage;
use crate::session::{Session, SessionEvent, SessionObserver, SessionResult, Snapshot};

pub struct App {
    config: SessionConfig,
    session: Session,
    input: String,
    source: Box<dyn PassageSource>,
    sink: Box<dyn ResultSink>,
    observers: Vec<Box<dyn SessionObserver>>,
    recent: Vec<SessionResult>,
    notice: Option<String>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("input", &self.input)
            .field("recent", &self.recent.len())
            .finish()
    }
}

impl App {
    pub fn new(
        config: SessionConfig,
        source: Box<dyn PassageSource>,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        let session = Session::new(load_passage(source.as_ref(), &config), config);
        let recent = sink.recent();
        Self {
            config,
            session,
            input: String::new(),
            source,
            sink,
            observers: Vec::new(),
            recent,
            notice: None,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn recent(&self) -> &[SessionResult] {
        &self.recent
    }

    pub fn trend(&self) -> Trend {
        trend(&self.recent)
    }

    pub fn snapshot(&self, now: Instant) -> Snapshot {
        self.session.snapshot(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    /// Append a typed character. Returns false if the session does not
    /// accept input: it has finished, or there is no passage to type.
    pub fn type_char(&mut self, c: char, now: Instant) -> bool {
        if self.session.is_finished() || self.session.passage().is_empty() {
            return false;
        }
        self.input.push(c);
        self.feed(now);
        true
    }

    /// Remove the last typed character, if any.
    pub fn backspace(&mut self, now: Instant) -> bool {
        if self.session.is_finished() || self.input.pop().is_none() {
            return false;
        }
        self.feed(now);
        true
    }

    fn feed(&mut self, now: Instant) {
        self.notice = None;
        let events = self.session.handle_input(&self.input, now);
        self.dispatch(events);
    }

    /// Service any session timer due at `now`.
    pub fn poll(&mut self, now: Instant) {
        let events = self.session.poll(now);
        self.dispatch(events);
    }

    fn dispatch(&mut self, events: Vec<SessionEvent>) {
        for event in &events {
            if let SessionEvent::Finished(result) = event {
                self.sink.on_result(result);
                self.recent.push(result.clone());
                if self.recent.len() > MAX_HISTORY {
                    self.recent.drain(..self.recent.len() - MAX_HISTORY);
                }
            }
            for observer in self.observers.iter_mut() {
                observer.on_event(event);
            }
        }
    }

    /// Replace the session with a fresh one on a new passage. The old
    /// session's timers are cancelled first.
    pub fn new_session(&mut self) {
        self.session.cancel_timers();
        let passage = load_passage(self.source.as_ref(), &self.config);
        self.session = Session::new(passage, self.config);
        self.input.clear();
        debug!(passage_len = self.session.passage().len(), "new session loaded");
    }

    fn reconfigure(&mut self, config: SessionConfig) -> Result<(), ConfigError> {
        if self.session.is_running() {
            self.notice = Some(ConfigError::SessionRunning.to_string());
            return Err(ConfigError::SessionRunning);
        }
        self.config = config;
        self.notice = None;
        self.new_session();
        Ok(())
    }

    pub fn set_duration(&mut self, duration_secs: u64) -> Result<(), ConfigError> {
        let config = self.config.with_duration(duration_secs)?;
        self.reconfigure(config)
    }

    pub fn set_category(&mut self, category: Category) -> Result<(), ConfigError> {
        self.reconfigure(self.config.with_category(category))
    }

    pub fn set_size(&mut self, size: Size) -> Result<(), ConfigError> {
        self.reconfigure(self.config.with_size(size))
    }

    pub fn cycle_duration(&mut self) -> Result<(), ConfigError> {
        self.set_duration(next_duration(self.config.duration_secs()))
    }

    pub fn cycle_category(&mut self) -> Result<(), ConfigError> {
        self.set_category(self.config.category().next())
    }

    pub fn cycle_size(&mut self) -> Result<(), ConfigError> {
        self.set_size(self.config.size().next())
    }
}

fn load_passage(source: &dyn PassageSource, config: &SessionConfig) -> Passage {
    Passage::new(&source.get_passage(config.category(), config.size()))
}

/// Observer that raises a shared flag whenever the screen is stale.
#[derive(Debug, Clone, Default)]
pub struct RedrawRequest(Rc<Cell<bool>>);

impl RedrawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    /// Returns whether a redraw was requested and clears the flag.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

impl SessionObserver for RedrawRequest {
    fn on_event(&mut self, _event: &SessionEvent) {
        self.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixedPassage;
    use crate::session::{FinishReason, SessionState};
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<SessionResult>>>);

    impl ResultSink for Recorder {
        fn on_result(&mut self, result: &SessionResult) {
            self.0.borrow_mut().push(result.clone());
        }
    }

    #[derive(Clone, Default)]
    struct EventLog(Rc<RefCell<Vec<SessionEvent>>>);

    impl SessionObserver for EventLog {
        fn on_event(&mut self, event: &SessionEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    fn app(text: &str, duration: u64) -> (App, Recorder) {
        let recorder = Recorder::default();
        let config = SessionConfig::new(duration, Category::Plain, Size::Small).unwrap();
        let app = App::new(
            config,
            Box::new(FixedPassage(text.to_string())),
            Box::new(recorder.clone()),
        );
        (app, recorder)
    }

    fn type_str(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            app.type_char(c, now);
        }
    }

    #[test]
    fn test_typing_to_completion_emits_result() {
        let (mut app, recorder) = app("the cat", 30);
        let t0 = Instant::now();
        type_str(&mut app, "the ca", t0);
        app.type_char('t', t0 + Duration::from_secs(6));

        assert_eq!(app.session().state(), SessionState::Finished);
        let results = recorder.0.borrow();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].wpm, 14);
        assert_eq!(results[0].accuracy, 100.0);
        assert_eq!(app.recent().len(), 1);
    }

    #[test]
    fn test_input_after_finish_is_rejected() {
        let (mut app, _) = app("ab", 30);
        let t0 = Instant::now();
        type_str(&mut app, "ab", t0);
        assert!(!app.type_char('c', t0));
        assert!(!app.backspace(t0));
        assert_eq!(app.input(), "ab");
    }

    #[test]
    fn test_empty_passage_rejects_input() {
        let (mut app, recorder) = app("日本語", 30);
        assert!(app.session().passage().is_empty());

        assert!(!app.type_char('x', Instant::now()));
        assert_eq!(app.input(), "");
        assert_eq!(app.session().state(), SessionState::Idle);
        assert!(recorder.0.borrow().is_empty());
        assert!(app.recent().is_empty());
    }

    #[test]
    fn test_backspace_on_empty_does_not_start() {
        let (mut app, _) = app("ab", 30);
        assert!(!app.backspace(Instant::now()));
        assert_eq!(app.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_backspace_reclassifies() {
        let (mut app, _) = app("hello", 30);
        let t0 = Instant::now();
        type_str(&mut app, "hex", t0);
        assert_eq!(app.snapshot(t0).correct, 2);
        assert!(app.backspace(t0));
        assert_eq!(app.input(), "he");
        let snap = app.snapshot(t0);
        assert_eq!(snap.total_typed, 2);
        assert_eq!(snap.accuracy, 100.0);
    }

    #[test]
    fn test_observers_receive_events() {
        let (mut app, _) = app("ab", 30);
        let log = EventLog::default();
        app.add_observer(Box::new(log.clone()));
        let t0 = Instant::now();
        type_str(&mut app, "ab", t0);

        let events = log.0.borrow();
        assert_eq!(events[0], SessionEvent::Started);
        assert_matches!(events.last(), Some(SessionEvent::Finished(_)));
    }

    #[test]
    fn test_config_change_rejected_while_running() {
        let (mut app, _) = app("hello world", 30);
        app.type_char('h', Instant::now());

        assert_eq!(app.set_duration(60), Err(ConfigError::SessionRunning));
        assert_eq!(app.set_category(Category::Quotes), Err(ConfigError::SessionRunning));
        assert_eq!(app.cycle_size(), Err(ConfigError::SessionRunning));
        assert_eq!(app.config().duration_secs(), 30);
        assert!(app.notice().is_some());
        assert!(app.session().is_running());
    }

    #[test]
    fn test_config_change_while_idle_loads_new_session() {
        let (mut app, _) = app("hello world", 30);
        app.set_duration(120).unwrap();
        assert_eq!(app.config().duration_secs(), 120);
        assert_eq!(app.session().config().duration_secs(), 120);
        assert_eq!(app.session().state(), SessionState::Idle);

        app.cycle_category().unwrap();
        assert_eq!(app.config().category(), Category::NumbersAndPunctuation);
        app.cycle_duration().unwrap();
        assert_eq!(app.config().duration_secs(), 15);
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let (mut app, _) = app("hello", 30);
        assert_eq!(app.set_duration(0), Err(ConfigError::InvalidDuration(0)));
        assert_eq!(app.config().duration_secs(), 30);
    }

    #[test]
    fn test_new_session_cancels_stale_timers() {
        let (mut app, recorder) = app("hello world", 15);
        let t0 = Instant::now();
        app.type_char('h', t0);
        assert!(app.next_deadline().is_some());

        app.new_session();
        assert!(app.next_deadline().is_none());
        assert_eq!(app.input(), "");

        // long after both the old tick and watchdog would have fired
        app.poll(t0 + Duration::from_secs(120));
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(app.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_timeout_through_poll() {
        let (mut app, recorder) = app("a long passage nobody finishes", 15);
        let t0 = Instant::now();
        type_str(&mut app, "a lo", t0);
        // keep the watchdog quiet
        app.type_char('n', t0 + Duration::from_secs(9));
        app.poll(t0 + Duration::from_secs(15));

        let results = recorder.0.borrow();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reason, FinishReason::TimedOut);
        assert_eq!(results[0].elapsed_secs, 15);
    }

    #[test]
    fn test_recent_history_capped() {
        let (mut app, _) = app("a", 30);
        for _ in 0..(MAX_HISTORY + 2) {
            app.type_char('a', Instant::now());
            app.new_session();
        }
        assert_eq!(app.recent().len(), MAX_HISTORY);
    }

    #[test]
    fn test_redraw_request() {
        let flag = RedrawRequest::new();
        let (mut app, _) = app("ab", 30);
        app.add_observer(Box::new(flag.clone()));

        assert!(!flag.take());
        app.type_char('a', Instant::now());
        assert!(flag.take());
        assert!(!flag.take());
    }
}
