use std::time::Instant;

use ratatui::Frame;

use crate::app::App;
use crate::session::SessionState;
use crate::ui::{AppView, SummaryView};

/// A UI Screen boundary: responsible for rendering one session phase
pub trait Screen {
    fn render(&self, app: &App, now: Instant, f: &mut Frame);
}

/// Passage, live stats and settings; shown while idle or typing
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, now: Instant, f: &mut Frame) {
        f.render_widget(AppView { app, now }, f.area());
    }
}

/// Final result, trend and recent history
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, _now: Instant, f: &mut Frame) {
        f.render_widget(SummaryView { app }, f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: SessionState) -> Box<dyn Screen> {
    match state {
        SessionState::Idle | SessionState::Running => Box::new(TypingScreen),
        SessionState::Finished => Box::new(SummaryScreen),
    }
}
