pub mod history_table;
pub mod screen;

use std::time::Instant;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::diff::CharResult;
use crate::session::SessionState;
use crate::timing::format_time;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Draw the screen matching the current session state.
pub fn draw(f: &mut Frame, app: &App, now: Instant) {
    screen::current_screen(app.session().state()).render(app, now, f);
}

/// An [`App`] as seen at one instant.
pub struct AppView<'a> {
    pub app: &'a App,
    pub now: Instant,
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// Style of each passage character given its classification and the cursor.
fn char_style(idx: usize, result: CharResult, cursor: usize) -> Style {
    match result {
        CharResult::Correct => bold().fg(Color::Green),
        CharResult::Incorrect => bold().fg(Color::Red),
        CharResult::Unclassified if idx == cursor => dim_bold().add_modifier(Modifier::UNDERLINED),
        CharResult::Unclassified => dim_bold(),
    }
}

/// Passage text as spans, one span per run of equally styled characters.
pub fn passage_spans(chars: &[char], results: &[CharResult], cursor: usize) -> Vec<Span<'static>> {
    let styled = chars.iter().zip(results).enumerate().map(|(idx, (&c, &r))| {
        // make mistyped spaces visible
        let shown = if r == CharResult::Incorrect && c == ' ' {
            '·'
        } else {
            c
        };
        (shown, char_style(idx, r, cursor))
    });

    let mut spans = Vec::new();
    let runs = styled.chunk_by(|(_, style)| *style);
    for (style, run) in &runs {
        spans.push(Span::styled(run.map(|(c, _)| c).collect::<String>(), style));
    }
    spans
}

/// First line to show so the cursor stays in the upper third of the view.
fn scroll_offset(cursor: usize, line_width: u16, view_height: u16) -> u16 {
    if line_width == 0 {
        return 0;
    }
    let cursor_line = (cursor / line_width as usize) as u16;
    cursor_line.saturating_sub(view_height / 3)
}

impl Widget for AppView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let session = app.session();
        let snapshot = app.snapshot(self.now);
        let config = app.config();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // settings
                Constraint::Length(1), // live stats
                Constraint::Length(1), // padding
                Constraint::Min(1),    // passage
                Constraint::Length(1), // notice / legend
            ])
            .split(area);

        let settings = Paragraph::new(Span::styled(
            format!(
                "{} · {} · {}",
                format_time(config.duration_secs()),
                config.category(),
                config.size()
            ),
            Style::default().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center);
        settings.render(chunks[0], buf);

        let stats = Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}",
                snapshot.wpm,
                snapshot.accuracy,
                format_time(snapshot.remaining_secs)
            ),
            bold(),
        ))
        .alignment(Alignment::Center);
        stats.render(chunks[1], buf);

        let passage_area = chunks[3];
        let text_width = session.passage().as_str().width();
        let single_line = text_width <= passage_area.width as usize;
        let spans = passage_spans(session.passage().chars(), &snapshot.results, snapshot.cursor);
        let passage = Paragraph::new(Line::from(spans))
            .alignment(if single_line {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .scroll((
                scroll_offset(snapshot.cursor, passage_area.width, passage_area.height),
                0,
            ));
        passage.render(passage_area, buf);

        let footer = match app.notice() {
            Some(notice) => Span::styled(notice.to_string(), Style::default().fg(Color::Yellow)),
            None => Span::styled(
                match snapshot.state {
                    SessionState::Idle => {
                        "start typing · (f2) time / (f3) category / (f4) size / (tab) new / (esc)ape"
                    }
                    _ => "(tab) new / (esc)ape",
                },
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        };
        Paragraph::new(footer).render(chunks[4], buf);
    }
}

/// Completion summary with the recent history and its trend.
pub struct SummaryView<'a> {
    pub app: &'a App,
}

impl Widget for SummaryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // result
                Constraint::Length(1), // trend
                Constraint::Min(3),    // history
                Constraint::Length(1), // legend
            ])
            .split(area);

        if let Some(result) = app.session().result() {
            let summary = Paragraph::new(Span::styled(
                format!(
                    "{} wpm   {}% acc   {}",
                    result.wpm,
                    result.accuracy,
                    format_time(result.elapsed_secs)
                ),
                bold(),
            ))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", result.reason)),
            )
            .alignment(Alignment::Center);
            summary.render(chunks[0], buf);
        }

        let trend = app.trend();
        let trend_line = Paragraph::new(Line::from(vec![
            Span::raw("Trend: "),
            Span::styled(trend.to_string(), history_table::trend_style(trend)),
        ]))
        .alignment(Alignment::Center);
        trend_line.render(chunks[1], buf);

        history_table::history_table(app.recent()).render(chunks[2], buf);

        Paragraph::new(Span::styled(
            "(n)ew / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}
