use ratatui::{
    layout::{Alignment, Constraint},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::history::Trend;
use crate::session::SessionResult;
use crate::timing::format_time;

pub fn trend_style(trend: Trend) -> Style {
    let color = match trend {
        Trend::Improving => Color::Green,
        Trend::Declining => Color::Red,
        Trend::Stable => Color::Yellow,
        Trend::InsufficientData => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Pure presenter for a single history row
pub fn present_row(result: &SessionResult) -> Row<'static> {
    let accuracy_color = if result.accuracy >= 95.0 {
        Color::Green
    } else if result.accuracy >= 85.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(result.timestamp.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(result.wpm.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}%", result.accuracy)).style(Style::default().fg(accuracy_color)),
        Cell::from(format_time(result.elapsed_secs)),
        Cell::from(result.category.to_string()),
        Cell::from(result.size.to_string()),
    ])
}

/// Recent results, newest on top.
pub fn history_table(results: &[SessionResult]) -> Table<'static> {
    let header = Row::new(vec!["Date", "WPM", "Acc", "Time", "Category", "Size"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = results.iter().rev().map(present_row).collect();

    let widths = [
        Constraint::Length(17),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(26),
        Constraint::Min(6),
    ];

    Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recent")
                .title_alignment(Alignment::Center),
        )
        .column_spacing(1)
}
