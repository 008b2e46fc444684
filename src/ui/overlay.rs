use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Widget},
};

use super::{box_width, centered_rect, pad_for};
use crate::app::App;

const LEADERBOARD_SIZE: usize = 5;

fn popup(title: &str, area: Rect, buf: &mut Buffer) -> Rect {
    Clear.render(area, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_owned())
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    block.render(area, buf);
    inner
}

fn fmt_avg(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.1}{suffix}"))
}

/// Active user's totals and the top five by best WPM.
pub fn render_stats(app: &App, area: Rect, buf: &mut Buffer) {
    let profiles = app.engine.profiles();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut summary = Vec::new();
    match profiles.current_user().and_then(|u| profiles.user(u).map(|s| (u, s))) {
        Some((name, stats)) => {
            summary.push(Line::from(Span::styled(name.to_owned(), bold)));
            summary.push(Line::from(format!(
                "tests {}  avg {} wpm  best {} wpm",
                stats.tests_completed,
                fmt_avg(stats.average_wpm(), ""),
                stats.best_wpm
            )));
            summary.push(Line::from(format!(
                "avg acc {}  best acc {:.1}%",
                fmt_avg(stats.average_accuracy(), "%"),
                stats.best_accuracy
            )));
        }
        None => summary.push(Line::from("no active user")),
    }

    let board = profiles.leaderboard(LEADERBOARD_SIZE);
    let height = (summary.len() + board.len() + 6) as u16;
    let rect = centered_rect(box_width(&summary, 50), height, area);
    let inner = popup("Stats", rect, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary.len() as u16 + 1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    Paragraph::new(summary)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let rows = board.iter().enumerate().map(|(i, (name, stats))| {
        let style = if Some(*name) == profiles.current_user() {
            app.theme().complete
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(format!("{}.", i + 1)),
            Cell::from((*name).to_owned()),
            Cell::from(stats.best_wpm.to_string()),
            Cell::from(format!("{:.1}%", stats.best_accuracy)),
        ])
        .style(style)
    });
    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(7),
        ],
    )
    .header(Row::new(vec!["#", "user", "wpm", "acc"]).style(bold))
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(esc) close",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

/// Numbered users, with the active one marked.
pub fn render_users(app: &App, area: Rect, buf: &mut Buffer) {
    let profiles = app.engine.profiles();
    let current = profiles.current_user();

    let mut lines: Vec<Line> = profiles
        .usernames()
        .into_iter()
        .take(9)
        .enumerate()
        .map(|(i, name)| {
            let marker = if Some(name) == current { "*" } else { " " };
            Line::from(format!("{marker} {}. {name}", i + 1))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(1-9) switch  (c) create  (d) delete active  (esc) close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let rect = centered_rect(box_width(&lines, 30), lines.len() as u16 + 2, area);
    let inner = popup("Users", rect, buf);
    Paragraph::new(lines).render(inner, buf);
}

pub fn render_name_prompt(app: &App, area: Rect, buf: &mut Buffer) {
    let label = "New user name:";
    let rect = centered_rect(40, 5, area);
    let inner = popup("Users", rect, buf);

    let cursor = if app.cursor_visible { "_" } else { " " };
    let entry = format!("{}{cursor}", app.name_input);
    let pad = " ".repeat(pad_for(&entry, inner.width));
    Paragraph::new(vec![
        Line::from(label),
        Line::from(vec![
            Span::raw(pad),
            Span::styled(app.name_input.clone(), app.theme().correct),
            Span::raw(cursor),
        ]),
    ])
    .render(inner, buf);
}
