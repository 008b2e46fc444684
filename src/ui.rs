pub mod overlay;
pub mod screen;

use std::collections::BTreeSet;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Overlay};
use crate::theme::Theme;

pub(crate) const HORIZONTAL_MARGIN: u16 = 5;
pub(crate) const VERTICAL_MARGIN: u16 = 2;

/// Positions that were mistyped once and later fixed.
const CORRECTED: Style = Style::new()
    .fg(Color::Rgb(255, 165, 0))
    .add_modifier(Modifier::BOLD);

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.engine.state()).render(self, area, buf);

        match self.overlay {
            Overlay::None => {}
            Overlay::Stats => overlay::render_stats(self, area, buf),
            Overlay::Users => overlay::render_users(self, area, buf),
            Overlay::NewUser => overlay::render_name_prompt(self, area, buf),
        }

        if let Some(notice) = self.notice() {
            let bottom = Rect {
                y: area.bottom().saturating_sub(1),
                height: area.height.min(1),
                ..area
            };
            Paragraph::new(Span::styled(
                notice.to_string(),
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(bottom, buf);
        }
    }
}

/// Colours `typed` against `target`, followed by the untyped rest.
///
/// `cursor` marks the next position to type; pass `None` for finished lines.
pub(crate) fn typed_spans(
    target: &[char],
    typed: &[char],
    mistakes: &BTreeSet<usize>,
    theme: &Theme,
    cursor: Option<bool>,
) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = typed
        .iter()
        .enumerate()
        .map(|(idx, &c)| match target.get(idx) {
            Some(&expected) if expected == c => {
                let style = if mistakes.contains(&idx) {
                    CORRECTED
                } else {
                    theme.correct
                };
                Span::styled(c.to_string(), style)
            }
            _ => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                theme.incorrect,
            ),
        })
        .collect();

    let mut rest = target.get(typed.len()..).unwrap_or_default();
    if let (Some(visible), Some((&next, tail))) = (cursor, rest.split_first()) {
        let style = if visible { theme.cursor } else { theme.pending };
        spans.push(Span::styled(next.to_string(), style));
        rest = tail;
    }
    if !rest.is_empty() {
        spans.push(Span::styled(rest.iter().collect::<String>(), theme.pending));
    }
    spans
}

/// A `width` x `height` box centred in `area`, clipped to fit.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Width needed to show every line of `lines` plus a border.
pub(crate) fn box_width(lines: &[Line], min: u16) -> u16 {
    let widest = lines.iter().map(Line::width).max().unwrap_or(0);
    u16::try_from(widest + 4).unwrap_or(u16::MAX).max(min)
}

/// Splits `area` into a fixed header, a flexible body and a one-line footer.
pub(crate) fn page_layout(area: Rect, header_lines: u16) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(header_lines),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

pub(crate) fn hint(text: &str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        text.to_owned(),
        Style::default()
            .add_modifier(Modifier::DIM)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

pub(crate) fn title(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_owned(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// Left pad that centres `text` in `width` columns.
pub(crate) fn pad_for(text: &str, width: u16) -> usize {
    (width as usize).saturating_sub(text.width()) / 2
}
