use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::{hint, page_layout, title, typed_spans};
use crate::app::App;
use crate::engine::EngineState;
use crate::mode::ModeChoice;
use crate::session::TypingSession;

/// Lines of history kept above the active line while typing.
const HISTORY_ROWS: usize = 2;
const PREVIEW_ROWS: usize = 3;

/// Draws the main view for one engine state.
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

pub struct SetupScreen;

impl Screen for SetupScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = page_layout(area, 2);
        Paragraph::new(vec![title("keysprint"), Line::from(app.tagline.clone())])
            .alignment(Alignment::Center)
            .render(header, buf);

        let cursor = if app.cursor_visible { "_" } else { " " };
        Paragraph::new(vec![
            Line::from(""),
            Line::from("Welcome! Enter a name to get started:"),
            Line::from(""),
            Line::from(vec![
                Span::styled(app.name_input.clone(), app.theme().correct),
                Span::raw(cursor),
            ]),
        ])
        .alignment(Alignment::Center)
        .render(body, buf);

        hint("(enter) save  (ctrl-c) quit").render(footer, buf);
    }
}

pub struct UserSelectScreen;

impl Screen for UserSelectScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = page_layout(area, 2);
        Paragraph::new(vec![title("Who is typing?"), Line::from("")])
            .alignment(Alignment::Center)
            .render(header, buf);

        let lines: Vec<Line> = app
            .engine
            .profiles()
            .usernames()
            .into_iter()
            .take(9)
            .enumerate()
            .map(|(i, name)| Line::from(format!("{}. {name}", i + 1)))
            .collect();
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);

        hint("(1-9) choose  (c) new user  (esc) quit").render(footer, buf);
    }
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = page_layout(area, 3);
        let user = app.engine.profiles().current_user().unwrap_or("-");
        Paragraph::new(vec![
            title("keysprint"),
            Line::from(Span::styled(
                app.tagline.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(format!("typing as {user}")),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(header, buf);

        let settings = app.engine.settings();
        let selected = app.engine.mode();
        let mut lines = vec![Line::from("")];
        for (key, choice) in [
            ('1', ModeChoice::Timed),
            ('2', ModeChoice::Words),
            ('3', ModeChoice::Unlimited),
        ] {
            let mode = choice.resolve(settings.sprint_secs, settings.word_target);
            let label = format!("({key}) {mode}");
            lines.push(if selected == Some(mode) {
                Line::from(Span::styled(format!("> {label} <"), app.theme().complete))
            } else {
                Line::from(label)
            });
        }
        if selected.is_some() {
            lines.push(Line::from(""));
            lines.push(Line::from("press enter when ready"));
        }
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);

        hint("(1-3) mode (enter) start (tab) theme (s) stats (u) users (esc) quit")
            .render(footer, buf);
    }
}

/// Both `Ready` and `Running`: the text with live figures above it.
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(session) = app.engine.session() else {
            return;
        };
        let theme = app.theme();
        let (header, body, footer) = page_layout(area, 3);

        let live = session.live();
        let counters = session.counters();
        Paragraph::new(vec![
            Line::from(format!("{}  |  {}", session.mode(), progress(session))),
            Line::from(format!(
                "{:.0} wpm  {:.1}% acc  streak {}",
                live.wpm, live.accuracy, counters.current_streak
            )),
        ])
        .alignment(Alignment::Center)
        .render(header, buf);

        let mut lines: Vec<Line> = Vec::new();
        let done = session.completed_lines();
        for line in &done[done.len().saturating_sub(HISTORY_ROWS)..] {
            let typed: Vec<char> = line.typed.chars().collect();
            let spans = typed_spans(line.target.chars(), &typed, &line.mistakes, theme, None);
            lines.push(Line::from(spans).patch_style(Style::default().add_modifier(Modifier::DIM)));
        }
        lines.push(Line::from(typed_spans(
            session.current_line().chars(),
            session.typed(),
            session.mistake_positions(),
            theme,
            Some(app.cursor_visible),
        )));
        for line in session.upcoming_lines().iter().take(PREVIEW_ROWS) {
            lines.push(Line::from(Span::styled(line.as_str().to_owned(), theme.pending)));
        }
        Paragraph::new(lines).render(body, buf);

        let keys = if app.engine.state() == EngineState::Ready {
            "start typing to begin  (enter) back  (tab) theme"
        } else {
            "(esc) cancel"
        };
        hint(keys).render(footer, buf);
    }
}

/// Countdown, words left, or elapsed time, depending on the mode.
fn progress(session: &TypingSession) -> String {
    let timer = session.timer();
    if let Some(remaining) = timer.remaining_secs {
        format!("{remaining:.1}s left")
    } else if let Some(words) = session.words_left() {
        format!("{words} words left")
    } else {
        format!("{:.0}s", timer.elapsed_secs)
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (Some(result), Some(session)) = (app.engine.last_result(), app.engine.session())
        else {
            return;
        };
        let theme = app.theme();
        let (header, body, footer) = page_layout(area, 4);

        Paragraph::new(vec![
            title("Test complete"),
            Line::from(Span::styled(
                format!("{} wpm  {:.1}% acc", result.wpm, result.accuracy),
                theme.complete.add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{}  |  best streak {}",
                result.mode,
                session.counters().best_streak
            )),
        ])
        .alignment(Alignment::Center)
        .render(header, buf);

        let lines: Vec<Line> = session
            .completed_lines()
            .iter()
            .map(|line| {
                let typed: Vec<char> = line.typed.chars().collect();
                Line::from(typed_spans(line.target.chars(), &typed, &line.mistakes, theme, None))
            })
            .collect();
        // Keep the most recent lines when the review overflows.
        let skip = lines.len().saturating_sub(body.height as usize);
        Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>()).render(body, buf);

        hint("(r) retry  (n) new  (m) menu  (s) stats  (u) users  (tab) theme").render(footer, buf);
    }
}

pub fn current_screen(state: EngineState) -> Box<dyn Screen> {
    match state {
        EngineState::Setup => Box::new(SetupScreen),
        EngineState::UserSelect => Box::new(UserSelectScreen),
        EngineState::Menu => Box::new(MenuScreen),
        EngineState::Ready | EngineState::Running => Box::new(TypingScreen),
        EngineState::Complete => Box::new(ResultsScreen),
    }
}
