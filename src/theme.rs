use ratatui::style::{Color, Modifier, Style};

/// Styles for the typed text, in one of four palettes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub correct: Style,
    pub incorrect: Style,
    pub pending: Style,
    pub cursor: Style,
    pub complete: Style,
}

const fn bold(fg: Color) -> Style {
    Style::new().fg(fg).add_modifier(Modifier::BOLD)
}

pub const THEMES: [Theme; 4] = [
    Theme {
        name: "Dark",
        correct: bold(Color::Green),
        incorrect: bold(Color::White).bg(Color::Red),
        pending: Style::new().add_modifier(Modifier::DIM),
        cursor: bold(Color::Black).bg(Color::Yellow),
        complete: Style::new().fg(Color::Green),
    },
    Theme {
        name: "Light",
        correct: bold(Color::Blue),
        incorrect: bold(Color::White).bg(Color::Rgb(139, 0, 0)),
        pending: Style::new().fg(Color::Gray),
        cursor: bold(Color::White).bg(Color::Blue),
        complete: Style::new().fg(Color::Blue),
    },
    Theme {
        name: "Ocean",
        correct: bold(Color::Cyan),
        incorrect: bold(Color::Yellow).bg(Color::Rgb(0, 0, 139)),
        pending: Style::new().fg(Color::Blue).add_modifier(Modifier::DIM),
        cursor: bold(Color::Black).bg(Color::LightCyan),
        complete: Style::new().fg(Color::Cyan),
    },
    Theme {
        name: "Retro",
        correct: bold(Color::LightGreen),
        incorrect: bold(Color::Black).bg(Color::LightYellow),
        pending: Style::new().fg(Color::Green).add_modifier(Modifier::DIM),
        cursor: bold(Color::Black).bg(Color::LightGreen),
        complete: Style::new().fg(Color::LightGreen),
    },
];

/// Index of the theme called `name` (case-insensitive), defaulting to the first.
pub fn index_of(name: &str) -> usize {
    THEMES
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or(0)
}

pub fn next(index: usize) -> usize {
    (index + 1) % THEMES.len()
}
