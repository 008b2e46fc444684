use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::engine::{EngineEvent, EngineState};
use crate::mode::ModeChoice;

/// What a key press asks for, once the engine state is taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Engine(EngineEvent),
    Quit,
    CycleTheme,
    ShowStats,
    ShowUsers,
    /// Open the name prompt to add a user.
    NewUser,
}

pub(crate) fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Printable characters only; chords with Ctrl or Alt are not typing.
pub fn typed_char(key: &KeyEvent) -> Option<char> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if !c.is_control() => Some(c),
        _ => None,
    }
}

/// Picks the user numbered `c` (1-9) on the alphabetical list.
pub fn user_for_digit(c: char, users: &[&str]) -> Option<String> {
    let n = c.to_digit(10)? as usize;
    (1..=users.len())
        .contains(&n)
        .then(|| users[n - 1].to_string())
}

/// Maps a key for the main screens. `Setup` is handled by the name prompt
/// and yields nothing here.
pub fn map_key(key: &KeyEvent, state: EngineState, users: &[&str]) -> Option<Action> {
    if is_ctrl_c(key) {
        return Some(Action::Quit);
    }

    match state {
        EngineState::Setup => None,
        EngineState::UserSelect => match key.code {
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('c') => Some(Action::NewUser),
            KeyCode::Char(c) => {
                user_for_digit(c, users).map(|u| Action::Engine(EngineEvent::UserSwitched(u)))
            }
            _ => None,
        },
        EngineState::Menu => match key.code {
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Enter => Some(Action::Engine(EngineEvent::Confirm)),
            KeyCode::Tab => Some(Action::CycleTheme),
            KeyCode::Char('u') => Some(Action::ShowUsers),
            KeyCode::Char('s') => Some(Action::ShowStats),
            KeyCode::Char(c) => {
                ModeChoice::from_key(c).map(|m| Action::Engine(EngineEvent::SelectMode(m)))
            }
            _ => None,
        },
        EngineState::Ready => match key.code {
            KeyCode::Enter => Some(Action::Engine(EngineEvent::Cancel)),
            KeyCode::Tab => Some(Action::CycleTheme),
            _ => typed_char(key).map(|c| Action::Engine(EngineEvent::Char(c))),
        },
        EngineState::Running => match key.code {
            KeyCode::Esc => Some(Action::Engine(EngineEvent::Cancel)),
            KeyCode::Backspace => Some(Action::Engine(EngineEvent::Backspace)),
            _ => typed_char(key).map(|c| Action::Engine(EngineEvent::Char(c))),
        },
        EngineState::Complete => match key.code {
            KeyCode::Esc | KeyCode::Char('m') => Some(Action::Engine(EngineEvent::ReturnToMenu)),
            KeyCode::Char('n') => Some(Action::Engine(EngineEvent::New)),
            KeyCode::Char('r') => Some(Action::Engine(EngineEvent::Retry)),
            KeyCode::Tab => Some(Action::CycleTheme),
            KeyCode::Char('u') => Some(Action::ShowUsers),
            KeyCode::Char('s') => Some(Action::ShowStats),
            _ => None,
        },
    }
}
