use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};

use crate::engine::{Engine, EngineEvent, EngineState, Update};
use crate::input::{self, Action};
use crate::runtime::AppEvent;
use crate::theme::{self, Theme};

const MAX_NAME_LEN: usize = 24;
const NOTICE_TTL: Duration = Duration::from_millis(1500);
const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Panels drawn over the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Stats,
    Users,
    /// Name prompt opened from the user menu.
    NewUser,
}

/// Presentation state wrapped around the [`Engine`].
#[derive(Debug)]
pub struct App {
    pub engine: Engine,
    pub overlay: Overlay,
    /// Text typed into the name prompt.
    pub name_input: String,
    pub theme_index: usize,
    pub tagline: String,
    pub cursor_visible: bool,
    notice: Option<(String, Instant)>,
    last_blink: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(engine: Engine, theme_name: &str) -> Self {
        let tagline = engine.library().phrase();
        Self {
            engine,
            overlay: Overlay::None,
            name_input: String::new(),
            theme_index: theme::index_of(theme_name),
            tagline,
            cursor_visible: true,
            notice: None,
            last_blink: Instant::now(),
            should_quit: false,
        }
    }

    pub fn theme(&self) -> &'static Theme {
        &theme::THEMES[self.theme_index]
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(msg, _)| msg.as_str())
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// True while the name prompt owns the keyboard.
    pub fn editing_name(&self) -> bool {
        self.engine.state() == EngineState::Setup || self.overlay == Overlay::NewUser
    }

    /// Feeds one runtime event through. Returns whether a redraw is needed.
    pub fn on_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Tick => self.on_tick(Instant::now()),
            AppEvent::Resize => true,
            AppEvent::Closed => {
                tracing::warn!("input closed, quitting");
                self.should_quit = true;
                false
            }
            AppEvent::Key(key) => {
                self.on_key(key);
                true
            }
        }
    }

    fn on_tick(&mut self, now: Instant) -> bool {
        let mut redraw = self.dispatch(EngineEvent::Tick);

        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| now.duration_since(*at) >= NOTICE_TTL)
        {
            self.notice = None;
            redraw = true;
        }
        if now.duration_since(self.last_blink) >= BLINK_INTERVAL {
            self.cursor_visible = !self.cursor_visible;
            self.last_blink = now;
            redraw |= self.engine.accepts_text() || self.editing_name();
        }
        redraw
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.editing_name() {
            self.on_name_key(key);
            return;
        }
        match self.overlay {
            Overlay::Stats => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('q')
                ) {
                    self.overlay = Overlay::None;
                }
            }
            Overlay::Users => self.on_users_key(key),
            Overlay::None | Overlay::NewUser => {
                let users = self.engine.profiles().usernames();
                let action = input::map_key(&key, self.engine.state(), &users);
                if let Some(action) = action {
                    self.apply(action);
                }
            }
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Engine(ev) => {
                self.dispatch(ev);
            }
            Action::Quit => self.should_quit = true,
            Action::CycleTheme => {
                self.theme_index = theme::next(self.theme_index);
                let name = self.theme().name;
                tracing::debug!(theme = name, "theme changed");
                self.notice = Some((format!("Theme: {name}"), Instant::now()));
            }
            Action::ShowStats => self.overlay = Overlay::Stats,
            Action::ShowUsers => self.overlay = Overlay::Users,
            Action::NewUser => {
                self.name_input.clear();
                self.overlay = Overlay::NewUser;
            }
        }
    }

    fn dispatch(&mut self, event: EngineEvent) -> bool {
        match self.engine.handle(event) {
            Update::Unchanged => false,
            Update::Changed => true,
            Update::Completed(result) => {
                self.notice = None;
                tracing::debug!(wpm = result.wpm, "showing results");
                true
            }
        }
    }

    fn on_users_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.overlay = Overlay::None,
            KeyCode::Char('c') => self.apply(Action::NewUser),
            KeyCode::Char('d') => {
                self.dispatch(EngineEvent::RemoveActiveUser);
                self.overlay = Overlay::None;
            }
            KeyCode::Char(c) => {
                let picked = input::user_for_digit(c, &self.engine.profiles().usernames());
                if let Some(user) = picked {
                    self.dispatch(EngineEvent::UserSwitched(user));
                    self.overlay = Overlay::None;
                }
            }
            _ => {}
        }
    }

    fn on_name_key(&mut self, key: KeyEvent) {
        if input::is_ctrl_c(&key) {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Enter => {
                let name = self.name_input.trim().to_string();
                if name.is_empty() {
                    return;
                }
                let event = if matches!(
                    self.engine.state(),
                    EngineState::Setup | EngineState::UserSelect
                ) {
                    EngineEvent::UsernameChosen(name)
                } else {
                    EngineEvent::CreateUser(name)
                };
                self.dispatch(event);
                self.name_input.clear();
                self.overlay = Overlay::None;
            }
            KeyCode::Esc => {
                self.name_input.clear();
                if self.overlay == Overlay::NewUser {
                    self.overlay = Overlay::None;
                }
            }
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            _ => {
                if let Some(c) = input::typed_char(&key) {
                    if self.name_input.chars().count() < MAX_NAME_LEN {
                        self.name_input.push(c);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;

    use crate::clock::ManualClock;
    use crate::engine::EngineSettings;
    use crate::profile::{MemoryBackend, Profiles, UserProfileStore};
    use crate::text::Corpus;

    fn app_with(profiles: Profiles) -> App {
        let library = Arc::new(Corpus::new(vec!["Go fast.".into()], vec!["cat sat".into()]));
        let engine = Engine::new(
            EngineSettings {
                sprint_secs: 30,
                word_target: 30,
                words_per_line: 10,
            },
            library,
            Arc::new(ManualClock::new()),
            UserProfileStore::open(Box::new(MemoryBackend::new(profiles))),
        );
        App::new(engine, "dark")
    }

    fn with_users(names: &[&str], current: Option<&str>) -> Profiles {
        let mut profiles = Profiles::default();
        for name in names {
            profiles.users.insert((*name).into(), Default::default());
        }
        profiles.current_user = current.map(Into::into);
        profiles
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn tagline_comes_from_phrases() {
        let app = app_with(Profiles::default());
        assert_eq!(app.tagline, "Go fast.");
    }

    #[test]
    fn setup_prompt_creates_user() {
        let mut app = app_with(Profiles::default());
        assert!(app.editing_name());

        type_str(&mut app, "adaa");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.engine.state(), EngineState::Menu);
        assert_eq!(app.engine.profiles().current_user(), Some("ada"));
        assert!(app.name_input.is_empty());
    }

    #[test]
    fn empty_name_is_not_submitted() {
        let mut app = app_with(Profiles::default());
        type_str(&mut app, "  ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.engine.state(), EngineState::Setup);
    }

    #[test]
    fn name_length_is_capped() {
        let mut app = app_with(Profiles::default());
        type_str(&mut app, &"x".repeat(40));
        assert_eq!(app.name_input.len(), MAX_NAME_LEN);
    }

    #[test]
    fn full_test_from_menu() {
        let mut app = app_with(with_users(&["ada"], Some("ada")));
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.engine.state(), EngineState::Ready);

        type_str(&mut app, "cat sat");
        assert_eq!(app.engine.state(), EngineState::Complete);
        assert_eq!(app.engine.profiles().user("ada").unwrap().tests_completed, 1);

        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.engine.state(), EngineState::Menu);
    }

    #[test]
    fn tab_cycles_theme_with_notice() {
        let mut app = app_with(with_users(&["ada"], Some("ada")));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.theme().name, "Light");
        assert_eq!(app.notice(), Some("Theme: Light"));

        app.on_tick(Instant::now() + NOTICE_TTL);
        assert_eq!(app.notice(), None);
    }

    #[test]
    fn stats_overlay_swallows_keys() {
        let mut app = app_with(with_users(&["ada"], Some("ada")));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.overlay, Overlay::Stats);
        press(&mut app, KeyCode::Char('1'));
        assert!(app.engine.mode().is_none());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.overlay, Overlay::None);
        assert!(!app.should_quit());
    }

    #[test]
    fn user_overlay_switches_creates_and_removes() {
        let mut app = app_with(with_users(&["ada", "bob"], Some("ada")));

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.engine.profiles().current_user(), Some("bob"));
        assert_eq!(app.overlay, Overlay::None);

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('c'));
        assert!(app.editing_name());
        type_str(&mut app, "cy");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.engine.profiles().current_user(), Some("cy"));

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.engine.state(), EngineState::UserSelect);
        assert_eq!(app.engine.profiles().usernames(), vec!["ada", "bob"]);
    }

    #[test]
    fn ctrl_c_quits_from_name_prompt() {
        let mut app = app_with(Profiles::default());
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
        assert!(app.name_input.is_empty());
    }

    #[test]
    fn closed_input_quits() {
        let mut app = app_with(with_users(&["ada"], Some("ada")));
        assert!(!app.on_event(AppEvent::Closed));
        assert!(app.should_quit());
    }

    #[test]
    fn escape_in_menu_quits() {
        let mut app = app_with(with_users(&["ada"], Some("ada")));
        assert!(app.on_event(AppEvent::Key(KeyEvent::new(
            KeyCode::Esc,
            KeyModifiers::NONE
        ))));
        assert!(app.should_quit());
    }
}
