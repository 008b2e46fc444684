//! Test lifecycle: which inputs mean something in which state, and what
//! happens when a test completes.

use std::sync::Arc;

use crate::clock::Clock;
use crate::metrics::FinalMetrics;
use crate::mode::{Mode, ModeChoice};
use crate::profile::UserProfileStore;
use crate::session::{InputOutcome, TickOutcome, TypingSession};
use crate::text::TextLibrary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EngineState {
    /// No users exist yet; waiting for a first username.
    Setup,
    /// Users exist but none is active.
    UserSelect,
    Menu,
    Ready,
    Running,
    Complete,
}

/// Discrete inputs, delivered one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Char(char),
    Backspace,
    Tick,
    SelectMode(ModeChoice),
    Confirm,
    Cancel,
    Retry,
    New,
    ReturnToMenu,
    UsernameChosen(String),
    UserSwitched(String),
    CreateUser(String),
    RemoveActiveUser,
}

/// Payload of a completed test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub wpm: u32,
    pub accuracy: f64,
    pub mode: Mode,
}

/// Tells the presentation layer whether to redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Update {
    Unchanged,
    Changed,
    Completed(TestResult),
}

/// Parameters applied when a menu choice becomes a [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub sprint_secs: u64,
    pub word_target: usize,
    pub words_per_line: usize,
}

impl From<&crate::config::Config> for EngineSettings {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            sprint_secs: cfg.sprint_secs,
            word_target: cfg.word_target,
            words_per_line: cfg.words_per_line,
        }
    }
}

pub struct Engine {
    state: EngineState,
    mode: Option<Mode>,
    session: Option<TypingSession>,
    last_result: Option<TestResult>,
    settings: EngineSettings,
    library: Arc<dyn TextLibrary>,
    clock: Arc<dyn Clock>,
    profiles: UserProfileStore,
    revision: u64,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        library: Arc<dyn TextLibrary>,
        clock: Arc<dyn Clock>,
        profiles: UserProfileStore,
    ) -> Self {
        let mut engine = Self {
            state: EngineState::Menu,
            mode: None,
            session: None,
            last_result: None,
            settings,
            library,
            clock,
            profiles,
            revision: 0,
        };
        engine.state = engine.identity_gate();
        engine
    }

    /// Where to go when the active user may be missing.
    fn identity_gate(&self) -> EngineState {
        if self.profiles.is_empty() {
            EngineState::Setup
        } else if self.profiles.current_user().is_none() {
            EngineState::UserSelect
        } else {
            EngineState::Menu
        }
    }

    pub fn handle(&mut self, event: EngineEvent) -> Update {
        let from = self.state;
        let update = match (self.state, event) {
            (EngineState::Setup | EngineState::UserSelect, EngineEvent::UsernameChosen(name)) => {
                self.choose_username(&name)
            }
            (EngineState::UserSelect, EngineEvent::UserSwitched(name)) => self.switch_user(&name),

            (EngineState::Menu | EngineState::Complete, EngineEvent::UserSwitched(name)) => {
                self.switch_user(&name)
            }
            (EngineState::Menu | EngineState::Complete, EngineEvent::CreateUser(name)) => {
                self.choose_username(&name)
            }
            (EngineState::Menu | EngineState::Complete, EngineEvent::RemoveActiveUser) => {
                self.remove_active_user()
            }

            (EngineState::Menu, EngineEvent::SelectMode(choice)) => {
                let mode = choice.resolve(self.settings.sprint_secs, self.settings.word_target);
                self.start_mode(mode);
                Update::Changed
            }
            (EngineState::Menu, EngineEvent::Confirm) if self.session.is_some() => {
                self.state = EngineState::Ready;
                Update::Changed
            }

            (EngineState::Ready, EngineEvent::Cancel) => {
                self.session = self.session.as_ref().map(TypingSession::restart);
                self.state = EngineState::Menu;
                Update::Changed
            }
            (EngineState::Ready, EngineEvent::Char(c)) => {
                self.state = EngineState::Running;
                match self.forward_char(c) {
                    // Leaving Ready is itself a visible change.
                    Update::Unchanged => Update::Changed,
                    other => other,
                }
            }

            (EngineState::Running, EngineEvent::Cancel) => {
                self.reset_to_menu();
                Update::Changed
            }
            (EngineState::Running, EngineEvent::Char(c)) => self.forward_char(c),
            (EngineState::Running, EngineEvent::Backspace) => {
                match self.session.as_mut().map(TypingSession::handle_backspace) {
                    Some(true) => Update::Changed,
                    _ => Update::Unchanged,
                }
            }
            (EngineState::Running, EngineEvent::Tick) => self.tick(),

            (EngineState::Complete, EngineEvent::Retry) => {
                self.session = self.session.as_ref().map(TypingSession::restart);
                self.last_result = None;
                self.state = EngineState::Ready;
                Update::Changed
            }
            (EngineState::Complete, EngineEvent::New) => {
                match self.mode {
                    Some(mode) => self.start_mode(mode),
                    None => self.reset_to_menu(),
                }
                Update::Changed
            }
            (EngineState::Complete, EngineEvent::ReturnToMenu) => {
                self.reset_to_menu();
                Update::Changed
            }

            _ => Update::Unchanged,
        };

        if self.state != from {
            tracing::debug!(from = %from, to = %self.state, "state transition");
        }
        if update != Update::Unchanged {
            self.revision += 1;
        }
        update
    }

    fn forward_char(&mut self, c: char) -> Update {
        let Some(session) = self.session.as_mut() else {
            return Update::Unchanged;
        };
        match session.handle_input(c) {
            InputOutcome::Ignored => Update::Unchanged,
            InputOutcome::Typed { .. } | InputOutcome::LineCompleted => Update::Changed,
            InputOutcome::TestComplete => self.complete_test(),
        }
    }

    fn tick(&mut self) -> Update {
        let Some(session) = self.session.as_mut() else {
            return Update::Unchanged;
        };
        match session.handle_tick() {
            TickOutcome::Idle => Update::Unchanged,
            TickOutcome::Updated => Update::Changed,
            TickOutcome::Expired => self.complete_test(),
        }
    }

    /// Scores the running session, records it for the active user and moves
    /// to `Complete`. A failed save is logged and otherwise ignored.
    fn complete_test(&mut self) -> Update {
        let Some(session) = self.session.as_mut() else {
            return Update::Unchanged;
        };
        session.finish();
        let FinalMetrics { wpm, accuracy } = session.final_metrics();
        let result = TestResult {
            wpm,
            accuracy,
            mode: session.mode(),
        };

        match self.profiles.current_user().map(str::to_owned) {
            Some(user) => {
                if let Err(e) = self.profiles.record(&user, wpm, accuracy) {
                    tracing::warn!(user = %user, "could not save test result: {e}");
                }
            }
            None => tracing::warn!("test completed without an active user, result not recorded"),
        }

        tracing::info!(wpm, accuracy, mode = %result.mode, "test complete");
        self.last_result = Some(result);
        self.state = EngineState::Complete;
        Update::Completed(result)
    }

    fn start_mode(&mut self, mode: Mode) {
        self.mode = Some(mode);
        self.session = Some(TypingSession::new(
            mode,
            self.library.paragraph(),
            self.settings.words_per_line,
            Arc::clone(&self.library),
            Arc::clone(&self.clock),
        ));
        self.last_result = None;
        self.state = EngineState::Menu;
    }

    fn reset_to_menu(&mut self) {
        self.mode = None;
        self.session = None;
        self.last_result = None;
        self.state = EngineState::Menu;
    }

    /// Creates the user if needed and makes it active.
    fn choose_username(&mut self, name: &str) -> Update {
        let name = name.trim();
        if name.is_empty() {
            return Update::Unchanged;
        }
        if let Err(e) = self.profiles.create_user(name) {
            tracing::warn!(user = name, "could not save new user: {e}");
        }
        self.switch_user(name)
    }

    fn switch_user(&mut self, name: &str) -> Update {
        let name = name.trim();
        if self.profiles.user(name).is_none() {
            return Update::Unchanged;
        }
        if let Err(e) = self.profiles.set_current_user(name) {
            tracing::warn!(user = name, "could not save active user: {e}");
        }
        if matches!(self.state, EngineState::Setup | EngineState::UserSelect) {
            self.state = EngineState::Menu;
        }
        Update::Changed
    }

    fn remove_active_user(&mut self) -> Update {
        let Some(user) = self.profiles.current_user().map(str::to_owned) else {
            return Update::Unchanged;
        };
        if let Err(e) = self.profiles.remove_user(&user) {
            tracing::warn!(user = %user, "could not save user removal: {e}");
        }
        self.reset_to_menu();
        self.state = self.identity_gate();
        Update::Changed
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn session(&self) -> Option<&TypingSession> {
        self.session.as_ref()
    }

    pub fn last_result(&self) -> Option<TestResult> {
        self.last_result
    }

    pub fn profiles(&self) -> &UserProfileStore {
        &self.profiles
    }

    pub fn library(&self) -> &dyn TextLibrary {
        self.library.as_ref()
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Bumped after every event that changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Only `Ready` and `Running` take typed characters.
    pub fn accepts_text(&self) -> bool {
        matches!(self.state, EngineState::Ready | EngineState::Running)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("session", &self.session)
            .field("last_result", &self.last_result)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
