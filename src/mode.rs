use std::fmt;
use std::time::Duration;

pub const DEFAULT_SPRINT_SECS: u64 = 30;
pub const DEFAULT_WORD_TARGET: usize = 30;

/// Completion rule of a test. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs until the countdown expires; paragraphs are recycled as needed.
    TimedSprint { duration: Duration },
    /// Runs until `target_words` words of completed lines have been typed.
    WordSprint { target_words: usize },
    /// Runs until the paragraph is exhausted.
    Unlimited,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::TimedSprint { duration } => write!(f, "{}s sprint", duration.as_secs()),
            Mode::WordSprint { target_words } => write!(f, "{target_words} word sprint"),
            Mode::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Mode {
    pub fn timed(secs: u64) -> Self {
        Mode::TimedSprint {
            duration: Duration::from_secs(secs),
        }
    }

    pub fn words(target_words: usize) -> Self {
        Mode::WordSprint { target_words }
    }

    /// Seconds on the countdown, for timed sprints only.
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            Mode::TimedSprint { duration } => Some(duration.as_secs_f64()),
            _ => None,
        }
    }

    pub fn word_target(&self) -> Option<usize> {
        match self {
            Mode::WordSprint { target_words } => Some(*target_words),
            _ => None,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::timed(DEFAULT_SPRINT_SECS)
    }
}

/// The three menu choices, before the configured parameters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    Timed,
    Words,
    Unlimited,
}

impl ModeChoice {
    /// Menu keys `1`, `2` and `3`.
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(ModeChoice::Timed),
            '2' => Some(ModeChoice::Words),
            '3' => Some(ModeChoice::Unlimited),
            _ => None,
        }
    }

    pub fn resolve(self, sprint_secs: u64, word_target: usize) -> Mode {
        match self {
            ModeChoice::Timed => Mode::timed(sprint_secs),
            ModeChoice::Words => Mode::words(word_target),
            ModeChoice::Unlimited => Mode::Unlimited,
        }
    }
}
