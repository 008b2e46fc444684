use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::clock::Clock;
use crate::metrics::{final_metrics, FinalMetrics, LiveMetrics};
use crate::mode::Mode;
use crate::text::{split_lines, Line, TextLibrary};

/// A finished line kept for the results review. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLine {
    pub target: Line,
    pub typed: String,
    pub mistakes: BTreeSet<usize>,
}

/// Append-only counters for the whole test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_chars_typed: usize,
    pub total_mistakes: usize,
    pub total_words_typed: usize,
    pub current_streak: usize,
    pub best_streak: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    pub started_at: Option<Instant>,
    pub elapsed_secs: f64,
    /// Countdown for timed sprints, `None` otherwise.
    pub remaining_secs: Option<f64>,
}

impl Timer {
    fn for_mode(mode: Mode) -> Self {
        Self {
            started_at: None,
            elapsed_secs: 0.0,
            remaining_secs: mode.duration_secs(),
        }
    }

    fn update(&mut self, now: Instant, mode: Mode) {
        if let Some(start) = self.started_at {
            self.elapsed_secs = now.saturating_duration_since(start).as_secs_f64();
        }
        if let Some(duration) = mode.duration_secs() {
            self.remaining_secs = Some((duration - self.elapsed_secs).max(0.0));
        }
    }
}

/// What a keystroke did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Dropped without effect (leading space, finished session, full line).
    Ignored,
    Typed { correct: bool },
    /// The keystroke completed a line and the next one is now active.
    LineCompleted,
    /// The test is over; the caller should finalize it.
    TestComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to time yet, or the session is already over.
    Idle,
    Updated,
    /// The countdown reached zero.
    Expired,
}

/// The live state of one test: active line, typed buffer, mistakes, streaks
/// and timing.
pub struct TypingSession {
    mode: Mode,
    words_per_line: usize,
    paragraph: String,
    lines: Vec<Line>,
    line_index: usize,
    typed: Vec<char>,
    mistakes: BTreeSet<usize>,
    completed: Vec<CompletedLine>,
    counters: Counters,
    timer: Timer,
    live: LiveMetrics,
    finished: bool,
    library: Arc<dyn TextLibrary>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TypingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingSession")
            .field("mode", &self.mode)
            .field("line_index", &self.line_index)
            .field("typed", &self.typed_text())
            .field("counters", &self.counters)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl TypingSession {
    pub fn new(
        mode: Mode,
        paragraph: String,
        words_per_line: usize,
        library: Arc<dyn TextLibrary>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut session = Self {
            mode,
            words_per_line,
            paragraph: String::new(),
            lines: Vec::new(),
            line_index: 0,
            typed: Vec::new(),
            mistakes: BTreeSet::new(),
            completed: Vec::new(),
            counters: Counters::default(),
            timer: Timer::for_mode(mode),
            live: LiveMetrics::default(),
            finished: false,
            library,
            clock,
        };
        session.load_paragraph(paragraph);
        session
    }

    /// A fresh session over the same paragraph, for retries.
    pub fn restart(&self) -> Self {
        Self::new(
            self.mode,
            self.paragraph.clone(),
            self.words_per_line,
            Arc::clone(&self.library),
            Arc::clone(&self.clock),
        )
    }

    fn load_paragraph(&mut self, paragraph: String) {
        let mut lines = split_lines(&paragraph, self.words_per_line);
        let paragraph = if lines.is_empty() {
            tracing::warn!("empty paragraph, drawing another from the library");
            let replacement = self.library.paragraph();
            lines = split_lines(&replacement, self.words_per_line);
            replacement
        } else {
            paragraph
        };
        if lines.is_empty() {
            lines.push(Line::new("the quick brown fox jumps over the lazy dog"));
        }

        self.paragraph = paragraph;
        self.lines = lines;
        self.line_index = 0;
        self.typed.clear();
        self.mistakes.clear();
    }

    /// Feed one printable character.
    pub fn handle_input(&mut self, c: char) -> InputOutcome {
        if self.finished {
            return InputOutcome::Ignored;
        }

        // A space typed between words across a line break is not an error.
        if c == ' ' && self.typed.is_empty() && !self.current_line().starts_with_space() {
            return InputOutcome::Ignored;
        }

        let now = self.clock.now();
        if self.typed.is_empty() && self.timer.started_at.is_none() {
            self.timer.started_at = Some(now);
            tracing::debug!(mode = %self.mode, "timer started");
        }

        if self.typed.len() >= self.current_line().len() {
            return self.check_line_completion().unwrap_or(InputOutcome::Ignored);
        }

        let offset = self.typed.len();
        self.typed.push(c);
        self.counters.total_chars_typed += 1;

        let correct = self.current_line().char_at(offset) == Some(c);
        if correct {
            self.counters.current_streak += 1;
            self.counters.best_streak = self.counters.best_streak.max(self.counters.current_streak);
        } else {
            if self.mistakes.insert(offset) {
                self.counters.total_mistakes += 1;
            }
            self.counters.current_streak = 0;
        }

        self.timer.update(now, self.mode);
        self.live = LiveMetrics::compute(
            self.counters.total_chars_typed,
            self.counters.total_mistakes,
            self.timer.elapsed_secs,
        );

        self.check_line_completion()
            .unwrap_or(InputOutcome::Typed { correct })
    }

    /// Removes the last typed character of the current line, if any.
    ///
    /// Recorded mistakes and counters are left alone.
    pub fn handle_backspace(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.typed.pop().is_some()
    }

    pub fn handle_tick(&mut self) -> TickOutcome {
        if self.finished || self.timer.started_at.is_none() {
            return TickOutcome::Idle;
        }
        self.timer.update(self.clock.now(), self.mode);

        match self.timer.remaining_secs {
            Some(remaining) if remaining <= 0.0 => {
                self.finish();
                TickOutcome::Expired
            }
            _ => TickOutcome::Updated,
        }
    }

    fn check_line_completion(&mut self) -> Option<InputOutcome> {
        if self.typed.len() != self.current_line().len() {
            return None;
        }

        let line = self.current_line().clone();
        self.completed.push(CompletedLine {
            typed: self.typed.iter().collect(),
            mistakes: self.mistakes.clone(),
            target: line.clone(),
        });
        self.counters.total_words_typed += line.word_count();

        if let Mode::WordSprint { target_words } = self.mode {
            if self.counters.total_words_typed >= target_words {
                self.finish();
                return Some(InputOutcome::TestComplete);
            }
        }

        if self.line_index + 1 < self.lines.len() {
            self.line_index += 1;
            self.typed.clear();
            self.mistakes.clear();
            return Some(InputOutcome::LineCompleted);
        }

        match self.mode {
            Mode::Unlimited => {
                self.finish();
                Some(InputOutcome::TestComplete)
            }
            Mode::TimedSprint { .. } | Mode::WordSprint { .. } => {
                let next = self.library.paragraph();
                tracing::debug!("paragraph exhausted, drawing another");
                self.load_paragraph(next);
                Some(InputOutcome::LineCompleted)
            }
        }
    }

    /// Stops the clock. A partly typed line is kept for the review; a line
    /// that was just recorded by the completion check is not added twice.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.timer.update(self.clock.now(), self.mode);
        if !self.typed.is_empty() && self.typed.len() < self.current_line().len() {
            self.completed.push(CompletedLine {
                target: self.current_line().clone(),
                typed: self.typed.iter().collect(),
                mistakes: self.mistakes.clone(),
            });
        }
        self.finished = true;
    }

    pub fn final_metrics(&self) -> FinalMetrics {
        final_metrics(
            self.mode,
            self.counters.total_chars_typed,
            self.counters.total_mistakes,
            self.timer.elapsed_secs,
        )
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn paragraph(&self) -> &str {
        &self.paragraph
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn current_line_index(&self) -> usize {
        self.line_index
    }

    pub fn current_line(&self) -> &Line {
        &self.lines[self.line_index]
    }

    /// Lines after the active one, for previews.
    pub fn upcoming_lines(&self) -> &[Line] {
        &self.lines[self.line_index + 1..]
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn mistake_positions(&self) -> &BTreeSet<usize> {
        &self.mistakes
    }

    pub fn completed_lines(&self) -> &[CompletedLine] {
        &self.completed
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    pub fn live(&self) -> LiveMetrics {
        self.live
    }

    pub fn has_started(&self) -> bool {
        self.timer.started_at.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Words still needed in a word sprint.
    pub fn words_left(&self) -> Option<usize> {
        self.mode
            .word_target()
            .map(|target| target.saturating_sub(self.counters.total_words_typed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::text::Corpus;
    use assert_matches::assert_matches;

    const TEN_WORDS: &str = "one two three four five six seven eight nine ten";

    fn library(paragraph: &str) -> Arc<dyn TextLibrary> {
        Arc::new(Corpus::new(vec!["phrase".into()], vec![paragraph.into()]))
    }

    fn session(mode: Mode, paragraph: &str) -> (TypingSession, ManualClock) {
        let clock = ManualClock::new();
        let s = TypingSession::new(
            mode,
            paragraph.to_string(),
            10,
            library(paragraph),
            Arc::new(clock.clone()),
        );
        (s, clock)
    }

    fn type_str(s: &mut TypingSession, text: &str) -> InputOutcome {
        let mut last = InputOutcome::Ignored;
        for c in text.chars() {
            last = s.handle_input(c);
        }
        last
    }

    #[test]
    fn new_session_starts_on_first_line() {
        let (s, _) = session(Mode::Unlimited, "a b c");
        assert_eq!(s.current_line().as_str(), "a b c");
        assert_eq!(s.current_line_index(), 0);
        assert!(!s.has_started());
        assert!(!s.is_finished());
        assert_eq!(s.counters(), Counters::default());
    }

    #[test]
    fn leading_space_is_discarded() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        assert_eq!(s.handle_input(' '), InputOutcome::Ignored);
        assert!(s.typed().is_empty());
        assert!(s.mistake_positions().is_empty());
        assert_eq!(s.counters().total_chars_typed, 0);
        assert!(!s.has_started());
    }

    #[test]
    fn first_character_starts_timer() {
        let (mut s, clock) = session(Mode::Unlimited, "cat sat");
        clock.advance_secs(5.0);
        s.handle_input('c');
        assert!(s.has_started());
        clock.advance_secs(2.0);
        s.handle_input('a');
        assert!((s.timer().elapsed_secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn correct_and_incorrect_characters() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        assert_eq!(s.handle_input('c'), InputOutcome::Typed { correct: true });
        assert_eq!(s.handle_input('x'), InputOutcome::Typed { correct: false });
        assert_eq!(s.typed_text(), "cx");
        assert_eq!(s.counters().total_chars_typed, 2);
        assert_eq!(s.counters().total_mistakes, 1);
        assert!(s.mistake_positions().contains(&1));
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_no_op() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        for _ in 0..5 {
            assert!(!s.handle_backspace());
        }
        assert!(s.typed().is_empty());
        assert_eq!(s.counters(), Counters::default());
    }

    #[test]
    fn backspace_keeps_mistakes_and_counters() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        type_str(&mut s, "cx");
        assert!(s.handle_backspace());
        assert_eq!(s.typed_text(), "c");
        assert!(s.mistake_positions().contains(&1));
        assert_eq!(s.counters().total_chars_typed, 2);
        assert_eq!(s.counters().total_mistakes, 1);
    }

    #[test]
    fn mistake_recorded_once_per_offset() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        s.handle_input('x');
        s.handle_backspace();
        s.handle_input('y');
        s.handle_backspace();
        s.handle_input('c');
        assert_eq!(s.counters().total_mistakes, 1);
        assert_eq!(s.mistake_positions().len(), 1);
        // Retyping correctly does not clear the mark.
        assert!(s.mistake_positions().contains(&0));
    }

    #[test]
    fn streaks_reset_on_mistake_and_track_best() {
        let (mut s, _) = session(Mode::Unlimited, "abcdef ghi");
        let mut best_seen = 0;
        for c in "abcxe".chars() {
            s.handle_input(c);
            let counters = s.counters();
            assert!(counters.best_streak >= best_seen);
            assert!(counters.best_streak >= counters.current_streak);
            best_seen = counters.best_streak;
        }
        assert_eq!(s.counters().current_streak, 1);
        assert_eq!(s.counters().best_streak, 3);
    }

    #[test]
    fn line_completion_advances_and_records_history() {
        let (mut s, _) = session(Mode::Unlimited, &format!("{TEN_WORDS} eleven twelve"));
        s.handle_input('x');
        s.handle_backspace();
        let outcome = type_str(&mut s, TEN_WORDS);

        assert_eq!(outcome, InputOutcome::LineCompleted);
        assert_eq!(s.completed_lines().len(), 1);
        let done = &s.completed_lines()[0];
        assert_eq!(done.target.as_str(), TEN_WORDS);
        assert_eq!(done.typed, TEN_WORDS);
        assert!(done.mistakes.contains(&0));

        assert_eq!(s.current_line_index(), 1);
        assert_eq!(s.current_line().as_str(), "eleven twelve");
        assert!(s.typed().is_empty());
        assert!(s.mistake_positions().is_empty());
        assert_eq!(s.counters().total_words_typed, 10);
    }

    #[test]
    fn space_after_line_end_is_not_a_mistake() {
        let (mut s, _) = session(Mode::Unlimited, &format!("{TEN_WORDS} eleven"));
        type_str(&mut s, TEN_WORDS);
        assert_eq!(s.handle_input(' '), InputOutcome::Ignored);
        type_str(&mut s, "eleven");
        assert_eq!(s.counters().total_mistakes, 0);
    }

    #[test]
    fn unlimited_completes_when_paragraph_is_exhausted() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        assert_eq!(type_str(&mut s, "cat sat"), InputOutcome::TestComplete);
        assert!(s.is_finished());
        assert_eq!(s.handle_input('x'), InputOutcome::Ignored);
        assert_eq!(s.completed_lines().len(), 1);
    }

    #[test]
    fn word_sprint_completes_at_target() {
        let paragraph = [TEN_WORDS; 4].join(" ");
        let (mut s, clock) = session(Mode::words(30), &paragraph);

        for i in 0..3 {
            clock.advance_secs(5.0);
            let outcome = type_str(&mut s, TEN_WORDS);
            if i < 2 {
                assert_eq!(outcome, InputOutcome::LineCompleted);
            } else {
                assert_eq!(outcome, InputOutcome::TestComplete);
            }
        }

        assert!(s.is_finished());
        assert_eq!(s.counters().total_words_typed, 30);
        assert_eq!(s.completed_lines().len(), 3);
        let result = s.final_metrics();
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(s.words_left(), Some(0));
    }

    #[test]
    fn word_sprint_draws_new_paragraph_before_target() {
        let (mut s, _) = session(Mode::words(30), TEN_WORDS);
        assert_eq!(type_str(&mut s, TEN_WORDS), InputOutcome::LineCompleted);
        assert!(!s.is_finished());
        assert_eq!(s.current_line_index(), 0);
        assert_eq!(s.current_line().as_str(), TEN_WORDS);
        assert_eq!(s.words_left(), Some(20));
    }

    #[test]
    fn timed_sprint_recycles_paragraphs() {
        let (mut s, _) = session(Mode::timed(30), "cat sat");
        assert_eq!(type_str(&mut s, "cat sat"), InputOutcome::LineCompleted);
        assert!(!s.is_finished());
        assert!(s.typed().is_empty());
        assert_eq!(s.current_line().as_str(), "cat sat");
    }

    #[test]
    fn timed_sprint_expires_on_tick() {
        let (mut s, clock) = session(Mode::timed(30), "cat sat on the mat");
        assert_eq!(s.handle_tick(), TickOutcome::Idle);

        type_str(&mut s, "cat");
        clock.advance_secs(10.0);
        assert_eq!(s.handle_tick(), TickOutcome::Updated);
        assert_eq!(s.timer().remaining_secs, Some(20.0));

        clock.advance_secs(20.1);
        assert_eq!(s.handle_tick(), TickOutcome::Expired);
        assert_eq!(s.timer().remaining_secs, Some(0.0));
        assert!(s.is_finished());
        assert_eq!(s.handle_tick(), TickOutcome::Idle);
    }

    #[test]
    fn ticks_do_not_expire_untimed_modes() {
        let (mut s, clock) = session(Mode::Unlimited, "cat sat");
        s.handle_input('c');
        clock.advance_secs(600.0);
        assert_eq!(s.handle_tick(), TickOutcome::Updated);
        assert!(!s.is_finished());
        assert!((s.timer().elapsed_secs - 600.0).abs() < 1e-6);
    }

    #[test]
    fn live_metrics_follow_keystrokes() {
        let (mut s, clock) = session(Mode::Unlimited, "abcdefghij klm");
        s.handle_input('a');
        assert_eq!(s.live().wpm, 0.0);
        clock.advance_secs(6.0);
        type_str(&mut s, "bcdxfghij");
        // 10 chars = 2 words in 0.1 minutes
        assert!((s.live().wpm - 20.0).abs() < 1e-9);
        assert_eq!(s.live().accuracy, 90.0);
    }

    #[test]
    fn finish_keeps_partial_line_for_review() {
        let (mut s, _) = session(Mode::timed(30), "cat sat");
        type_str(&mut s, "ca");
        s.finish();
        assert_eq!(s.completed_lines().len(), 1);
        assert_eq!(s.completed_lines()[0].typed, "ca");
        // Idempotent
        s.finish();
        assert_eq!(s.completed_lines().len(), 1);
    }

    #[test]
    fn history_entries_are_copies() {
        let (mut s, _) = session(Mode::Unlimited, &format!("{TEN_WORDS} more"));
        type_str(&mut s, TEN_WORDS);
        s.handle_input('x');
        assert!(s.completed_lines()[0].mistakes.is_empty());
        assert!(s.mistake_positions().contains(&0));
    }

    #[test]
    fn restart_reuses_paragraph_with_fresh_counters() {
        let (mut s, _) = session(Mode::Unlimited, "cat sat");
        let s = {
            s.handle_input('c');
            s.restart()
        };
        assert_eq!(s.paragraph(), "cat sat");
        assert_eq!(s.counters(), Counters::default());
        assert!(!s.has_started());
    }

    #[test]
    fn empty_paragraph_draws_replacement() {
        let clock = ManualClock::new();
        let s = TypingSession::new(
            Mode::Unlimited,
            "   ".into(),
            10,
            library("replacement text"),
            Arc::new(clock),
        );
        assert_eq!(s.current_line().as_str(), "replacement text");
    }

    #[test]
    fn line_width_follows_configuration() {
        let clock = ManualClock::new();
        let s = TypingSession::new(
            Mode::Unlimited,
            "a b c d e".into(),
            2,
            library("a b c d e"),
            Arc::new(clock),
        );
        assert_eq!(s.lines().len(), 3);
        assert_eq!(s.upcoming_lines().len(), 2);
        assert_matches!(s.mode(), Mode::Unlimited);
    }
}
