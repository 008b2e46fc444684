//! Words-per-minute and accuracy.
//!
//! A "word" is five typed characters everywhere except the word sprint's
//! final score, which uses the configured target.

use crate::mode::Mode;

const CHARS_PER_WORD: f64 = 5.0;

/// Live WPM; zero until time has passed.
pub fn live_wpm(total_chars: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (total_chars as f64 / CHARS_PER_WORD) / (elapsed_secs / 60.0)
}

/// Share of typed characters that were not recorded as mistakes, in percent.
pub fn live_accuracy(total_chars: usize, total_mistakes: usize) -> f64 {
    if total_chars == 0 {
        return 0.0;
    }
    let correct = total_chars.saturating_sub(total_mistakes);
    (correct as f64 / total_chars as f64 * 100.0).clamp(0.0, 100.0)
}

/// Snapshot recomputed after every accepted keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveMetrics {
    pub wpm: f64,
    pub accuracy: f64,
}

impl LiveMetrics {
    pub fn compute(total_chars: usize, total_mistakes: usize, elapsed_secs: f64) -> Self {
        Self {
            wpm: live_wpm(total_chars, elapsed_secs),
            accuracy: live_accuracy(total_chars, total_mistakes),
        }
    }
}

/// Score recorded once a test completes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinalMetrics {
    pub wpm: u32,
    /// Percent with one decimal place.
    pub accuracy: f64,
}

pub fn final_metrics(
    mode: Mode,
    total_chars: usize,
    total_mistakes: usize,
    elapsed_secs: f64,
) -> FinalMetrics {
    let typed_words = total_chars as f64 / CHARS_PER_WORD;
    let (words, minutes) = match mode {
        // The countdown always runs to its end.
        Mode::TimedSprint { duration } => (typed_words, duration.as_secs_f64() / 60.0),
        Mode::WordSprint { target_words } => (target_words as f64, elapsed_secs / 60.0),
        Mode::Unlimited => {
            let minutes = if elapsed_secs > 0.0 {
                elapsed_secs / 60.0
            } else {
                1.0
            };
            (typed_words, minutes)
        }
    };

    let wpm = if total_chars == 0 || minutes <= 0.0 {
        0
    } else {
        (words / minutes).max(0.0) as u32
    };

    FinalMetrics {
        wpm,
        accuracy: round_tenths(live_accuracy(total_chars, total_mistakes)),
    }
}

pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
