use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

static TEXT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

pub const DEFAULT_WORDS_PER_LINE: usize = 10;

/// Used only if the embedded corpus itself is unusable.
const LAST_RESORT: &str = "The quick brown fox jumps over the lazy dog";

/// Source of practice content.
pub trait TextLibrary: Send + Sync {
    /// A short phrase; never empty.
    fn phrase(&self) -> String;
    /// A paragraph with at least one word.
    fn paragraph(&self) -> String;
}

/// One chunk of a paragraph, the unit of typing progress.
///
/// Stored as code points so offsets line up with typed characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    chars: Vec<char>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn starts_with_space(&self) -> bool {
        self.chars.first() == Some(&' ')
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Greedy word-count chunking; the last line may be shorter.
pub fn split_lines(paragraph: &str, max_words_per_line: usize) -> Vec<Line> {
    let per_line = max_words_per_line.max(1);
    paragraph
        .split_whitespace()
        .collect::<Vec<_>>()
        .chunks(per_line)
        .map(|words| Line::new(words.join(" ")))
        .collect()
}

/// Phrases and paragraphs, either embedded in the binary or read from a
/// `{"phrases": [...], "paragraphs": [...]}` JSON file.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Corpus {
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl Corpus {
    pub fn new(phrases: Vec<String>, paragraphs: Vec<String>) -> Self {
        Self {
            phrases,
            paragraphs,
        }
    }

    /// The set compiled into the binary.
    pub fn builtin() -> Self {
        let parsed = TEXT_DIR
            .get_file("default.json")
            .and_then(|f| f.contents_utf8())
            .ok_or_else(|| Error::EmptyCorpus("embedded default.json missing".into()))
            .and_then(Self::parse);

        match parsed {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::error!("embedded corpus unusable: {e}");
                Self::new(vec![LAST_RESORT.into()], vec![LAST_RESORT.into()])
            }
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        let mut corpus: Corpus = serde_json::from_str(json)?;
        corpus.phrases.retain(|p| !p.trim().is_empty());
        corpus.paragraphs.retain(|p| !p.trim().is_empty());

        // Partial files are rejected as a whole.
        if corpus.phrases.is_empty() || corpus.paragraphs.is_empty() {
            return Err(Error::EmptyCorpus(
                "both phrases and paragraphs must be non-empty".into(),
            ));
        }
        Ok(corpus)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::parse(&data)
    }

    /// Reads `path` if given, falling back to the built-in set on any failure.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        match Self::load(path) {
            Ok(corpus) => {
                tracing::info!(
                    path = %path.display(),
                    paragraphs = corpus.paragraphs.len(),
                    "loaded practice texts"
                );
                corpus
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "using built-in texts: {e}");
                Self::builtin()
            }
        }
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TextLibrary for Corpus {
    fn phrase(&self) -> String {
        self.phrases
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| LAST_RESORT.to_string())
    }

    fn paragraph(&self) -> String {
        self.paragraphs
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| LAST_RESORT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_corpus_still_yields_text() {
        let corpus = Corpus::new(vec![], vec![]);
        assert_eq!(corpus.paragraph(), LAST_RESORT);
        assert_eq!(corpus.phrase(), LAST_RESORT);
    }

    #[test]
    fn split_greedy_by_word_count() {
        let lines = split_lines("a b c d e f g", 3);
        let texts: Vec<&str> = lines.iter().map(Line::as_str).collect();
        assert_eq!(texts, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn split_collapses_whitespace() {
        let lines = split_lines("  one\ttwo \n three  ", 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_str(), "one two three");
    }

    #[test]
    fn split_empty_paragraph_yields_no_lines() {
        assert!(split_lines("   ", 10).is_empty());
    }

    #[test]
    fn split_zero_width_is_one_word_per_line() {
        assert_eq!(split_lines("a b", 0).len(), 2);
    }

    #[test]
    fn line_counts_code_points() {
        let line = Line::new("héllo wörld");
        assert_eq!(line.len(), 11);
        assert_eq!(line.char_at(1), Some('é'));
        assert_eq!(line.word_count(), 2);
        assert!(!line.starts_with_space());
        assert!(Line::new(" x").starts_with_space());
    }

    #[test]
    fn builtin_corpus_is_usable() {
        let corpus = Corpus::builtin();
        assert!(!corpus.phrases.is_empty());
        assert!(!corpus.paragraphs.is_empty());
        assert!(!corpus.paragraph().trim().is_empty());
        assert!(!corpus.phrase().is_empty());
    }

    #[test]
    fn parse_rejects_partial_corpus() {
        let err = Corpus::parse(r#"{"phrases": ["hi"], "paragraphs": []}"#);
        assert!(matches!(err, Err(Error::EmptyCorpus(_))));

        let err = Corpus::parse(r#"{"paragraphs": ["some text"]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(matches!(Corpus::parse("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"phrases": ["short one"], "paragraphs": ["only paragraph here"]}}"#
        )
        .unwrap();

        let corpus = Corpus::load_or_builtin(Some(file.path()));
        assert_eq!(corpus.paragraph(), "only paragraph here");
        assert_eq!(corpus.phrase(), "short one");
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::load_or_builtin(Some(dir.path().join("nope.json").as_path()));
        assert_eq!(corpus, Corpus::builtin());
    }
}
