//! Removal of ISBD punctuation.
//!
//! MARC records transcribe the ISBD (International Standard Bibliographic
//! Description) punctuation that separates the areas and elements of a
//! description, e.g. `Symmetry through the eyes of a chemist /` or
//! `Springer,`. A citation only wants the element itself, but a final period
//! can just as well belong to the text (`Hargittai, I.`, `3rd ed.`,
//! `Doe, John, Jr.`), so the trailing mark is removed only when the tail of
//! the text does not look like one of those protected patterns.
//!
//! # Example
//!
//! ```
//! use marc2bib::punctuation::{remove_isbd_punctuation, Normalizer};
//!
//! assert_eq!(remove_isbd_punctuation("Symmetry through the eyes of a chemist /", false),
//!            "Symmetry through the eyes of a chemist");
//! assert_eq!(remove_isbd_punctuation("Jane Doe, Sr.", false), "Jane Doe, Sr.");
//! assert_eq!(remove_isbd_punctuation("[Princeton] :", true), "Princeton");
//!
//! let normalizer = Normalizer::new().with_abbreviations(["ca."]);
//! assert_eq!(normalizer.normalize("ca.", false), "ca.");
//! ```

use crate::regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters ending an ISBD area or element.
pub const TERMINAL_CHARS: &str = ".,:;+=/";

/// Abbreviations whose final period is kept.
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "co.", "ed.", "eds.", "et al.", "v.", "vol.", "vols.", "inc.", "p.",
];

static SPACED_TERMINAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[.,:;+=/]$").unwrap());

static TERMINAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,:;+=/]$").unwrap());

static NAME_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[JS]r\.$").unwrap());

static INITIAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]\.$").unwrap());

static ORDINAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9](st|nd|rd|th)\.$").unwrap());

static ELLIPSIS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^[:space:][:punct:]]\.{3}$").unwrap());

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::new);

/// Removes trailing ISBD punctuation using [`DEFAULT_ABBREVIATIONS`].
///
/// With `strip_brackets`, text fully enclosed in square brackets (the
/// cataloger's mark for supplied text) loses the outer pair.
pub fn remove_isbd_punctuation(text: &str, strip_brackets: bool) -> String {
    DEFAULT_NORMALIZER.normalize(text, strip_brackets)
}

/// Trailing punctuation remover with a configurable abbreviation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    /// Lowercase abbreviations matched against the end of the text.
    abbreviations: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Creates a normalizer protecting [`DEFAULT_ABBREVIATIONS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_abbreviation_list(DEFAULT_ABBREVIATIONS.iter().copied())
    }

    /// Creates a normalizer protecting exactly the given abbreviations.
    #[must_use]
    pub fn with_abbreviation_list<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            abbreviations: abbreviations
                .into_iter()
                .map(|abbr| abbr.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Adds abbreviations to the protected list.
    #[must_use]
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|abbr| abbr.as_ref().to_lowercase()),
        );
        self
    }

    pub fn abbreviations(&self) -> &[String] {
        &self.abbreviations
    }

    /// Removes trailing ISBD punctuation from `text`.
    ///
    /// A removal step is repeated until the text no longer changes, so the
    /// result is stable under another call.
    pub fn normalize(&self, text: &str, strip_brackets: bool) -> String {
        let mut value = if strip_brackets {
            strip_outer_square_brackets(text).to_string()
        } else {
            text.to_string()
        };

        loop {
            let next = self.remove_terminal(&value);
            if next == value {
                return value;
            }
            value = next;
        }
    }

    /// One removal step: drop a space-separated terminal mark, then a single
    /// terminal character unless the tail is protected.
    fn remove_terminal(&self, value: &str) -> String {
        let value = SPACED_TERMINAL_REGEX.replace(value, "");
        if self.is_protected(&value) {
            return value.into_owned();
        }
        let removed = TERMINAL_REGEX.replace(&value, "");
        if removed.len() == value.len() {
            removed.into_owned()
        } else {
            removed.trim_end().to_string()
        }
    }

    /// Whether the final period belongs to the text.
    pub fn is_protected(&self, value: &str) -> bool {
        if NAME_SUFFIX_REGEX.is_match(value)
            || INITIAL_REGEX.is_match(value)
            || ORDINAL_REGEX.is_match(value)
            || ELLIPSIS_REGEX.is_match(value)
        {
            return true;
        }

        let lowered = value.to_lowercase();
        self.abbreviations
            .iter()
            .any(|abbr| lowered.ends_with(abbr.as_str()))
    }
}

/// Strips one pair of square brackets enclosing the whole text.
///
/// The closing bracket may be followed by whitespace and one terminal
/// character (`[Princeton] :`). Text such as `[One] and [two]` is left alone
/// because its first bracket closes before the end.
pub fn strip_outer_square_brackets(value: &str) -> &str {
    let mut rest = value;
    if let Some(stripped) = rest.strip_suffix(|c: char| TERMINAL_CHARS.contains(c)) {
        rest = stripped;
    }
    let rest = rest.trim_end();

    let Some(inner) = rest
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return value;
    };

    if is_balanced(inner) { inner } else { value }
}

fn is_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => match depth.checked_sub(1) {
                Some(lower) => depth = lower,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
