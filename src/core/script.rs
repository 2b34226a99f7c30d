//! "Is this text written in the target script" predicate.
//!
//! Literals that fail the predicate are never classified at all.

use regex::Regex;

/// Default target script: the basic Cyrillic letters `а-я` and `А-Я`.
///
/// `ё` and `Ё` sit outside these ranges and do not count on their own.
pub const DEFAULT_SCRIPT_PATTERN: &str = "[а-яА-Я]";

pub trait ScriptPredicate: Send + Sync {
    fn matches(&self, text: &str) -> bool;
}

impl<F> ScriptPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, text: &str) -> bool {
        self(text)
    }
}

/// Target script described by a regular expression; matches when the pattern
/// is found anywhere in the text.
#[derive(Debug, Clone)]
pub struct ScriptPattern {
    regex: Regex,
}

impl ScriptPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn cyrillic() -> Self {
        Self {
            regex: Regex::new(DEFAULT_SCRIPT_PATTERN).expect("default script pattern is valid"),
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for ScriptPattern {
    fn default() -> Self {
        Self::cyrillic()
    }
}

impl ScriptPredicate for ScriptPattern {
    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}
