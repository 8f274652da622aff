//! Keyword / substring detector.

use regex::Regex;

use super::{DetectMeta, Detector};
use crate::error::{GuardError, Result};
use crate::patterns::{DEFAULT_KEYWORD_SCORE, KEYWORD_LITERALS, KEYWORD_REGEXES};
use crate::types::{Detection, Severity, DEFAULT_SCORE_HINT};

/// A single keyword entry
#[derive(Debug, Clone)]
pub enum KeywordPattern {
    /// Case-insensitive substring (stored lowercased)
    Literal(String),
    /// Regex, matched as written
    Regex(Regex),
}

impl KeywordPattern {
    /// Literal entry
    pub fn literal(keyword: &str) -> Self {
        KeywordPattern::Literal(keyword.to_lowercase())
    }

    /// Regex entry
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(KeywordPattern::Regex)
            .map_err(|source| GuardError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    fn is_match(&self, text: &str, lowered: &str) -> bool {
        match self {
            KeywordPattern::Literal(needle) => lowered.contains(needle.as_str()),
            KeywordPattern::Regex(re) => re.is_match(text),
        }
    }
}

impl std::fmt::Display for KeywordPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordPattern::Literal(s) => write!(f, "\"{s}\""),
            KeywordPattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Emits one medium-severity detection per matching keyword.
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    patterns: Vec<KeywordPattern>,
    score: f64,
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            score: DEFAULT_SCORE_HINT,
        }
    }
}

impl KeywordDetector {
    /// Detector over explicit entries
    pub fn new(patterns: Vec<KeywordPattern>, score: f64) -> Self {
        let patterns = patterns
            .into_iter()
            .filter(|p| !matches!(p, KeywordPattern::Literal(s) if s.is_empty()))
            .collect();
        Self { patterns, score }
    }

    /// Build from literal and regex source lists
    pub fn from_lists<L, R>(literals: L, regexes: R, score: f64) -> Result<Self>
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut patterns: Vec<KeywordPattern> = literals
            .into_iter()
            .map(|l| KeywordPattern::literal(l.as_ref()))
            .collect();
        for r in regexes {
            patterns.push(KeywordPattern::regex(r.as_ref())?);
        }
        Ok(Self::new(patterns, score))
    }

    /// Built-in keyword list used by the default guard
    pub fn preset() -> Self {
        let mut patterns: Vec<KeywordPattern> = KEYWORD_LITERALS
            .iter()
            .map(|k| KeywordPattern::literal(k))
            .collect();
        patterns.extend(
            KEYWORD_REGEXES
                .iter()
                .filter_map(|r| KeywordPattern::regex(r).ok()),
        );
        Self::new(patterns, DEFAULT_KEYWORD_SCORE)
    }

    /// Configured entries
    pub fn patterns(&self) -> &[KeywordPattern] {
        &self.patterns
    }
}

impl Detector for KeywordDetector {
    fn name(&self) -> &str {
        "KeywordDetector"
    }

    fn detect(&self, text: &str, _meta: &DetectMeta<'_>) -> Vec<Detection> {
        if text.is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .filter(|p| p.is_match(text, &lowered))
            .map(|p| {
                Detection::new(
                    format!("Sensitive keyword/pattern matched: {p}"),
                    Severity::Medium,
                )
                .with_score(self.score)
                .with_meta("pattern", p.to_string())
            })
            .collect()
    }
}
