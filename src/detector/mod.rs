//! Detectors: independent heuristics that turn a text fragment into
//! zero or more [`Detection`]s.
//!
//! | Detector                  | Method                          | Severity | Score |
//! |---------------------------|---------------------------------|----------|-------|
//! | [`KeywordDetector`]       | literal substrings + regexes    | Medium   | 10*   |
//! | [`InjectionDetector`]     | injection / jailbreak regexes   | High     | 16    |
//! | [`ContextShiftDetector`]  | role / persona override regexes | High     | 14    |
//! | [`ToolInjectionDetector`] | tool-call payload regexes       | High     | 15    |
//! | [`ComplexityDetector`]    | entropy, symbols, runs, zero-width | Low-High | 8-18 |
//!
//! \* configurable at construction.
//!
//! Detectors are stateless after construction, never mutate their input
//! and return an empty vector for empty input.

mod complexity;
mod context_shift;
mod injection;
mod keyword;
mod tool;

pub use complexity::{ComplexityDetector, ComplexityOptions};
pub use context_shift::ContextShiftDetector;
pub use injection::InjectionDetector;
pub use keyword::{KeywordDetector, KeywordPattern};
pub use tool::ToolInjectionDetector;

use regex::{Regex, RegexBuilder};

use crate::error::{GuardError, Result};
use crate::patterns::PatternKind;
use crate::types::{Detection, Origin, ScanContext, Severity};

/// Per-run metadata handed to every detector
#[derive(Debug, Clone, Copy)]
pub struct DetectMeta<'a> {
    /// Primary input or external fragment
    pub origin: Origin,
    /// External fragment label (only for `Origin::External`)
    pub source: Option<&'a str>,
    /// Caller-supplied context
    pub context: &'a ScanContext,
}

impl<'a> DetectMeta<'a> {
    /// Metadata for the primary input
    pub fn input(context: &'a ScanContext) -> Self {
        Self {
            origin: Origin::Input,
            source: None,
            context,
        }
    }

    /// Metadata for an external fragment
    pub fn external(source: &'a str, context: &'a ScanContext) -> Self {
        Self {
            origin: Origin::External,
            source: Some(source),
            context,
        }
    }
}

/// A heuristic that inspects a text fragment.
pub trait Detector: Send + Sync {
    /// Detector name, copied into every finding it produces
    fn name(&self) -> &str;

    /// Inspect `text`. Must not panic on empty or unusual input.
    fn detect(&self, text: &str, meta: &DetectMeta<'_>) -> Vec<Detection>;
}

/// Adapter turning a closure into a [`Detector`]
pub struct FnDetector<F> {
    name: String,
    f: F,
}

impl<F> FnDetector<F>
where
    F: Fn(&str, &DetectMeta<'_>) -> Vec<Detection> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Detector for FnDetector<F>
where
    F: Fn(&str, &DetectMeta<'_>) -> Vec<Detection> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, text: &str, meta: &DetectMeta<'_>) -> Vec<Detection> {
        (self.f)(text, meta)
    }
}

/// A compiled, named regex
#[derive(Debug, Clone)]
pub struct NamedPattern {
    /// Preset name, or the pattern source for caller-supplied entries
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
}

/// Ordered list of compiled patterns
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<NamedPattern>,
}

impl PatternSet {
    /// Preset table for `kind`
    pub fn preset(kind: PatternKind) -> Self {
        let entries = kind
            .compiled()
            .iter()
            .map(|(regex, pattern)| NamedPattern {
                name: pattern.name.to_string(),
                regex: regex.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Compile caller-supplied patterns, optionally forcing case-insensitivity
    pub fn compile<I, S>(patterns: I, case_insensitive: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = patterns
            .into_iter()
            .map(|p| {
                let source = p.as_ref();
                RegexBuilder::new(source)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map(|regex| NamedPattern {
                        name: source.to_string(),
                        regex,
                    })
                    .map_err(|source_err| GuardError::InvalidPattern {
                        pattern: source.to_string(),
                        source: source_err,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Patterns matching `text`, in list order
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a NamedPattern> + 'a {
        self.entries.iter().filter(move |p| p.regex.is_match(text))
    }

    /// Iterate all patterns
    pub fn iter(&self) -> std::slice::Iter<'_, NamedPattern> {
        self.entries.iter()
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no patterns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared engine of the regex-list detectors: one detection per matching
/// pattern, all with the same severity and score hint.
#[derive(Debug, Clone)]
pub(crate) struct PatternMatcher {
    pub(crate) patterns: PatternSet,
    severity: Severity,
    score: f64,
    label: &'static str,
}

impl PatternMatcher {
    pub(crate) fn new(
        patterns: PatternSet,
        severity: Severity,
        score: f64,
        label: &'static str,
    ) -> Self {
        Self {
            patterns,
            severity,
            score,
            label,
        }
    }

    pub(crate) fn run(&self, text: &str) -> Vec<Detection> {
        if text.is_empty() {
            return Vec::new();
        }
        self.patterns
            .matches(text)
            .map(|p| {
                Detection::new(format!("{}: {}", self.label, p.name), self.severity)
                    .with_score(self.score)
                    .with_meta("pattern", p.regex.as_str())
            })
            .collect()
    }
}
