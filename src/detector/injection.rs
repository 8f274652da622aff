//! Injection / jailbreak phrase detector.

use super::{DetectMeta, Detector, PatternMatcher, PatternSet};
use crate::error::Result;
use crate::patterns::PatternKind;
use crate::types::{Detection, Severity};

/// Score hint for injection phrase matches
pub const INJECTION_SCORE: f64 = 16.0;

/// Matches known injection phrasings, role markers and inline tool-call
/// JSON shapes. One high-severity detection per matching pattern.
#[derive(Debug, Clone)]
pub struct InjectionDetector {
    matcher: PatternMatcher,
}

impl Default for InjectionDetector {
    fn default() -> Self {
        Self::with_set(PatternSet::preset(PatternKind::Injection))
    }
}

impl InjectionDetector {
    /// Detector over the preset injection table
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector over caller-supplied patterns (compiled case-insensitively)
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_set(PatternSet::compile(patterns, true)?))
    }

    fn with_set(set: PatternSet) -> Self {
        Self {
            matcher: PatternMatcher::new(
                set,
                Severity::High,
                INJECTION_SCORE,
                "Likely prompt-injection phrase matched",
            ),
        }
    }

    /// Active patterns
    pub fn patterns(&self) -> &PatternSet {
        &self.matcher.patterns
    }
}

impl Detector for InjectionDetector {
    fn name(&self) -> &str {
        "InjectionDetector"
    }

    fn detect(&self, text: &str, _meta: &DetectMeta<'_>) -> Vec<Detection> {
        self.matcher.run(text)
    }
}
