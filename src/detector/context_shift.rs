//! Context / role shift detector.

use super::{DetectMeta, Detector, PatternMatcher, PatternSet};
use crate::error::Result;
use crate::patterns::PatternKind;
use crate::types::{Detection, Severity};

/// Score hint for context-shift matches
pub const CONTEXT_SHIFT_SCORE: f64 = 14.0;

/// Flags persona reassignment and system-prompt extraction phrasings.
#[derive(Debug, Clone)]
pub struct ContextShiftDetector {
    matcher: PatternMatcher,
}

impl Default for ContextShiftDetector {
    fn default() -> Self {
        Self::with_set(PatternSet::preset(PatternKind::ContextShift))
    }
}

impl ContextShiftDetector {
    /// Detector over the preset context-shift table
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
                CONTEXT_SHIFT_SCORE,
                "Context/role shift attempt detected",
            ),
        }
    }

    /// Active patterns
    pub fn patterns(&self) -> &PatternSet {
        &self.matcher.patterns
    }
}

impl Detector for ContextShiftDetector {
    fn name(&self) -> &str {
        "ContextShiftDetector"
    }

    fn detect(&self, text: &str, _meta: &DetectMeta<'_>) -> Vec<Detection> {
        self.matcher.run(text)
    }
}
