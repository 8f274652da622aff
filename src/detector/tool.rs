//! Tool / function-call injection detector.

use super::{DetectMeta, Detector, PatternMatcher, PatternSet};
use crate::error::Result;
use crate::patterns::PatternKind;
use crate::types::{Detection, Severity};

/// Score hint for tool-injection matches
pub const TOOL_SCORE: f64 = 15.0;

/// Targets structured tool-call payloads (`function_call`, `tool_calls`,
/// shell-flavoured `arguments`) and natural-language tool invocations.
#[derive(Debug, Clone)]
pub struct ToolInjectionDetector {
    matcher: PatternMatcher,
}

impl Default for ToolInjectionDetector {
    fn default() -> Self {
        Self::with_set(PatternSet::preset(PatternKind::Tool))
    }
}

impl ToolInjectionDetector {
    /// Detector over the preset tool table
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
                TOOL_SCORE,
                "Tool/function-call injection detected",
            ),
        }
    }

    /// Active patterns
    pub fn patterns(&self) -> &PatternSet {
        &self.matcher.patterns
    }
}

impl Detector for ToolInjectionDetector {
    fn name(&self) -> &str {
        "ToolInjectionDetector"
    }

    fn detect(&self, text: &str, _meta: &DetectMeta<'_>) -> Vec<Detection> {
        self.matcher.run(text)
    }
}
