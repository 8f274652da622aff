//! Deterministic risk scoring.
//!
//! ```text
//! base  = Σ weight(severity) × score_hint
//! score = clamp(round(base × external × trust), 0, 100)
//! ```
//!
//! - `external` = 1.15 when any finding came from an external fragment
//! - `trust`    = 0.8 when the context carries `trust_level == "high"`

use serde::{Deserialize, Serialize};

use crate::types::{Finding, RiskLevel, ScanContext, Severity};

/// Upper bound of every score
pub const MAX_SCORE: u32 = 100;

/// Maps findings to a numeric score and a risk level.
pub trait RiskScorer: Send + Sync {
    /// Score in `[0, 100]`
    fn score(&self, findings: &[Finding], context: &ScanContext) -> u32;

    /// Risk level of a score
    fn level(&self, score: u32) -> RiskLevel {
        RiskLevel::from_score(score)
    }
}

/// Multipliers converting a severity label into a score contribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    /// Weight of `low`
    pub low: f64,
    /// Weight of `medium`
    pub medium: f64,
    /// Weight of `high`
    pub high: f64,
    /// Weight of `critical`
    pub critical: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: 1.0,
            medium: 3.0,
            high: 6.0,
            critical: 8.0,
        }
    }
}

impl SeverityWeights {
    /// Weight for a severity
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

/// Built-in scorer
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer {
    /// Severity weight table
    pub weights: SeverityWeights,
    /// Multiplier applied when any finding is external
    pub external_factor: f64,
    /// Multiplier applied for trusted channels
    pub trust_discount: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            weights: SeverityWeights::default(),
            external_factor: 1.15,
            trust_discount: 0.8,
        }
    }
}

impl Scorer {
    /// Scorer with default weights and factors
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the severity weight table
    pub fn with_weights(mut self, weights: SeverityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Unrounded, unclamped score
    pub fn raw_score(&self, findings: &[Finding], context: &ScanContext) -> f64 {
        let base: f64 = findings
            .iter()
            .map(|f| self.weights.weight(f.severity) * f.score)
            .sum();

        let external = if findings.iter().any(Finding::is_external) {
            self.external_factor
        } else {
            1.0
        };
        let trust = if context.is_trusted() {
            self.trust_discount
        } else {
            1.0
        };

        base * external * trust
    }
}

impl RiskScorer for Scorer {
    fn score(&self, findings: &[Finding], context: &ScanContext) -> u32 {
        if findings.is_empty() {
            return 0;
        }
        let raw = self.raw_score(findings, context);
        if raw.is_nan() {
            return 0;
        }
        raw.round().clamp(0.0, f64::from(MAX_SCORE)) as u32
    }
}
