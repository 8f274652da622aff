//! Core value types shared by detectors, the scorer and the scanner.
//!
//! A detector reports [`Detection`]s; the scanner tags each one with its
//! provenance (origin, external source label, detector name) to produce a
//! [`Finding`]. Findings are never mutated after creation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Score hint used when a detector does not choose one.
pub const DEFAULT_SCORE_HINT: f64 = 10.0;

/// Free-form contextual details attached to a detection (e.g. measured entropy).
pub type Meta = BTreeMap<String, Value>;

/// Qualitative severity of a single detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    /// Weak signal
    Low,
    /// Suspicious
    Medium,
    /// Likely attack
    High,
    /// Near-certain attack
    Critical,
}

impl Severity {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a label case-insensitively. Unknown labels map to `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        }
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the scanned text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Direct user input
    Input,
    /// Untrusted third-party content (tool output, retrieved documents)
    External,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Input => write!(f, "input"),
            Origin::External => write!(f, "external"),
        }
    }
}

/// Three-tier risk bucket derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// score < 25
    Low,
    /// 25 <= score < 60
    Medium,
    /// score >= 60
    High,
}

impl RiskLevel {
    /// Minimum score for `High`
    pub const HIGH_THRESHOLD: u32 = 60;
    /// Minimum score for `Medium`
    pub const MEDIUM_THRESHOLD: u32 = 25;

    /// Bucket a score
    pub fn from_score(score: u32) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Whether this level triggers the alert hook
    pub fn is_alerting(&self) -> bool {
        matches!(self, RiskLevel::Medium | RiskLevel::High)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Raw output of a detector, before the scanner attaches provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Human-readable description
    pub message: String,
    /// Severity label
    pub severity: Severity,
    /// Strength hint used by the scorer
    pub score: f64,
    /// Contextual details
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
}

impl Detection {
    /// Create a detection with the default score hint
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            score: DEFAULT_SCORE_HINT,
            meta: Meta::new(),
        }
    }

    /// Set the score hint
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Attach a meta entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A detection tagged with its provenance.
///
/// `source` is present exactly when `origin` is [`Origin::External`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Human-readable description
    pub message: String,
    /// Severity label
    pub severity: Severity,
    /// Strength hint used by the scorer
    pub score: f64,
    /// Primary input or external fragment
    pub origin: Origin,
    /// Label of the external fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Name of the producing detector
    pub detector: String,
    /// Contextual details
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
}

impl Finding {
    /// Tag a detection found in the primary input
    pub fn from_input(detection: Detection, detector: &str) -> Self {
        Self::tagged(detection, Origin::Input, None, detector)
    }

    /// Tag a detection found in an external fragment
    pub fn from_external(detection: Detection, source: &str, detector: &str) -> Self {
        Self::tagged(detection, Origin::External, Some(source.to_string()), detector)
    }

    fn tagged(
        detection: Detection,
        origin: Origin,
        source: Option<String>,
        detector: &str,
    ) -> Self {
        let Detection {
            message,
            severity,
            score,
            meta,
        } = detection;
        Self {
            message,
            severity,
            score,
            origin,
            source,
            detector: detector.to_string(),
            meta,
        }
    }

    /// Whether the finding came from an external fragment
    pub fn is_external(&self) -> bool {
        self.origin == Origin::External
    }
}

/// Caller-supplied scan context, passed read-only to detectors and the scorer.
///
/// Only `trust_level` is interpreted by the built-in scorer; any other
/// entries are carried through for custom detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanContext {
    /// Channel trust level; only the string `"high"` discounts the score
    #[serde(
        rename = "trustLevel",
        alias = "trust_level",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub trust_level: Option<Value>,
    /// Arbitrary extra metadata (user id, channel id, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScanContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trust level
    pub fn with_trust_level(mut self, level: impl Into<String>) -> Self {
        self.trust_level = Some(Value::String(level.into()));
        self
    }

    /// Add an extra entry
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up an extra entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// True when the caller marked the channel as highly trusted
    pub fn is_trusted(&self) -> bool {
        self.trust_level.as_ref().and_then(Value::as_str) == Some("high")
    }
}

/// Untrusted third-party text injected into the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFragment {
    /// Origin label (e.g. `url:123`, `tool:search`)
    pub source: String,
    /// Fragment body
    pub content: String,
}

impl ExternalFragment {
    /// Create a fragment
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label(" low "), Severity::Low);
        assert_eq!(Severity::from_label("critical"), Severity::Critical);
        assert_eq!(Severity::from_label("bogus"), Severity::Medium);
        assert_eq!(Severity::from_label(""), Severity::Medium);
    }

    #[test]
    fn test_severity_serde_is_lenient() {
        let sev: Severity = serde_json::from_str(r#""Extreme""#).unwrap();
        assert_eq!(sev, Severity::Medium);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), r#""high""#);
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(24), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
        assert!(RiskLevel::Low < RiskLevel::Medium && RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("Medium".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_finding_provenance() {
        let det = Detection::new("x", Severity::Low).with_meta("k", 1);
        let input = Finding::from_input(det.clone(), "D");
        assert_eq!(input.origin, Origin::Input);
        assert!(input.source.is_none());
        assert_eq!(input.meta.get("k"), Some(&Value::from(1)));

        let ext = Finding::from_external(det, "url:1", "D");
        assert!(ext.is_external());
        assert_eq!(ext.source.as_deref(), Some("url:1"));
        assert_eq!(ext.detector, "D");
    }

    #[test]
    fn test_detection_default_score() {
        let det = Detection::new("x", Severity::High);
        assert!((det.score - DEFAULT_SCORE_HINT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_context_trust() {
        assert!(!ScanContext::new().is_trusted());
        assert!(ScanContext::new().with_trust_level("high").is_trusted());
        assert!(!ScanContext::new().with_trust_level("High").is_trusted());

        let ctx: ScanContext =
            serde_json::from_str(r#"{"trustLevel":"high","channel":"ops"}"#).unwrap();
        assert!(ctx.is_trusted());
        assert_eq!(ctx.get("channel"), Some(&Value::from("ops")));
    }

    #[test]
    fn test_context_non_string_trust_level() {
        for raw in [
            r#"{"trustLevel":true}"#,
            r#"{"trustLevel":3,"channel":"ops"}"#,
            r#"{"trustLevel":{"level":"high"}}"#,
            r#"{"trustLevel":null}"#,
        ] {
            let ctx: ScanContext = serde_json::from_str(raw).unwrap();
            assert!(!ctx.is_trusted(), "{raw}");
        }

        let ctx: ScanContext = serde_json::from_str(r#"{"trust_level":"high"}"#).unwrap();
        assert!(ctx.is_trusted());
    }
}
