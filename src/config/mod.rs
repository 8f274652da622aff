//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`PROMPT_GUARD_*`)
//! - CLI arguments (for the `prompt-guard` binary)
//!
//! Every section is optional; missing keys fall back to the defaults of the
//! default guard, so `Config::default().build_scanner()` is equivalent to
//! [`crate::default_guard`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detector::{
    ComplexityDetector, ComplexityOptions, ContextShiftDetector, Detector, InjectionDetector,
    KeywordDetector, ToolInjectionDetector,
};
use crate::error::{GuardError, Result};
use crate::patterns::{DEFAULT_KEYWORD_SCORE, KEYWORD_LITERALS, KEYWORD_REGEXES};
use crate::scanner::{Scanner, DEFAULT_MAX_EXTERNAL, DEFAULT_MAX_INPUT_LENGTH};
use crate::scorer::{Scorer, SeverityWeights};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scanner limits
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Scoring weights and factors
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Keyword detector entries
    #[serde(default)]
    pub keyword: KeywordConfig,

    /// Complexity detector thresholds
    #[serde(default)]
    pub complexity: ComplexityOptions,

    /// Pattern list overrides for the regex detectors
    #[serde(default)]
    pub patterns: PatternOverrides,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;

        toml::from_str(&content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/prompt-guard/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prompt-guard").join("config.toml"))
    }

    /// Load the default config file if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path)?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PROMPT_GUARD_*` environment variables on top of `self`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed::<usize>(&lookup, "PROMPT_GUARD_MAX_INPUT_LENGTH") {
            self.scanner.max_input_length = v;
        }
        if let Some(v) = parsed::<usize>(&lookup, "PROMPT_GUARD_MAX_EXTERNAL") {
            self.scanner.max_external = v;
        }
        if let Some(v) = parsed::<f64>(&lookup, "PROMPT_GUARD_ENTROPY_THRESHOLD") {
            self.complexity.entropy_threshold = v;
        }
        if let Some(v) = parsed::<f64>(&lookup, "PROMPT_GUARD_SYMBOL_THRESHOLD") {
            self.complexity.symbol_threshold = v;
        }
        if let Some(v) = parsed::<f64>(&lookup, "PROMPT_GUARD_KEYWORD_SCORE") {
            self.keyword.score = v;
        }

        self
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check limits and thresholds
    pub fn validate(&self) -> Result<()> {
        fn finite_non_negative(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(GuardError::Config(format!(
                    "{name} must be a finite, non-negative number (got {v})"
                )))
            }
        }

        if self.scanner.max_input_length == 0 {
            return Err(GuardError::Config(
                "scanner.max_input_length must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.complexity.symbol_threshold) {
            return Err(GuardError::Config(format!(
                "complexity.symbol_threshold must be within 0.0-1.0 (got {})",
                self.complexity.symbol_threshold
            )));
        }
        if self.complexity.repeat_run < 2 {
            return Err(GuardError::Config(format!(
                "complexity.repeat_run must be at least 2 (got {})",
                self.complexity.repeat_run
            )));
        }
        finite_non_negative("complexity.entropy_threshold", self.complexity.entropy_threshold)?;
        finite_non_negative("keyword.score", self.keyword.score)?;

        let w = &self.scoring.weights;
        for (name, v) in [
            ("scoring.weights.low", w.low),
            ("scoring.weights.medium", w.medium),
            ("scoring.weights.high", w.high),
            ("scoring.weights.critical", w.critical),
            ("scoring.external_factor", self.scoring.external_factor),
            ("scoring.trust_discount", self.scoring.trust_discount),
        ] {
            finite_non_negative(name, v)?;
        }

        Ok(())
    }

    /// Build the configured detectors, in default-guard order
    pub fn build_detectors(&self) -> Result<Vec<Box<dyn Detector>>> {
        let keyword = KeywordDetector::from_lists(
            &self.keyword.literals,
            &self.keyword.regexes,
            self.keyword.score,
        )?;

        let injection = match &self.patterns.injection {
            Some(list) => InjectionDetector::with_patterns(list)?,
            None => InjectionDetector::new(),
        };
        let context_shift = match &self.patterns.context_shift {
            Some(list) => ContextShiftDetector::with_patterns(list)?,
            None => ContextShiftDetector::new(),
        };
        let tool = match &self.patterns.tool {
            Some(list) => ToolInjectionDetector::with_patterns(list)?,
            None => ToolInjectionDetector::new(),
        };

        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(keyword),
            Box::new(injection),
            Box::new(context_shift),
            Box::new(tool),
            Box::new(ComplexityDetector::with_options(self.complexity)),
        ];
        Ok(detectors)
    }

    /// Validate and build a scanner
    pub fn build_scanner(&self) -> Result<Scanner> {
        self.validate()?;
        Ok(Scanner::builder()
            .detectors(self.build_detectors()?)
            .scorer(self.scoring.scorer())
            .max_input_length(self.scanner.max_input_length)
            .max_external(self.scanner.max_external)
            .build())
    }
}

/// Scanner limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Maximum chars scanned per text
    pub max_input_length: usize,

    /// Maximum external fragments scanned per call
    pub max_external: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            max_external: DEFAULT_MAX_EXTERNAL,
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier when any finding is external
    pub external_factor: f64,

    /// Multiplier for `trust_level = "high"` contexts
    pub trust_discount: f64,

    /// Severity weight table
    pub weights: SeverityWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let scorer = Scorer::default();
        Self {
            external_factor: scorer.external_factor,
            trust_discount: scorer.trust_discount,
            weights: scorer.weights,
        }
    }
}

impl ScoringConfig {
    /// Scorer with these settings
    pub fn scorer(&self) -> Scorer {
        Scorer {
            weights: self.weights,
            external_factor: self.external_factor,
            trust_discount: self.trust_discount,
        }
    }
}

/// Keyword detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Case-insensitive substrings
    pub literals: Vec<String>,

    /// Regexes, matched as written
    pub regexes: Vec<String>,

    /// Score hint for every keyword hit
    pub score: f64,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            literals: KEYWORD_LITERALS.iter().map(|s| (*s).to_string()).collect(),
            regexes: KEYWORD_REGEXES.iter().map(|s| (*s).to_string()).collect(),
            score: DEFAULT_KEYWORD_SCORE,
        }
    }
}

/// Replacement pattern lists; `None` keeps the preset table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOverrides {
    /// Injection detector patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injection: Option<Vec<String>>,

    /// Context-shift detector patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_shift: Option<Vec<String>>,

    /// Tool-injection detector patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Vec<String>>,
}
