//! Statistical / complexity detector.
//!
//! Looks for structural signs of obfuscation rather than phrasing:
//!
//! | Check                  | Trigger                            | Severity | Score |
//! |------------------------|------------------------------------|----------|-------|
//! | Shannon entropy        | > 5.0 bits/char and > 50 chars     | Medium   | 12    |
//! | Symbol ratio           | > 35% non-ASCII-alnum, non-space   | Low      | 8     |
//! | Repeated run           | 7+ identical consecutive chars     | Medium   | 10    |
//! | Zero-width / bidi      | U+200B..U+200F, U+202A..U+202E     | High     | 18    |
//!
//! Fragments shorter than 12 chars, and whitespace-only fragments, are
//! skipped entirely. Runs do not span line breaks. All lengths are counted
//! in chars, not bytes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{DetectMeta, Detector};
use crate::types::{Detection, Severity};

/// Thresholds for [`ComplexityDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityOptions {
    /// Entropy (bits/char) above which a fragment is flagged
    pub entropy_threshold: f64,
    /// Fragment must be longer than this for the entropy check
    pub entropy_min_length: usize,
    /// Symbol ratio (0.0 - 1.0) above which a fragment is flagged
    pub symbol_threshold: f64,
    /// Fragments shorter than this are not inspected
    pub min_length: usize,
    /// Minimum length of an identical-char run
    pub repeat_run: usize,
}

impl Default for ComplexityOptions {
    fn default() -> Self {
        Self {
            entropy_threshold: 5.0,
            entropy_min_length: 50,
            symbol_threshold: 0.35,
            min_length: 12,
            repeat_run: 7,
        }
    }
}

/// Entropy, symbol density, repetition and hidden-character checks.
#[derive(Debug, Clone, Default)]
pub struct ComplexityDetector {
    options: ComplexityOptions,
}

impl ComplexityDetector {
    /// Detector with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with custom thresholds
    pub fn with_options(options: ComplexityOptions) -> Self {
        Self { options }
    }

    /// Active thresholds
    pub fn options(&self) -> &ComplexityOptions {
        &self.options
    }
}

/// Shannon entropy of the char distribution, in bits per char
pub fn shannon_entropy(text: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut len = 0usize;
    for ch in text.chars() {
        *freq.entry(ch).or_insert(0) += 1;
        len += 1;
    }
    if len == 0 {
        return 0.0;
    }
    let len = len as f64;
    freq.values().fold(0.0, |h, &n| {
        let p = n as f64 / len;
        h - p * p.log2()
    })
}

/// Share of chars that are neither ASCII alphanumeric nor whitespace
pub fn symbol_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut symbols = 0usize;
    for ch in text.chars() {
        total += 1;
        if !ch.is_ascii_alphanumeric() && !ch.is_whitespace() {
            symbols += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        symbols as f64 / total as f64
    }
}

/// Longest run of one repeated char within a line, as `(char, length)`
pub fn longest_run(text: &str) -> Option<(char, usize)> {
    let mut best: Option<(char, usize)> = None;
    let mut current: Option<(char, usize)> = None;
    for ch in text.chars() {
        if is_line_break(ch) {
            current = None;
            continue;
        }
        current = match current {
            Some((c, n)) if c == ch => Some((c, n + 1)),
            _ => Some((ch, 1)),
        };
        if let Some((c, n)) = current {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((c, n));
            }
        }
    }
    best
}

fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Zero-width and bidirectional control characters
pub fn is_hidden_control(ch: char) -> bool {
    matches!(ch, '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}')
}

impl Detector for ComplexityDetector {
    fn name(&self) -> &str {
        "ComplexityDetector"
    }

    fn detect(&self, text: &str, _meta: &DetectMeta<'_>) -> Vec<Detection> {
        let opts = &self.options;
        let len = text.chars().count();
        if len < opts.min_length || text.trim().is_empty() {
            return Vec::new();
        }
        let mut detections = Vec::new();

        let entropy = shannon_entropy(text);
        if entropy > opts.entropy_threshold && len > opts.entropy_min_length {
            detections.push(
                Detection::new(
                    format!(
                        "Abnormally high entropy ({entropy:.2} bits/char) - likely obfuscation or encoded payload"
                    ),
                    Severity::Medium,
                )
                .with_score(12.0)
                .with_meta("entropy", entropy),
            );
        }

        let ratio = symbol_ratio(text);
        if ratio > opts.symbol_threshold {
            detections.push(
                Detection::new(
                    format!(
                        "Symbol ratio {:.1}% is anomalously high - possible filter evasion via symbols",
                        ratio * 100.0
                    ),
                    Severity::Low,
                )
                .with_score(8.0)
                .with_meta("symbol_ratio", ratio),
            );
        }

        if let Some((ch, run)) = longest_run(text).filter(|&(_, n)| n >= opts.repeat_run) {
            detections.push(
                Detection::new(
                    format!(
                        "Long repeated character run ({run}x {ch:?}), a zero-entropy segment in a fragment of entropy {entropy:.2} - likely payload delimiter or escape"
                    ),
                    Severity::Medium,
                )
                .with_score(10.0)
                .with_meta("run_length", run)
                .with_meta("run_char", ch.to_string())
                .with_meta("entropy", entropy),
            );
        }

        let hidden = text.chars().filter(|&c| is_hidden_control(c)).count();
        if hidden > 0 {
            detections.push(
                Detection::new(
                    format!(
                        "Zero-width characters detected ({hidden}) - hidden instructions suspected"
                    ),
                    Severity::High,
                )
                .with_score(18.0)
                .with_meta("zero_width_count", hidden),
            );
        }

        detections
    }
}
