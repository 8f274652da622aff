use prompt_guard::{
    default_detectors, default_guard, Detection, Finding, RiskLevel, RiskScorer, ScanContext,
    ScanOptions, Scanner, Scorer, Severity,
};
use proptest::prelude::*;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
    ]
}

fn findings() -> impl Strategy<Value = Vec<(Severity, f64)>> {
    prop::collection::vec((severity(), 0.0f64..40.0), 0..12)
}

fn as_input(raw: &[(Severity, f64)]) -> Vec<Finding> {
    raw.iter()
        .map(|&(sev, hint)| Finding::from_input(Detection::new("p", sev).with_score(hint), "P"))
        .collect()
}

fn quiet_guard() -> Scanner {
    Scanner::builder()
        .detectors(default_detectors())
        .without_logger()
        .build()
}

// ── Score bounds and level mapping ─────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded_and_level_follows_score(text in "\\PC{0,400}") {
        let result = default_guard().scan_text(&text);
        prop_assert!(result.score <= 100);
        prop_assert_eq!(result.level, RiskLevel::from_score(result.score));
        if result.detections.is_empty() {
            prop_assert_eq!(result.score, 0);
        }
    }

    #[test]
    fn whitespace_only_is_clean(text in "[ \t\r\n]{0,64}") {
        let result = quiet_guard().scan_text(&text);
        prop_assert_eq!(result.score, 0);
        prop_assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn scan_is_deterministic(text in "\\PC{0,200}", fragment in "\\PC{0,100}") {
        let guard = quiet_guard();
        let options = ScanOptions::new().with_external("doc", fragment);
        let first = guard.scan(&text, &options);
        let second = guard.scan(&text, &options);
        prop_assert_eq!(first, second);
    }
}

// ── Scoring factors ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn external_origin_never_lowers_score(raw in findings(), which in 0usize..12) {
        prop_assume!(!raw.is_empty());
        let scorer = Scorer::new();
        let ctx = ScanContext::new();

        let input = as_input(&raw);
        let mut mixed = input.clone();
        let idx = which % mixed.len();
        let det = Detection::new("p", mixed[idx].severity).with_score(mixed[idx].score);
        mixed[idx] = Finding::from_external(det, "doc", "P");

        prop_assert!(scorer.score(&mixed, &ctx) >= scorer.score(&input, &ctx));
    }

    #[test]
    fn trusted_channel_never_raises_score(raw in findings()) {
        let scorer = Scorer::new();
        let findings = as_input(&raw);
        let trusted = ScanContext::new().with_trust_level("high");
        prop_assert!(
            scorer.score(&findings, &trusted) <= scorer.score(&findings, &ScanContext::new())
        );
    }

    #[test]
    fn adding_a_finding_never_lowers_score(raw in findings(), extra in (severity(), 0.0f64..40.0)) {
        let scorer = Scorer::new();
        let ctx = ScanContext::new();
        let before = as_input(&raw);
        let mut after = before.clone();
        after.extend(as_input(&[extra]));
        prop_assert!(scorer.score(&after, &ctx) >= scorer.score(&before, &ctx));
    }
}

// ── Input limits ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn tail_past_limit_is_ignored(head in "[a-z ]{16}", tail in "\\PC{0,200}") {
        let mut guard = quiet_guard();
        guard.max_input_length = 16;

        let full = guard.scan_text(&format!("{head}{tail}"));
        let truncated = guard.scan_text(&head);
        prop_assert_eq!(full, truncated);
    }

    #[test]
    fn fragments_past_cap_are_ignored(cap in 0usize..4, count in 0usize..8) {
        let mut guard = quiet_guard();
        guard.max_external = cap;

        let options = (0..count).fold(ScanOptions::new(), |options, i| {
            options.with_external(format!("doc:{i}"), "system override")
        });
        let result = guard.scan("hello", &options);

        prop_assert_eq!(result.detections.len(), cap.min(count));
        for finding in &result.detections {
            let source = finding.source.as_deref().unwrap_or_default();
            let index: usize = source.trim_start_matches("doc:").parse().unwrap();
            prop_assert!(index < cap);
        }
    }
}
