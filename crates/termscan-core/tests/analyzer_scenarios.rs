use proptest::prelude::*;
use termscan_core::{Analyzer, Clause, DefaultAnalyzer, Document, DocumentId, DocumentSource};

fn analyzer() -> DefaultAnalyzer {
    DefaultAnalyzer::builtin().expect("built-in rules compile")
}

fn analyze(text: &str) -> Vec<Clause> {
    analyzer()
        .analyze(DocumentId(42), text)
        .expect("analysis should succeed")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn selling_information_is_high_risk() {
    let clauses = analyze(
        "We may sell your personal information to third parties at any time without notice.",
    );
    assert_eq!(clauses.len(), 1);
    let clause = &clauses[0];
    assert_eq!(clause.category, "Data Collection");
    assert!(clause.risk_score >= 0.95);
    assert!(clause.suggestion.starts_with("HIGH RISK:"));
    assert_eq!(clause.document_id, DocumentId(42));
}

#[test]
fn cannot_opt_out_reaches_override_floor() {
    let clauses = analyze("You cannot opt out of this feature.");
    assert_eq!(clauses.len(), 1);
    assert!(clauses[0].risk_score >= 0.85);
}

#[test]
fn cannot_opt_floor_applies_without_rule_match() {
    let clauses = analyze("You cannot choose to opt in later.");
    assert_eq!(clauses.len(), 1);
    assert!(clauses[0].matched_rules.is_empty());
    assert_close(clauses[0].risk_score, 0.85);
    assert_eq!(clauses[0].category, "General Terms");
    assert_eq!(
        clauses[0].suggestion,
        "HIGH RISK: Review this clause carefully and consider its implications. \
         Consider if you're comfortable accepting these terms or if alternatives exist."
    );
}

#[test]
fn benign_sentence_produces_no_clause() {
    let clauses = analyze("This is a short sentence about the weather today in general.");
    assert!(clauses.is_empty());
}

#[test]
fn three_equal_matches_escalate_to_point_eight() {
    let clauses = analyze(
        "We use cookies for marketing and arbitration. \
         We may terminate your account, suspend service or add a recurring charge.",
    );
    assert_eq!(clauses.len(), 2);
    for clause in &clauses {
        assert_eq!(clause.matched_rules.len(), 3, "{:?}", clause.matched_rules);
        assert_close(clause.risk_score, 0.8);
    }
    assert!(clauses[0].text.starts_with("We use cookies"));
}

#[test]
fn output_is_truncated_to_top_twenty_five() {
    let mut text = String::new();
    for idx in 0..20 {
        text.push_str(&format!("Item {idx} we use cookies on this page. "));
        text.push_str(&format!("Item {idx} we may sell your personal information. "));
    }
    let clauses = analyze(&text);
    assert_eq!(clauses.len(), 25);

    let expected: Vec<String> = (0..20)
        .map(|idx| format!("Item {idx} we may sell your personal information"))
        .chain((0..5).map(|idx| format!("Item {idx} we use cookies on this page")))
        .collect();
    let actual: Vec<_> = clauses.iter().map(|clause| clause.text.clone()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn analyze_document_reads_content() {
    let document = Document::new(
        DocumentId(9),
        DocumentSource::Pasted,
        "Disputes are settled through arbitration only.",
    );
    let clauses = analyzer().analyze_document(&document).unwrap();
    assert_eq!(clauses.len(), 1);
    assert_eq!(clauses[0].document_id, DocumentId(9));
}

const PHRASES: &[&str] = &[
    "we may sell your personal information",
    "we use cookies on this page",
    "the weather is pleasant",
    "disputes go to arbitration",
    "you cannot opt out",
    "biometric",
    "fee",
    "we may change policy at any time without notice",
    "governing law applies",
    "analytics help us improve",
    "all sales include an irrevocable license",
];

const TERMINATORS: &[&str] = &[".", "!", "?", "...", "?!", ". "];

fn document_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec((0..PHRASES.len(), 0..TERMINATORS.len()), 0..60).prop_map(
        |parts| {
            let mut text = String::from("Terms of service. ");
            for (idx, (phrase, terminator)) in parts.into_iter().enumerate() {
                text.push_str(&format!(
                    "s{idx} {}{} ",
                    PHRASES[phrase], TERMINATORS[terminator]
                ));
            }
            text
        },
    )
}

fn segment_index(clause: &Clause) -> usize {
    clause
        .text
        .strip_prefix('S')
        .and_then(|rest| rest.split(' ').next())
        .and_then(|idx| idx.parse().ok())
        .unwrap_or_else(|| panic!("unexpected clause text {:?}", clause.text))
}

proptest! {
    #[test]
    fn emitted_clauses_respect_invariants(text in document_strategy()) {
        let clauses = analyze(&text);

        prop_assert!(clauses.len() <= 25);
        for clause in &clauses {
            prop_assert!(clause.risk_score > 0.15 && clause.risk_score <= 1.0);
            prop_assert!(clause.text.chars().count() >= 15);
        }
        for pair in clauses.windows(2) {
            prop_assert!(pair[0].risk_score >= pair[1].risk_score);
            if pair[0].risk_score == pair[1].risk_score {
                prop_assert!(segment_index(&pair[0]) < segment_index(&pair[1]));
            }
        }
    }

    #[test]
    fn analysis_is_idempotent(text in document_strategy()) {
        prop_assert_eq!(analyze(&text), analyze(&text));
    }
}
