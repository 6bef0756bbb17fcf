use std::collections::BTreeSet;

use serde::Serialize;
use tracing::trace;

use crate::rules::RuleSet;

/// Literal co-occurrence that floors the score regardless of the rule table.
struct OverrideBoost {
    required: &'static str,
    any_of: &'static [&'static str],
    floor: f64,
}

const OVERRIDE_BOOSTS: &[OverrideBoost] = &[
    OverrideBoost {
        required: "sell",
        any_of: &["data", "information"],
        floor: 0.9,
    },
    OverrideBoost {
        required: "cannot",
        any_of: &["opt"],
        floor: 0.85,
    },
];

/// How a clause's score was assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Highest weight among matching rules, or 0.
    pub max_weight: f64,
    /// Number of distinct rules that matched.
    pub matches: usize,
    /// `max_weight` after the escalation bonus.
    pub escalated: f64,
    /// Highest override floor that fired, if any.
    pub override_floor: Option<f64>,
    pub score: f64,
    pub matched_rules: Vec<String>,
}

/// Scores lower-cased clause text against a [`RuleSet`].
#[derive(Debug, Clone, Copy)]
pub struct RiskScorer<'r> {
    rules: &'r RuleSet,
    escalation_step: f64,
}

impl<'r> RiskScorer<'r> {
    pub fn new(rules: &'r RuleSet, escalation_step: f64) -> Self {
        Self {
            rules,
            escalation_step,
        }
    }

    pub fn score(&self, text: &str) -> f64 {
        self.score_detailed(text).score
    }

    pub fn score_detailed(&self, text: &str) -> ScoreBreakdown {
        let mut max_weight: f64 = 0.0;
        let mut matched_rules = Vec::new();

        for (regex, rule) in &self.rules.regex_rules {
            if regex.is_match(text) {
                trace!(rule_id = %rule.id, family = rule.family(), "risk rule matched");
                max_weight = max_weight.max(rule.weight);
                matched_rules.push(rule.id.clone());
            }
        }

        if let Some(keywords) = &self.rules.keyword_rules {
            let hits: BTreeSet<usize> = keywords
                .automaton
                .find_overlapping_iter(text)
                .map(|mat| mat.pattern().as_usize())
                .collect();
            for idx in hits {
                if let Some(rule) = keywords.rules.get(idx) {
                    trace!(rule_id = %rule.id, family = rule.family(), "keyword rule matched");
                    max_weight = max_weight.max(rule.weight);
                    matched_rules.push(rule.id.clone());
                }
            }
        }

        let matches = matched_rules.len();
        let escalated = if matches > 1 {
            (max_weight + (matches - 1) as f64 * self.escalation_step).min(1.0)
        } else {
            max_weight
        };

        let override_floor = OVERRIDE_BOOSTS
            .iter()
            .filter(|boost| {
                text.contains(boost.required) && boost.any_of.iter().any(|word| text.contains(word))
            })
            .map(|boost| boost.floor)
            .reduce(f64::max);

        let score = override_floor
            .map_or(escalated, |floor| escalated.max(floor))
            .clamp(0.0, 1.0);

        ScoreBreakdown {
            max_weight,
            matches,
            escalated,
            override_floor,
            score,
            matched_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{builtin::builtin_rule_set, CategoryRule, RiskRule, RuleKind, RulePack};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn custom_rules(rules: Vec<RiskRule>) -> RuleSet {
        RuleSet::compile(&RulePack {
            risk_rules: rules,
            categories: vec![CategoryRule::new("Data Collection", "data", "x").unwrap()],
            fallback_suggestion: "fallback".into(),
        })
        .unwrap()
    }

    #[test]
    fn no_match_scores_zero() {
        let rules = builtin_rule_set().unwrap();
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown =
            scorer.score_detailed("this is a short sentence about the weather today in general");
        assert_eq!(breakdown.matches, 0);
        assert_eq!(breakdown.score, 0.0);
        assert!(breakdown.override_floor.is_none());
    }

    #[test]
    fn single_match_uses_rule_weight() {
        let rules = builtin_rule_set().unwrap();
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown = scorer.score_detailed("this agreement is subject to governing law");
        assert_eq!(breakdown.matched_rules, vec!["LEGAL_GOVERNING_LAW"]);
        assert_close(breakdown.score, 0.3);
    }

    #[test]
    fn multiple_matches_escalate() {
        let rules = builtin_rule_set().unwrap();
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown = scorer.score_detailed("we use cookies for marketing and arbitration");
        assert_eq!(breakdown.matches, 3);
        assert_close(breakdown.max_weight, 0.6);
        assert_close(breakdown.score, 0.8);
    }

    #[test]
    fn escalation_caps_at_one() {
        let rules = builtin_rule_set().unwrap();
        let scorer = RiskScorer::new(&rules, 0.1);
        let score = scorer.score(
            "we may sell your information, use cookies, analytics, advertising and biometric data",
        );
        assert_close(score, 1.0);
    }

    #[test]
    fn sell_and_data_override_floors_score() {
        let rules = custom_rules(vec![RiskRule::new(
            "LEGAL_GOVERNING_LAW",
            "law",
            RuleKind::Regex,
            "governing.*law",
            0.3,
        )
        .unwrap()]);
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown = scorer.score_detailed("partners may sell aggregated data");
        assert_eq!(breakdown.override_floor, Some(0.9));
        assert_close(breakdown.score, 0.9);
    }

    #[test]
    fn cannot_opt_override_floors_score() {
        let rules = custom_rules(vec![RiskRule::new(
            "FIN_FEE",
            "fee",
            RuleKind::Keyword,
            "fee",
            0.5,
        )
        .unwrap()]);
        let scorer = RiskScorer::new(&rules, 0.1);
        assert_close(scorer.score("you cannot opt out of this feature"), 0.85);
    }

    #[test]
    fn override_never_lowers_score() {
        let rules = builtin_rule_set().unwrap();
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown = scorer.score_detailed(
            "we may sell your personal information to third parties at any time without notice",
        );
        assert_eq!(breakdown.override_floor, Some(0.9));
        assert_close(breakdown.score, 1.0);
    }

    #[test]
    fn keyword_rules_count_once_per_rule() {
        let rules = custom_rules(vec![
            RiskRule::new("TRACK_COOKIES", "c", RuleKind::Keyword, "cookies", 0.6).unwrap(),
            RiskRule::new("TRACK_PIXEL", "p", RuleKind::Keyword, "tracking pixel", 0.7).unwrap(),
        ]);
        let scorer = RiskScorer::new(&rules, 0.1);
        let breakdown =
            scorer.score_detailed("cookies, more cookies and a tracking pixel on every page");
        assert_eq!(breakdown.matches, 2);
        assert_close(breakdown.score, 0.8);
    }

    #[test]
    fn keyword_rules_match_case_insensitively() {
        let rules = custom_rules(vec![RiskRule::new(
            "TRACK_COOKIES",
            "c",
            RuleKind::Keyword,
            "Cookies",
            0.6,
        )
        .unwrap()]);
        let scorer = RiskScorer::new(&rules, 0.1);
        assert_close(scorer.score("we set cookies on your device"), 0.6);
    }
}
