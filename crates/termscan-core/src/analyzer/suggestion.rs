use super::{RiskTier, RiskTierThresholds};
use crate::rules::RuleSet;

const HIGH_RISK_FOLLOW_UP: &str =
    " Consider if you're comfortable accepting these terms or if alternatives exist.";
const MEDIUM_RISK_FOLLOW_UP: &str = " Weigh the benefits against potential privacy concerns.";

/// Builds the remediation text for a clause from its category and score.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionGenerator<'r> {
    rules: &'r RuleSet,
    thresholds: &'r RiskTierThresholds,
}

impl<'r> SuggestionGenerator<'r> {
    pub fn new(rules: &'r RuleSet, thresholds: &'r RiskTierThresholds) -> Self {
        Self { rules, thresholds }
    }

    pub fn suggest(&self, category: &str, risk_score: f64) -> String {
        let base = self.rules.suggestion_for(category);
        let tier = RiskTier::from_score_with_thresholds(risk_score, self.thresholds);
        let follow_up = match tier {
            RiskTier::High => HIGH_RISK_FOLLOW_UP,
            RiskTier::Medium => MEDIUM_RISK_FOLLOW_UP,
            RiskTier::Low | RiskTier::Minimal => "",
        };
        format!("{}{base}{follow_up}", tier.prefix())
    }
}
