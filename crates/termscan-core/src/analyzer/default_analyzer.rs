use std::sync::Arc;

use tracing::{debug, instrument};

use super::{
    categorizer::Categorizer, ranker::ClauseRanker, scorer::RiskScorer, segmenter::segment,
    suggestion::SuggestionGenerator, AnalysisConfig, AnalysisError, Analyzer, Clause,
};
use crate::document::DocumentId;
use crate::rules::{builtin::builtin_rule_set, RuleSet, RuleSetError};

/// Analyzer backed by a compiled rule set: segment, score, categorize,
/// suggest, then rank.
#[derive(Debug, Clone)]
pub struct DefaultAnalyzer {
    rules: Arc<RuleSet>,
    config: AnalysisConfig,
}

impl DefaultAnalyzer {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            config: AnalysisConfig::default(),
        }
    }

    /// Analyzer with overridden settings; rejects configs that would loosen
    /// the emission limits.
    pub fn with_config(rules: Arc<RuleSet>, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { rules, config })
    }

    /// Analyzer using the shared built-in rule tables.
    pub fn builtin() -> Result<Self, RuleSetError> {
        Ok(Self::new(builtin_rule_set()?))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn annotate(&self, document_id: DocumentId, sentence: &str) -> Option<Clause> {
        let breakdown =
            RiskScorer::new(&self.rules, self.config.escalation_step).score_detailed(sentence);
        if breakdown.score <= self.config.emission_threshold {
            return None;
        }
        let category = Categorizer::new(&self.rules).categorize(sentence);
        let suggestion = SuggestionGenerator::new(&self.rules, &self.config.tiers)
            .suggest(category, breakdown.score);
        Some(Clause {
            text: sentence_case(sentence),
            category: category.to_string(),
            risk_score: breakdown.score,
            suggestion,
            document_id,
            matched_rules: breakdown.matched_rules,
        })
    }
}

impl Analyzer for DefaultAnalyzer {
    #[instrument(
        name = "analyze_document",
        skip_all,
        fields(document_id = %document_id, input_len = raw_text.len())
    )]
    fn analyze(
        &self,
        document_id: DocumentId,
        raw_text: &str,
    ) -> Result<Vec<Clause>, AnalysisError> {
        if raw_text.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "document text must not be empty".into(),
            ));
        }

        let normalized = raw_text.to_lowercase();
        let mut candidates = 0usize;
        let annotated: Vec<_> = segment(&normalized)
            .filter(|sentence| sentence.chars().count() >= self.config.min_clause_chars)
            .inspect(|_| candidates += 1)
            .filter_map(|sentence| self.annotate(document_id, sentence))
            .collect();

        let ranker = ClauseRanker::new(self.config.emission_threshold, self.config.max_clauses);
        let emitted = annotated.len();
        let clauses = ranker.rank(annotated);
        debug!(
            candidates,
            emitted,
            returned = clauses.len(),
            "analysis completed"
        );
        Ok(clauses)
    }
}

fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CategoryRule, RiskRule, RuleKind, RulePack};

    fn analyzer() -> DefaultAnalyzer {
        DefaultAnalyzer::builtin().expect("built-in rules compile")
    }

    #[test]
    fn rejects_blank_input() {
        let err = analyzer()
            .analyze(DocumentId(1), "   \n\t ")
            .expect_err("blank text is invalid");
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn sentence_cases_emitted_text() {
        let clauses = analyzer()
            .analyze(DocumentId(3), "WE USE COOKIES ON EVERY PAGE.")
            .unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].text, "We use cookies on every page");
        assert_eq!(clauses[0].document_id, DocumentId(3));
        assert_eq!(clauses[0].matched_rules, vec!["TRACK_COOKIES"]);
    }

    #[test]
    fn short_segments_are_never_scored() {
        // "biometric" alone is 9 chars, "we use biometric" is 16
        let clauses = analyzer()
            .analyze(DocumentId(1), "Biometric. Tracking! We use biometric.")
            .unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].text, "We use biometric");
    }

    #[test]
    fn fifteen_chars_is_the_shortest_scored_segment() {
        // "use biometrics" is 14 chars, "a biometric use" is 15
        let clauses = analyzer()
            .analyze(DocumentId(1), "Use biometrics. A biometric use.")
            .unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].text, "A biometric use");
        assert_eq!(clauses[0].matched_rules, vec!["DATA_BIOMETRIC"]);
    }

    #[test]
    fn with_config_rejects_negative_threshold() {
        let config = AnalysisConfig {
            emission_threshold: -1.0,
            ..AnalysisConfig::default()
        };
        let err = DefaultAnalyzer::with_config(builtin_rule_set().unwrap(), config)
            .expect_err("negative threshold would emit zero scores");
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn low_scores_are_not_emitted() {
        let pack = RulePack {
            risk_rules: vec![
                RiskRule::new("INFO_NOTE", "note", RuleKind::Keyword, "please note", 0.15).unwrap(),
                RiskRule::new("INFO_LAW", "law", RuleKind::Regex, "governing.*law", 0.3).unwrap(),
            ],
            categories: vec![CategoryRule::new("Legal & Disputes", "law", "Check it.").unwrap()],
            fallback_suggestion: "Review.".into(),
        };
        let rules = Arc::new(RuleSet::compile(&pack).unwrap());
        let clauses = DefaultAnalyzer::new(rules)
            .analyze(
                DocumentId(1),
                "Please note the office hours. Governing law is that of Utopia.",
            )
            .unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].category, "Legal & Disputes");
        assert_eq!(clauses[0].suggestion, "LOW RISK: Check it.");
    }

    #[test]
    fn custom_config_limits_output() {
        let rules = builtin_rule_set().unwrap();
        let config = AnalysisConfig {
            max_clauses: 1,
            ..AnalysisConfig::default()
        };
        let analyzer = DefaultAnalyzer::with_config(rules, config).expect("valid config");
        assert_eq!(analyzer.config().max_clauses, 1);
        let clauses = analyzer
            .analyze(
                DocumentId(1),
                "We use cookies on this site. We may sell your personal information.",
            )
            .unwrap();
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].text.starts_with("We may sell"));
    }

    #[test]
    fn sentence_case_handles_multibyte_first_char() {
        assert_eq!(sentence_case("éclair policy"), "Éclair policy");
        assert_eq!(sentence_case(""), "");
    }
}
