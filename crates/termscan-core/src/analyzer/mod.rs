use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Document, DocumentId};

pub mod categorizer;
pub mod default_analyzer;
pub mod ranker;
pub mod scorer;
pub mod segmenter;
pub mod suggestion;

/// Score boundaries for the suggestion tiers. Tiers are ordered and
/// non-overlapping: `high >= medium >= low`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTierThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for RiskTierThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.5,
            low: 0.25,
        }
    }
}

/// Qualitative bucket for a clause's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        Self::from_score_with_thresholds(score, &RiskTierThresholds::default())
    }

    pub fn from_score_with_thresholds(score: f64, thresholds: &RiskTierThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else if score >= thresholds.low {
            Self::Low
        } else {
            Self::Minimal
        }
    }

    /// Prefix placed before the suggestion text; empty for minimal risk.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::High => "HIGH RISK: ",
            Self::Medium => "MEDIUM RISK: ",
            Self::Low => "LOW RISK: ",
            Self::Minimal => "",
        }
    }
}

/// Calibrated constants for a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Segments shorter than this (in chars, after trimming) are discarded.
    pub min_clause_chars: usize,
    /// Clauses must score strictly above this to be emitted.
    pub emission_threshold: f64,
    pub max_clauses: usize,
    /// Added per matching rule beyond the first.
    pub escalation_step: f64,
    pub tiers: RiskTierThresholds,
    /// Score at or above which a clause counts as high risk in summaries.
    pub high_risk_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_clause_chars: 15,
            emission_threshold: 0.15,
            max_clauses: 25,
            escalation_step: 0.1,
            tiers: RiskTierThresholds::default(),
            high_risk_threshold: 0.7,
        }
    }
}

impl AnalysisConfig {
    /// Overrides may only tighten the calibrated defaults: emitted scores stay
    /// in `(0.15, 1.0]`, at most 25 clauses are returned and segments shorter
    /// than 15 chars are never scored.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let defaults = Self::default();
        if self.min_clause_chars < defaults.min_clause_chars {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_clause_chars must be at least {} (got {})",
                defaults.min_clause_chars, self.min_clause_chars
            )));
        }
        if !(defaults.emission_threshold..1.0).contains(&self.emission_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "emission_threshold must be within [{}, 1.0) (got {})",
                defaults.emission_threshold, self.emission_threshold
            )));
        }
        if !(1..=defaults.max_clauses).contains(&self.max_clauses) {
            return Err(AnalysisError::InvalidConfig(format!(
                "max_clauses must be within 1..={} (got {})",
                defaults.max_clauses, self.max_clauses
            )));
        }
        if !(self.escalation_step.is_finite() && self.escalation_step >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "escalation_step must be a non-negative number (got {})",
                self.escalation_step
            )));
        }
        let (high, medium, low) = (self.tiers.high, self.tiers.medium, self.tiers.low);
        let in_unit = |value: f64| (0.0..=1.0).contains(&value);
        if !(in_unit(high) && in_unit(medium) && in_unit(low) && high >= medium && medium >= low)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "tiers must satisfy 1.0 >= high >= medium >= low >= 0.0 \
                 (got high={high}, medium={medium}, low={low})"
            )));
        }
        if !in_unit(self.high_risk_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "high_risk_threshold must be within [0.0, 1.0] (got {})",
                self.high_risk_threshold
            )));
        }
        Ok(())
    }
}

/// A risky fragment of a document, annotated by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Trimmed, lower-cased segment with its first character upper-cased.
    pub text: String,
    pub category: String,
    /// In `(emission_threshold, 1.0]`.
    pub risk_score: f64,
    pub suggestion: String,
    pub document_id: DocumentId,
    /// Ids of the risk rules that fired: regex rules first, then keyword
    /// rules, each in rule-table order.
    pub matched_rules: Vec<String>,
}

impl Clause {
    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::from_score(self.risk_score)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

/// Turns raw document text into a ranked list of risky clauses.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, document_id: DocumentId, raw_text: &str)
        -> Result<Vec<Clause>, AnalysisError>;

    fn analyze_document(&self, document: &Document) -> Result<Vec<Clause>, AnalysisError> {
        self.analyze(document.id, &document.content)
    }
}
