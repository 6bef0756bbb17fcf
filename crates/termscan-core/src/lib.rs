pub mod analyzer;
pub mod document;
pub mod report;
pub mod rules;

pub use analyzer::{
    default_analyzer::DefaultAnalyzer, scorer::ScoreBreakdown, AnalysisConfig, AnalysisError,
    Analyzer, Clause, RiskTier, RiskTierThresholds,
};
pub use document::{Document, DocumentId, DocumentSource, PASTED_TEXT_MARKER};
pub use report::{
    high_risk, render_clauses, render_report, AnalysisReport, AnalysisStats, OutputFormat,
    DEFAULT_MIN_RISK,
};
pub use rules::{
    builtin::{builtin_rule_set, BuiltinRuleRepository},
    file_repository::FileRuleRepository,
    CategoryRule, RiskRule, RuleKind, RulePack, RuleRepository, RuleSet, RuleSetError,
    RuleValidationError, DEFAULT_CATEGORY,
};
