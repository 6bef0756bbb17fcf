use std::collections::HashSet;

use aho_corasick::AhoCorasick;
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod builtin;
pub mod file_repository;

/// Label assigned when no category pattern matches a clause.
pub const DEFAULT_CATEGORY: &str = "General Terms";

/// Distinguishes between literal keyword and regular-expression rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Keyword,
    Regex,
}

/// Weighted risk signal evaluated against every candidate clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRule {
    /// Unique identifier, namespaced by family (e.g. `DATA_SELL`).
    pub id: String,
    /// Human-readable summary shown in rule listings.
    pub description: String,
    pub kind: RuleKind,
    /// Keyword literal or regex source, matched case-insensitively.
    pub pattern: String,
    /// Severity in `(0.0, 1.0]`.
    pub weight: f64,
}

impl RiskRule {
    /// Construct a new rule, validating invariants before returning.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        kind: RuleKind,
        pattern: impl Into<String>,
        weight: f64,
    ) -> Result<Self, RuleValidationError> {
        let rule = Self {
            id: id.into(),
            description: description.into(),
            kind,
            pattern: pattern.into(),
            weight,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.id.trim().is_empty() {
            return Err(RuleValidationError::EmptyId);
        }
        if self.pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern {
                rule_id: self.id.clone(),
            });
        }
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(RuleValidationError::InvalidWeight {
                rule_id: self.id.clone(),
                weight: self.weight,
            });
        }
        Ok(())
    }

    /// Family prefix of the rule id (`DATA_SELL` -> `DATA`).
    pub fn family(&self) -> &str {
        self.id.split('_').next().unwrap_or(&self.id)
    }
}

/// Topic label assigned to the first clause it matches, with its remediation text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    pub pattern: String,
    pub suggestion: String,
}

impl CategoryRule {
    pub fn new(
        label: impl Into<String>,
        pattern: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Result<Self, RuleValidationError> {
        let rule = Self {
            label: label.into(),
            pattern: pattern.into(),
            suggestion: suggestion.into(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.label.trim().is_empty() {
            return Err(RuleValidationError::EmptyLabel);
        }
        if self.pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern {
                rule_id: self.label.clone(),
            });
        }
        Ok(())
    }
}

/// Errors emitted while validating rule definitions.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleValidationError {
    #[error("rule id must not be blank")]
    EmptyId,
    #[error("rule `{rule_id}` pattern must not be empty")]
    EmptyPattern { rule_id: String },
    #[error("rule `{rule_id}` weight must be within (0.0, 1.0] (got {weight})")]
    InvalidWeight { rule_id: String, weight: f64 },
    #[error("category label must not be blank")]
    EmptyLabel,
    #[error("duplicate rule id `{rule_id}`")]
    DuplicateId { rule_id: String },
}

/// Errors raised while compiling a [`RulePack`] into a [`RuleSet`].
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error(transparent)]
    InvalidRule(#[from] RuleValidationError),
    #[error("invalid regex pattern for rule `{rule_id}`")]
    InvalidPattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to build keyword automaton")]
    KeywordAutomaton(#[from] aho_corasick::BuildError),
}

/// Uncompiled, serializable rule tables.
///
/// Category order is significant: categorization is first-match over
/// `categories` in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePack {
    pub risk_rules: Vec<RiskRule>,
    pub categories: Vec<CategoryRule>,
    pub fallback_suggestion: String,
}

impl RulePack {
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        let mut seen = HashSet::new();
        for rule in &self.risk_rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleValidationError::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }
        }
        for category in &self.categories {
            category.validate()?;
        }
        Ok(())
    }
}

pub(crate) struct CompiledCategory {
    pub(crate) regex: Regex,
    pub(crate) rule: CategoryRule,
}

pub(crate) struct KeywordRules {
    pub(crate) automaton: AhoCorasick,
    pub(crate) rules: Vec<RiskRule>,
}

/// Immutable compiled rule tables, shared by reference across analyses.
pub struct RuleSet {
    pub(crate) regex_rules: Vec<(Regex, RiskRule)>,
    pub(crate) keyword_rules: Option<KeywordRules>,
    pub(crate) categories: Vec<CompiledCategory>,
    pub(crate) fallback_suggestion: String,
    pack: RulePack,
}

impl RuleSet {
    pub fn compile(pack: &RulePack) -> Result<Self, RuleSetError> {
        pack.validate()?;

        let mut regex_rules = Vec::new();
        for rule in pack
            .risk_rules
            .iter()
            .filter(|rule| matches!(rule.kind, RuleKind::Regex))
        {
            let regex = case_insensitive(&rule.pattern).map_err(|source| {
                RuleSetError::InvalidPattern {
                    rule_id: rule.id.clone(),
                    source,
                }
            })?;
            regex_rules.push((regex, rule.clone()));
        }

        let keyword_rules = Self::compile_keyword_automaton(&pack.risk_rules)?;

        let mut categories = Vec::with_capacity(pack.categories.len());
        for rule in &pack.categories {
            let regex =
                case_insensitive(&rule.pattern).map_err(|source| RuleSetError::InvalidPattern {
                    rule_id: rule.label.clone(),
                    source,
                })?;
            categories.push(CompiledCategory {
                regex,
                rule: rule.clone(),
            });
        }

        Ok(Self {
            regex_rules,
            keyword_rules,
            categories,
            fallback_suggestion: pack.fallback_suggestion.clone(),
            pack: pack.clone(),
        })
    }

    fn compile_keyword_automaton(rules: &[RiskRule]) -> Result<Option<KeywordRules>, RuleSetError> {
        let keyword_rules: Vec<_> = rules
            .iter()
            .filter(|rule| matches!(rule.kind, RuleKind::Keyword))
            .cloned()
            .collect();
        if keyword_rules.is_empty() {
            return Ok(None);
        }
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keyword_rules.iter().map(|rule| rule.pattern.as_str()))?;
        Ok(Some(KeywordRules {
            automaton,
            rules: keyword_rules,
        }))
    }

    /// The source tables this set was compiled from.
    pub fn pack(&self) -> &RulePack {
        &self.pack
    }

    pub fn risk_rule_count(&self) -> usize {
        self.regex_rules.len()
            + self
                .keyword_rules
                .as_ref()
                .map_or(0, |keywords| keywords.rules.len())
    }

    /// Remediation text for a category label, falling back to the generic sentence.
    pub fn suggestion_for(&self, category: &str) -> &str {
        self.categories
            .iter()
            .find(|compiled| compiled.rule.label == category)
            .map_or(self.fallback_suggestion.as_str(), |compiled| {
                compiled.rule.suggestion.as_str()
            })
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("risk_rules", &self.risk_rule_count())
            .field("categories", &self.categories.len())
            .finish()
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Abstraction over rule loading so built-in and file-backed packs can be swapped transparently.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Retrieve the full rule pack currently active.
    async fn load_rule_pack(&self) -> AnyResult<RulePack>;

    /// Fetch a single risk rule by identifier if it exists.
    async fn get_rule(&self, rule_id: &str) -> AnyResult<Option<RiskRule>> {
        let pack = self.load_rule_pack().await?;
        Ok(pack.risk_rules.into_iter().find(|rule| rule.id == rule_id))
    }
}
