use crate::rules::{RuleSet, DEFAULT_CATEGORY};

/// First-match category lookup over the rule set's ordered category table.
#[derive(Debug, Clone, Copy)]
pub struct Categorizer<'r> {
    rules: &'r RuleSet,
}

impl<'r> Categorizer<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Label of the first category whose pattern matches, or `General Terms`.
    pub fn categorize(&self, text: &str) -> &'r str {
        self.rules
            .categories
            .iter()
            .find(|category| category.regex.is_match(text))
            .map_or(DEFAULT_CATEGORY, |category| category.rule.label.as_str())
    }
}
