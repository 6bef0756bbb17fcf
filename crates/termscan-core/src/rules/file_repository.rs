use std::{collections::HashSet, fs, path::PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

use super::{
    builtin::{builtin_categories, FALLBACK_SUGGESTION},
    CategoryRule, RiskRule, RuleKind, RulePack, RuleRepository,
};

/// Loads a rule pack from `keywords.txt`, `patterns.json` and an optional
/// `categories.json` located under a base directory.
pub struct FileRuleRepository {
    base_path: PathBuf,
    cache: OnceCell<RulePack>,
}

impl FileRuleRepository {
    /// Create a repository rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: OnceCell::new(),
        }
    }

    fn keywords_path(&self) -> PathBuf {
        self.base_path.join("keywords.txt")
    }

    fn patterns_path(&self) -> PathBuf {
        self.base_path.join("patterns.json")
    }

    fn categories_path(&self) -> PathBuf {
        self.base_path.join("categories.json")
    }

    fn load_keywords(&self, seen: &mut HashSet<String>) -> Result<Vec<RiskRule>> {
        let mut rules = Vec::new();
        let path = self.keywords_path();
        if !path.exists() {
            return Ok(rules);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read keyword rule file at {}", path.display()))?;
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parts: Vec<_> = trimmed.splitn(4, '|').map(str::trim).collect();
            if parts.len() != 4 {
                return Err(anyhow::anyhow!(
                    "invalid keyword rule format at {}:{} (expected id|weight|description|phrase)",
                    path.display(),
                    idx + 1
                ));
            }
            let id = parts[0].to_string();
            if !seen.insert(id.clone()) {
                return Err(anyhow::anyhow!("duplicate rule id `{id}`"));
            }
            let weight: f64 = parts[1].parse().with_context(|| {
                format!(
                    "invalid weight `{}` for rule `{}` at {}:{}",
                    parts[1],
                    id,
                    path.display(),
                    idx + 1
                )
            })?;
            let rule = RiskRule::new(id, parts[2], RuleKind::Keyword, parts[3], weight)
                .with_context(|| {
                    format!("invalid keyword rule at {}:{}", path.display(), idx + 1)
                })?;
            rules.push(rule);
        }
        Ok(rules)
    }

    fn load_patterns(&self, seen: &mut HashSet<String>) -> Result<Vec<RiskRule>> {
        let mut rules = Vec::new();
        let path = self.patterns_path();
        if !path.exists() {
            return Ok(rules);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read pattern rule file at {}", path.display()))?;
        let items: Vec<JsonRule> = serde_json::from_str(&raw).with_context(|| {
            format!(
                "invalid JSON structure in pattern rule file at {}",
                path.display()
            )
        })?;
        for item in items {
            if !seen.insert(item.id.clone()) {
                return Err(anyhow::anyhow!("duplicate rule id `{}`", item.id));
            }
            let rule = RiskRule::new(
                item.id,
                item.description,
                RuleKind::Regex,
                item.pattern,
                item.weight,
            )?;
            rules.push(rule);
        }
        Ok(rules)
    }

    fn load_categories(&self) -> Result<Vec<CategoryRule>> {
        let path = self.categories_path();
        if !path.exists() {
            return Ok(builtin_categories());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read category file at {}", path.display()))?;
        let categories: Vec<CategoryRule> = serde_json::from_str(&raw).with_context(|| {
            format!("invalid JSON structure in category file at {}", path.display())
        })?;
        for category in &categories {
            category.validate()?;
        }
        Ok(categories)
    }
}

#[async_trait::async_trait]
impl RuleRepository for FileRuleRepository {
    async fn load_rule_pack(&self) -> Result<RulePack> {
        let pack = self.cache.get_or_try_init(|| {
            let mut seen = HashSet::new();
            let mut risk_rules = self.load_keywords(&mut seen)?;
            risk_rules.extend(self.load_patterns(&mut seen)?);
            if risk_rules.is_empty() {
                return Err(anyhow::anyhow!(
                    "no risk rules found under {}",
                    self.base_path.display()
                ));
            }
            Ok::<_, anyhow::Error>(RulePack {
                risk_rules,
                categories: self.load_categories()?,
                fallback_suggestion: FALLBACK_SUGGESTION.to_string(),
            })
        })?;
        Ok(pack.clone())
    }
}

#[derive(serde::Deserialize)]
struct JsonRule {
    id: String,
    description: String,
    pattern: String,
    weight: f64,
}
