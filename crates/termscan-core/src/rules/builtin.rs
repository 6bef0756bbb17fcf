//! Built-in rule tables for terms-of-service analysis.
//!
//! Weights are calibrated values and are ported as-is; `governing.*law` is
//! intentionally informational only.

use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use once_cell::sync::OnceCell;

use super::{CategoryRule, RiskRule, RuleKind, RulePack, RuleRepository, RuleSet, RuleSetError};

/// `(id, description, regex, weight)`
const RISK_RULES: &[(&str, &str, &str, f64)] = &[
    // Data collection & usage
    ("DATA_COLLECT_PERSONAL", "Collects personal data", "collect.*personal data", 0.9),
    ("DATA_SHARE_THIRD_PARTIES", "Shares data with third parties", "share.*third parties", 0.9),
    ("DATA_SELL", "Sells user information", "sell.*information", 0.95),
    ("DATA_LOCATION_TRACKING", "Tracks user location", "location.*tracking", 0.85),
    ("DATA_BIOMETRIC", "Processes biometric data", "biometric", 0.9),
    ("DATA_INDEFINITE", "Retains or licenses indefinitely", "indefinitely", 0.85),
    ("DATA_UNLIMITED", "Unlimited grant or use", "unlimited", 0.8),
    ("DATA_PERMANENT", "Permanent grant or retention", "permanent", 0.8),
    ("DATA_IRREVOCABLE", "Irrevocable grant", "irrevocable", 0.9),
    ("DATA_SHARE_NO_CONSENT", "Shares data without consent", "share.*without.*consent", 0.95),
    ("DATA_TRANSFER_OVERSEAS", "Transfers data overseas", "transfer.*overseas", 0.8),
    ("DATA_AFFILIATE", "Discloses to affiliate companies", "affiliate.*company", 0.7),
    ("DATA_BUSINESS_PARTNER", "Discloses to business partners", "business.*partner", 0.7),
    // Tracking & advertising
    ("TRACK_COOKIES", "Uses cookies", "cookies", 0.6),
    ("TRACK_ANALYTICS", "Runs analytics", "analytics", 0.5),
    ("TRACK_ADVERTISING", "Advertising use", "advertising", 0.7),
    ("TRACK_MARKETING", "Marketing use", "marketing", 0.6),
    ("TRACK_GENERIC", "Tracks users", "tracking", 0.7),
    ("TRACK_BEHAVIORAL", "Behavioral profiling", "behavioral", 0.75),
    ("TRACK_CROSS_DEVICE", "Cross-device tracking", "cross.*device", 0.8),
    ("TRACK_FINGERPRINT", "Device fingerprinting", "fingerprint", 0.85),
    // Rights & control
    ("RIGHTS_NO_OPT_OUT", "No opt-out available", "cannot.*opt.out", 0.9),
    ("RIGHTS_NO_CONTROL", "User has no control", "no.*control", 0.8),
    ("RIGHTS_AUTO_RENEWAL", "Automatic renewal", "automatic.*renewal", 0.7),
    ("RIGHTS_NO_REFUND", "No refunds", "no.*refund", 0.75),
    ("RIGHTS_TERMINATE_ACCOUNT", "Provider may terminate accounts", "terminate.*account", 0.6),
    ("RIGHTS_SUSPEND_SERVICE", "Provider may suspend service", "suspend.*service", 0.6),
    ("RIGHTS_DELETE_ACCOUNT", "Provider may delete accounts", "delete.*account", 0.5),
    // Legal & liability
    ("LEGAL_NOT_LIABLE", "Disclaims liability", "not.*liable", 0.7),
    ("LEGAL_WAIVE_RIGHTS", "Waiver of rights", "waive.*rights", 0.85),
    ("LEGAL_ARBITRATION", "Mandatory arbitration", "arbitration", 0.6),
    ("LEGAL_CLASS_ACTION", "Class action restrictions", "class.*action", 0.65),
    ("LEGAL_GOVERNING_LAW", "Governing law clause", "governing.*law", 0.3),
    ("LEGAL_DISCLAIM_WARRANTY", "Warranty disclaimer", "disclaim.*warranty", 0.7),
    ("LEGAL_LIMIT_LIABILITY", "Limitation of liability", "limitation.*liability", 0.6),
    // Changes & modifications
    ("MODIFY_TERMS", "Terms may be modified", "modify.*terms", 0.5),
    ("MODIFY_POLICY", "Policy may change", "change.*policy", 0.4),
    ("MODIFY_WITHOUT_NOTICE", "Changes without notice", "without.*notice", 0.8),
    ("MODIFY_SOLE_DISCRETION", "Sole discretion of provider", "sole.*discretion", 0.7),
    ("MODIFY_ANY_TIME", "Changes at any time", "at.*any.*time", 0.6),
    // Financial & subscription
    ("FIN_AUTO_RENEW", "Auto-renewing subscription", "auto.*renew", 0.7),
    ("FIN_RECURRING_CHARGE", "Recurring charges", "recurring.*charge", 0.6),
    ("FIN_CANCELLATION_FEE", "Cancellation fee", "cancellation.*fee", 0.8),
    ("FIN_EARLY_TERMINATION", "Early termination penalty", "early.*termination", 0.7),
];

/// `(label, regex, suggestion)` in first-match order.
const CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "Data Collection",
        "data|information|personal|collect|store|process",
        "Review what personal data is collected and if it's necessary for the service. Check if you can limit data collection.",
    ),
    (
        "Data Sharing",
        "share|third.party|partner|affiliate|sell",
        "Check if you can opt-out of data sharing with third parties. Understand who your data is shared with.",
    ),
    (
        "Tracking & Analytics",
        "track|cookie|analytics|advertising|marketing",
        "Look for cookie preferences or tracking opt-out options in privacy settings.",
    ),
    (
        "Cancellation & Refunds",
        "cancel|terminate|refund|subscription",
        "Understand the cancellation process, notice periods, and refund policy before subscribing.",
    ),
    (
        "Liability & Warranties",
        "liable|responsibility|warranty|damages",
        "Be aware of limited liability clauses that may affect your legal rights in case of issues.",
    ),
    (
        "Terms Modification",
        "modify|change|update|amend",
        "Check how you'll be notified of changes to terms and your options if you disagree with changes.",
    ),
    (
        "Location Services",
        "location|gps|geolocation",
        "Consider if location tracking is necessary for the service and review location privacy settings.",
    ),
    (
        "Legal & Disputes",
        "arbitration|dispute|court|legal",
        "Understand dispute resolution processes, arbitration clauses, and your legal rights.",
    ),
    (
        "Payment Terms",
        "payment|billing|charge|fee",
        "Review billing cycles, automatic renewals, and cancellation fees before agreeing to paid services.",
    ),
    (
        "Account Management",
        "account|profile|user",
        "Understand account termination policies and what happens to your data when you close your account.",
    ),
];

pub const FALLBACK_SUGGESTION: &str =
    "Review this clause carefully and consider its implications.";

static BUILTIN_RULES: OnceCell<Arc<RuleSet>> = OnceCell::new();

/// The built-in tables as an uncompiled pack.
pub fn builtin_pack() -> RulePack {
    RulePack {
        risk_rules: builtin_risk_rules(),
        categories: builtin_categories(),
        fallback_suggestion: FALLBACK_SUGGESTION.to_string(),
    }
}

pub fn builtin_risk_rules() -> Vec<RiskRule> {
    RISK_RULES
        .iter()
        .map(|(id, description, pattern, weight)| RiskRule {
            id: (*id).to_string(),
            description: (*description).to_string(),
            kind: RuleKind::Regex,
            pattern: (*pattern).to_string(),
            weight: *weight,
        })
        .collect()
}

pub fn builtin_categories() -> Vec<CategoryRule> {
    CATEGORIES
        .iter()
        .map(|(label, pattern, suggestion)| CategoryRule {
            label: (*label).to_string(),
            pattern: (*pattern).to_string(),
            suggestion: (*suggestion).to_string(),
        })
        .collect()
}

/// Process-wide compiled built-in rules, compiled on first use.
pub fn builtin_rule_set() -> Result<Arc<RuleSet>, RuleSetError> {
    BUILTIN_RULES
        .get_or_try_init(|| RuleSet::compile(&builtin_pack()).map(Arc::new))
        .cloned()
}

/// Repository serving the built-in tables.
#[derive(Debug, Default, Clone)]
pub struct BuiltinRuleRepository;

#[async_trait]
impl RuleRepository for BuiltinRuleRepository {
    async fn load_rule_pack(&self) -> AnyResult<RulePack> {
        Ok(builtin_pack())
    }
}
