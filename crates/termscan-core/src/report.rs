use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::analyzer::{Clause, RiskTier};
use crate::document::{Document, DocumentId};

/// Default minimum score for the cross-document high-risk query.
pub const DEFAULT_MIN_RISK: f64 = 0.7;

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Outcome of analyzing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub document_id: DocumentId,
    pub source: String,
    /// Length of the submitted text in chars.
    pub content_length: usize,
    pub clauses_found: usize,
    pub high_risk_clauses: usize,
    pub clauses: Vec<Clause>,
}

impl AnalysisReport {
    pub fn new(document: &Document, clauses: Vec<Clause>, high_risk_threshold: f64) -> Self {
        let high_risk_clauses = clauses
            .iter()
            .filter(|clause| clause.risk_score >= high_risk_threshold)
            .count();
        Self {
            document_id: document.id,
            source: document.source.display_name().to_string(),
            content_length: document.content_length(),
            clauses_found: clauses.len(),
            high_risk_clauses,
            clauses,
        }
    }
}

/// Aggregate counts across analyzed documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_documents: usize,
    pub total_clauses: usize,
    pub high_risk_clauses: usize,
}

impl AnalysisStats {
    pub fn from_reports(reports: &[AnalysisReport], high_risk_threshold: f64) -> Self {
        Self {
            total_documents: reports.len(),
            total_clauses: reports.iter().map(|report| report.clauses.len()).sum(),
            high_risk_clauses: high_risk(reports, high_risk_threshold).len(),
        }
    }
}

/// Every clause scoring at least `min_risk` across `reports`, highest first.
/// Equal scores keep report order, then clause order.
pub fn high_risk(reports: &[AnalysisReport], min_risk: f64) -> Vec<&Clause> {
    let mut clauses: Vec<_> = reports
        .iter()
        .flat_map(|report| report.clauses.iter())
        .filter(|clause| clause.risk_score >= min_risk)
        .collect();
    clauses.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    clauses
}

/// Produce a report string from an `AnalysisReport` using the desired format.
pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn render_human(report: &AnalysisReport) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "Document {} ({}): {} chars",
        report.document_id, report.source, report.content_length
    )?;
    writeln!(
        out,
        "Clauses found: {} • High risk: {}",
        report.clauses_found, report.high_risk_clauses
    )?;
    writeln!(out)?;

    if report.clauses.is_empty() {
        writeln!(out, "No risky clauses detected.")?;
        return Ok(out);
    }

    for (idx, clause) in report.clauses.iter().enumerate() {
        render_clause(&mut out, idx + 1, clause)?;
    }
    Ok(out)
}

/// Render a flat clause listing, as used by the high-risk query.
pub fn render_clauses(clauses: &[&Clause]) -> anyhow::Result<String> {
    let mut out = String::new();
    if clauses.is_empty() {
        writeln!(out, "No clauses at or above the requested risk.")?;
        return Ok(out);
    }
    for (idx, clause) in clauses.iter().enumerate() {
        render_clause(&mut out, idx + 1, clause)?;
    }
    Ok(out)
}

fn render_clause(out: &mut String, position: usize, clause: &Clause) -> anyhow::Result<()> {
    writeln!(
        out,
        "{position:>2}. [{tier:<7}] {score:>3.0}% {category} (document {doc})",
        tier = tier_label(clause.risk_tier()),
        score = clause.risk_score * 100.0,
        category = clause.category,
        doc = clause.document_id,
    )?;
    writeln!(out, "    \"{}\"", sanitize_text(&clause.text))?;
    writeln!(out, "    -> {}", clause.suggestion)?;
    if !clause.matched_rules.is_empty() {
        writeln!(out, "    rules: {}", clause.matched_rules.join(", "))?;
    }
    Ok(())
}

fn tier_label(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "high",
        RiskTier::Medium => "medium",
        RiskTier::Low => "low",
        RiskTier::Minimal => "minimal",
    }
}

fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}
