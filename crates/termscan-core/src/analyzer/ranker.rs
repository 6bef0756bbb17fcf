use super::Clause;

/// Filters, orders and truncates annotated clauses.
#[derive(Debug, Clone, Copy)]
pub struct ClauseRanker {
    emission_threshold: f64,
    max_clauses: usize,
}

impl ClauseRanker {
    pub fn new(emission_threshold: f64, max_clauses: usize) -> Self {
        Self {
            emission_threshold,
            max_clauses,
        }
    }

    /// Drop clauses at or below the emission threshold, sort by descending
    /// score and keep the top `max_clauses`. Equal scores keep input order.
    pub fn rank(&self, clauses: impl IntoIterator<Item = Clause>) -> Vec<Clause> {
        let mut ranked: Vec<_> = clauses
            .into_iter()
            .filter(|clause| clause.risk_score > self.emission_threshold)
            .collect();
        // `sort_by` is stable
        ranked.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        ranked.truncate(self.max_clauses);
        ranked
    }
}
