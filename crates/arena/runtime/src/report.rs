//! Arena reports.

use std::cmp::Ordering;

use arena_ssn::{ActuationSheet, OracleSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One adapted implementation of a candidate, run against the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterRun {
    /// `Unit#rank`
    pub adapter: String,
    pub container: String,
    pub converters: usize,
    pub oracle: OracleSummary,
    pub actuation: ActuationSheet,
}

/// What happened to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateStatus {
    Evaluated,
    /// No permutation of the candidate fits the abstraction.
    NoAdapter,
    /// The candidate's task died before producing a result.
    Failed { message: String },
}

/// Result for one candidate of the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Position in the pool.
    pub position: usize,
    pub unit: String,
    pub status: CandidateStatus,
    pub runs: Vec<AdapterRun>,
}

impl CandidateReport {
    pub fn no_adapter(position: usize, unit: impl Into<String>) -> Self {
        Self {
            position,
            unit: unit.into(),
            status: CandidateStatus::NoAdapter,
            runs: Vec::new(),
        }
    }

    pub fn failed(position: usize, unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            position,
            unit: unit.into(),
            status: CandidateStatus::Failed {
                message: message.into(),
            },
            runs: Vec::new(),
        }
    }

    pub fn adapter_count(&self) -> usize {
        self.runs.len()
    }

    /// Run that matched the most expectations; the earlier rank wins ties.
    pub fn best_run(&self) -> Option<&AdapterRun> {
        self.runs.iter().fold(None, |best: Option<&AdapterRun>, run| match best {
            Some(b) if b.oracle.matched >= run.oracle.matched => Some(b),
            _ => Some(run),
        })
    }

    /// Expectations matched and checked by the best run.
    pub fn score(&self) -> OracleSummary {
        self.best_run().map(|r| r.oracle).unwrap_or_default()
    }

    /// Evaluated, and some run met every expectation of the sheet.
    pub fn passed(&self) -> bool {
        self.status == CandidateStatus::Evaluated
            && self.runs.iter().any(|r| r.oracle.all_matched())
    }
}

/// Result of evaluating one stimulus sheet against a candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaReport {
    pub id: Uuid,
    pub sheet: String,
    pub abstraction: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In pool order.
    pub candidates: Vec<CandidateReport>,
}

impl ArenaReport {
    pub fn candidate(&self, unit: &str) -> Option<&CandidateReport> {
        self.candidates.iter().find(|c| c.unit == unit)
    }

    pub fn passed(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.passed())
    }

    /// Candidates ordered by matched expectations, best first. Candidates
    /// without a run come last; pool order breaks ties.
    pub fn ranking(&self) -> Vec<&CandidateReport> {
        let mut ranked: Vec<&CandidateReport> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| match (a.best_run(), b.best_run()) {
            (Some(x), Some(y)) => y.oracle.matched.cmp(&x.oracle.matched),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ranked
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(adapter: &str, checked: usize, matched: usize) -> AdapterRun {
        AdapterRun {
            adapter: adapter.into(),
            container: format!("{}-c", adapter),
            converters: 0,
            oracle: OracleSummary { checked, matched },
            actuation: ActuationSheet {
                sheet: "s".into(),
                header: None,
                adapter: adapter.into(),
                unit: "U".into(),
                executed_at: Utc::now(),
                timeout_ms: 5_000,
                operations: Vec::new(),
            },
        }
    }

    fn evaluated(position: usize, unit: &str, runs: Vec<AdapterRun>) -> CandidateReport {
        CandidateReport {
            position,
            unit: unit.into(),
            status: CandidateStatus::Evaluated,
            runs,
        }
    }

    #[test]
    fn best_run_prefers_earlier_rank_on_ties() {
        let report = evaluated(0, "A", vec![run("A#0", 3, 2), run("A#1", 3, 2), run("A#2", 3, 1)]);
        assert_eq!(report.best_run().unwrap().adapter, "A#0");
        assert_eq!(report.score(), OracleSummary { checked: 3, matched: 2 });
        assert!(!report.passed());

        let report = evaluated(0, "A", vec![run("A#0", 3, 1), run("A#1", 3, 3)]);
        assert_eq!(report.best_run().unwrap().adapter, "A#1");
        assert!(report.passed());
    }

    #[test]
    fn ranking_orders_by_matches() {
        let report = ArenaReport {
            id: Uuid::new_v4(),
            sheet: "s".into(),
            abstraction: "Stack".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            candidates: vec![
                CandidateReport::no_adapter(0, "None"),
                evaluated(1, "Half", vec![run("Half#0", 2, 1)]),
                evaluated(2, "Full", vec![run("Full#0", 2, 2)]),
                CandidateReport::failed(3, "Broken", "panicked"),
            ],
        };
        let order: Vec<&str> = report.ranking().iter().map(|c| c.unit.as_str()).collect();
        assert_eq!(order, vec!["Full", "Half", "None", "Broken"]);
        assert_eq!(report.passed().count(), 1);
        assert_eq!(report.candidate("Half").unwrap().adapter_count(), 1);

        let json = report.to_json().unwrap();
        let back: ArenaReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.candidates[3].status, CandidateStatus::Failed { message: "panicked".into() });
    }
}
