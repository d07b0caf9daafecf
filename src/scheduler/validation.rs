//! Schedule validation and coverage reporting
//!
//! Everything here is recomputed from the displayed candidates and the
//! window dates on every call. Issues are advisory: nothing in this module
//! can block an edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::models::{CandidateId, HostCandidate};

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
    Info,
    Success,
}

impl IssueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateDate,
    MissingAddress,
    Unassigned,
    Coverage,
    FullCoverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateId>,
}

/// Coverage of the window by resolved hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub window_size: usize,
    /// Window dates before the first assignment
    pub implicit: usize,
    /// Window dates with an explicit host
    pub explicit: usize,
    pub covered: usize,
    pub remaining: usize,
    pub first_assigned: Option<NaiveDate>,
}

impl Coverage {
    /// Covered share of the window (1.0 for an empty window)
    pub fn fraction(&self) -> f64 {
        if self.window_size == 0 {
            return 1.0;
        }
        self.covered as f64 / self.window_size as f64
    }
}

/// Compute coverage of `window` by the displayed candidates
///
/// Window dates strictly before the earliest assigned date count as
/// covered, in addition to the explicitly assigned window dates.
pub fn compute_coverage(displayed: &[HostCandidate], window: &[NaiveDate]) -> Coverage {
    let assigned: BTreeSet<NaiveDate> = displayed.iter().filter_map(|c| c.assigned_date).collect();
    let first_assigned = assigned.iter().next().copied();

    let mut implicit = 0;
    let mut explicit = 0;
    for date in window {
        if assigned.contains(date) {
            explicit += 1;
        } else if first_assigned.map(|first| *date < first).unwrap_or(false) {
            implicit += 1;
        }
    }

    let covered = implicit + explicit;
    Coverage {
        window_size: window.len(),
        implicit,
        explicit,
        covered,
        remaining: window.len() - covered,
        first_assigned,
    }
}

/// Validation result for one session view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub coverage: Coverage,
}

impl ValidationReport {
    pub fn count(&self, level: IssueLevel) -> usize {
        self.issues.iter().filter(|i| i.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(IssueLevel::Error) > 0
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// Validate the displayed candidates against the window dates
///
/// `displayed` should be in display order; issue order follows it.
pub fn validate(displayed: &[HostCandidate], window: &[NaiveDate]) -> ValidationReport {
    let mut issues = Vec::new();

    let mut by_date: BTreeMap<NaiveDate, Vec<&HostCandidate>> = BTreeMap::new();
    for candidate in displayed {
        if let Some(date) = candidate.assigned_date {
            by_date.entry(date).or_default().push(candidate);
        }
    }

    for (date, group) in by_date.iter().filter(|(_, g)| g.len() > 1) {
        let names: Vec<&str> = group.iter().map(|c| c.display_name.as_str()).collect();
        issues.push(ValidationIssue {
            level: IssueLevel::Error,
            kind: IssueKind::DuplicateDate,
            message: format!("{} hosts on {}: {}", group.len(), date, names.join(", ")),
            date: Some(*date),
            candidates: group.iter().map(|c| c.id.clone()).collect(),
        });
    }

    for candidate in displayed.iter().filter(|c| !c.has_usable_address()) {
        issues.push(ValidationIssue {
            level: IssueLevel::Warning,
            kind: IssueKind::MissingAddress,
            message: format!("{} has no address", candidate.display_name),
            date: candidate.assigned_date,
            candidates: vec![candidate.id.clone()],
        });
    }

    let unassigned: Vec<&HostCandidate> =
        displayed.iter().filter(|c| c.assigned_date.is_none()).collect();
    for candidate in &unassigned {
        issues.push(ValidationIssue {
            level: IssueLevel::Warning,
            kind: IssueKind::Unassigned,
            message: format!("{} has no host date", candidate.display_name),
            date: None,
            candidates: vec![candidate.id.clone()],
        });
    }

    let coverage = compute_coverage(displayed, window);
    if coverage.window_size > 0 {
        if coverage.remaining > 0 {
            issues.push(ValidationIssue {
                level: IssueLevel::Info,
                kind: IssueKind::Coverage,
                message: format!(
                    "{}/{} dates covered ({:.0}%), {} remaining",
                    coverage.covered,
                    coverage.window_size,
                    coverage.fraction() * 100.0,
                    coverage.remaining
                ),
                date: None,
                candidates: Vec::new(),
            });
        } else if unassigned.is_empty() {
            issues.push(ValidationIssue {
                level: IssueLevel::Success,
                kind: IssueKind::FullCoverage,
                message: format!("All {} dates have a host", coverage.window_size),
                date: None,
                candidates: Vec::new(),
            });
        }
    }

    ValidationReport { issues, coverage }
}
