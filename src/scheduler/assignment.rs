//! Host date assignment
//!
//! This module holds the candidate → date mapping and the bulk operations
//! over it. Operations here never touch the record store: they return the
//! planned [`AssignmentChange`]s, and the caller decides which of them to
//! apply once each write has been persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::models::{CandidateId, HostCandidate};

// ============================================================================
// Shift Direction
// ============================================================================

/// Direction for moving every displayed host through the date sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    /// One meeting later
    Forward,
    /// One meeting earlier
    Backward,
}

impl ShiftDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" | "next" | "+" => Ok(Self::Forward),
            "backward" | "back" | "prev" | "previous" | "-" => Ok(Self::Backward),
            other => Err(format!(
                "invalid shift direction '{other}' (expected forward or backward)"
            )),
        }
    }
}

// ============================================================================
// Assignment Change
// ============================================================================

/// One candidate's date moving from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentChange {
    pub candidate_id: CandidateId,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AssignmentChange {
    pub fn new(candidate_id: CandidateId, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            candidate_id,
            from,
            to,
        }
    }

    /// Whether applying the change would alter anything
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for AssignmentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        write!(
            f,
            "{}: {} -> {}",
            self.candidate_id,
            show(self.from),
            show(self.to)
        )
    }
}

// ============================================================================
// Assignment Map
// ============================================================================

/// Candidate id → assigned date (or none)
///
/// Duplicate dates are allowed; they are reported by validation, not
/// rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentMap {
    entries: BTreeMap<CandidateId, Option<NaiveDate>>,
}

impl AssignmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from each candidate's persisted date
    pub fn from_candidates(candidates: &[HostCandidate]) -> Self {
        Self {
            entries: candidates
                .iter()
                .map(|c| (c.id.clone(), c.assigned_date))
                .collect(),
        }
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.entries.contains_key(id)
    }

    /// Current date of a candidate; `None` for unassigned or unknown ids
    pub fn get(&self, id: &CandidateId) -> Option<NaiveDate> {
        self.entries.get(id).copied().flatten()
    }

    /// Change that [`set`](Self::set) would perform, without applying it
    pub fn plan(&self, id: &CandidateId, date: Option<NaiveDate>) -> AssignmentChange {
        AssignmentChange::new(id.clone(), self.get(id), date)
    }

    /// Set or clear a candidate's date
    pub fn set(&mut self, id: &CandidateId, date: Option<NaiveDate>) -> AssignmentChange {
        let change = self.plan(id, date);
        self.entries.insert(id.clone(), date);
        change
    }

    /// Apply a previously planned change
    pub fn apply(&mut self, change: &AssignmentChange) {
        self.entries.insert(change.candidate_id.clone(), change.to);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of candidates holding a date
    pub fn assigned_count(&self) -> usize {
        self.entries.values().filter(|d| d.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateId, Option<NaiveDate>)> {
        self.entries.iter().map(|(id, date)| (id, *date))
    }

    /// Candidates currently on `date`, in id order
    pub fn candidates_on(&self, date: NaiveDate) -> Vec<&CandidateId> {
        self.entries
            .iter()
            .filter(|(_, d)| **d == Some(date))
            .map(|(id, _)| id)
            .collect()
    }
}

// ============================================================================
// Display order
// ============================================================================

/// Sort candidates for display: assigned date ascending, unassigned last,
/// ties broken by name (case-insensitive) and then id.
pub fn sort_for_display(candidates: &mut [HostCandidate]) {
    candidates.sort_by(|a, b| {
        let by_date = match (a.assigned_date, b.assigned_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_date
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
            .then_with(|| a.id.cmp(&b.id))
    });
}

// ============================================================================
// Bulk operations
// ============================================================================

/// Date one step away from `current` in `dates`
///
/// `dates` must be ascending. Unassigned candidates and dates missing from
/// the sequence start at the first (forward) or last (backward) date; the
/// ends of the sequence clamp. An empty sequence leaves `current` as is.
pub fn shift_target(
    current: Option<NaiveDate>,
    dates: &[NaiveDate],
    direction: ShiftDirection,
) -> Option<NaiveDate> {
    let last = match dates.len().checked_sub(1) {
        Some(last) => last,
        None => return current,
    };

    let position = current.and_then(|date| dates.binary_search(&date).ok());
    let target = match (position, direction) {
        (None, ShiftDirection::Forward) => 0,
        (None, ShiftDirection::Backward) => last,
        (Some(idx), ShiftDirection::Forward) => (idx + 1).min(last),
        (Some(idx), ShiftDirection::Backward) => idx.saturating_sub(1),
    };

    Some(dates[target])
}

/// Changes that shift every displayed candidate by one meeting
pub fn plan_shift_all(
    displayed: &[CandidateId],
    map: &AssignmentMap,
    dates: &[NaiveDate],
    direction: ShiftDirection,
) -> Vec<AssignmentChange> {
    displayed
        .iter()
        .map(|id| {
            let current = map.get(id);
            AssignmentChange::new(id.clone(), current, shift_target(current, dates, direction))
        })
        .filter(|change| !change.is_noop())
        .collect()
}

/// Changes that clear every displayed candidate holding a date
pub fn plan_clear_all(displayed: &[CandidateId], map: &AssignmentMap) -> Vec<AssignmentChange> {
    displayed
        .iter()
        .filter_map(|id| {
            map.get(id)
                .map(|date| AssignmentChange::new(id.clone(), Some(date), None))
        })
        .collect()
}

/// Changes that resolve duplicate dates
///
/// `displayed` must be in display order. The first candidate on each date
/// keeps it; every later one is cleared. Cleared candidates are not moved
/// to open dates.
pub fn plan_quick_fix(displayed: &[CandidateId], map: &AssignmentMap) -> Vec<AssignmentChange> {
    let mut seen = HashSet::new();
    let mut changes = Vec::new();

    for id in displayed {
        if let Some(date) = map.get(id) {
            if !seen.insert(date) {
                changes.push(AssignmentChange::new(id.clone(), Some(date), None));
            }
        }
    }

    changes
}
