//! Calendar grid projection of a rotation

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CandidateId, HostCandidate};

/// A host shown in a grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridHost {
    pub id: CandidateId,
    pub name: String,
    pub is_teacher: bool,
}

/// One date of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub cancelled: bool,
    /// False for assigned dates that fall outside the session window
    pub in_window: bool,
    pub hosts: Vec<GridHost>,
}

impl GridDay {
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn has_conflict(&self) -> bool {
        self.hosts.len() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarGrid {
    /// Window dates first, then out-of-window assigned dates, each ascending
    pub days: Vec<GridDay>,
}

impl CalendarGrid {
    pub fn day(&self, date: NaiveDate) -> Option<&GridDay> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn open_days(&self) -> impl Iterator<Item = &GridDay> {
        self.days
            .iter()
            .filter(|d| d.in_window && !d.cancelled && d.is_empty())
    }
}

/// Group displayed candidates by assigned date
///
/// Every window date gets a row even with no host. Hosts keep the order
/// of `displayed`.
pub fn project(
    displayed: &[HostCandidate],
    window: &[NaiveDate],
    cancelled: &BTreeSet<NaiveDate>,
) -> CalendarGrid {
    let mut hosts_by_date: BTreeMap<NaiveDate, Vec<GridHost>> = BTreeMap::new();
    for candidate in displayed {
        if let Some(date) = candidate.assigned_date {
            hosts_by_date.entry(date).or_default().push(GridHost {
                id: candidate.id.clone(),
                name: candidate.display_name.clone(),
                is_teacher: candidate.is_teacher,
            });
        }
    }

    let make_day = |date: NaiveDate, in_window: bool, hosts: Vec<GridHost>| GridDay {
        date,
        weekday: date.weekday(),
        cancelled: cancelled.contains(&date),
        in_window,
        hosts,
    };

    let mut days: Vec<GridDay> = window
        .iter()
        .map(|date| {
            let hosts = hosts_by_date.remove(date).unwrap_or_default();
            make_day(*date, true, hosts)
        })
        .collect();

    days.extend(
        hosts_by_date
            .into_iter()
            .map(|(date, hosts)| make_day(date, false, hosts)),
    );

    CalendarGrid { days }
}
