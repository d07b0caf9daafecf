//! Calendar window expansion
//!
//! Turns a session's start date, end date and free-text weekday list into
//! the ordered sequence of meeting dates. Dates are plain calendar dates
//! with no time or timezone component, so no conversion can shift a day.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::SessionRecord;

// ============================================================================
// Weekday parsing
// ============================================================================

/// Every accepted weekday spelling. Matching is exact after lowercasing.
const WEEKDAY_TOKENS: [(&str, Weekday); 14] = [
    ("sunday", Weekday::Sun),
    ("sun", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sat", Weekday::Sat),
];

/// Parse a single weekday token (full name or 3-letter abbreviation)
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let normalized = token.trim().to_lowercase();
    WEEKDAY_TOKENS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, day)| *day)
}

/// Weekday ordinal with Sunday = 0
pub fn weekday_ordinal(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

/// Set of weekdays stored as a 7-bit mask (bit 0 = Sunday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self(0b111_1111)
    }

    /// Build from ordinals 0-6; larger values are ignored
    pub fn from_ordinals(ordinals: &[u8]) -> Self {
        let mut set = Self::empty();
        for &ordinal in ordinals.iter().filter(|&&o| o < 7) {
            set.0 |= 1 << ordinal;
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << weekday_ordinal(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << weekday_ordinal(day)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in the set, Sunday first
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ]
        .into_iter()
        .filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Result of parsing a comma-separated weekday list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DayFilter {
    /// Recognized weekdays
    pub days: WeekdaySet,

    /// Tokens that matched no weekday spelling
    pub ignored: Vec<String>,
}

impl DayFilter {
    /// Whether the filter restricts anything (at least one weekday recognized)
    pub fn is_active(&self) -> bool {
        !self.days.is_empty()
    }
}

/// Parse a free-text weekday list such as `"Monday, wed"`
///
/// Unknown tokens are collected in [`DayFilter::ignored`] and otherwise
/// have no effect.
pub fn parse_day_filter(input: &str) -> DayFilter {
    let mut filter = DayFilter::default();

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match parse_weekday(token) {
            Some(day) => filter.days.insert(day),
            None => filter.ignored.push(token.to_string()),
        }
    }

    if !filter.ignored.is_empty() {
        tracing::debug!(ignored = ?filter.ignored, "Ignoring unrecognized weekday tokens");
    }

    filter
}

// ============================================================================
// Date parsing
// ============================================================================

/// Parse a `YYYY-MM-DD` calendar date
///
/// A trailing time part (`2025-01-06T00:00:00Z`, `2025-01-06 09:00`) is
/// dropped before parsing so the calendar day is taken as written.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let date_part = match trimmed.find(|c: char| c == 'T' || c == ' ') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Canonical `YYYY-MM-DD` form
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Calendar Window
// ============================================================================

/// Inclusive date range with an optional weekday restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// `None` means every weekday
    pub allowed: Option<WeekdaySet>,
}

impl CalendarWindow {
    /// Window covering every day between `start` and `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            allowed: None,
        }
    }

    /// Restrict to the given weekdays; an empty set removes the restriction
    pub fn with_weekdays(mut self, days: WeekdaySet) -> Self {
        self.allowed = if days.is_empty() { None } else { Some(days) };
        self
    }

    /// Build from raw text inputs; `None` when either bound is unparseable
    pub fn parse(start: &str, end: &str, day_filter: Option<&str>) -> Option<Self> {
        let start = parse_calendar_date(start)?;
        let end = parse_calendar_date(end)?;
        let days = day_filter
            .map(|f| parse_day_filter(f).days)
            .unwrap_or_default();
        Some(Self::new(start, end).with_weekdays(days))
    }

    /// Window of a stored session
    pub fn from_session(session: &SessionRecord) -> Option<Self> {
        Self::parse(
            &session.start_date,
            &session.end_date,
            session.day_filter.as_deref(),
        )
    }

    /// Whether a date falls on an allowed weekday inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start
            && date <= self.end
            && self
                .allowed
                .map(|days| days.contains(date.weekday()))
                .unwrap_or(true)
    }

    /// Ordered meeting dates; empty when `start > end`
    pub fn dates(&self) -> Vec<NaiveDate> {
        if self.start > self.end {
            return Vec::new();
        }

        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .filter(|d| {
                self.allowed
                    .map(|days| days.contains(d.weekday()))
                    .unwrap_or(true)
            })
            .collect()
    }
}

/// Expand raw window inputs into meeting dates
///
/// Never fails: unparseable bounds or an inverted range give an empty
/// sequence, and a filter with no recognizable weekday means "every day".
pub fn expand_window(start: &str, end: &str, day_filter: Option<&str>) -> Vec<NaiveDate> {
    match CalendarWindow::parse(start, end, day_filter) {
        Some(window) => window.dates(),
        None => {
            tracing::debug!(start, end, "Unparseable calendar window, no dates");
            Vec::new()
        }
    }
}
