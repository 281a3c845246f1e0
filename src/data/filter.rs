use std::fmt;
use std::str::FromStr;

use super::model::{TripTable, DAY_NAMES, MONTH_NAMES};

/// Keyword that disables filtering on an axis.
pub const ALL: &str = "all";

/// Months the datasets cover.
pub const FILTER_MONTHS: [&str; 6] = ["january", "february", "march", "april", "may", "june"];

// ---------------------------------------------------------------------------
// Per-axis filters
// ---------------------------------------------------------------------------

/// Month axis: either every month or a single lower-cased month name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    Only(&'static str),
}

/// Weekday axis: either every day or a single lower-cased day name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFilter {
    All,
    Only(&'static str),
}

#[derive(Debug, thiserror::Error)]
#[error("'{value}' is not a valid {axis} filter")]
pub struct InvalidFilter {
    pub axis: &'static str,
    pub value: String,
}

fn parse_axis(
    s: &str,
    names: &[&'static str],
    axis: &'static str,
) -> Result<Option<&'static str>, InvalidFilter> {
    let wanted = s.trim();
    if wanted.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    names
        .iter()
        .copied()
        .find(|n| n.eq_ignore_ascii_case(wanted))
        .map(Some)
        .ok_or_else(|| InvalidFilter {
            axis,
            value: s.to_string(),
        })
}

impl FromStr for MonthFilter {
    type Err = InvalidFilter;

    /// Accepts any calendar month so tables loaded by path can be filtered
    /// outside the interactive January–June range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_axis(s, &MONTH_NAMES, "month")? {
            Some(name) => MonthFilter::Only(name),
            None => MonthFilter::All,
        })
    }
}

impl FromStr for DayFilter {
    type Err = InvalidFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_axis(s, &DAY_NAMES, "day")? {
            Some(name) => DayFilter::Only(name),
            None => DayFilter::All,
        })
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str(ALL),
            MonthFilter::Only(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str(ALL),
            DayFilter::Only(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Keep only trips whose derived month matches. `All` keeps every row.
pub fn filter_month(table: TripTable, month: MonthFilter) -> TripTable {
    match month {
        MonthFilter::All => table,
        MonthFilter::Only(name) => {
            let before = table.len();
            let table = table.retain(|t| t.month.eq_ignore_ascii_case(name));
            log::debug!("month filter '{name}': {before} -> {} trips", table.len());
            table
        }
    }
}

/// Keep only trips whose derived weekday matches. `All` keeps every row.
pub fn filter_day(table: TripTable, day: DayFilter) -> TripTable {
    match day {
        DayFilter::All => table,
        DayFilter::Only(name) => {
            let before = table.len();
            let table = table.retain(|t| t.day_of_week.eq_ignore_ascii_case(name));
            log::debug!("day filter '{name}': {before} -> {} trips", table.len());
            table
        }
    }
}

/// Apply the month filter, then the day filter.
pub fn apply_filters(table: TripTable, month: MonthFilter, day: DayFilter) -> TripTable {
    filter_day(filter_month(table, month), day)
}
