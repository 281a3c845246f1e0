use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};

/// Name of the timestamp column every trip file must carry.
pub const START_TIME: &str = "Start Time";
/// Derived lower-cased month name column.
pub const MONTH_COLUMN: &str = "month";
/// Derived lower-cased weekday name column.
pub const DAY_COLUMN: &str = "day_of_week";

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

// ---------------------------------------------------------------------------
// CellValue – a single cell in a trip column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV column lands in.
/// Statistics count values in `BTreeMap`s, so `CellValue` must be `Ord`.
///
/// Cell types are guessed per cell, so one column can mix `Integer` and
/// `Float`. Both compare numerically: `1985` and `1985.0` are the same value.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can use CellValue as a map key --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Birth years arrive as floats ("1989.0") in the raw files.
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Guess the type of a raw text cell. Empty text is a null.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        // `f64::from_str` also takes "inf" and "NaN"; those stay text.
        let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
        if unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            if let Ok(f) = s.parse::<f64>() {
                return CellValue::Float(f);
            }
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Trip – one row of the trip log
// ---------------------------------------------------------------------------

/// A single trip (one row of the source file).
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Parsed `Start Time`.
    pub start_time: NaiveDateTime,
    /// Lower-cased month name derived from `start_time`.
    pub month: String,
    /// Lower-cased weekday name derived from `start_time`.
    pub day_of_week: String,
    /// Every other column: column_name → value.
    pub fields: BTreeMap<String, CellValue>,
}

impl Trip {
    /// Build a trip, deriving the month and weekday columns.
    pub fn new(start_time: NaiveDateTime, fields: BTreeMap<String, CellValue>) -> Self {
        Trip {
            start_time,
            month: month_name(start_time).to_string(),
            day_of_week: day_name(start_time).to_string(),
            fields,
        }
    }

    /// Look up a column value, returning `None` for nulls and absent columns.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column).filter(|v| !v.is_null())
    }
}

pub fn month_name(ts: NaiveDateTime) -> &'static str {
    MONTH_NAMES[ts.month0() as usize]
}

pub fn day_name(ts: NaiveDateTime) -> &'static str {
    DAY_NAMES[ts.weekday().num_days_from_monday() as usize]
}

// ---------------------------------------------------------------------------
// TripTable – the loaded (and filtered) dataset
// ---------------------------------------------------------------------------

/// The in-memory trip table for one city.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripTable {
    /// Header order from the source file, followed by the derived columns.
    pub column_names: Vec<String>,
    pub trips: Vec<Trip>,
}

impl TripTable {
    /// Build a table from a source header and its rows, appending the derived
    /// column names.
    pub fn new(header: Vec<String>, trips: Vec<Trip>) -> Self {
        let mut column_names = header;
        for derived in [MONTH_COLUMN, DAY_COLUMN] {
            if !column_names.iter().any(|c| c == derived) {
                column_names.push(derived.to_string());
            }
        }
        TripTable {
            column_names,
            trips,
        }
    }

    /// Keep only the trips matching `pred`, preserving column layout.
    pub fn retain<F: FnMut(&Trip) -> bool>(mut self, pred: F) -> Self {
        self.trips.retain(pred);
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
