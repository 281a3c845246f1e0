use std::collections::BTreeMap;
use std::fmt;

use chrono::Timelike;

use super::Statistic;
use crate::cli::filters::title_case;
use crate::data::model::{CellValue, TripTable};

pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const NO_TRIPS: &str = "No trips match the selected filters.";

// ---------------------------------------------------------------------------
// Summary – ordered label/value lines
// ---------------------------------------------------------------------------

/// Result of a built-in statistic: one `label: value` line per entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    lines: Vec<(String, String)>,
}

impl Summary {
    pub fn push(&mut self, label: impl Into<String>, value: impl ToString) {
        self.lines.push((label.into(), value.to_string()));
    }

    /// Value recorded under `label`, if any.
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (label, value) in &self.lines {
            if !first {
                writeln!(f)?;
            }
            first = false;
            if label.is_empty() {
                write!(f, "{value}")?;
            } else {
                write!(f, "{label}: {value}")?;
            }
        }
        Ok(())
    }
}

fn no_trips() -> Summary {
    let mut s = Summary::default();
    s.push("", NO_TRIPS);
    s
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Most frequent value; ties go to the smallest value.
pub fn most_common<T: Ord, I: IntoIterator<Item = T>>(values: I) -> Option<(T, usize)> {
    let counts = value_counts(values);
    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best
}

fn value_counts<T: Ord, I: IntoIterator<Item = T>>(values: I) -> BTreeMap<T, usize> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

/// Non-null values of `column`, or `None` when the table lacks it.
fn column<'a>(
    table: &'a TripTable,
    name: &'a str,
) -> Option<impl Iterator<Item = &'a CellValue> + 'a> {
    if !table.has_column(name) {
        log::warn!("column '{name}' not present; skipping");
        return None;
    }
    Some(table.trips.iter().filter_map(move |t| t.get(name)))
}

fn push_most_common(summary: &mut Summary, table: &TripTable, label: &str, col: &str) {
    match column(table, col) {
        Some(values) => match most_common(values) {
            Some((value, count)) => summary.push(label, format!("{value} ({count} trips)")),
            None => summary.push(label, "no data"),
        },
        None => summary.push(label, "not available for this city"),
    }
}

/// `3725.0` → `1h 2m 5s`.
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    format!("{h}h {m}m {s}s")
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Most common month, weekday and start hour.
pub fn time_stats(table: &TripTable) -> Summary {
    if table.is_empty() {
        return no_trips();
    }
    let mut s = Summary::default();
    if let Some((month, _)) = most_common(table.trips.iter().map(|t| t.month.as_str())) {
        s.push("Most common month", title_case(month));
    }
    if let Some((day, _)) = most_common(table.trips.iter().map(|t| t.day_of_week.as_str())) {
        s.push("Most common day", title_case(day));
    }
    if let Some((hour, _)) = most_common(table.trips.iter().map(|t| t.start_time.hour())) {
        s.push("Most common start hour", format!("{hour:02}:00"));
    }
    s
}

/// Most common start station, end station and start → end trip.
pub fn station_stats(table: &TripTable) -> Summary {
    if table.is_empty() {
        return no_trips();
    }
    let mut s = Summary::default();
    push_most_common(&mut s, table, "Most common start station", START_STATION);
    push_most_common(&mut s, table, "Most common end station", END_STATION);

    let label = "Most common trip";
    if table.has_column(START_STATION) && table.has_column(END_STATION) {
        let pairs = table
            .trips
            .iter()
            .filter_map(|t| Some((t.get(START_STATION)?, t.get(END_STATION)?)));
        match most_common(pairs) {
            Some(((from, to), count)) => s.push(label, format!("{from} -> {to} ({count} trips)")),
            None => s.push(label, "no data"),
        }
    } else {
        s.push(label, "not available for this city");
    }
    s
}

/// Total and mean trip duration.
pub fn trip_duration_stats(table: &TripTable) -> Summary {
    if table.is_empty() {
        return no_trips();
    }
    let mut s = Summary::default();
    let Some(values) = column(table, TRIP_DURATION) else {
        s.push("Trip duration", "not available for this city");
        return s;
    };
    let durations: Vec<f64> = values.filter_map(CellValue::as_f64).collect();
    if durations.is_empty() {
        s.push("Trip duration", "no data");
        return s;
    }
    let total: f64 = durations.iter().sum();
    let mean = total / durations.len() as f64;
    s.push(
        "Total travel time",
        format!("{total:.1} seconds ({})", format_seconds(total)),
    );
    s.push(
        "Mean travel time",
        format!("{mean:.1} seconds ({})", format_seconds(mean)),
    );
    s
}

/// Counts per user type and gender, plus birth year extremes.
pub fn user_stats(table: &TripTable) -> Summary {
    if table.is_empty() {
        return no_trips();
    }
    let mut s = Summary::default();
    for (col, what) in [(USER_TYPE, "user type"), (GENDER, "gender")] {
        match column(table, col) {
            Some(values) => {
                let mut counts: Vec<_> = value_counts(values).into_iter().collect();
                counts.sort_by(|a, b| b.1.cmp(&a.1));
                for (value, count) in counts {
                    s.push(value.to_string(), count);
                }
            }
            None => s.push(title_case(what), "not available for this city"),
        }
    }

    match column(table, BIRTH_YEAR) {
        Some(values) => {
            let years: Vec<&CellValue> = values.collect();
            match (years.iter().min(), years.iter().max()) {
                (Some(earliest), Some(latest)) => {
                    s.push("Earliest birth year", earliest);
                    s.push("Most recent birth year", latest);
                }
                _ => s.push("Birth year", "no data"),
            }
            if let Some((year, _)) = most_common(years) {
                s.push("Most common birth year", year);
            }
        }
        None => s.push("Birth year", "not available for this city"),
    }
    s
}

/// The statistics run after every load, in display order.
pub fn all() -> Vec<Statistic> {
    vec![
        Statistic {
            label: "the most frequent times of travel",
            compute: time_stats,
        },
        Statistic {
            label: "the most popular stations and trip",
            compute: station_stats,
        },
        Statistic {
            label: "trip duration",
            compute: trip_duration_stats,
        },
        Statistic {
            label: "user stats",
            compute: user_stats,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::data::model::{Trip, START_TIME};

    fn trip(ts: &str, cells: &[(&str, &str)]) -> Trip {
        let start = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap();
        let fields: BTreeMap<String, CellValue> = cells
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::guess(v)))
            .collect();
        Trip::new(start, fields)
    }

    fn chicago() -> TripTable {
        let header = [
            START_TIME,
            TRIP_DURATION,
            START_STATION,
            END_STATION,
            USER_TYPE,
            GENDER,
            BIRTH_YEAR,
        ]
        .map(String::from)
        .to_vec();
        let row = |ts, dur, from, to, user, gender, year| {
            trip(
                ts,
                &[
                    (TRIP_DURATION, dur),
                    (START_STATION, from),
                    (END_STATION, to),
                    (USER_TYPE, user),
                    (GENDER, gender),
                    (BIRTH_YEAR, year),
                ],
            )
        };
        TripTable::new(
            header,
            vec![
                row("2017-01-02 08:10:00", "600", "Canal St", "Clark St", "Subscriber", "Male", "1985.0"),
                row("2017-01-09 08:45:00", "1200", "Canal St", "Clark St", "Subscriber", "Female", "1990.0"),
                row("2017-02-07 17:05:00", "300", "Lake Shore Dr", "Canal St", "Customer", "", ""),
                row("2017-01-16 08:20:00", "3600", "Clark St", "Canal St", "Subscriber", "Male", "1985.0"),
            ],
        )
    }

    #[test]
    fn most_common_breaks_ties_toward_smallest() {
        assert_eq!(most_common(["b", "a", "b", "a"]), Some(("a", 2)));
        assert_eq!(most_common(["b", "c", "c"]), Some(("c", 2)));
        assert_eq!(most_common(Vec::<u32>::new()), None);
    }

    #[test]
    fn formats_seconds_as_hours_minutes_seconds() {
        assert_eq!(format_seconds(3725.0), "1h 2m 5s");
        assert_eq!(format_seconds(59.6), "0h 1m 0s");
    }

    #[test]
    fn time_stats_pick_modal_month_day_and_hour() {
        let s = time_stats(&chicago());
        assert_eq!(s.get("Most common month"), Some("January"));
        assert_eq!(s.get("Most common day"), Some("Monday"));
        assert_eq!(s.get("Most common start hour"), Some("08:00"));
    }

    #[test]
    fn station_stats_pick_modal_stations_and_trip() {
        let s = station_stats(&chicago());
        assert_eq!(s.get("Most common start station"), Some("Canal St (2 trips)"));
        assert_eq!(s.get("Most common end station"), Some("Canal St (2 trips)"));
        assert_eq!(s.get("Most common trip"), Some("Canal St -> Clark St (2 trips)"));
    }

    #[test]
    fn trip_duration_totals_and_mean() {
        let s = trip_duration_stats(&chicago());
        assert_eq!(s.get("Total travel time"), Some("5700.0 seconds (1h 35m 0s)"));
        assert_eq!(s.get("Mean travel time"), Some("1425.0 seconds (0h 23m 45s)"));
    }

    #[test]
    fn user_stats_count_types_and_birth_years() {
        let s = user_stats(&chicago());
        assert_eq!(s.get("Subscriber"), Some("3"));
        assert_eq!(s.get("Customer"), Some("1"));
        assert_eq!(s.get("Male"), Some("2"));
        assert_eq!(s.get("Female"), Some("1"));
        assert_eq!(s.get("Earliest birth year"), Some("1985"));
        assert_eq!(s.get("Most recent birth year"), Some("1990"));
        assert_eq!(s.get("Most common birth year"), Some("1985"));
    }

    #[test]
    fn birth_years_mixing_integers_and_floats() {
        let rows = ["2000", "1950.0", "1985", "1985.0", "1985.0"]
            .into_iter()
            .map(|year| trip("2017-03-01 12:00:00", &[(BIRTH_YEAR, year)]))
            .collect();
        let table = TripTable::new(vec![START_TIME.into(), BIRTH_YEAR.into()], rows);

        let s = user_stats(&table);
        assert_eq!(s.get("Earliest birth year"), Some("1950"));
        assert_eq!(s.get("Most recent birth year"), Some("2000"));
        assert_eq!(s.get("Most common birth year"), Some("1985"));
        assert_eq!(
            most_common(table.trips.iter().filter_map(|t| t.get(BIRTH_YEAR))).map(|(_, n)| n),
            Some(3)
        );
    }

    #[test]
    fn missing_columns_are_reported_not_fatal() {
        let table = TripTable::new(
            vec![START_TIME.into(), USER_TYPE.into()],
            vec![trip("2017-03-01 12:00:00", &[(USER_TYPE, "Customer")])],
        );
        let s = user_stats(&table);
        assert_eq!(s.get("Customer"), Some("1"));
        assert_eq!(s.get("Gender"), Some("not available for this city"));
        assert_eq!(s.get("Birth year"), Some("not available for this city"));
        assert_eq!(
            trip_duration_stats(&table).get("Trip duration"),
            Some("not available for this city")
        );
    }

    #[test]
    fn empty_table_prints_a_single_notice() {
        for stat in all() {
            let s = (stat.compute)(&TripTable::default());
            assert_eq!(s.to_string(), NO_TRIPS);
        }
    }
}
