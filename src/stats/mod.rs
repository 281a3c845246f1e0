//! Statistic runner: times a table → result computation and prints it.

pub mod builtin;

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Instant;

use crate::data::model::TripTable;

pub use builtin::Summary;

const SEPARATOR_WIDTH: usize = 40;

/// A named computation over a loaded trip table.
#[derive(Clone, Copy)]
pub struct Statistic {
    pub label: &'static str,
    pub compute: fn(&TripTable) -> Summary,
}

impl Statistic {
    pub fn run<W: Write>(&self, out: &mut W, table: &TripTable) -> io::Result<()> {
        display_statistics(out, table, self.label, self.compute)
    }
}

/// Print `Calculating <label>...`, run `compute`, print its result and how
/// long it took, then a separator line.
pub fn display_statistics<W, F, R>(
    out: &mut W,
    table: &TripTable,
    label: &str,
    compute: F,
) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&TripTable) -> R,
    R: Display,
{
    writeln!(out, "\nCalculating {label}...")?;
    let start = Instant::now();
    let result = compute(table);
    writeln!(out, "{result}")?;
    let elapsed = start.elapsed();
    log::debug!("{label} took {elapsed:?} over {} trips", table.len());
    writeln!(out, "\nTime taken: {:.2} seconds.", elapsed.as_secs_f64())?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_label_result_timing_and_separator() {
        let mut out = Vec::new();
        let table = TripTable::default();
        display_statistics(&mut out, &table, "row count", |t| t.len()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "Calculating row count...",
                "0",
                "",
                "Time taken: 0.00 seconds.",
                "----------------------------------------",
            ]
        );
    }

    #[test]
    fn accepts_capturing_closures() {
        let mut out = Vec::new();
        let table = TripTable::default();
        let prefix = String::from("trips:");
        display_statistics(&mut out, &table, "prefixed", |t| format!("{prefix} {}", t.len()))
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("trips: 0"));
    }
}
