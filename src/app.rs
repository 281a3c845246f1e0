use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::cli::filters::{fetch_filters, FilterSelection};
use crate::cli::prompt::Prompter;
use crate::data::loader::load_city_data;
use crate::data::registry::CityRegistry;
use crate::state::Phase;
use crate::stats::Statistic;

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

pub struct BikeshareApp<R, W> {
    pub registry: CityRegistry,
    pub prompter: Prompter<R, W>,
    pub statistics: Vec<Statistic>,
}

impl<R: BufRead, W: Write> BikeshareApp<R, W> {
    pub fn new(
        registry: CityRegistry,
        prompter: Prompter<R, W>,
        statistics: Vec<Statistic>,
    ) -> Self {
        Self {
            registry,
            prompter,
            statistics,
        }
    }

    /// Collect filters, load, analyze, and ask to restart until the user
    /// declines. Returns the number of load passes executed.
    pub fn run(&mut self) -> Result<usize> {
        let mut passes = 0;
        let mut phase = Phase::default();

        while !phase.is_done() {
            log::trace!("phase: {}", phase.name());
            phase = match phase {
                Phase::CollectingFilters => Phase::Loading(fetch_filters(&mut self.prompter)?),
                Phase::Loading(selection) => {
                    writeln!(self.prompter.output(), "\nLoading data...")?;
                    passes += 1;
                    let FilterSelection { city, month, day } = selection;
                    let table = load_city_data(&self.registry, city, month, day)
                        .with_context(|| format!("loading trips for {city}"))?;
                    Phase::Analyzing(table)
                }
                Phase::Analyzing(table) => {
                    for stat in &self.statistics {
                        stat.run(self.prompter.output(), &table)?;
                    }
                    Phase::AskingRestart
                }
                Phase::AskingRestart => {
                    if self.prompter.ask_restart()? {
                        Phase::CollectingFilters
                    } else {
                        Phase::Done
                    }
                }
                Phase::Done => Phase::Done,
            };
        }

        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;
    use crate::stats::builtin;

    const CHICAGO_CSV: &str = "\
Start Time,Trip Duration,Start Station,End Station,User Type
2017-01-02 08:00:00,600,Canal St,Clark St,Subscriber
2017-02-06 17:30:00,900,Clark St,Canal St,Customer
";

    type TestApp = BikeshareApp<Cursor<Vec<u8>>, Vec<u8>>;

    fn app(input: &str, statistics: Vec<Statistic>) -> (TempDir, TestApp) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("chicago.csv"), CHICAGO_CSV).unwrap();
        let prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let app = BikeshareApp::new(CityRegistry::rooted_at(dir.path()), prompter, statistics);
        (dir, app)
    }

    fn transcript(app: TestApp) -> String {
        String::from_utf8(app.prompter.into_parts().1).unwrap()
    }

    #[test]
    fn restart_yes_then_no_runs_two_passes() {
        let input = "chicago\njanuary\nall\nyes\nChicago\nall\nmonday\nno\n";
        let (_dir, mut app) = app(input, Vec::new());
        assert_eq!(app.run().unwrap(), 2);

        let out = transcript(app);
        assert_eq!(out.matches("Loading data...").count(), 2);
        assert_eq!(out.matches("Would you like to restart?").count(), 2);
    }

    #[test]
    fn anything_but_yes_ends_after_one_pass() {
        let (_dir, mut app) = app("chicago\nall\nall\nnope\n", Vec::new());
        assert_eq!(app.run().unwrap(), 1);
    }

    #[test]
    fn runs_each_statistic_over_the_filtered_table() {
        let count = Statistic {
            label: "trip count",
            compute: |t| {
                let mut s = builtin::Summary::default();
                s.push("Trips", t.len());
                s
            },
        };
        let (_dir, mut app) = app("chicago\njanuary\nall\nno\n", vec![count]);
        app.run().unwrap();

        let out = transcript(app);
        assert!(out.contains("Calculating trip count..."));
        assert!(out.contains("Trips: 1"));
        assert!(out.contains("Time taken: "));
    }

    #[test]
    fn builtin_statistics_run_end_to_end() {
        let (_dir, mut app) = app("chicago\nall\nall\nno\n", builtin::all());
        app.run().unwrap();

        let out = transcript(app);
        assert!(out.contains("Most common month: February"));
        assert!(out.contains("Total travel time: 1500.0 seconds (0h 25m 0s)"));
        assert!(out.contains("Gender: not available for this city"));
    }

    #[test]
    fn missing_data_file_aborts_the_run() {
        let (_dir, mut app) = app("washington\nall\nall\nno\n", Vec::new());
        let err = app.run().unwrap_err();
        assert!(format!("{err:#}").contains("washington.csv"));
    }
}
