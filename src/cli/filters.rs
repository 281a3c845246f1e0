use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use super::prompt::Prompter;
use crate::data::filter::{DayFilter, MonthFilter, ALL, FILTER_MONTHS};
use crate::data::model::DAY_NAMES;
use crate::data::registry::City;

const CITY_PROMPT: &str = "\nChoose a city (Chicago, New York City, or Washington): ";
const MONTH_PROMPT: &str = "\nEnter a month (January - June) or 'all': ";
const DAY_PROMPT: &str = "\nEnter a day of the week or 'all': ";

/// The (city, month, day) choice for one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSelection {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

/// `new york city` → `New York City`.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask for city, month and day, then echo the choice back.
pub fn fetch_filters<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
) -> Result<FilterSelection> {
    writeln!(prompter.output(), "Welcome! Let's analyze US bikeshare data.")?;

    let city = prompter.input_validated(CITY_PROMPT, City::ALL.map(City::key), true)?;
    let month = prompter.input_validated(
        MONTH_PROMPT,
        FILTER_MONTHS.iter().copied().chain([ALL]),
        true,
    )?;
    let day = prompter.input_validated(DAY_PROMPT, DAY_NAMES.iter().copied().chain([ALL]), true)?;

    writeln!(
        prompter.output(),
        "\nFilters applied -> City: {}, Month: {}, Day: {}",
        title_case(&city),
        title_case(&month),
        title_case(&day)
    )?;

    let selection = FilterSelection {
        city: city.parse().context("validated city")?,
        month: month.parse().context("validated month")?,
        day: day.parse().context("validated day")?,
    };
    log::debug!("selected {selection:?}");
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn title_cases_each_word() {
        assert_eq!(title_case("new york city"), "New York City");
        assert_eq!(title_case("all"), "All");
        assert_eq!(title_case("JANUARY"), "January");
    }

    #[test]
    fn collects_three_validated_answers() {
        let input = "Chicago\nmarch\n  FRIDAY \n";
        let mut p = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let selection = fetch_filters(&mut p).unwrap();

        assert_eq!(
            selection,
            FilterSelection {
                city: City::Chicago,
                month: MonthFilter::Only("march"),
                day: DayFilter::Only("friday"),
            }
        );
        let out = String::from_utf8(p.into_parts().1).unwrap();
        assert!(out.contains("Filters applied -> City: Chicago, Month: March, Day: Friday"));
    }

    #[test]
    fn months_outside_the_dataset_range_are_rejected() {
        let input = "new york city\njuly\nall\nall\n";
        let mut p = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let selection = fetch_filters(&mut p).unwrap();

        assert_eq!(selection.city, City::NewYorkCity);
        assert_eq!(selection.month, MonthFilter::All);
        assert_eq!(selection.day, DayFilter::All);
        let out = String::from_utf8(p.into_parts().1).unwrap();
        assert_eq!(out.matches("Invalid input").count(), 1);
        assert!(out.contains("City: New York City, Month: All, Day: All"));
    }
}
