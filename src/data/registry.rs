use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// City – the three supported datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Canonical lower-case key, as typed by the user.
    pub fn key(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }

    /// Data file name inside the registry root.
    pub fn file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown city '{0}'")]
pub struct UnknownCity(pub String);

impl FromStr for City {
    type Err = UnknownCity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        City::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCity(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// CityRegistry – city → data file
// ---------------------------------------------------------------------------

/// Fixed mapping from each [`City`] to its trip file.
#[derive(Debug, Clone)]
pub struct CityRegistry {
    root: PathBuf,
}

impl Default for CityRegistry {
    /// Files under `data/` relative to the working directory.
    fn default() -> Self {
        Self::rooted_at("data")
    }
}

impl CityRegistry {
    /// Same file layout as the default registry, under another directory.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        CityRegistry { root: root.into() }
    }

    pub fn path_for(&self, city: City) -> PathBuf {
        self.root.join(city.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_points_at_data_dir() {
        let registry = CityRegistry::default();
        assert_eq!(
            registry.path_for(City::NewYorkCity),
            PathBuf::from("data/new_york_city.csv")
        );
        assert_eq!(
            registry.path_for(City::Chicago),
            PathBuf::from("data/chicago.csv")
        );
    }

    #[test]
    fn parses_city_keys_case_insensitively() {
        assert_eq!("  New York City ".parse::<City>().unwrap(), City::NewYorkCity);
        assert_eq!("WASHINGTON".parse::<City>().unwrap(), City::Washington);
        assert!("boston".parse::<City>().is_err());
    }
}
