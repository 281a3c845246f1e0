use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

const TRIPS_PER_CITY: usize = 500;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `lo..hi`.
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo) as f64) as i64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.range(0, items.len() as i64) as usize]
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Trip<'a> {
    #[serde(rename = "")]
    index: usize,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "Start Station")]
    start_station: &'a str,
    #[serde(rename = "End Station")]
    end_station: &'a str,
    #[serde(rename = "User Type")]
    user_type: &'a str,
}

/// Chicago and New York City also publish rider demographics.
#[derive(Serialize)]
struct TripWithRider<'a> {
    #[serde(rename = "")]
    index: usize,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "Start Station")]
    start_station: &'a str,
    #[serde(rename = "End Station")]
    end_station: &'a str,
    #[serde(rename = "User Type")]
    user_type: &'a str,
    #[serde(rename = "Gender")]
    gender: &'a str,
    #[serde(rename = "Birth Year")]
    birth_year: Option<f64>,
}

struct CityPlan {
    file_name: &'static str,
    stations: &'static [&'static str],
    demographics: bool,
    seed: u64,
}

const CITIES: [CityPlan; 3] = [
    CityPlan {
        file_name: "chicago.csv",
        stations: &[
            "Streeter Dr & Grand Ave",
            "Lake Shore Dr & Monroe St",
            "Clinton St & Washington Blvd",
            "Canal St & Madison St",
            "Michigan Ave & Oak St",
        ],
        demographics: true,
        seed: 42,
    },
    CityPlan {
        file_name: "new_york_city.csv",
        stations: &[
            "Pershing Square North",
            "E 17 St & Broadway",
            "W 21 St & 6 Ave",
            "West St & Chambers St",
            "Broadway & E 22 St",
        ],
        demographics: true,
        seed: 7,
    },
    CityPlan {
        file_name: "washington.csv",
        stations: &[
            "Columbus Circle / Union Station",
            "Lincoln Memorial",
            "Jefferson Dr & 14th St SW",
            "Massachusetts Ave & Dupont Circle NW",
            "15th & P St NW",
        ],
        demographics: false,
        seed: 1_000,
    },
];

fn random_start(rng: &mut SimpleRng, base: NaiveDateTime) -> NaiveDateTime {
    // January through June 2017.
    let offset = rng.range(0, 181 * 24 * 3600);
    base + Duration::seconds(offset)
}

fn write_city(dir: &Path, plan: &CityPlan) -> Result<PathBuf> {
    let path = dir.join(plan.file_name);
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut rng = SimpleRng::new(plan.seed);
    let base = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid base date")?;

    for index in 0..TRIPS_PER_CITY {
        let start = random_start(&mut rng, base);
        let seconds = rng.range(60, 3600);
        let end = start + Duration::seconds(seconds);
        let start_station = rng.pick(plan.stations);
        let end_station = rng.pick(plan.stations);
        let user_type = if rng.next_f64() < 0.75 {
            "Subscriber"
        } else {
            "Customer"
        };

        let start_time = start.format(TIMESTAMP_FORMAT).to_string();
        let end_time = end.format(TIMESTAMP_FORMAT).to_string();
        let trip_duration = seconds as f64;

        if plan.demographics {
            // Casual riders often leave demographics blank.
            let known = user_type == "Subscriber" || rng.next_f64() < 0.3;
            let gender = if !known {
                ""
            } else if rng.next_f64() < 0.7 {
                "Male"
            } else {
                "Female"
            };
            let birth_year = known.then(|| rng.range(1950, 2002) as f64);
            writer.serialize(TripWithRider {
                index,
                start_time,
                end_time,
                trip_duration,
                start_station,
                end_station,
                user_type,
                gender,
                birth_year,
            })?;
        } else {
            writer.serialize(Trip {
                index,
                start_time,
                end_time,
                trip_duration,
                start_station,
                end_station,
                user_type,
            })?;
        }
    }

    writer.flush()?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    for plan in &CITIES {
        let path = write_city(&out_dir, plan)?;
        log::info!("wrote {}", path.display());
        println!("Wrote {TRIPS_PER_CITY} trips to {}", path.display());
    }
    Ok(())
}
