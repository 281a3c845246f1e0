/// Data layer: city registry, trip table, loading, and time filters.
///
/// Architecture:
/// ```text
///   City ──registry──▶ data/<city>.csv
///                          │
///                          ▼
///                    ┌──────────┐
///                    │  loader   │  parse file → TripTable (+ month, day_of_week)
///                    └──────────┘
///                          │
///                          ▼
///                    ┌──────────┐
///                    │  filter   │  month / day predicates → filtered TripTable
///                    └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod registry;
