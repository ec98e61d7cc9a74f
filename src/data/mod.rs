/// Data layer: core types, loading, derivation, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, check schema → RawListingTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  brand, vehicle_age → DerivedListingTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  row predicates → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  views    │  group / aggregate / reshape → AggregateView
///   └──────────┘
/// ```

pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod views;
