/// Data layer: core table types and ingestion.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (timestamp column first)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named Value columns, grouping / reduce / divide
///   └──────────┘
/// ```
pub mod loader;
pub mod model;
