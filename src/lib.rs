//! # loadshape
//!
//! Loadshape analysis for arbitrary time-stamped load data.
//!
//! A loadshape is a normalized profile of a numeric measurement over
//! recurring time-of-day / day-type categories, computed in one or more
//! 24-hour (or sub-daily) series. The crate is a reusable
//! grouping–aggregation–normalization pipeline rather than a one-off
//! script per dataset:
//!
//! 1. derive categorical key columns from a timestamp column via pluggable
//!    extractors ([`Extractor`], [`KeyExtractor`]);
//! 2. sum the numeric measurement columns per distinct composite key;
//! 3. normalize the aggregate to a comparable scale ([`Normalize`]).
//!
//! ## Modules
//!
//! - [`data::model`] — [`Table`] (column-oriented container) and [`Value`]
//! - [`data::loader`] — CSV/JSON ingestion into a `Table`
//! - [`shape::extract`] — day-type and DST-aware hour-of-day key extractors
//! - [`shape::groupby`] — ordered grouping specification
//! - [`shape::engine`] — the [`Loadshape`] engine
//! - [`error`] — error types
//!
//! ## Quick start
//!
//! ```
//! use loadshape::data::loader;
//! use loadshape::{Loadshape, Normalize};
//!
//! let csv = "\
//! datetime,load
//! 2024-01-01 00:00:00,1.0
//! 2024-01-01 01:00:00,2.0
//! 2024-01-02 00:00:00,3.0
//! 2024-01-02 01:00:00,4.0
//! ";
//! let table = loader::parse_csv_str(csv, None, loader::DEFAULT_TIMESTAMP_FORMAT).unwrap();
//! let mut engine = Loadshape::new(table).unwrap();
//! let shape = engine.loadshape(Normalize::Max).unwrap();
//!
//! // Both days are weekdays: one day-type × two hours.
//! assert_eq!(shape.row_count(), 2);
//! ```

pub mod data;
pub mod error;
pub mod shape;

pub use data::model::{Table, Value};
pub use error::LoadshapeError;
pub use shape::engine::{Loadshape, Normalize};
pub use shape::extract::{DayTypeMap, DstRules, Extractor, KeyExtractor};
pub use shape::groupby::{GroupBySpec, GroupEntry};
