use thiserror::Error;

/// Errors produced by the loadshape core.
///
/// Ingestion failures are reported by the loader collaborator as
/// `anyhow::Error` and are not wrapped here. Degenerate normalization
/// (zero denominator) is not an error either: it propagates as
/// infinite/NaN cell values for the caller to check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadshapeError {
    /// The input table has no columns at all.
    #[error("table has no columns")]
    EmptyTable,

    /// A named column does not exist in the table.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// A column's length does not match the table's row count.
    #[error("column has {actual} rows, table has {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A group source column holds something other than a timestamp.
    /// Extractor/parameter mismatches surface here, at the point of use.
    #[error("column '{column}' does not hold a timestamp at row {row}")]
    NotTimestamp { column: String, row: usize },

    /// `loadshape` (or `add_groups`) was called on an already-aggregated
    /// engine. The group source columns no longer exist at that point, so
    /// the operation fails fast instead of producing garbage.
    #[error("loadshape already computed; build a new engine from fresh data")]
    AlreadyAggregated,
}
