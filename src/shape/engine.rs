use crate::data::model::Table;
use crate::error::LoadshapeError;
use crate::shape::groupby::GroupBySpec;

// ---------------------------------------------------------------------------
// Normalization modes
// ---------------------------------------------------------------------------

/// Normalization policy for the aggregated table.
///
/// The `Max`/`Min`/`Range` denominators are *global* scalars computed over
/// all measurement cells jointly, not per column — that keeps cross-column
/// magnitudes comparable in the final loadshape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalize {
    /// Denominator 1; the table is left unchanged.
    None,
    /// Divide every cell by the global maximum.
    Max,
    /// Divide every cell by the global minimum.
    Min,
    /// Divide every cell by (global maximum − global minimum).
    Range,
    /// Divide every cell by a literal denominator.
    Value(f64),
}

// ---------------------------------------------------------------------------
// Loadshape engine
// ---------------------------------------------------------------------------

/// Raw = post-construction, Aggregated = post-`loadshape`. One-way.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Raw,
    Aggregated,
}

/// The grouping–aggregation–normalization engine.
///
/// Owns a [`Table`] of time-stamped records, derives one categorical
/// column per [`GroupBySpec`] entry, sums the measurement columns per
/// distinct composite key, and normalizes the result. Single-threaded,
/// fully in-memory, and single-use: once [`loadshape`](Loadshape::loadshape)
/// has run, the source rows are gone and a second aggregation is refused.
///
/// ```
/// use chrono::NaiveDate;
/// use loadshape::{Loadshape, Normalize, Table, Value};
///
/// let mut table = Table::new();
/// let stamps: Vec<Value> = (0u32..48)
///     .map(|h| {
///         let day = NaiveDate::from_ymd_opt(2024, 1, 1 + h / 24).unwrap();
///         Value::Timestamp(day.and_hms_opt(h % 24, 0, 0).unwrap())
///     })
///     .collect();
/// table.push_column("datetime", stamps).unwrap();
/// table
///     .push_column(
///         "load",
///         (0u32..48).map(|h| Value::Float(1.0 + f64::from(h % 24))).collect(),
///     )
///     .unwrap();
///
/// let mut engine = Loadshape::new(table).unwrap();
/// let shape = engine.loadshape(Normalize::Max).unwrap();
/// // Two weekdays → one daytype, 24 hours → 24 groups.
/// assert_eq!(shape.row_count(), 24);
/// ```
#[derive(Debug)]
pub struct Loadshape {
    table: Table,
    datecol: String,
    columns: Vec<String>,
    /// Grouping dimensions. Fully replaceable before aggregation.
    pub groupby: GroupBySpec,
    state: State,
}

impl Loadshape {
    /// Build an engine over a table of records. The first column is taken
    /// as the timestamp column; every other column becomes a measurement
    /// column to aggregate. Defaults are installed fresh per instance.
    pub fn new(table: Table) -> Result<Self, LoadshapeError> {
        let datecol = table
            .column_names()
            .first()
            .cloned()
            .ok_or(LoadshapeError::EmptyTable)?;
        let columns: Vec<String> = table
            .column_names()
            .iter()
            .skip(1)
            .cloned()
            .collect();
        let groupby = GroupBySpec::default_for(&datecol);
        Ok(Loadshape {
            table,
            datecol,
            columns,
            groupby,
            state: State::Raw,
        })
    }

    /// Select a different timestamp column. Measurement columns and the
    /// default grouping spec are recomputed around it.
    pub fn with_datecol(mut self, name: &str) -> Result<Self, LoadshapeError> {
        if self.table.column_index(name).is_none() {
            return Err(LoadshapeError::ColumnNotFound {
                name: name.to_string(),
            });
        }
        self.datecol = name.to_string();
        self.columns = self
            .table
            .column_names()
            .iter()
            .filter(|n| *n != name)
            .cloned()
            .collect();
        self.groupby = GroupBySpec::default_for(name);
        Ok(self)
    }

    pub fn datecol(&self) -> &str {
        &self.datecol
    }

    /// The measurement columns, fixed at construction time.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Derive one categorical column per grouping dimension, in spec
    /// order, by running each extractor over the source column. Re-running
    /// overwrites the derived columns (idempotent at the column level).
    ///
    /// The source column must hold timestamps; a mismatched extractor
    /// parameter or source fails here, at the point of use.
    pub fn add_groups(&mut self) -> Result<(), LoadshapeError> {
        if self.state == State::Aggregated {
            return Err(LoadshapeError::AlreadyAggregated);
        }
        for entry in self.groupby.iter() {
            let source = self.table.column(&entry.source).ok_or_else(|| {
                LoadshapeError::ColumnNotFound {
                    name: entry.source.clone(),
                }
            })?;
            let mut derived = Vec::with_capacity(source.len());
            for (row, cell) in source.iter().enumerate() {
                let ts = cell
                    .as_timestamp()
                    .ok_or_else(|| LoadshapeError::NotTimestamp {
                        column: entry.source.clone(),
                        row,
                    })?;
                derived.push(entry.extractor.key(ts));
            }
            self.table.push_column(entry.name.clone(), derived)?;
        }
        Ok(())
    }

    /// Normalized copy of the current table; internal state is untouched.
    pub fn normalize(&self, mode: Normalize) -> Result<Table, LoadshapeError> {
        let mut table = self.table.clone();
        Self::apply(&mut table, &self.columns, mode)?;
        Ok(table)
    }

    /// Normalize the current table in place.
    pub fn normalize_mut(&mut self, mode: Normalize) -> Result<(), LoadshapeError> {
        Self::apply(&mut self.table, &self.columns, mode)
    }

    fn apply(table: &mut Table, columns: &[String], mode: Normalize) -> Result<(), LoadshapeError> {
        let denom = match mode {
            Normalize::None => return Ok(()),
            Normalize::Max => table.global_max(columns)?,
            Normalize::Min => table.global_min(columns)?,
            Normalize::Range => table.global_max(columns)? - table.global_min(columns)?,
            Normalize::Value(v) => v,
        };
        table.div_scalar(columns, denom)
    }

    /// Compute the loadshape: derive the group columns for the current
    /// spec, sum the measurement columns per distinct composite key, and
    /// normalize. The engine's table is *replaced* by the result and the
    /// engine transitions to its aggregated state; a second call fails
    /// with [`LoadshapeError::AlreadyAggregated`].
    ///
    /// Result rows are ordered by ascending composite key; key
    /// combinations with no occurring records are absent, never
    /// zero-filled.
    pub fn loadshape(&mut self, mode: Normalize) -> Result<Table, LoadshapeError> {
        if self.state == State::Aggregated {
            return Err(LoadshapeError::AlreadyAggregated);
        }
        self.add_groups()?;
        let keys = self.groupby.names();
        let grouped = self.table.group_sum(&keys, &self.columns)?;
        log::debug!(
            "aggregated {} records into {} groups ({:?})",
            self.table.row_count(),
            grouped.row_count(),
            keys
        );
        self.table = grouped;
        self.state = State::Aggregated;
        self.normalize_mut(mode)?;
        Ok(self.table.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::shape::extract::{DayTypeMap, DstRules, Extractor};
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;

    /// One full week of hourly records starting Monday 2024-01-01, with a
    /// repeating per-hour load so every group sum is known.
    fn week_table() -> Table {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut stamps = Vec::new();
        let mut loads = Vec::new();
        for h in 0..(7 * 24) {
            stamps.push(Value::Timestamp(start + Duration::hours(h)));
            loads.push(Value::Float(1.0 + (h % 24) as f64));
        }
        let mut table = Table::new();
        table.push_column("datetime", stamps).unwrap();
        table.push_column("load", loads).unwrap();
        table
    }

    #[test]
    fn default_grouping_yields_48_rows_with_max_one() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        let shape = engine.loadshape(Normalize::Max).unwrap();

        // 2 observed day-types × 24 hours.
        assert_eq!(shape.row_count(), 48);
        assert_eq!(shape.column_names(), &["daytype", "hour", "load"]);
        let max = shape.global_max(&["load".to_string()]).unwrap();
        assert_eq!(max, 1.0);
    }

    #[test]
    fn hour_only_grouping_yields_24_rows_with_max_one() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        engine.groupby =
            GroupBySpec::new().with("hour", "datetime", Extractor::HourOfDay(DstRules::new()));
        let shape = engine.loadshape(Normalize::Max).unwrap();

        assert_eq!(shape.row_count(), 24);
        assert_eq!(
            shape.global_max(&["load".to_string()]).unwrap(),
            1.0
        );
    }

    #[test]
    fn normalizing_by_own_max_again_is_identity() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        let first = engine.loadshape(Normalize::Max).unwrap();
        // The table's max is now 1.0; dividing by it changes nothing.
        let second = engine.normalize(Normalize::Max).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_none_leaves_table_unchanged() {
        let engine = Loadshape::new(week_table()).unwrap();
        let copy = engine.normalize(Normalize::None).unwrap();
        assert_eq!(&copy, engine.table());
    }

    #[test]
    fn normalize_by_literal_value() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        engine.groupby =
            GroupBySpec::new().with("hour", "datetime", Extractor::HourOfDay(DstRules::new()));
        let shape = engine.loadshape(Normalize::Value(7.0)).unwrap();
        // Hour 0 sums to 7 × 1.0 across the week.
        assert_eq!(shape.column("load").unwrap()[0], Value::Float(1.0));
    }

    #[test]
    fn groupby_order_permutes_rows_not_values() {
        let mut forward = Loadshape::new(week_table()).unwrap();
        let shape_fwd = forward.loadshape(Normalize::Max).unwrap();

        let mut reversed = Loadshape::new(week_table()).unwrap();
        reversed.groupby = GroupBySpec::new()
            .with("hour", "datetime", Extractor::HourOfDay(DstRules::new()))
            .with("daytype", "datetime", Extractor::DayType(DayTypeMap::default()));
        let shape_rev = reversed.loadshape(Normalize::Max).unwrap();

        // Key order differs...
        assert_eq!(shape_fwd.column_names(), &["daytype", "hour", "load"]);
        assert_eq!(shape_rev.column_names(), &["hour", "daytype", "load"]);

        // ...but the per-group values are a permutation of each other.
        let collect = |t: &Table| -> HashMap<(Value, Value), Value> {
            let d = t.column("daytype").unwrap();
            let h = t.column("hour").unwrap();
            let l = t.column("load").unwrap();
            (0..t.row_count())
                .map(|i| ((d[i].clone(), h[i].clone()), l[i].clone()))
                .collect()
        };
        assert_eq!(collect(&shape_fwd), collect(&shape_rev));
    }

    #[test]
    fn unmatched_daytype_records_are_dropped() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        let mut map = DayTypeMap::new();
        map.push("weekday", vec![0, 1, 2, 3, 4]);
        engine.groupby = GroupBySpec::new()
            .with("daytype", "datetime", Extractor::DayType(map))
            .with("hour", "datetime", Extractor::HourOfDay(DstRules::new()));
        let shape = engine.loadshape(Normalize::None).unwrap();

        // Weekend records have no day-type and form no group at all.
        assert_eq!(shape.row_count(), 24);
        // Hour 0 on weekdays: 5 × 1.0.
        assert_eq!(shape.column("load").unwrap()[0], Value::Float(5.0));
    }

    #[test]
    fn dst_shift_splits_off_hour_24() {
        // Rule covering all of the week shifts every hour after the start.
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut rules = DstRules::new();
        rules.insert(2024, (start, start + Duration::days(8)));

        let mut engine = Loadshape::new(week_table()).unwrap();
        engine.groupby =
            GroupBySpec::new().with("hour", "datetime", Extractor::HourOfDay(rules));
        let shape = engine.loadshape(Normalize::None).unwrap();

        let hours = shape.column("hour").unwrap();
        // Hour 0 only occurs at the unshifted start instant; 24 exists.
        assert_eq!(hours[0], Value::Integer(0));
        assert_eq!(hours[hours.len() - 1], Value::Integer(24));
        assert_eq!(shape.row_count(), 25);
    }

    #[test]
    fn second_loadshape_call_fails_fast() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        engine.loadshape(Normalize::Max).unwrap();
        assert_eq!(
            engine.loadshape(Normalize::Max).unwrap_err(),
            LoadshapeError::AlreadyAggregated
        );
        assert_eq!(
            engine.add_groups().unwrap_err(),
            LoadshapeError::AlreadyAggregated
        );
    }

    #[test]
    fn add_groups_is_idempotent() {
        let mut engine = Loadshape::new(week_table()).unwrap();
        engine.add_groups().unwrap();
        let cols = engine.table().column_count();
        engine.add_groups().unwrap();
        assert_eq!(engine.table().column_count(), cols);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(
            Loadshape::new(Table::new()).unwrap_err(),
            LoadshapeError::EmptyTable
        );
    }

    #[test]
    fn with_datecol_unknown_column() {
        let engine = Loadshape::new(week_table()).unwrap();
        assert!(matches!(
            engine.with_datecol("nope"),
            Err(LoadshapeError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn non_timestamp_source_fails_at_point_of_use() {
        let mut table = Table::new();
        table
            .push_column("datetime", vec![Value::String("not a date".into())])
            .unwrap();
        table.push_column("load", vec![Value::Float(1.0)]).unwrap();
        let mut engine = Loadshape::new(table).unwrap();
        assert_eq!(
            engine.add_groups().unwrap_err(),
            LoadshapeError::NotTimestamp {
                column: "datetime".into(),
                row: 0
            }
        );
    }
}
