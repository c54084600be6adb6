use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// DayTypeMap – ordered day-type classification table
// ---------------------------------------------------------------------------

/// Weekday index reserved for a holiday override. `weekday()` never
/// produces it, so the default `holiday` day-type matches nothing unless a
/// caller maps holidays onto it explicitly.
pub const HOLIDAY_WEEKDAY: u32 = 7;

/// Ordered mapping from a day-type label to a set of weekday indices
/// (0 = Monday … 6 = Sunday, plus [`HOLIDAY_WEEKDAY`]).
///
/// Order matters: classification returns the *first* label whose set
/// contains the weekday, so overlapping entries resolve to the earliest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTypeMap {
    entries: Vec<(String, Vec<u32>)>,
}

impl DayTypeMap {
    /// An empty map. Every timestamp classifies as null until entries are
    /// pushed.
    pub fn new() -> Self {
        DayTypeMap {
            entries: Vec::new(),
        }
    }

    /// Append a label with its weekday-index set.
    pub fn push(&mut self, label: impl Into<String>, weekdays: Vec<u32>) {
        self.entries.push((label.into(), weekdays));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a timestamp: the first label (in insertion order) whose
    /// weekday set contains the timestamp's weekday, or [`Value::Null`]
    /// when none matches.
    pub fn classify(&self, ts: NaiveDateTime) -> Value {
        let weekday = ts.weekday().num_days_from_monday();
        for (label, weekdays) in &self.entries {
            if weekdays.contains(&weekday) {
                return Value::String(label.clone());
            }
        }
        Value::Null
    }
}

impl Default for DayTypeMap {
    /// The conventional three-way split: `weekday` = Mon–Fri,
    /// `weekend` = Sat–Sun, `holiday` = the override index.
    /// Returns a fresh, independently owned value per call.
    fn default() -> Self {
        let mut map = DayTypeMap::new();
        map.push("weekday", vec![0, 1, 2, 3, 4]);
        map.push("weekend", vec![5, 6]);
        map.push("holiday", vec![HOLIDAY_WEEKDAY]);
        map
    }
}

// ---------------------------------------------------------------------------
// DstRules – per-year daylight-saving intervals
// ---------------------------------------------------------------------------

/// Per-year daylight-saving interval table: year → `(start, end]` during
/// which clocks are considered shifted forward by one hour. One interval
/// per year.
pub type DstRules = BTreeMap<i32, (NaiveDateTime, NaiveDateTime)>;

/// Hour of day for a timestamp, shifted by the DST rule for its year.
///
/// Half-open on the left: a timestamp exactly at `start` keeps its
/// unmodified hour, one strictly inside `(start, end]` gets `hour + 1`.
/// The shifted value may be 24, which downstream grouping keeps as its own
/// group rather than wrapping to 0.
pub fn shifted_hour(ts: NaiveDateTime, rules: &DstRules) -> Value {
    let mut hour = i64::from(ts.hour());
    if let Some((start, end)) = rules.get(&ts.year()) {
        if ts > *start && ts <= *end {
            hour += 1;
        }
    }
    Value::Integer(hour)
}

// ---------------------------------------------------------------------------
// Extractors – timestamp → categorical key
// ---------------------------------------------------------------------------

/// Capability for computing a categorical group key from a timestamp.
/// Implement this to add grouping dimensions beyond the two built-ins.
pub trait KeyExtractor {
    fn key(&self, ts: NaiveDateTime) -> Value;
}

/// A group-key extractor paired with its auxiliary parameter.
///
/// The two built-ins carry their parameter tables directly; `Custom` is
/// the open extension point for caller-defined extractors.
pub enum Extractor {
    /// Day-type classification via an ordered [`DayTypeMap`].
    DayType(DayTypeMap),
    /// Hour-of-day with a per-year [`DstRules`] shift.
    HourOfDay(DstRules),
    /// Caller-supplied extractor.
    Custom(Box<dyn KeyExtractor>),
}

impl Extractor {
    /// Compute the group key for a timestamp. Pure; no side effects.
    pub fn key(&self, ts: NaiveDateTime) -> Value {
        match self {
            Extractor::DayType(map) => map.classify(ts),
            Extractor::HourOfDay(rules) => shifted_hour(ts, rules),
            Extractor::Custom(extractor) => extractor.key(ts),
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::DayType(map) => f.debug_tuple("DayType").field(map).finish(),
            Extractor::HourOfDay(rules) => f.debug_tuple("HourOfDay").field(rules).finish(),
            Extractor::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn default_daytypes_classify_week() {
        let map = DayTypeMap::default();
        // 2024-01-01 is a Monday, 2024-01-06 a Saturday.
        assert_eq!(
            map.classify(ts(2024, 1, 1, 12, 0, 0)),
            Value::String("weekday".into())
        );
        assert_eq!(
            map.classify(ts(2024, 1, 6, 12, 0, 0)),
            Value::String("weekend".into())
        );
        assert_eq!(
            map.classify(ts(2024, 1, 7, 12, 0, 0)),
            Value::String("weekend".into())
        );
    }

    #[test]
    fn classification_takes_first_matching_label() {
        let mut map = DayTypeMap::new();
        map.push("all", vec![0, 1, 2, 3, 4, 5, 6]);
        map.push("monday", vec![0]);
        assert_eq!(
            map.classify(ts(2024, 1, 1, 0, 0, 0)),
            Value::String("all".into())
        );
    }

    #[test]
    fn uncovered_weekday_classifies_null() {
        let mut map = DayTypeMap::new();
        map.push("monday", vec![0]);
        // 2024-01-02 is a Tuesday.
        assert_eq!(map.classify(ts(2024, 1, 2, 0, 0, 0)), Value::Null);
    }

    #[test]
    fn hour_without_rules_is_unmodified() {
        let rules = DstRules::new();
        assert_eq!(
            shifted_hour(ts(2024, 6, 1, 14, 30, 0), &rules),
            Value::Integer(14)
        );
    }

    #[test]
    fn dst_interval_is_left_open_right_closed() {
        let start = ts(2024, 3, 10, 2, 0, 0);
        let end = ts(2024, 11, 3, 2, 0, 0);
        let mut rules = DstRules::new();
        rules.insert(2024, (start, end));

        // Exactly at start: unmodified.
        assert_eq!(shifted_hour(start, &rules), Value::Integer(2));
        // One instant after start: shifted.
        assert_eq!(
            shifted_hour(ts(2024, 3, 10, 2, 0, 1), &rules),
            Value::Integer(3)
        );
        // Exactly at end: still shifted.
        assert_eq!(shifted_hour(end, &rules), Value::Integer(3));
        // After end: unmodified again.
        assert_eq!(
            shifted_hour(ts(2024, 11, 3, 2, 0, 1), &rules),
            Value::Integer(2)
        );
    }

    #[test]
    fn dst_rule_only_applies_to_its_year() {
        let mut rules = DstRules::new();
        rules.insert(2024, (ts(2024, 3, 10, 2, 0, 0), ts(2024, 11, 3, 2, 0, 0)));
        assert_eq!(
            shifted_hour(ts(2023, 6, 1, 14, 0, 0), &rules),
            Value::Integer(14)
        );
    }

    #[test]
    fn shifted_hour_can_reach_24() {
        let mut rules = DstRules::new();
        rules.insert(2024, (ts(2024, 6, 1, 0, 0, 0), ts(2024, 6, 2, 0, 0, 0)));
        // 23:00 inside the interval shifts to 24 and is not wrapped to 0.
        assert_eq!(
            shifted_hour(ts(2024, 6, 1, 23, 0, 0), &rules),
            Value::Integer(24)
        );
    }

    #[test]
    fn custom_extractor_dispatches_through_trait() {
        struct Month;
        impl KeyExtractor for Month {
            fn key(&self, ts: NaiveDateTime) -> Value {
                Value::Integer(i64::from(ts.month()))
            }
        }
        let extractor = Extractor::Custom(Box::new(Month));
        assert_eq!(extractor.key(ts(2024, 7, 15, 0, 0, 0)), Value::Integer(7));
    }
}
