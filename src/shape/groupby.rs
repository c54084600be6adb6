use crate::shape::extract::{DayTypeMap, DstRules, Extractor};

// ---------------------------------------------------------------------------
// GroupBySpec – ordered grouping dimensions
// ---------------------------------------------------------------------------

/// One grouping dimension: the derived column's name, the source column
/// the extractor reads, and the extractor itself.
#[derive(Debug)]
pub struct GroupEntry {
    pub name: String,
    pub source: String,
    pub extractor: Extractor,
}

/// An ordered list of grouping dimensions.
///
/// Order is semantically significant: it becomes the composite grouping
/// key order and therefore the row order of the aggregated result.
/// Entries with the same name overwrite each other's derived column, last
/// writer wins.
#[derive(Debug, Default)]
pub struct GroupBySpec {
    entries: Vec<GroupEntry>,
}

impl GroupBySpec {
    pub fn new() -> Self {
        GroupBySpec {
            entries: Vec::new(),
        }
    }

    /// The default two-dimension spec over `datecol`: day-type
    /// classification followed by hour-of-day with no DST rules. Each call
    /// builds fresh parameter tables, so engines never share defaults.
    pub fn default_for(datecol: &str) -> Self {
        GroupBySpec::new()
            .with("daytype", datecol, Extractor::DayType(DayTypeMap::default()))
            .with("hour", datecol, Extractor::HourOfDay(DstRules::new()))
    }

    /// Append a dimension.
    pub fn push(&mut self, name: impl Into<String>, source: impl Into<String>, extractor: Extractor) {
        self.entries.push(GroupEntry {
            name: name.into(),
            source: source.into(),
            extractor,
        });
    }

    /// Builder-style [`push`](GroupBySpec::push).
    pub fn with(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        extractor: Extractor,
    ) -> Self {
        self.push(name, source, extractor);
        self
    }

    /// Derived-column names in spec order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_orders_daytype_before_hour() {
        let spec = GroupBySpec::default_for("datetime");
        assert_eq!(spec.names(), vec!["daytype", "hour"]);
        assert!(spec.iter().all(|e| e.source == "datetime"));
    }

    #[test]
    fn push_preserves_insertion_order() {
        let mut spec = GroupBySpec::new();
        spec.push("hour", "t", Extractor::HourOfDay(DstRules::new()));
        spec.push("daytype", "t", Extractor::DayType(DayTypeMap::default()));
        assert_eq!(spec.names(), vec!["hour", "daytype"]);
        assert_eq!(spec.len(), 2);
    }
}
