//! Query execution: filter, then a stable sort over serialized field values.

use std::cmp::Ordering;

use serde_json::Value;

use super::compare::{compare_values, field_value};
use super::{Query, SortDirection, SortEntry};

/// A decoded record together with its serialized form, which sort keys read from.
pub(crate) struct Row<R> {
    pub value: Value,
    pub record: R,
}

impl<R> Query<R> {
    /// Apply this query to rows given in natural enumeration order.
    ///
    /// The filter runs before the sort so that only matching rows are ordered.
    pub(crate) fn apply(&self, rows: Vec<Row<R>>) -> Vec<R> {
        let mut matching: Vec<Row<R>> = match &self.predicate {
            Some(predicate) => rows.into_iter().filter(|row| predicate(&row.record)).collect(),
            None => rows,
        };

        if !self.sort.is_empty() {
            matching.sort_by(|a, b| compare_rows(&a.value, &b.value, &self.sort));
        }

        matching.into_iter().map(|row| row.record).collect()
    }
}

fn compare_rows(a: &Value, b: &Value, sort: &[SortEntry]) -> Ordering {
    for entry in sort {
        let va = field_value(a, &entry.field).unwrap_or(&Value::Null);
        let vb = field_value(b, &entry.field).unwrap_or(&Value::Null);
        let cmp = compare_values(va, vb);
        if cmp != Ordering::Equal {
            return match entry.direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}
