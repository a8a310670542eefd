//! Structural checks on tables

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::model::Table;

/// Fail when a column label occurs more than once.
///
/// The error lists every duplicated label once, in order of first
/// duplication. Returns the table itself so the check can be chained.
pub fn check_duplicated_labels(table: &Table) -> Result<&Table> {
    let mut seen = FxHashSet::default();
    let mut duplicated = IndexSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            duplicated.insert(column.name.clone());
        }
    }

    if duplicated.is_empty() {
        Ok(table)
    } else {
        Err(Error::DuplicateColumns(duplicated.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use serde_json::json;

    #[test]
    fn test_unique_labels_pass() {
        let table = Table::from_json_records(&json!([
            {"test_index": 1, "trial_num": 1, "subject": 1},
            {"test_index": 2, "trial_num": 2, "subject": 1},
        ]))
        .unwrap()
        .set_index(&["test_index"])
        .unwrap();
        assert_eq!(check_duplicated_labels(&table).unwrap(), &table);
    }

    #[test]
    fn test_duplicated_labels_fail() {
        let table = Table::new(vec![
            Column::new("trial_num"),
            Column::new("subject"),
            Column::new("trial_num"),
            Column::new("subject"),
            Column::new("trial_num"),
        ]);
        assert_eq!(
            check_duplicated_labels(&table).unwrap_err(),
            Error::DuplicateColumns(vec!["trial_num".into(), "subject".into()])
        );
    }
}
