// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Row, scalar_text};

/// Rows whose `field` value case-insensitively contains `term`.
///
/// An empty term keeps every row with a defined (non-null) value for
/// `field`, embedded objects included. A non-empty term only ever matches
/// values with a scalar text rendering, so embedded reference objects are
/// not substring-searchable.
pub fn filter_rows<'r>(rows: &'r [Row], field: &str, term: &str) -> Vec<&'r Row> {
    let needle = term.to_lowercase();
    rows.iter()
        .filter(|row| row_matches(row, field, &needle))
        .collect()
}

fn row_matches(row: &Row, field: &str, folded_term: &str) -> bool {
    let Some(value) = row.get(field) else {
        return false;
    };
    if value.is_null() {
        return false;
    }
    if folded_term.is_empty() {
        return true;
    }
    match scalar_text(value) {
        Some(text) => text.to_lowercase().contains(folded_term),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::filter_rows;
    use crate::model::Row;
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        serde_json::from_value(value).expect("object literal should decode into a row")
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row(json!({"id": 1, "name": "Acme Warehousing", "warehousingData": {"id": 5, "name": "Acme"}})),
            row(json!({"id": 2, "name": "Blue Anchor", "warehousingData": {}})),
            row(json!({"id": 3, "name": null})),
            row(json!({"id": 4})),
        ]
    }

    #[test]
    fn empty_term_keeps_exactly_the_rows_with_a_defined_value() {
        let rows = sample_rows();
        let kept = filter_rows(&rows, "name", "");
        let ids: Vec<&Value> = kept.iter().filter_map(|row| row.get("id")).collect();
        assert_eq!(ids, vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let rows = sample_rows();
        let kept = filter_rows(&rows, "name", "aCmE");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get("id"), Some(&json!(1)));
    }

    #[test]
    fn filtered_set_is_a_subset_of_the_vacuous_match() {
        let rows = sample_rows();
        let all_defined = filter_rows(&rows, "name", "");
        for term in ["a", "blue", "zzz"] {
            let narrowed = filter_rows(&rows, "name", term);
            for row in narrowed {
                assert!(all_defined.iter().any(|kept| *kept == row));
            }
        }
    }

    #[test]
    fn numbers_and_bools_match_by_their_text_rendering() {
        let rows = vec![
            row(json!({"id": 10, "active": true})),
            row(json!({"id": 20, "active": false})),
        ];
        assert_eq!(filter_rows(&rows, "id", "1").len(), 1);
        assert_eq!(filter_rows(&rows, "active", "tru").len(), 1);
    }

    #[test]
    fn embedded_objects_never_match_a_non_empty_term() {
        let rows = sample_rows();
        assert!(filter_rows(&rows, "warehousingData", "acm").is_empty());
        // ...but they are defined values for the vacuous match.
        assert_eq!(filter_rows(&rows, "warehousingData", "").len(), 2);
    }

    #[test]
    fn unknown_field_matches_nothing() {
        let rows = sample_rows();
        assert!(filter_rows(&rows, "port", "").is_empty());
    }
}
