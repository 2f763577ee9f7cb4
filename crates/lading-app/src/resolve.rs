// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{OverheadCategory, REFERENCE_ID_FIELD, Row};

/// The remote data store's read contract: all rows of one table, or a
/// failure. Implementations never retry and never return partial tables.
pub trait TableFetcher {
    fn fetch(&self, table: &str) -> Result<Vec<Row>>;
}

/// Fetches a category's base table plus every reference table its bindings
/// name, and embeds the matched reference row (or `{}`) under each
/// binding's target field. Base-table order is preserved. Any fetch
/// failure fails the whole resolution; partial joins are never surfaced.
pub fn resolve<F>(fetcher: &F, category: OverheadCategory) -> Result<Vec<Row>>
where
    F: TableFetcher + ?Sized,
{
    let mut base = fetcher
        .fetch(category.table())
        .with_context(|| format!("load {} overhead rows", category.label()))?;

    let bindings = category.bindings();
    if bindings.is_empty() {
        return Ok(base);
    }

    // Each distinct reference table is fetched once per resolution.
    let mut references: BTreeMap<&str, Vec<Row>> = BTreeMap::new();
    for binding in bindings {
        if references.contains_key(binding.table) {
            continue;
        }
        let rows = fetcher
            .fetch(binding.table)
            .with_context(|| format!("load reference table {}", binding.table))?;
        references.insert(binding.table, rows);
    }

    for row in &mut base {
        for binding in bindings {
            let embedded = row
                .get(binding.foreign_key)
                .filter(|value| !value.is_null())
                .and_then(|key| lookup_reference(&references[binding.table], key))
                .map(Row::to_value)
                .unwrap_or_else(|| Value::Object(Map::new()));
            row.set(binding.target, embedded);
        }
    }

    Ok(base)
}

/// Linear scan over the reference table; on duplicate identifiers the
/// first match wins.
fn lookup_reference<'t>(table: &'t [Row], key: &Value) -> Option<&'t Row> {
    table
        .iter()
        .find(|row| row.get(REFERENCE_ID_FIELD) == Some(key))
}
