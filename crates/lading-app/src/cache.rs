// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::model::{OverheadCategory, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub rows: Vec<Row>,
    pub resolved_at: OffsetDateTime,
}

/// Per-session store of resolved overhead rows. Entries are write-once for
/// the session lifetime: a second `put` for the same category keeps the
/// original rows. There is no eviction and no refresh path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryCache {
    entries: BTreeMap<OverheadCategory, CacheEntry>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, category: OverheadCategory) -> bool {
        self.entries.contains_key(&category)
    }

    pub fn get(&self, category: OverheadCategory) -> Option<&CacheEntry> {
        self.entries.get(&category)
    }

    pub fn rows(&self, category: OverheadCategory) -> Option<&[Row]> {
        self.entries
            .get(&category)
            .map(|entry| entry.rows.as_slice())
    }

    pub fn put(&mut self, category: OverheadCategory, rows: Vec<Row>) {
        self.entries.entry(category).or_insert_with(|| CacheEntry {
            rows,
            resolved_at: OffsetDateTime::now_utc(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
