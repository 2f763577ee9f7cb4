// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference rows are matched on this field.
pub const REFERENCE_ID_FIELD: &str = "id";

pub const VENDOR_TABLE: &str = "vendor_database";
pub const NON_SHIP_CLIENT_TABLE: &str = "nonshipclients";
pub const SHIP_CLIENT_TABLE: &str = "shipclients";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Vendors,
    NonShipClients,
    ShipClients,
    Overheads,
}

impl TabKind {
    pub const ALL: [Self; 4] = [
        Self::Vendors,
        Self::NonShipClients,
        Self::ShipClients,
        Self::Overheads,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendors => "vendors",
            Self::NonShipClients => "non-ship-clients",
            Self::ShipClients => "ship-clients",
            Self::Overheads => "overheads",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vendors" => Some(Self::Vendors),
            "non-ship-clients" => Some(Self::NonShipClients),
            "ship-clients" => Some(Self::ShipClients),
            "overheads" => Some(Self::Overheads),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vendors => "vendors",
            Self::NonShipClients => "non-ship clients",
            Self::ShipClients => "ship clients",
            Self::Overheads => "overheads",
        }
    }

    /// Table behind the tab, for the tabs that map straight onto one.
    /// The overheads tab fans out per category instead.
    pub const fn base_table(self) -> Option<&'static str> {
        match self {
            Self::Vendors => Some(VENDOR_TABLE),
            Self::NonShipClients => Some(NON_SHIP_CLIENT_TABLE),
            Self::ShipClients => Some(SHIP_CLIENT_TABLE),
            Self::Overheads => None,
        }
    }
}

/// A declared foreign-key relationship from a category's base rows to a
/// reference table. The matched reference row (or an empty object) is
/// embedded under `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceBinding {
    pub foreign_key: &'static str,
    pub table: &'static str,
    pub target: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverheadCategory {
    Salaries,
    Utilities,
    Warehousing,
    Freight,
}

impl OverheadCategory {
    pub const ALL: [Self; 4] = [
        Self::Salaries,
        Self::Utilities,
        Self::Warehousing,
        Self::Freight,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Salaries => "salaries",
            Self::Utilities => "utilities",
            Self::Warehousing => "warehousing",
            Self::Freight => "freight",
        }
    }

    pub const fn table(self) -> &'static str {
        match self {
            Self::Salaries => "overhead_salaries",
            Self::Utilities => "overhead_utilities",
            Self::Warehousing => "overhead_warehousing",
            Self::Freight => "overhead_freight",
        }
    }

    /// Join rules per category. No category needs more than two reference
    /// tables.
    pub const fn bindings(self) -> &'static [ReferenceBinding] {
        match self {
            Self::Salaries | Self::Utilities => &[],
            Self::Warehousing => &[ReferenceBinding {
                foreign_key: "warehousing_company_id",
                table: "warehousing_companies",
                target: "warehousingData",
            }],
            Self::Freight => &[
                ReferenceBinding {
                    foreign_key: "carrier_id",
                    table: "carriers",
                    target: "carrierData",
                },
                ReferenceBinding {
                    foreign_key: "warehousing_company_id",
                    table: "warehousing_companies",
                    target: "warehousingData",
                },
            ],
        }
    }
}

/// One record as returned by the backend: an ordered field map. Field sets
/// are not enforced across rows; the first row of a table defines the
/// displayed schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Ordered column list for a row set: the first row's field names in
/// backend order. Computed once per row set and passed alongside the data.
pub fn schema(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.field_names().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// First field of the first row whose value can be substring-filtered,
/// skipping embedded reference objects and null values.
pub fn default_filter_field(rows: &[Row]) -> Option<String> {
    let first = rows.first()?;
    first
        .field_names()
        .find(|field| {
            first
                .get(field)
                .is_some_and(|value| !value.is_null() && !value.is_object())
        })
        .map(str::to_owned)
}

/// Text a scalar value contributes to substring matching. Embedded objects
/// (and nulls) have no scalar text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Cell rendering: `-` for null or blank, compact JSON for embedded
/// objects, the bare text otherwise.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_owned(),
        Value::String(text) if text.is_empty() => "-".to_owned(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

/// The three tables loaded up front, one per base tab.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseTables {
    pub vendors: Vec<Row>,
    pub non_ship_clients: Vec<Row>,
    pub ship_clients: Vec<Row>,
}

impl BaseTables {
    pub fn rows_for(&self, tab: TabKind) -> Option<&[Row]> {
        match tab {
            TabKind::Vendors => Some(&self.vendors),
            TabKind::NonShipClients => Some(&self.non_ship_clients),
            TabKind::ShipClients => Some(&self.ship_clients),
            TabKind::Overheads => None,
        }
    }
}
