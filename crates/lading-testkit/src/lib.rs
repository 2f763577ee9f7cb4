// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use lading_app::{OverheadCategory, Row, TableFetcher};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use time::{Date, Month};

const COMPANY_PREFIXES: [&str; 12] = [
    "Harbor", "Atlas", "Meridian", "Pacific", "Crown", "Beacon", "Anchor", "Polaris", "Summit",
    "Gateway", "Northstar", "Baltic",
];
const COMPANY_SUFFIXES: [&str; 6] = [
    "Logistics",
    "Forwarding",
    "Shipping Co",
    "Cargo Group",
    "Freight Lines",
    "Trading",
];

const VENDOR_SERVICES: [&str; 8] = [
    "customs brokerage",
    "drayage",
    "container repair",
    "fumigation",
    "marine insurance",
    "port agency",
    "crating",
    "surveying",
];
const PAYMENT_TERMS: [&str; 4] = ["NET 15", "NET 30", "NET 45", "NET 60"];

const FIRST_NAMES: [&str; 14] = [
    "Ines", "Viktor", "Mei", "Tobias", "Amara", "Henrik", "Lucia", "Rafael", "Sanne", "Kofi",
    "Petra", "Dario", "Yuki", "Leonor",
];
const LAST_NAMES: [&str; 14] = [
    "Van Dijk", "Okafor", "Silva", "Janssen", "Koval", "Marques", "Tan", "Lindqvist", "Osei",
    "Petrov", "Haddad", "Moreau", "Sato", "Ferreira",
];

const PORTS: [&str; 10] = [
    "Rotterdam",
    "Singapore",
    "Hamburg",
    "Shanghai",
    "Antwerp",
    "Busan",
    "Valencia",
    "Santos",
    "Felixstowe",
    "Oakland",
];
const COUNTRIES: [&str; 8] = [
    "Netherlands",
    "Germany",
    "Singapore",
    "Brazil",
    "Spain",
    "South Korea",
    "United Kingdom",
    "United States",
];
const INCOTERMS: [&str; 5] = ["FOB", "CIF", "EXW", "DAP", "DDP"];

const STAFF_ROLES: [&str; 6] = [
    "ops manager",
    "customs clerk",
    "dispatcher",
    "accountant",
    "sales rep",
    "warehouse lead",
];
const UTILITY_SERVICES: [&str; 6] = [
    "office lease",
    "electricity",
    "internet",
    "water",
    "liability insurance",
    "phone",
];
const CARRIER_MODES: [&str; 4] = ["sea", "air", "road", "rail"];

/// Foreign keys that intentionally reference no row, so demo data and
/// tests always exercise the empty-object embed path.
pub const DANGLING_WAREHOUSING_COMPANY_ID: i64 = 99;
pub const DANGLING_CARRIER_ID: i64 = 98;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Builds a row from a `json!` object literal, preserving field order.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(fields) => Row::from(fields),
        other => panic!("row literals must be JSON objects, got {other}"),
    }
}

/// Deterministic generator for freight-office demo rows. Same seed, same
/// dataset.
#[derive(Debug, Clone)]
pub struct FreightFaker {
    rng: DeterministicRng,
}

impl FreightFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(if seed == 0 { 1 } else { seed }),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    fn pick(&mut self, values: &[&'static str]) -> &'static str {
        values[self.rng.int_n(values.len())]
    }

    fn int_range_i64(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        low + (self.rng.next_u64() % ((high - low) as u64)) as i64
    }

    fn company_name(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&COMPANY_PREFIXES),
            self.pick(&COMPANY_SUFFIXES)
        )
    }

    fn contact_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn email_for(&mut self, contact: &str) -> String {
        let slug: String = contact
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == ' ')
            .collect::<String>()
            .to_ascii_lowercase()
            .replace(' ', ".");
        format!("{slug}@{}", self.pick(&[
            "freightdesk.example",
            "cargopost.test",
            "portmail.invalid",
        ]))
    }

    fn date_in_year(&mut self, year: i32) -> String {
        let start = Date::from_calendar_date(year, Month::January, 1)
            .unwrap_or(Date::MIN)
            .to_julian_day();
        let day = Date::from_julian_day(start + self.rng.int_n(365) as i32).unwrap_or(Date::MIN);
        day.to_string()
    }

    fn lane(&mut self) -> String {
        let origin = self.rng.int_n(PORTS.len());
        let offset = 1 + self.rng.int_n(PORTS.len() - 1);
        let destination = (origin + offset) % PORTS.len();
        format!("{}-{}", PORTS[origin], PORTS[destination])
    }

    pub fn vendor_row(&mut self, id: i64) -> Row {
        let contact = self.contact_name();
        let email = self.email_for(&contact);
        row(json!({
            "id": id,
            "name": self.company_name(),
            "service": self.pick(&VENDOR_SERVICES),
            "contact_name": contact,
            "email": email,
            "payment_terms": self.pick(&PAYMENT_TERMS),
            "contract_start": self.date_in_year(2024),
        }))
    }

    pub fn non_ship_client_row(&mut self, id: i64) -> Row {
        let contact = self.contact_name();
        let email = self.email_for(&contact);
        row(json!({
            "id": id,
            "name": self.company_name(),
            "country": self.pick(&COUNTRIES),
            "incoterms": self.pick(&INCOTERMS),
            "contact_name": contact,
            "email": email,
        }))
    }

    pub fn ship_client_row(&mut self, id: i64) -> Row {
        let contact = self.contact_name();
        row(json!({
            "id": id,
            "name": self.company_name(),
            "vessel": format!("MV {}", self.pick(&COMPANY_PREFIXES)),
            "home_port": self.pick(&PORTS),
            "contact_name": contact,
        }))
    }

    pub fn salary_row(&mut self, id: i64) -> Row {
        row(json!({
            "id": id,
            "employee": self.contact_name(),
            "role": self.pick(&STAFF_ROLES),
            "monthly_cost": self.int_range_i64(2_800, 7_500),
        }))
    }

    pub fn utility_row(&mut self, id: i64) -> Row {
        row(json!({
            "id": id,
            "service": UTILITY_SERVICES[(id as usize - 1) % UTILITY_SERVICES.len()],
            "provider": self.company_name(),
            "monthly_cost": self.int_range_i64(120, 4_000),
        }))
    }

    pub fn warehousing_company_row(&mut self, id: i64) -> Row {
        row(json!({
            "id": id,
            "name": self.company_name(),
            "city": self.pick(&PORTS),
            "capacity_pallets": self.int_range_i64(500, 12_000),
        }))
    }

    pub fn warehousing_row(&mut self, id: i64, warehousing_company_id: i64) -> Row {
        row(json!({
            "id": id,
            "warehousing_company_id": warehousing_company_id,
            "pallets": self.int_range_i64(20, 600),
            "monthly_cost": self.int_range_i64(400, 9_000),
        }))
    }

    pub fn carrier_row(&mut self, id: i64) -> Row {
        row(json!({
            "id": id,
            "name": self.company_name(),
            "mode": self.pick(&CARRIER_MODES),
            "fleet_size": self.int_range_i64(3, 120),
        }))
    }

    pub fn freight_row(&mut self, id: i64, carrier_id: i64, warehousing_company_id: i64) -> Row {
        row(json!({
            "id": id,
            "carrier_id": carrier_id,
            "warehousing_company_id": warehousing_company_id,
            "lane": self.lane(),
            "monthly_cost": self.int_range_i64(1_500, 22_000),
        }))
    }
}

/// The full demo dataset: every base table, every overhead category table,
/// and both reference tables, with consistent foreign keys plus one
/// dangling reference per bound category.
pub fn demo_tables(seed: u64) -> BTreeMap<String, Vec<Row>> {
    let mut faker = FreightFaker::new(seed);
    let mut tables = BTreeMap::new();

    tables.insert(
        lading_app::VENDOR_TABLE.to_owned(),
        (1..=8).map(|id| faker.vendor_row(id)).collect(),
    );
    tables.insert(
        lading_app::NON_SHIP_CLIENT_TABLE.to_owned(),
        (1..=6).map(|id| faker.non_ship_client_row(id)).collect(),
    );
    tables.insert(
        lading_app::SHIP_CLIENT_TABLE.to_owned(),
        (1..=6).map(|id| faker.ship_client_row(id)).collect(),
    );

    tables.insert(
        OverheadCategory::Salaries.table().to_owned(),
        (1..=6).map(|id| faker.salary_row(id)).collect(),
    );
    tables.insert(
        OverheadCategory::Utilities.table().to_owned(),
        (1..=6).map(|id| faker.utility_row(id)).collect(),
    );

    let warehousing_companies: Vec<Row> = (1..=4)
        .map(|id| faker.warehousing_company_row(id))
        .collect();
    let carriers: Vec<Row> = (1..=4).map(|id| faker.carrier_row(id)).collect();

    let mut warehousing = Vec::new();
    for id in 1..=5_i64 {
        let company_id = if id == 5 {
            DANGLING_WAREHOUSING_COMPANY_ID
        } else {
            (id - 1) % 4 + 1
        };
        warehousing.push(faker.warehousing_row(id, company_id));
    }

    let mut freight = Vec::new();
    for id in 1..=5_i64 {
        let carrier_id = if id == 5 {
            DANGLING_CARRIER_ID
        } else {
            (id - 1) % 4 + 1
        };
        let company_id = id % 4 + 1;
        freight.push(faker.freight_row(id, carrier_id, company_id));
    }

    tables.insert("warehousing_companies".to_owned(), warehousing_companies);
    tables.insert("carriers".to_owned(), carriers);
    tables.insert(
        OverheadCategory::Warehousing.table().to_owned(),
        warehousing,
    );
    tables.insert(OverheadCategory::Freight.table().to_owned(), freight);

    tables
}

/// In-memory stand-in for the data API. Records per-table fetch counts and
/// injects failures, so cache and error-path behavior can be asserted
/// without a network.
#[derive(Debug)]
pub struct StaticFetcher {
    tables: BTreeMap<String, Vec<Row>>,
    failures: BTreeMap<String, String>,
    calls: Mutex<BTreeMap<String, usize>>,
}

impl StaticFetcher {
    pub fn new(tables: BTreeMap<String, Vec<Row>>) -> Self {
        Self {
            tables,
            failures: BTreeMap::new(),
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_failure(mut self, table: &str, message: &str) -> Self {
        self.set_failure(table, message);
        self
    }

    pub fn set_failure(&mut self, table: &str, message: &str) {
        self.failures.insert(table.to_owned(), message.to_owned());
    }

    pub fn clear_failure(&mut self, table: &str) {
        self.failures.remove(table);
    }

    pub fn fetch_count(&self, table: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .sum()
    }
}

impl TableFetcher for StaticFetcher {
    fn fetch(&self, table: &str) -> Result<Vec<Row>> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(table.to_owned())
            .or_insert(0) += 1;

        if let Some(message) = self.failures.get(table) {
            bail!("{message}");
        }
        match self.tables.get(table) {
            Some(rows) => Ok(rows.clone()),
            None => bail!("unknown table {table:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DANGLING_CARRIER_ID, DANGLING_WAREHOUSING_COMPANY_ID, FreightFaker, StaticFetcher,
        demo_tables, row,
    };
    use anyhow::Result;
    use lading_app::{OverheadCategory, REFERENCE_ID_FIELD, TableFetcher};
    use serde_json::json;

    #[test]
    fn same_seed_produces_the_same_dataset() {
        assert_eq!(demo_tables(7), demo_tables(7));
        assert_ne!(demo_tables(7), demo_tables(8));
    }

    #[test]
    fn demo_tables_cover_every_known_table() {
        let tables = demo_tables(7);
        for name in [
            lading_app::VENDOR_TABLE,
            lading_app::NON_SHIP_CLIENT_TABLE,
            lading_app::SHIP_CLIENT_TABLE,
            "warehousing_companies",
            "carriers",
        ] {
            assert!(tables.contains_key(name), "{name} missing");
        }
        for category in OverheadCategory::ALL {
            assert!(
                tables.contains_key(category.table()),
                "{} missing",
                category.label()
            );
        }
    }

    #[test]
    fn foreign_keys_resolve_except_the_deliberate_dangles() {
        let tables = demo_tables(7);
        for category in [OverheadCategory::Warehousing, OverheadCategory::Freight] {
            for binding in category.bindings() {
                let reference = &tables[binding.table];
                let mut dangling = 0;
                for base_row in &tables[category.table()] {
                    let key = base_row
                        .get(binding.foreign_key)
                        .expect("demo rows carry their foreign keys");
                    let matched = reference
                        .iter()
                        .any(|candidate| candidate.get(REFERENCE_ID_FIELD) == Some(key));
                    if !matched {
                        dangling += 1;
                        assert!(
                            key == &json!(DANGLING_WAREHOUSING_COMPANY_ID)
                                || key == &json!(DANGLING_CARRIER_ID),
                            "unexpected dangling key {key} in {}",
                            category.label()
                        );
                    }
                }
                if binding.foreign_key == "carrier_id"
                    || category == OverheadCategory::Warehousing
                {
                    assert_eq!(dangling, 1, "{}/{}", category.label(), binding.foreign_key);
                }
            }
        }
    }

    #[test]
    fn faker_dates_are_iso_formatted() {
        let mut faker = FreightFaker::new(3);
        let vendor = faker.vendor_row(1);
        let date = vendor
            .get("contract_start")
            .and_then(|value| value.as_str())
            .expect("contract_start should be a string");
        assert_eq!(date.len(), 10);
        assert!(date.starts_with("2024-"));
    }

    #[test]
    fn static_fetcher_counts_fetches_per_table() -> Result<()> {
        let fetcher = StaticFetcher::new(demo_tables(7));
        fetcher.fetch(lading_app::VENDOR_TABLE)?;
        fetcher.fetch(lading_app::VENDOR_TABLE)?;
        fetcher.fetch("carriers")?;

        assert_eq!(fetcher.fetch_count(lading_app::VENDOR_TABLE), 2);
        assert_eq!(fetcher.fetch_count("carriers"), 1);
        assert_eq!(fetcher.fetch_count("never_fetched"), 0);
        assert_eq!(fetcher.total_fetches(), 3);
        Ok(())
    }

    #[test]
    fn static_fetcher_failures_count_and_clear() {
        let mut fetcher = StaticFetcher::new(demo_tables(7));
        fetcher.set_failure("carriers", "carriers table is on fire");

        let error = fetcher
            .fetch("carriers")
            .expect_err("scripted failure should surface");
        assert_eq!(error.to_string(), "carriers table is on fire");
        assert_eq!(fetcher.fetch_count("carriers"), 1);

        fetcher.clear_failure("carriers");
        assert!(fetcher.fetch("carriers").is_ok());
    }

    #[test]
    fn unknown_tables_are_an_error() {
        let fetcher = StaticFetcher::new(demo_tables(7));
        let error = fetcher
            .fetch("bill_of_lading")
            .expect_err("unknown table should fail");
        assert!(error.to_string().contains("unknown table"));
    }

    #[test]
    fn row_literal_preserves_field_order() {
        let built = row(json!({"zeta": 1, "alpha": 2}));
        let names: Vec<&str> = built.field_names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
