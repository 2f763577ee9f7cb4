// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use lading_app::{
    BaseTables, NON_SHIP_CLIENT_TABLE, OverheadCategory, Row, SHIP_CLIENT_TABLE, TableFetcher,
    VENDOR_TABLE, resolve,
};
use std::thread;

/// Bridges any `TableFetcher` (the HTTP client, or the testkit's static
/// fetcher in demo mode) into the view's runtime contract.
pub struct FetchRuntime<F> {
    fetcher: F,
}

impl<F> FetchRuntime<F>
where
    F: TableFetcher + Sync,
{
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F> lading_tui::AppRuntime for FetchRuntime<F>
where
    F: TableFetcher + Sync,
{
    fn load_base_tables(&mut self) -> Result<BaseTables> {
        let fetcher = &self.fetcher;
        // The three base reads are independent; fan them out and settle
        // all of them before the first frame. The first error wins.
        let (vendors, non_ship, ship) = thread::scope(|scope| {
            let vendors = scope.spawn(|| fetcher.fetch(VENDOR_TABLE));
            let non_ship = scope.spawn(|| fetcher.fetch(NON_SHIP_CLIENT_TABLE));
            let ship = scope.spawn(|| fetcher.fetch(SHIP_CLIENT_TABLE));
            (settle(vendors), settle(non_ship), settle(ship))
        });

        Ok(BaseTables {
            vendors: vendors?,
            non_ship_clients: non_ship?,
            ship_clients: ship?,
        })
    }

    fn resolve_category(&mut self, category: OverheadCategory) -> Result<Vec<Row>> {
        resolve(&self.fetcher, category)
    }
}

fn settle(handle: thread::ScopedJoinHandle<'_, Result<Vec<Row>>>) -> Result<Vec<Row>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("table fetch worker panicked")),
    }
}
