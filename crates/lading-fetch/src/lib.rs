// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use lading_app::{Row, TableFetcher};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Read-only client for the data API. One table read is one
/// `GET {base}/{table}?select=*` returning a JSON array of row objects.
/// Failed reads are never retried and responses are never partially
/// consumed.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("invalid api.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url {trimmed:?} must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Startup reachability probe for `--check`.
    pub fn ping(&self) -> Result<()> {
        let mut request = self.http.get(self.base_url.clone());
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response("<root>", status, &body));
        }
        Ok(())
    }

    pub fn fetch_rows(&self, table: &str) -> Result<Vec<Row>> {
        let url = self.table_url(table)?;
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(table, status, &body));
        }

        let rows: Vec<Row> = response
            .json()
            .with_context(|| format!("decode rows for table {table}"))?;
        Ok(rows)
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        if table.is_empty()
            || !table
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            bail!("invalid table name {table:?}");
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api.base_url {} cannot take a table path", self.base_url))?
            .push(table);
        url.query_pairs_mut().append_pair("select", "*");
        Ok(url)
    }
}

impl TableFetcher for Client {
    fn fetch(&self, table: &str) -> Result<Vec<Row>> {
        self.fetch_rows(table)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [api].base_url and that the data API is up ({} )",
        base_url,
        error
    )
}

fn clean_error_response(table: &str, status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!(
            "table {}: server error ({}): {}",
            table,
            status.as_u16(),
            message
        );
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!(
            "table {}: server error ({}): {}",
            table,
            status.as_u16(),
            body.trim()
        );
    }

    anyhow!("table {}: server returned {}", table, status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Client;
    use anyhow::Result;
    use std::time::Duration;

    #[test]
    fn rejects_empty_base_url() {
        let error = Client::new("", None, Duration::from_secs(1))
            .expect_err("empty base url should fail");
        assert!(error.to_string().contains("must not be empty"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let error = Client::new("ftp://example.test/rest", None, Duration::from_secs(1))
            .expect_err("non-http scheme should fail");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn trims_trailing_slashes_from_the_base_url() -> Result<()> {
        let client = Client::new("http://localhost:54321/rest/v1///", None, Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://localhost:54321/rest/v1");
        Ok(())
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() -> Result<()> {
        let client = Client::new(
            "http://localhost:54321/rest/v1",
            Some("   "),
            Duration::from_secs(1),
        )?;
        assert!(client.api_key.is_none());
        Ok(())
    }

    #[test]
    fn table_url_appends_the_table_and_select_star() -> Result<()> {
        let client = Client::new("http://localhost:54321/rest/v1", None, Duration::from_secs(1))?;
        let url = client.table_url("vendor_database")?;
        assert_eq!(
            url.as_str(),
            "http://localhost:54321/rest/v1/vendor_database?select=*"
        );
        Ok(())
    }

    #[test]
    fn table_url_rejects_names_that_would_bend_the_path() -> Result<()> {
        let client = Client::new("http://localhost:54321/rest/v1", None, Duration::from_secs(1))?;
        for bad in ["", "../secrets", "a table", "rows?x=1"] {
            let error = client
                .table_url(bad)
                .expect_err("malformed table name should fail");
            assert!(error.to_string().contains("invalid table name"));
        }
        Ok(())
    }
}
