// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use lading_fetch::Client;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body).with_status_code(status).with_header(
        Header::from_bytes("Content-Type", "application/json").expect("valid content type header"),
    )
}

#[test]
fn fetch_error_contains_actionable_remediation() {
    let client = Client::new("http://127.0.0.1:1/rest/v1", None, Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .fetch_rows("vendor_database")
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach"));
    assert!(message.contains("[api].base_url"));
}

#[test]
fn fetch_rows_decodes_rows_in_backend_order() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/rest/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/rest/v1/vendor_database?select=*");
        let body = r#"[{"id":1,"name":"Acme Freight","port":"Rotterdam"},{"id":2,"name":"Blue Anchor","port":null}]"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, None, Duration::from_secs(1))?;
    let rows = client.fetch_rows("vendor_database")?;

    assert_eq!(rows.len(), 2);
    assert_eq!(
        lading_app::schema(&rows),
        vec!["id".to_owned(), "name".to_owned(), "port".to_owned()]
    );
    assert_eq!(rows[1].get("port"), Some(&serde_json::Value::Null));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn api_key_is_sent_as_apikey_and_bearer_headers() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/rest/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let header_value = |field: &'static str| {
            request
                .headers()
                .iter()
                .find(|header| header.field.equiv(field))
                .map(|header| header.value.as_str().to_owned())
        };
        assert_eq!(header_value("apikey").as_deref(), Some("secret-anon-key"));
        assert_eq!(
            header_value("authorization").as_deref(),
            Some("Bearer secret-anon-key")
        );
        request
            .respond(json_response("[]", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Some("secret-anon-key"), Duration::from_secs(1))?;
    let rows = client.fetch_rows("shipclients")?;
    assert!(rows.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_error_envelope_is_cleaned_into_one_line() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/rest/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"{"code":"42P01","message":"relation \"overhead_freight\" does not exist"}"#;
        request
            .respond(json_response(body, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, None, Duration::from_secs(1))?;
    let error = client
        .fetch_rows("overhead_freight")
        .expect_err("error envelope should fail the fetch");
    let message = error.to_string();
    assert!(message.contains("table overhead_freight"));
    assert!(message.contains("server error (404)"));
    assert!(message.contains("does not exist"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn opaque_error_bodies_fall_back_to_the_status_code() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/rest/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("{\"unrelated\":true}", 500))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, None, Duration::from_secs(1))?;
    let error = client
        .fetch_rows("carriers")
        .expect_err("500 should fail the fetch");
    assert!(error.to_string().contains("server returned 500"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_array_payload_is_a_decode_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/rest/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("{\"rows\":[]}", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, None, Duration::from_secs(1))?;
    let error = client
        .fetch_rows("warehousing_companies")
        .expect_err("object payload should fail row decoding");
    assert!(
        error
            .to_string()
            .contains("decode rows for table warehousing_companies")
    );

    handle.join().expect("server thread should join");
    Ok(())
}
