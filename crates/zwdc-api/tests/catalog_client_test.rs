#![allow(clippy::unwrap_used)]
// Integration tests for `CatalogClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zwdc_api::{Attribute, CatalogClient, DeviceType, DeviceTypeQuery, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CatalogClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = CatalogClient::with_client(reqwest::Client::new(), base_url.clone(), base_url);
    (server, client)
}

fn device_type_json(id: &str, key: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("type {id}"),
        "attributes": [
            { "key": "senergy/zwave-dc", "value": "true" },
            { "key": "senergy/zwave-type-mapping-key", "value": key }
        ],
        "services": null
    })
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_single_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device-types"))
        .and(query_param("attribute", "senergy/zwave-dc"))
        .and(query_param("sort", "name.asc"))
        .and(header("authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_type_json("dt-1", "0x0002.0x0005.0x0175"),
            device_type_json("dt-2", "881.3.2"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = DeviceTypeQuery::with_attribute("senergy/zwave-dc", 100);
    let types = client.list_device_types("Bearer t", &query).await.unwrap();

    assert_eq!(types.len(), 2);
    assert_eq!(types[0].id, "dt-1");
    assert!(types[1].services.is_empty());
}

#[tokio::test]
async fn test_list_follows_pages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device-types"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_type_json("dt-1", "a"),
            device_type_json("dt-2", "b"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/device-types"))
        .and(query_param("offset", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([device_type_json("dt-3", "c")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = DeviceTypeQuery::with_attribute("senergy/zwave-dc", 2);
    let ids: Vec<String> = client
        .list_device_types("Bearer t", &query)
        .await
        .unwrap()
        .into_iter()
        .map(|dt| dt.id)
        .collect();

    assert_eq!(ids, vec!["dt-1", "dt-2", "dt-3"]);
}

#[tokio::test]
async fn test_list_stops_when_offset_is_ignored() {
    let (server, client) = setup().await;

    // Every page is the same full page, whatever the offset.
    Mock::given(method("GET"))
        .and(path("/device-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_type_json("dt-1", "a"),
            device_type_json("dt-2", "b"),
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let query = DeviceTypeQuery::with_attribute("senergy/zwave-dc", 2);
    let ids: Vec<String> = client
        .list_device_types("Bearer t", &query)
        .await
        .unwrap()
        .into_iter()
        .map(|dt| dt.id)
        .collect();

    assert_eq!(ids, vec!["dt-1", "dt-2"]);
}

#[tokio::test]
async fn test_list_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device-types"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let query = DeviceTypeQuery::with_attribute("senergy/zwave-dc", 0);
    let result = client.list_device_types("Bearer t", &query).await;

    match result {
        Err(ref e @ Error::Api { status, ref message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
            assert!(e.is_transient());
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Creation ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_device_type() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/device-types"))
        .and(header("authorization", "Bearer t"))
        .and(body_partial_json(json!({ "name": "ZWaveJs2Mqtt Danfoss Thermostat" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_type_json(
            "urn:dt:new",
            "0x0002.0x0005.0x0175",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let definition = DeviceType {
        name: "ZWaveJs2Mqtt Danfoss Thermostat".into(),
        attributes: vec![Attribute::new(
            "senergy/zwave-type-mapping-key",
            "0x0002.0x0005.0x0175",
        )],
        ..DeviceType::default()
    };
    let created = client
        .create_device_type("Bearer t", &definition)
        .await
        .unwrap();

    assert_eq!(created.id, "urn:dt:new");
}

#[tokio::test]
async fn test_create_rejected_body_verbatim() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/device-types"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown device class"))
        .mount(&server)
        .await;

    let result = client
        .create_device_type("Bearer t", &DeviceType::default())
        .await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "unknown device class");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}
