//! Integration tests for the CKAN client against a mocked CKAN portal.

use open_data_ckan::{CkanClient, CkanError, Configuration};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(server: &MockServer) -> CkanClient {
    let config = Configuration::for_portal(
        &server.uri(),
        Some("open-data-ckan-test/1.0".to_string()),
        Duration::from_secs(5),
    )
    .expect("client builds");
    CkanClient::new(Arc::new(config))
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "help": "http://portal/api/3/action/help_show",
        "success": true,
        "result": result,
    }))
}

#[tokio::test]
async fn test_basic_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_search"))
        .and(query_param("q", "climate"))
        .and(query_param("rows", "5"))
        .respond_with(ok(json!({
            "count": 42,
            "results": [
                {
                    "id": "a1",
                    "name": "climate-normals",
                    "title": "Climate Normals",
                    "num_resources": 3
                },
                {"id": "b2", "name": "sea-level", "title": "Sea Level"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let result = client
        .package_search(Some("climate"), Some(5), None, None)
        .await
        .expect("Search should succeed");

    assert_eq!(result.count, Some(42));
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].name, "climate-normals");
    // Unknown fields survive in the flattened map
    assert_eq!(result.results[0].fields.get("num_resources"), Some(&json!(3)));
}

#[tokio::test]
async fn test_package_show() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .and(query_param("id", "climate-normals"))
        .respond_with(ok(json!({
            "id": "a1",
            "name": "climate-normals",
            "title": "Climate Normals",
            "organization": {"name": "noaa-gov", "title": "NOAA"},
            "resources": [{"id": "r1", "format": "CSV", "url": "http://x/r1.csv"}],
            "extras": [{"key": "bureauCode", "value": "006:48"}]
        })))
        .mount(&server)
        .await;

    let package = create_test_client(&server)
        .package_show("climate-normals")
        .await
        .expect("Package show should succeed");

    assert_eq!(package.organization_name(), Some("noaa-gov"));
    assert_eq!(package.resources.as_ref().map(Vec::len), Some(1));
    assert_eq!(
        package.extras.as_ref().and_then(|e| e[0].as_str()),
        Some("006:48")
    );
}

#[tokio::test]
async fn test_organization_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/organization_list"))
        .and(query_param("all_fields", "true"))
        .and(query_param("limit", "2"))
        .respond_with(ok(json!([
            {"name": "epa-gov", "title": "EPA"},
            {"name": "noaa-gov", "title": "NOAA"}
        ])))
        .mount(&server)
        .await;

    let orgs = create_test_client(&server)
        .organization_list(None, Some(2), None)
        .await
        .expect("Organization list should succeed");

    assert_eq!(orgs.len(), 2);
    assert_eq!(orgs[1].title.as_deref(), Some("NOAA"));
}

#[tokio::test]
async fn test_not_found_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": {"message": "Not found", "__type": "Not Found Error"}
        })))
        .mount(&server)
        .await;

    match create_test_client(&server).package_show("missing").await {
        Err(CkanError::ApiError { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found Error: Not found");
        }
        other => panic!("Unexpected result: {:?}", other.map(|p| p.name)),
    }
}

#[tokio::test]
async fn test_unsuccessful_action() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/resource_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"message": "Access denied"}
        })))
        .mount(&server)
        .await;

    let err = create_test_client(&server)
        .resource_show("r1")
        .await
        .expect_err("success=false must be an error");
    assert!(matches!(err, CkanError::ActionFailed { ref message } if message == "Access denied"));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/status_show"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = create_test_client(&server)
        .status_show()
        .await
        .expect_err("HTML is not a CKAN payload");
    assert!(matches!(err, CkanError::ParseError(_)));
}

#[tokio::test]
async fn test_timeout_is_detected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/status_show"))
        .respond_with(ok(json!({"ckan_version": "2.10"})).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = Configuration::for_portal(&server.uri(), None, Duration::from_millis(50))
        .expect("client builds");
    let err = CkanClient::new(Arc::new(config))
        .status_show()
        .await
        .expect_err("request should time out");
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused_is_detected() {
    // Bind then drop a server so the port is known to be closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let config =
        Configuration::for_portal(&uri, None, Duration::from_secs(2)).expect("client builds");
    let err = CkanClient::new(Arc::new(config))
        .status_show()
        .await
        .expect_err("nothing is listening");
    assert!(err.is_connect());
}
