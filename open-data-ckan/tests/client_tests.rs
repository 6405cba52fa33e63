use open_data_ckan::{CkanClient, CkanError, Configuration, portals};
use std::sync::Arc;
use std::time::Duration;

/// Test that we can create a client and it has expected debug output
#[test]
fn test_client_creation() {
    let config = Arc::new(Configuration {
        base_path: "https://catalog.data.gov/api/3".to_string(),
        user_agent: Some("test-client/1.0".to_string()),
        client: reqwest::Client::new(),
    });

    let client = CkanClient::new(config);

    let debug_str = format!("{:?}", client);
    assert!(debug_str.contains("CkanClient"));
    assert!(debug_str.contains("catalog.data.gov"));
}

/// Test that a portal configuration points at the action API root
#[test]
fn test_portal_configuration() {
    let portal = portals::find("uk").expect("uk portal is registered");
    let config = Configuration::for_portal(
        portal.base_url,
        Some("test-client/1.0".to_string()),
        Duration::from_secs(5),
    )
    .expect("client builds");

    assert_eq!(config.base_path, "https://data.gov.uk/api/3");
    assert_eq!(CkanClient::new(Arc::new(config)).base_path(), "https://data.gov.uk/api/3");
}

/// Test error types implement expected traits
#[test]
fn test_error_types() {
    let req_error = CkanError::RequestError(Box::new(std::io::Error::other("test error")));
    assert!(!req_error.is_timeout());
    assert!(!req_error.is_connect());

    let parse_error = CkanError::ParseError(
        serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err(),
    );
    assert!(format!("{}", parse_error).starts_with("Parse error"));

    let failed = CkanError::ActionFailed {
        message: "Not authorized".to_string(),
    };
    assert_eq!(format!("{}", failed), "CKAN action failed: Not authorized");

    fn check_error_trait<T: std::error::Error>(_: T) {}
    check_error_trait(req_error);
}

/// Test that error messages are meaningful
#[test]
fn test_error_messages() {
    let api_error = CkanError::ApiError {
        status: 404,
        message: "Dataset not found".to_string(),
    };

    let message = format!("{}", api_error);
    assert!(message.contains("404"));
    assert!(message.contains("Dataset not found"));
}
