//! Shape validation of envelopes, the acceptance gate of every harness case.

use serde_json::Value;
use thiserror::Error;

use crate::envelope::Envelope;

/// Metadata keys any one of which identifies what was queried.
pub const IDENTIFIER_KEYS: [&str; 3] = ["country", "endpoint", "action"];

/// Why an envelope was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Invalid result type: expected a JSON object")]
    NotAnObject,

    #[error("Missing required fields (data, metadata, error)")]
    MissingField(&'static str),

    #[error("API Error: {0}")]
    Remote(String),

    #[error("Missing metadata field: {0}")]
    MissingMetadata(&'static str),
}

/// True when `envelope` passes [`check`].
pub fn validate(envelope: &Envelope) -> bool {
    check(envelope).is_ok()
}

/// Validate a typed envelope through its serialized form.
pub fn check(envelope: &Envelope) -> Result<(), ValidationFailure> {
    check_value(&envelope.to_value())
}

/// Validate any JSON value against the envelope contract.
///
/// The value must be an object with `data`, `metadata` and `error`; `error`
/// must be falsy; `metadata` must carry `source`, an identifier (see
/// [`IDENTIFIER_KEYS`]), `last_updated` and `count`.
pub fn check_value(value: &Value) -> Result<(), ValidationFailure> {
    let object = value.as_object().ok_or(ValidationFailure::NotAnObject)?;

    for field in ["data", "metadata", "error"] {
        if !object.contains_key(field) {
            return Err(ValidationFailure::MissingField(field));
        }
    }

    if let Some(message) = truthy_error(&object["error"]) {
        return Err(ValidationFailure::Remote(message));
    }

    let metadata = object["metadata"]
        .as_object()
        .ok_or(ValidationFailure::MissingField("metadata"))?;

    if !metadata.contains_key("source") {
        return Err(ValidationFailure::MissingMetadata("source"));
    }
    if !IDENTIFIER_KEYS.iter().any(|key| metadata.contains_key(*key)) {
        return Err(ValidationFailure::MissingMetadata("country"));
    }
    for field in ["last_updated", "count"] {
        if !metadata.contains_key(field) {
            return Err(ValidationFailure::MissingMetadata(field));
        }
    }

    Ok(())
}

fn truthy_error(error: &Value) -> Option<String> {
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Metadata;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "data": [],
            "metadata": {"source": "s", "country": "us", "last_updated": "now", "count": 0},
            "error": null
        })
    }

    #[test]
    fn test_accepts_complete_envelope() {
        assert_eq!(check_value(&valid()), Ok(()));
    }

    #[test]
    fn test_rejects_missing_top_level_field() {
        let mut value = valid();
        value.as_object_mut().map(|o| o.remove("error"));
        assert_eq!(
            check_value(&value),
            Err(ValidationFailure::MissingField("error"))
        );
        assert_eq!(check_value(&json!([1])), Err(ValidationFailure::NotAnObject));
    }

    #[test]
    fn test_falsy_errors_pass() {
        for falsy in [json!(null), json!(""), json!(false)] {
            let mut value = valid();
            value["error"] = falsy;
            assert!(check_value(&value).is_ok());
        }
        let mut value = valid();
        value["error"] = json!("HTTP Error: 500 - Internal Server Error");
        assert!(matches!(check_value(&value), Err(ValidationFailure::Remote(_))));
    }

    #[test]
    fn test_rejects_missing_metadata_keys() {
        for (key, reported) in [
            ("source", "source"),
            ("country", "country"),
            ("last_updated", "last_updated"),
            ("count", "count"),
        ] {
            let mut value = valid();
            value["metadata"].as_object_mut().map(|m| m.remove(key));
            assert_eq!(
                check_value(&value),
                Err(ValidationFailure::MissingMetadata(reported))
            );
        }
    }

    #[test]
    fn test_endpoint_counts_as_identifier() {
        let mut value = valid();
        let metadata = value["metadata"].as_object_mut().expect("object");
        metadata.remove("country");
        metadata.insert("endpoint".into(), json!("v2/accounting/od/mts"));
        assert!(check_value(&value).is_ok());
    }

    #[test]
    fn test_typed_envelopes() {
        let ok = Envelope::success(Metadata::new("s").with_country("us"), vec![]);
        assert!(validate(&ok));

        let failed = Envelope::timeout(Metadata::new("s").with_country("us"));
        assert!(!validate(&failed));

        // Successful but unidentified
        let anonymous = Envelope::success(Metadata::new("s"), vec![]);
        assert_eq!(
            check(&anonymous),
            Err(ValidationFailure::MissingMetadata("country"))
        );
    }
}
