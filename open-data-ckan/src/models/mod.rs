//! Typed views over CKAN action API payloads.
//!
//! Only the fields the client navigates on are typed. Everything else a portal
//! returns is kept in the flattened `fields` map so that a model serializes back
//! to the full record it was parsed from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod extra;

pub use extra::Extra;

/// The wrapper every CKAN action responds with.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub help: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ActionError>,
}

/// Error block returned by CKAN when `success` is false.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
}

impl ActionError {
    /// Best human-readable description CKAN gave us.
    pub fn describe(&self) -> String {
        match (&self.error_type, &self.message) {
            (Some(kind), Some(message)) => format!("{}: {}", kind, message),
            (None, Some(message)) => message.clone(),
            (Some(kind), None) => kind.clone(),
            (None, None) => "CKAN API reported failure".to_string(),
        }
    }
}

/// Result of `package_search`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackageSearchResult {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<Package>,
}

/// A dataset, which CKAN calls a package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<Extra>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Package {
    /// Name of the owning organization, when the portal reports one.
    pub fn organization_name(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .map(|org| org.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// A file or API endpoint attached to a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A publishing organization (usually a government agency).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}
