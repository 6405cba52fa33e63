use serde::{Deserialize, Serialize};

/// Represents an extra key-value pair in CKAN datasets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    pub value: serde_json::Value,
}

impl Extra {
    /// The value as plain text, when the portal stored a string.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}
