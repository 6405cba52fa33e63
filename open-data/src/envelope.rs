//! The `{data, metadata, error}` envelope every accessor returns.
//!
//! [`Envelope`] is a tagged type: a success holds records, a failure holds an
//! [`EnvelopeError`]. Its fields are private, so the constructors below are the
//! only way to build one, and a success always reports `count == data.len()`.
//! On the wire both shapes serialize to the same three keys:
//!
//! ```json
//! {"data": [...], "metadata": {"source": "...", "count": 2, ...}, "error": null}
//! {"data": [], "metadata": {"source": "...", ...}, "error": "HTTP Error: 404 - Not Found"}
//! ```

use chrono::{DateTime, Local};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// One row of an envelope's `data`. The schema belongs to the remote endpoint.
pub type Record = Map<String, Value>;

/// Pagination block reported by paged endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// The `metadata` mapping of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// When the call was made, not when the data was published
    pub last_updated: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Operation-specific keys (`query`, `category`, `params`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Metadata stamped with the current time.
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            action: None,
            country: None,
            endpoint: None,
            last_updated: Local::now(),
            count: None,
            total_count: None,
            page_info: None,
            extra: Map::new(),
        }
    }

    pub fn with_action<S: Into<String>>(mut self, action: S) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_country<S: Into<String>>(mut self, country: S) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_pagination(mut self, total_count: u64, page_info: PageInfo) -> Self {
        self.total_count = Some(total_count);
        self.page_info = Some(page_info);
        self
    }

    /// Attach an operation-specific key.
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Number of records in the envelope; only set on success.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    /// Identifier of what was queried: country, endpoint, or action name.
    pub fn identifier(&self) -> Option<&str> {
        self.country
            .as_deref()
            .or(self.endpoint.as_deref())
            .or(self.action.as_deref())
    }
}

/// Outcome carried by an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Vec<Record>),
    Failure(EnvelopeError),
}

/// Uniform response of every accessor. See the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    metadata: Metadata,
    outcome: Outcome,
}

impl Envelope {
    /// Successful response; `metadata.count` is set from `data`.
    pub fn success(mut metadata: Metadata, data: Vec<Record>) -> Self {
        metadata.count = Some(data.len());
        Self {
            metadata,
            outcome: Outcome::Success(data),
        }
    }

    /// Failed response. Pagination and count are cleared since no data came back.
    pub fn failure(mut metadata: Metadata, error: EnvelopeError) -> Self {
        metadata.count = None;
        metadata.total_count = None;
        metadata.page_info = None;
        Self {
            metadata,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn transport<S: Into<String>>(metadata: Metadata, detail: S) -> Self {
        Self::failure(metadata, EnvelopeError::Transport(detail.into()))
    }

    pub fn timeout(metadata: Metadata) -> Self {
        Self::failure(metadata, EnvelopeError::Timeout)
    }

    pub fn http_status(metadata: Metadata, status: u16) -> Self {
        Self::failure(metadata, EnvelopeError::http_status(status))
    }

    pub fn malformed<S: Into<String>>(metadata: Metadata, detail: S) -> Self {
        Self::failure(metadata, EnvelopeError::MalformedResponse(detail.into()))
    }

    pub fn remote<S: Into<String>>(metadata: Metadata, message: S) -> Self {
        Self::failure(metadata, EnvelopeError::Remote(message.into()))
    }

    pub fn no_datasets<S: Into<String>>(metadata: Metadata, category: S) -> Self {
        Self::failure(
            metadata,
            EnvelopeError::NoDatasets {
                category: category.into(),
            },
        )
    }

    pub fn unexpected<S: Into<String>>(metadata: Metadata, detail: S) -> Self {
        Self::failure(metadata, EnvelopeError::Unexpected(detail.into()))
    }

    /// Build from a fallible lookup.
    pub fn from_result<E: Into<EnvelopeError>>(
        metadata: Metadata,
        result: std::result::Result<Vec<Record>, E>,
    ) -> Self {
        match result {
            Ok(data) => Self::success(metadata, data),
            Err(err) => Self::failure(metadata, err.into()),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Records on success, an empty slice on failure.
    pub fn data(&self) -> &[Record] {
        match &self.outcome {
            Outcome::Success(data) => data,
            Outcome::Failure(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn first(&self) -> Option<&Record> {
        self.data().first()
    }

    pub fn into_data(self) -> Vec<Record> {
        match self.outcome {
            Outcome::Success(data) => data,
            Outcome::Failure(_) => Vec::new(),
        }
    }

    /// Serialized form, as printed by the CLI.
    pub fn to_value(&self) -> Value {
        // Every field is a string-keyed map or primitive, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 3)?;
        state.serialize_field("data", self.data())?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("error", &self.error().map(ToString::to_string))?;
        state.end()
    }
}

/// Convert a serializable value into a record, if it serializes to a JSON object.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, EnvelopeError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(EnvelopeError::Unexpected(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}
